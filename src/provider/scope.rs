//! Scoping attributes shared by every resource schema.
//!
//! Scoping values pick the object's location on the device and are part of
//! its identifier, so all of them force replacement.

use declarative::Attribute;

pub fn name() -> Attribute {
    Attribute::string()
        .required()
        .force_new()
        .describe("Object name")
}

pub fn vsys(default: &str) -> Attribute {
    Attribute::string()
        .optional()
        .force_new()
        .default(default)
        .describe("Virtual system (firewall, or template on Panorama)")
}

/// Panorama device group. Empty (or `shared`) is Panorama's shared
/// location; firewalls ignore it.
pub fn device_group() -> Attribute {
    Attribute::string()
        .optional()
        .force_new()
        .describe("Panorama device group; shared when unset")
}

pub fn template() -> Attribute {
    Attribute::string()
        .optional()
        .force_new()
        .conflicts_with(&["template_stack"])
        .describe("Panorama template")
}

pub fn template_stack() -> Attribute {
    Attribute::string()
        .optional()
        .force_new()
        .conflicts_with(&["template"])
        .describe("Panorama template stack")
}

/// Name of an enclosing object.
pub fn parent(what: &str) -> Attribute {
    Attribute::string().required().force_new().describe(what)
}
