//! Where objects live on a device
//!
//! A [`Scope`] is the full set of scoping values a resource carries. Each
//! device arm turns the scope into a [`Location`], using only the values
//! that matter for it: a firewall ignores templates and device groups,
//! Panorama ignores nothing. A [`Container`] then names one list of objects
//! of a single [`Kind`] at that location, possibly nested under parent
//! objects (a BGP filter lives inside an aggregate inside a virtual router).
//!
//! Containers render to xpath-like keys:
//!
//! ```
//! use panoskit::{Container, Kind, Location};
//!
//! let c = Container::new(Location::Vsys { vsys: "vsys1".into() }, Kind::Application);
//! assert_eq!(c.key(), "/config/devices/localhost/vsys/vsys1/application");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The vsys name that denotes shared configuration.
pub const SHARED: &str = "shared";

/// Type of device on the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Standalone next-generation firewall
    Firewall,
    /// Central manager
    Panorama,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firewall => write!(f, "firewall"),
            Self::Panorama => write!(f, "panorama"),
        }
    }
}

/// Scoping values carried by a resource. Empty means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    pub vsys: String,
    pub device_group: String,
    pub template: String,
    pub template_stack: String,
}

impl Scope {
    /// Scope with only a vsys.
    pub fn vsys(vsys: impl Into<String>) -> Self {
        Self {
            vsys: vsys.into(),
            ..Self::default()
        }
    }

    /// Scope with only a device group.
    pub fn device_group(device_group: impl Into<String>) -> Self {
        Self {
            device_group: device_group.into(),
            ..Self::default()
        }
    }

    /// Scope inside a template or template stack.
    pub fn template(
        template: impl Into<String>,
        template_stack: impl Into<String>,
        vsys: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            template_stack: template_stack.into(),
            vsys: vsys.into(),
            ..Self::default()
        }
    }
}

/// Configuration area a kind of object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Policy objects: firewall vsys, Panorama device group
    Objects,
    /// Device settings and server profiles: firewall vsys or shared,
    /// Panorama template
    DeviceConfig,
    /// Network settings: firewall device level, Panorama template
    Network,
    /// Panorama-only configuration such as device groups
    Panorama,
    /// Security policy rulebases
    Rulebase,
}

/// Kind of object. Determines the container path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Application,
    AuthenticationProfile,
    LdapProfile,
    RadiusProfile,
    TacacsPlusProfile,
    SnmpServerProfile,
    LocalUser,
    Certificate,
    VirtualRouter,
    BgpAggregate,
    BgpAggAdvertiseFilter,
    IkeCryptoProfile,
    DhcpRelay,
    UrlCategory,
    DeviceGroup,
    Template,
    TemplateStack,
    SecurityRule,
    NatRule,
    PbfRule,
    DecryptionRule,
}

impl Kind {
    /// Path segment of the container holding this kind.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::AuthenticationProfile => "authentication-profile",
            Self::LdapProfile => "server-profile/ldap",
            Self::RadiusProfile => "server-profile/radius",
            Self::TacacsPlusProfile => "server-profile/tacplus",
            Self::SnmpServerProfile => "log-settings/snmptrap",
            Self::LocalUser => "local-user-database/user",
            Self::Certificate => "certificate",
            Self::VirtualRouter => "virtual-router",
            Self::BgpAggregate => "protocol/bgp/policy/aggregation/address",
            Self::BgpAggAdvertiseFilter => "aggregate-route-attributes/advertise-filters",
            Self::IkeCryptoProfile => "ike/crypto-profiles/ike-crypto-profiles",
            Self::DhcpRelay => "dhcp/interface",
            Self::UrlCategory => "profiles/custom-url-category",
            Self::DeviceGroup => "device-group",
            Self::Template => "template",
            Self::TemplateStack => "template-stack",
            Self::SecurityRule => "security/rules",
            Self::NatRule => "nat/rules",
            Self::PbfRule => "pbf/rules",
            Self::DecryptionRule => "decryption/rules",
        }
    }

    /// Short name used in messages.
    pub fn label(&self) -> &'static str {
        self.path().rsplit('/').next().unwrap_or_default()
    }
}

/// A resolved configuration location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// Firewall shared configuration
    Shared,
    /// Firewall vsys
    Vsys { vsys: String },
    /// Firewall device-level network configuration
    Device,
    /// A vsys (or shared) inside a Panorama template or template stack
    Template {
        template: String,
        template_stack: String,
        vsys: String,
    },
    /// Network configuration inside a Panorama template or template stack
    TemplateNetwork {
        template: String,
        template_stack: String,
    },
    /// Panorama device group
    DeviceGroup { device_group: String },
    /// Panorama shared configuration
    PanoramaShared,
    /// Panorama's own configuration root
    Panorama,
    /// Rulebase of a Panorama device group (`pre-rulebase`/`post-rulebase`)
    DeviceGroupRulebase {
        device_group: String,
        rulebase: String,
    },
}

impl Location {
    /// Xpath-like key of the location.
    pub fn key(&self) -> String {
        const ROOT: &str = "/config/devices/localhost";
        match self {
            Self::Shared | Self::PanoramaShared => "/config/shared".to_string(),
            Self::Vsys { vsys } => format!("{ROOT}/vsys/{vsys}"),
            Self::Device => format!("{ROOT}/network"),
            Self::Template {
                template,
                template_stack,
                vsys,
            } => {
                let base = template_root(template, template_stack);
                if vsys == SHARED {
                    format!("{base}/config/shared")
                } else {
                    format!("{base}/config/devices/localhost/vsys/{vsys}")
                }
            }
            Self::TemplateNetwork {
                template,
                template_stack,
            } => format!(
                "{}/config/devices/localhost/network",
                template_root(template, template_stack)
            ),
            Self::DeviceGroup { device_group } => format!("{ROOT}/device-group/{device_group}"),
            Self::Panorama => ROOT.to_string(),
            Self::DeviceGroupRulebase {
                device_group,
                rulebase,
            } => format!("{ROOT}/device-group/{device_group}/{rulebase}"),
        }
    }

    /// The named Panorama container this location lives in, if any.
    pub fn parent_container(&self) -> Option<(Kind, &str)> {
        match self {
            Self::Template {
                template,
                template_stack,
                ..
            }
            | Self::TemplateNetwork {
                template,
                template_stack,
            } => {
                if template.is_empty() {
                    Some((Kind::TemplateStack, template_stack.as_str()))
                } else {
                    Some((Kind::Template, template.as_str()))
                }
            }
            Self::DeviceGroup { device_group } | Self::DeviceGroupRulebase { device_group, .. } => {
                Some((Kind::DeviceGroup, device_group.as_str()))
            }
            _ => None,
        }
    }
}

fn template_root(template: &str, template_stack: &str) -> String {
    if template.is_empty() {
        format!("/config/devices/localhost/template-stack/{template_stack}")
    } else {
        format!("/config/devices/localhost/template/{template}")
    }
}

/// One list of objects of a single kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Container {
    pub location: Location,
    /// Enclosing objects, outermost first
    pub parents: Vec<(Kind, String)>,
    pub kind: Kind,
}

impl Container {
    /// Top-level container at a location.
    pub fn new(location: Location, kind: Kind) -> Self {
        Self {
            location,
            parents: Vec::new(),
            kind,
        }
    }

    /// Container nested under a parent object.
    pub fn within(mut self, kind: Kind, name: impl Into<String>) -> Self {
        self.parents.push((kind, name.into()));
        self
    }

    /// Xpath-like key of the container.
    pub fn key(&self) -> String {
        let mut key = self.location.key();
        for (kind, name) in &self.parents {
            key.push_str(&format!("/{}/entry[@name='{name}']", kind.path()));
        }
        key.push('/');
        key.push_str(self.kind.path());
        key
    }

    /// Container holding the innermost parent, if any.
    pub fn parent(&self) -> Option<(Self, &str)> {
        let ((kind, name), rest) = self.parents.split_last()?;
        let container = Self {
            location: self.location.clone(),
            parents: rest.to_vec(),
            kind: *kind,
        };
        Some((container, name.as_str()))
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_keys() {
        let in_template = Location::Template {
            template: "t1".into(),
            template_stack: String::new(),
            vsys: SHARED.into(),
        };
        assert_eq!(
            in_template.key(),
            "/config/devices/localhost/template/t1/config/shared"
        );

        let in_stack = Location::TemplateNetwork {
            template: String::new(),
            template_stack: "s1".into(),
        };
        assert_eq!(
            in_stack.key(),
            "/config/devices/localhost/template-stack/s1/config/devices/localhost/network"
        );
        assert_eq!(in_stack.parent_container(), Some((Kind::TemplateStack, "s1")));
    }

    #[test]
    fn test_nested_container() {
        let c = Container::new(Location::Device, Kind::BgpAggAdvertiseFilter)
            .within(Kind::VirtualRouter, "vr1")
            .within(Kind::BgpAggregate, "agg1");
        assert_eq!(
            c.key(),
            "/config/devices/localhost/network/virtual-router/entry[@name='vr1']\
             /protocol/bgp/policy/aggregation/address/entry[@name='agg1']\
             /aggregate-route-attributes/advertise-filters"
        );

        let (parent, name) = c.parent().unwrap();
        assert_eq!(name, "agg1");
        assert_eq!(parent.kind, Kind::BgpAggregate);
        assert_eq!(parent.parents.len(), 1);
    }

    #[test]
    fn test_kind_label() {
        assert_eq!(Kind::LdapProfile.label(), "ldap");
        assert_eq!(Kind::Application.label(), "application");
    }
}
