//! Import relation of network objects
//!
//! Network objects such as virtual routers are defined once per device (or
//! template) and then imported into a vsys. Reads verify the relation and
//! report a mismatch through the vsys attribute.

use crate::provider::lifecycle::Target;
use anyhow::{Context, Result};
use panoskit::{Device, Family, Kind, Scope};

/// What a read reports for `vsys` given the observed import relation.
pub fn observed_vsys(declared: &str, imported: Option<&str>) -> String {
    match imported {
        Some(actual) if actual == declared => declared.to_string(),
        _ => format!("(not {declared})"),
    }
}

/// Vsys the object should be imported into.
fn declared_vsys(device: &(dyn Device + 'static), scope: &Scope) -> String {
    if scope.vsys.is_empty() {
        device.default_vsys(Family::Network).to_string()
    } else {
        scope.vsys.clone()
    }
}

/// Check that `target` is imported into its declared vsys.
pub fn verify(device: &(dyn Device + 'static), kind: Kind, target: &Target) -> Result<String> {
    let declared = declared_vsys(device, &target.scope);
    let network = device.locate(Family::Network, &target.scope)?;
    let imported = device
        .backend()
        .imported_into(&network, kind, &target.name)
        .with_context(|| format!("querying import of {}", target.name))?;

    let observed = observed_vsys(&declared, imported.as_deref());
    if observed != declared {
        log::warn!(
            "{} {} is imported into {:?}, expected {declared}",
            kind.label(),
            target.name,
            imported.as_deref().unwrap_or("nothing")
        );
    }
    Ok(observed)
}

/// Import `target` into its declared vsys.
pub fn import(device: &(dyn Device + 'static), kind: Kind, target: &Target) -> Result<()> {
    let declared = declared_vsys(device, &target.scope);
    let network = device.locate(Family::Network, &target.scope)?;
    log::debug!("importing {} {} into {declared}", kind.label(), target.name);
    device
        .backend()
        .import(&network, kind, &declared, &target.name)
        .with_context(|| format!("importing {} into {declared}", target.name))
}

/// Drop the import relation of `target`.
pub fn unimport(device: &(dyn Device + 'static), kind: Kind, target: &Target) -> panoskit::Result<()> {
    let network = device.locate(Family::Network, &target.scope)?;
    device.backend().unimport(&network, kind, &target.name)
}
