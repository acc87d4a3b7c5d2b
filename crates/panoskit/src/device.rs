//! The two device arms
//!
//! Every resource talks to a `&dyn Device`. The firewall and Panorama arms
//! differ only in how they turn a [`Scope`] into a [`Location`] and in
//! which families they can hold; everything else goes through the shared
//! [`Backend`].

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::location::{DeviceKind, Family, Location, SHARED, Scope};
use std::sync::Arc;

/// Default vsys for firewall policy objects.
pub const DEFAULT_VSYS: &str = "vsys1";

/// A connected device.
pub trait Device: Send + Sync {
    /// Which arm this is.
    fn kind(&self) -> DeviceKind;

    /// Hostname the device was reached at.
    fn hostname(&self) -> &str;

    /// Transport to the device.
    fn backend(&self) -> &dyn Backend;

    /// Resolve scoping values to a location for a family.
    fn locate(&self, family: Family, scope: &Scope) -> Result<Location>;

    /// Vsys assumed when a resource of this family leaves it unset.
    fn default_vsys(&self, family: Family) -> &'static str;

    /// Whether this is a Panorama.
    fn is_panorama(&self) -> bool {
        self.kind() == DeviceKind::Panorama
    }
}

/// Standalone firewall.
#[derive(Clone)]
pub struct Firewall {
    hostname: String,
    backend: Arc<dyn Backend>,
}

impl Firewall {
    /// Firewall reached through `backend`.
    pub fn new(hostname: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        Self {
            hostname: hostname.into(),
            backend,
        }
    }
}

impl Device for Firewall {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Firewall
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    fn locate(&self, family: Family, scope: &Scope) -> Result<Location> {
        let vsys = if scope.vsys.is_empty() {
            self.default_vsys(family)
        } else {
            scope.vsys.as_str()
        };

        match family {
            Family::Objects | Family::Rulebase | Family::DeviceConfig => {
                if vsys == SHARED {
                    Ok(Location::Shared)
                } else {
                    Ok(Location::Vsys {
                        vsys: vsys.to_string(),
                    })
                }
            }
            Family::Network => Ok(Location::Device),
            Family::Panorama => Err(Error::Unsupported {
                device: self.kind().to_string(),
                what: "Panorama configuration".to_string(),
            }),
        }
    }

    fn default_vsys(&self, family: Family) -> &'static str {
        match family {
            Family::Objects | Family::Rulebase | Family::Network => DEFAULT_VSYS,
            Family::DeviceConfig | Family::Panorama => SHARED,
        }
    }
}

/// Panorama central manager.
#[derive(Clone)]
pub struct Panorama {
    hostname: String,
    backend: Arc<dyn Backend>,
}

impl Panorama {
    /// Panorama reached through `backend`.
    pub fn new(hostname: impl Into<String>, backend: Arc<dyn Backend>) -> Self {
        Self {
            hostname: hostname.into(),
            backend,
        }
    }
}

impl Device for Panorama {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Panorama
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    fn locate(&self, family: Family, scope: &Scope) -> Result<Location> {
        if !scope.template.is_empty() && !scope.template_stack.is_empty() {
            return Err(Error::InvalidScope(
                "template and template_stack are mutually exclusive".to_string(),
            ));
        }
        let templated = !scope.template.is_empty() || !scope.template_stack.is_empty();
        let device_group = match scope.device_group.as_str() {
            "" | SHARED => None,
            dg => Some(dg.to_string()),
        };

        match family {
            Family::Objects => Ok(match device_group {
                Some(device_group) => Location::DeviceGroup { device_group },
                None => Location::PanoramaShared,
            }),
            Family::Rulebase => Ok(match device_group {
                Some(device_group) => Location::DeviceGroupRulebase {
                    device_group,
                    rulebase: "pre-rulebase".to_string(),
                },
                None => Location::PanoramaShared,
            }),
            Family::DeviceConfig if !templated => Ok(Location::PanoramaShared),
            Family::DeviceConfig => Ok(Location::Template {
                template: scope.template.clone(),
                template_stack: scope.template_stack.clone(),
                vsys: if scope.vsys.is_empty() {
                    SHARED.to_string()
                } else {
                    scope.vsys.clone()
                },
            }),
            Family::Network if !templated => Err(Error::InvalidScope(
                "template or template_stack is required for network configuration".to_string(),
            )),
            Family::Network => Ok(Location::TemplateNetwork {
                template: scope.template.clone(),
                template_stack: scope.template_stack.clone(),
            }),
            Family::Panorama => Ok(Location::Panorama),
        }
    }

    fn default_vsys(&self, family: Family) -> &'static str {
        match family {
            Family::Network => DEFAULT_VSYS,
            _ => SHARED,
        }
    }
}
