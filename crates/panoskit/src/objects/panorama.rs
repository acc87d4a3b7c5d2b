//! Panorama device groups.

use super::Entry;
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Member firewalls: serial number to vsys list (empty means all)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub devices: BTreeMap<String, Vec<String>>,
}

impl Entry for DeviceGroup {
    const KIND: Kind = Kind::DeviceGroup;
    const FAMILY: Family = Family::Panorama;

    fn name(&self) -> &str {
        &self.name
    }

    // Membership is owned by the device group entry resources.
    fn copy_from(&mut self, other: &Self) {
        self.description.clone_from(&other.description);
    }
}
