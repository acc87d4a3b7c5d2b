//! Local user database.

use super::{Entry, is_false};
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

/// A user in the local user database. Only the password hash is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phash: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

impl Entry for LocalUser {
    const KIND: Kind = Kind::LocalUser;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        self.phash.clone_from(&other.phash);
        self.disabled = other.disabled;
    }
}
