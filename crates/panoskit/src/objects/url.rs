//! Custom URL categories.

use super::Entry;
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// URL list entries, managed in place as members
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<String>,
    /// `URL List` or `Category Match`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category_type: String,
}

impl Entry for UrlCategory {
    const KIND: Kind = Kind::UrlCategory;
    const FAMILY: Family = Family::Objects;

    fn name(&self) -> &str {
        &self.name
    }

    // Sites added through URL category entries survive an edit that does
    // not list any.
    fn copy_from(&mut self, other: &Self) {
        self.description.clone_from(&other.description);
        if !other.sites.is_empty() {
            self.sites.clone_from(&other.sites);
        }
        self.category_type.clone_from(&other.category_type);
    }
}
