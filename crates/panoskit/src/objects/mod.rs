//! Typed object entries
//!
//! Each PAN-OS object kind is a serde struct implementing [`Entry`]. The
//! [`Objects`] accessor binds an entry type to a device and turns scoping
//! values into containers, so resources never build locations by hand.
//!
//! ```
//! use std::sync::Arc;
//! use panoskit::{Firewall, MemoryBackend, Objects, Scope, UrlCategory};
//!
//! let fw = Firewall::new("fw", Arc::new(MemoryBackend::new()));
//! let categories = Objects::<UrlCategory>::new(&fw);
//! let scope = Scope::vsys("vsys1");
//!
//! categories
//!     .set(&scope, &UrlCategory { name: "blocked".into(), ..Default::default() })
//!     .unwrap();
//! categories.set_member(&scope, "blocked", "sites", "a.example").unwrap();
//!
//! assert_eq!(categories.get(&scope, "blocked").unwrap().sites, vec!["a.example"]);
//! ```

pub mod application;
pub mod audit;
pub mod auth;
pub mod certificate;
pub mod network;
pub mod panorama;
pub mod server_profile;
pub mod url;
pub mod user;

use crate::device::Device;
use crate::error::{Error, Result};
use crate::location::{Container, Family, Kind, Scope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// A typed object entry.
pub trait Entry: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Kind of object
    const KIND: Kind;

    /// Configuration area the kind belongs to
    const FAMILY: Family;

    /// Enclosing object kinds, outermost first
    const PARENTS: &'static [Kind] = &[];

    /// Entry name
    fn name(&self) -> &str;

    /// Copy the fields that may change in place from `other`.
    ///
    /// Used on update: the live entry is fetched, the mutable subset of the
    /// proposed entry is copied over it, and the result is written back, so
    /// fields this crate does not model survive the edit.
    fn copy_from(&mut self, other: &Self);
}

/// Typed access to one kind of entry on a device.
pub struct Objects<'a, T: Entry> {
    device: &'a dyn Device,
    parents: Vec<String>,
    _entry: PhantomData<T>,
}

impl<'a, T: Entry> Objects<'a, T> {
    /// Accessor for top-level entries.
    pub fn new(device: &'a dyn Device) -> Self {
        Self::nested(device, Vec::new())
    }

    /// Accessor for entries nested under parent objects, named outermost
    /// first.
    pub fn nested(device: &'a dyn Device, parents: Vec<String>) -> Self {
        Self {
            device,
            parents,
            _entry: PhantomData,
        }
    }

    /// Container the entries live in for a scope.
    pub fn container(&self, scope: &Scope) -> Result<Container> {
        if self.parents.len() != T::PARENTS.len() {
            return Err(Error::Other(format!(
                "{} needs {} parent names, got {}",
                T::KIND.label(),
                T::PARENTS.len(),
                self.parents.len()
            )));
        }
        let location = self.device.locate(T::FAMILY, scope)?;
        Ok(T::PARENTS
            .iter()
            .zip(&self.parents)
            .fold(Container::new(location, T::KIND), |c, (kind, name)| {
                c.within(*kind, name.as_str())
            }))
    }

    pub fn get(&self, scope: &Scope, name: &str) -> Result<T> {
        let value = self.device.backend().get(&self.container(scope)?, name)?;
        Ok(serde_json::from_value(value)?)
    }

    /// All entries in device order.
    pub fn list(&self, scope: &Scope) -> Result<Vec<T>> {
        self.device
            .backend()
            .list(&self.container(scope)?)?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Error::from))
            .collect()
    }

    pub fn list_names(&self, scope: &Scope) -> Result<Vec<String>> {
        self.device.backend().list_names(&self.container(scope)?)
    }

    /// Merge an entry into the device.
    pub fn set(&self, scope: &Scope, entry: &T) -> Result<()> {
        log::debug!("set {} {}", T::KIND.label(), entry.name());
        self.device
            .backend()
            .set(&self.container(scope)?, serde_json::to_value(entry)?)
    }

    /// Replace an entry wholesale.
    pub fn edit(&self, scope: &Scope, entry: &T) -> Result<()> {
        log::debug!("edit {} {}", T::KIND.label(), entry.name());
        self.device
            .backend()
            .edit(&self.container(scope)?, serde_json::to_value(entry)?)
    }

    pub fn delete(&self, scope: &Scope, name: &str) -> Result<()> {
        log::debug!("delete {} {name}", T::KIND.label());
        self.device.backend().delete(&self.container(scope)?, name)
    }

    pub fn set_member(&self, scope: &Scope, name: &str, field: &str, member: &str) -> Result<()> {
        self.device
            .backend()
            .set_member(&self.container(scope)?, name, field, member)
    }

    pub fn delete_member(&self, scope: &Scope, name: &str, field: &str, member: &str) -> Result<()> {
        self.device
            .backend()
            .delete_member(&self.container(scope)?, name, field, member)
    }

    pub fn set_map_entry(
        &self,
        scope: &Scope,
        name: &str,
        field: &str,
        key: &str,
        value: &impl Serialize,
    ) -> Result<()> {
        self.device.backend().set_map_entry(
            &self.container(scope)?,
            name,
            field,
            key,
            serde_json::to_value(value)?,
        )
    }

    pub fn delete_map_entry(&self, scope: &Scope, name: &str, field: &str, key: &str) -> Result<()> {
        self.device
            .backend()
            .delete_map_entry(&self.container(scope)?, name, field, key)
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn is_false(value: &bool) -> bool {
    !value
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::device::{Firewall, Panorama};
    use crate::objects::network::BgpAggAdvertiseFilter;
    use crate::objects::url::UrlCategory;
    use std::sync::Arc;

    #[test]
    fn test_container_nesting() {
        let fw = Firewall::new("fw", Arc::new(MemoryBackend::new()));
        let filters =
            Objects::<BgpAggAdvertiseFilter>::nested(&fw, vec!["vr1".into(), "agg".into()]);
        let c = filters.container(&Scope::default()).unwrap();
        assert_eq!(c.parents.len(), 2);
        assert_eq!(c.parents[0], (Kind::VirtualRouter, "vr1".to_string()));

        let wrong = Objects::<BgpAggAdvertiseFilter>::new(&fw);
        assert!(wrong.container(&Scope::default()).is_err());
    }

    #[test]
    fn test_list_in_device_order() {
        let fw = Firewall::new("fw", Arc::new(MemoryBackend::new()));
        let categories = Objects::<UrlCategory>::new(&fw);
        let scope = Scope::vsys("vsys2");
        for name in ["b", "a"] {
            categories
                .set(
                    &scope,
                    &UrlCategory {
                        name: name.into(),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let names: Vec<String> = categories
            .list(&scope)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(categories.list(&Scope::vsys("vsys1")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_device_group() {
        let pano = Panorama::new("pano", Arc::new(MemoryBackend::new()));
        let categories = Objects::<UrlCategory>::new(&pano);
        let err = categories.get(&Scope::device_group("missing"), "x").unwrap_err();
        assert!(err.is_not_found());
    }
}
