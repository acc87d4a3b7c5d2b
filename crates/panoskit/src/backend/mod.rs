//! Backend abstraction for device operations.
//!
//! The [`Backend`] trait is the transport: it moves JSON-shaped entries in
//! and out of [`Container`]s and exposes the handful of operational calls
//! that are not plain configuration (import relations, audit comments,
//! certificate import/export, password hashing). The typed layer in
//! [`crate::objects`] sits on top of it.
//!
//! Every call is a blocking round trip. Backends never retry.
//!
//! # Testing
//!
//! Use [`memory::MemoryBackend`] for testing without a device:
//!
//! ```
//! use panoskit::backend::{Backend, memory::MemoryBackend};
//! use panoskit::{Container, Kind, Location};
//! use serde_json::json;
//!
//! let device = MemoryBackend::new();
//! let c = Container::new(Location::Vsys { vsys: "vsys1".into() }, Kind::UrlCategory);
//! device.set(&c, json!({"name": "blocked", "sites": ["a.example"]})).unwrap();
//! device.set_member(&c, "blocked", "sites", "b.example").unwrap();
//!
//! let entry = device.get(&c, "blocked").unwrap();
//! assert_eq!(entry["sites"], json!(["a.example", "b.example"]));
//! ```

pub mod memory;

use crate::error::Result;
use crate::location::{Container, Kind, Location};
use crate::objects::audit::{AuditComment, AuditQuery};
use crate::objects::certificate::CertificateImport;
use serde_json::Value;

/// Transport to a device.
pub trait Backend: Send + Sync {
    /// Fetch one entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::ObjectNotFound` if the entry (or the template or
    /// device group holding it) does not exist.
    fn get(&self, container: &Container, name: &str) -> Result<Value>;

    /// All entries of a container, in device order.
    ///
    /// An empty container yields an empty list; a missing template or
    /// device group is an error.
    fn list(&self, container: &Container) -> Result<Vec<Value>>;

    /// Merge an entry into the device, creating it if needed.
    fn set(&self, container: &Container, entry: Value) -> Result<()>;

    /// Replace an entry wholesale, creating it if needed.
    fn edit(&self, container: &Container, entry: Value) -> Result<()>;

    /// Remove an entry.
    fn delete(&self, container: &Container, name: &str) -> Result<()>;

    /// Add `member` to the list field `field` of an existing entry.
    fn set_member(&self, container: &Container, name: &str, field: &str, member: &str)
    -> Result<()>;

    /// Remove `member` from the list field `field` of an existing entry.
    fn delete_member(
        &self,
        container: &Container,
        name: &str,
        field: &str,
        member: &str,
    ) -> Result<()>;

    /// Set one keyed element of the map field `field`, replacing it whole.
    fn set_map_entry(
        &self,
        container: &Container,
        name: &str,
        field: &str,
        key: &str,
        value: Value,
    ) -> Result<()>;

    /// Remove one keyed element of the map field `field`.
    fn delete_map_entry(&self, container: &Container, name: &str, field: &str, key: &str)
    -> Result<()>;

    /// Vsys an object defined at `network` is imported into, if any.
    fn imported_into(&self, network: &Location, kind: Kind, name: &str) -> Result<Option<String>>;

    /// Import an object into a vsys.
    fn import(&self, network: &Location, kind: Kind, vsys: &str, name: &str) -> Result<()>;

    /// Drop an object's import relation. Not imported is not an error.
    fn unimport(&self, network: &Location, kind: Kind, name: &str) -> Result<()>;

    /// Audit comment history of one rule.
    fn audit_comments(
        &self,
        rules: &Container,
        name: &str,
        query: &AuditQuery,
    ) -> Result<Vec<AuditComment>>;

    /// Import a certificate (and private key) under `name`.
    fn import_certificate(
        &self,
        container: &Container,
        name: &str,
        import: &CertificateImport,
    ) -> Result<()>;

    /// Export a certificate with its passphrase, returning the public key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Device` if the passphrase is not the one the
    /// certificate was imported with.
    fn export_certificate(&self, container: &Container, name: &str, passphrase: &str)
    -> Result<String>;

    /// Ask the device for the hash of a password.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Names of all entries of a container, in device order.
    fn list_names(&self, container: &Container) -> Result<Vec<String>> {
        Ok(self
            .list(container)?
            .iter()
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }
}
