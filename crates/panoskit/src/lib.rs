//! PAN-OS device capabilities.
//!
//! This crate is what a resource sees of a firewall or Panorama:
//!
//! - [`Device`] arms ([`Firewall`], [`Panorama`]) that resolve scoping
//!   values to a [`Location`]
//! - typed object entries and the [`Objects`] accessor
//! - the [`Backend`] transport, with [`MemoryBackend`] as an in-memory
//!   device for offline use and tests
//! - an error taxonomy with a not-found predicate
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use panoskit::{Application, Device, Firewall, MemoryBackend, Objects, Scope};
//!
//! let fw = Firewall::new("fw.example", Arc::new(MemoryBackend::new()));
//! let apps = Objects::<Application>::new(&fw);
//!
//! let app = Application { name: "crm".into(), risk: 2, ..Default::default() };
//! apps.set(&Scope::default(), &app).unwrap();
//!
//! assert_eq!(apps.get(&Scope::vsys("vsys1"), "crm").unwrap().risk, 2);
//! assert!(apps.get(&Scope::vsys("vsys2"), "crm").unwrap_err().is_not_found());
//! assert!(!fw.is_panorama());
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod location;
pub mod objects;

pub use backend::Backend;
pub use backend::memory::{ENCRYPTED_PREFIX, MemoryBackend};
pub use device::{DEFAULT_VSYS, Device, Firewall, Panorama};
pub use error::{Error, ErrorCategory, Result};
pub use location::{Container, DeviceKind, Family, Kind, Location, SHARED, Scope};
pub use objects::application::{AppDefaults, Application};
pub use objects::audit::{AuditComment, AuditQuery, Direction};
pub use objects::auth::{AuthType, AuthenticationProfile, SingleSignOn};
pub use objects::certificate::{Certificate, CertificateImport};
pub use objects::network::{
    BgpAggAdvertiseFilter, BgpAggregate, DhcpRelay, IkeCryptoProfile, Ipv6RelayServer, Lifetime,
    VirtualRouter,
};
pub use objects::panorama::DeviceGroup;
pub use objects::server_profile::{
    AuthProtocol, LdapProfile, LdapServer, RadiusProfile, RadiusServer, SnmpServerProfile,
    SnmpV2cServer, SnmpV3Server, SnmpVersion, TacacsPlusProfile, TacacsPlusServer,
};
pub use objects::url::UrlCategory;
pub use objects::user::LocalUser;
pub use objects::{Entry, Objects};
