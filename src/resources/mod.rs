//! PAN-OS resource types.
//!
//! Most are [`ObjectResource`](crate::provider::lifecycle::ObjectResource)
//! descriptions run by the shared lifecycle. Collection elements are
//! [`MemberResource`](crate::provider::member::MemberResource)s, and the
//! certificate import drives the device directly.

pub mod application;
pub mod auth;
pub mod bgp;
pub mod certificate;
pub mod device_group;
pub mod dhcp_relay;
pub mod ike;
pub mod ldap;
pub mod local_user;
pub mod radius;
pub mod snmp;
pub mod tacacs;
pub mod url_category;
pub mod virtual_router;
