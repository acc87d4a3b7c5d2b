//! Server profiles: LDAP, RADIUS, TACACS+ and SNMP trap.
//!
//! Shared secrets and passwords are written in plain text and come back
//! device-encrypted.

use super::{Entry, is_false, is_zero};
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

/// Authentication protocol of RADIUS and TACACS+ profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProtocol {
    Chap,
    Pap,
    PeapMschapv2,
    PeapWithGtc,
    EapTtlsWithPap,
}

impl AuthProtocol {
    pub const ALL: &'static [&'static str] = &[
        "chap",
        "pap",
        "peap_mschapv2",
        "peap_with_gtc",
        "eap_ttls_with_pap",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chap => "chap",
            Self::Pap => "pap",
            Self::PeapMschapv2 => "peap_mschapv2",
            Self::PeapWithGtc => "peap_with_gtc",
            Self::EapTtlsWithPap => "eap_ttls_with_pap",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "chap" => Some(Self::Chap),
            "pap" => Some(Self::Pap),
            "peap_mschapv2" => Some(Self::PeapMschapv2),
            "peap_with_gtc" => Some(Self::PeapWithGtc),
            "eap_ttls_with_pap" => Some(Self::EapTtlsWithPap),
            _ => None,
        }
    }
}

// ============================================================================
// LDAP
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapServer {
    pub name: String,
    pub server: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin_use_only: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ldap_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ssl: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub verify_server_certificate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_dn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bind_dn: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bind_password: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub bind_timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub search_timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry_interval: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<LdapServer>,
}

impl Entry for LdapProfile {
    const KIND: Kind = Kind::LdapProfile;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        *self = Self {
            name: std::mem::take(&mut self.name),
            ..other.clone()
        };
    }
}

// ============================================================================
// RADIUS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusServer {
    pub name: String,
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadiusProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin_use_only: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retries: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<AuthProtocol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<RadiusServer>,
}

impl Entry for RadiusProfile {
    const KIND: Kind = Kind::RadiusProfile;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        *self = Self {
            name: std::mem::take(&mut self.name),
            ..other.clone()
        };
    }
}

// ============================================================================
// TACACS+
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacacsPlusServer {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacacsPlusProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin_use_only: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_single_connection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<AuthProtocol>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<TacacsPlusServer>,
}

impl Entry for TacacsPlusProfile {
    const KIND: Kind = Kind::TacacsPlusProfile;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        *self = Self {
            name: std::mem::take(&mut self.name),
            ..other.clone()
        };
    }
}

// ============================================================================
// SNMP trap
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpV2cServer {
    pub name: String,
    pub manager: String,
    pub community: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpV3Server {
    pub name: String,
    pub manager: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub engine_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub priv_password: String,
}

/// SNMP version of a trap profile, with its servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnmpVersion {
    V2c(Vec<SnmpV2cServer>),
    V3(Vec<SnmpV3Server>),
}

impl Default for SnmpVersion {
    fn default() -> Self {
        Self::V2c(Vec::new())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpServerProfile {
    pub name: String,
    #[serde(default)]
    pub version: SnmpVersion,
}

impl Entry for SnmpServerProfile {
    const KIND: Kind = Kind::SnmpServerProfile;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        self.version = other.version.clone();
    }
}
