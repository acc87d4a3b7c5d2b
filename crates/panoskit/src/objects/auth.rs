//! Authentication profiles.

use super::{Entry, is_zero};
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

/// Authentication method of a profile. Exactly one applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    LocalDatabase,
    Radius {
        server_profile: String,
        #[serde(default)]
        retrieve_user_group: bool,
    },
    Ldap {
        server_profile: String,
        #[serde(default)]
        login_attribute: String,
        #[serde(default)]
        password_expiry_warning: String,
    },
    Kerberos {
        server_profile: String,
        #[serde(default)]
        realm: String,
    },
    TacacsPlus {
        server_profile: String,
        #[serde(default)]
        retrieve_user_group: bool,
    },
}

/// Kerberos single sign-on settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSignOn {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_principal: String,
    /// Device-encrypted keytab
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keytab: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_list: Vec<String>,
    /// Failed attempts before lockout, as the device reports it
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lockout_failed_attempts: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub lockout_time: i64,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username_modifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_sign_on: Option<SingleSignOn>,
    /// Multi-factor authentication profiles
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub factors: Vec<String>,
}

impl Entry for AuthenticationProfile {
    const KIND: Kind = Kind::AuthenticationProfile;
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
