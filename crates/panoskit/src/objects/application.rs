//! Custom application objects.

use super::{Entry, is_false, is_zero};
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

/// How the application is identified by default. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppDefaults {
    /// `tcp/80`, `udp/dynamic` style port specs
    Port(Vec<String>),
    /// IP protocol number
    IpProtocol(i64),
    Icmp { r#type: i64, code: i64 },
    Icmp6 { r#type: i64, code: i64 },
}

/// A custom application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<AppDefaults>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub technology: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub risk: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_app: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tcp_timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub udp_timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tcp_half_closed_timeout: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub tcp_time_wait_timeout: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub able_to_file_transfer: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub excessive_bandwidth: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tunnels_other_applications: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub has_known_vulnerability: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub used_by_malware: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub evasive_behavior: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pervasive_use: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub prone_to_misuse: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub continue_scanning_for_other_applications: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub file_type_identification: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub virus_identification: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub data_identification: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_app_id_caching: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub alg_disable_capability: bool,
}

impl Entry for Application {
    const KIND: Kind = Kind::Application;
    const FAMILY: Family = Family::Objects;

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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_serialize_tagged() {
        let app = Application {
            name: "app1".into(),
            defaults: Some(AppDefaults::Icmp { r#type: 8, code: 0 }),
            risk: 3,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&app).unwrap(),
            json!({"name": "app1", "defaults": {"icmp": {"type": 8, "code": 0}}, "risk": 3})
        );
    }

    #[test]
    fn test_copy_from_keeps_name() {
        let mut live = Application {
            name: "app1".into(),
            category: "media".into(),
            ..Default::default()
        };
        live.copy_from(&Application {
            name: "other".into(),
            description: "new".into(),
            ..Default::default()
        });
        assert_eq!(live.name, "app1");
        assert_eq!(live.description, "new");
        assert!(live.category.is_empty());
    }
}
