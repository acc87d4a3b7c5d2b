//! Network configuration: virtual routers, BGP aggregation, IKE and DHCP.

use super::{Entry, is_false, is_zero};
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

// ============================================================================
// Virtual router
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualRouter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub static_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub static_ipv6_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ospf_int_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ospf_ext_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ospfv3_int_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ospfv3_ext_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ibgp_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ebgp_dist: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rip_dist: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_ecmp: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ecmp_symmetric_return: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ecmp_strict_source_path: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ecmp_max_path: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ecmp_load_balance_method: String,
}

impl Entry for VirtualRouter {
    const KIND: Kind = Kind::VirtualRouter;
    const FAMILY: Family = Family::Network;

    fn name(&self) -> &str {
        &self.name
    }

    // Interfaces attached through virtual router entries survive an edit
    // that does not list any.
    fn copy_from(&mut self, other: &Self) {
        let interfaces = if other.interfaces.is_empty() {
            std::mem::take(&mut self.interfaces)
        } else {
            other.interfaces.clone()
        };
        *self = Self {
            name: std::mem::take(&mut self.name),
            interfaces,
            ..other.clone()
        };
    }
}

// ============================================================================
// BGP aggregation
// ============================================================================

/// A BGP aggregate address inside a virtual router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpAggregate {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub summary: bool,
}

impl Entry for BgpAggregate {
    const KIND: Kind = Kind::BgpAggregate;
    const FAMILY: Family = Family::Network;
    const PARENTS: &'static [Kind] = &[Kind::VirtualRouter];

    fn name(&self) -> &str {
        &self.name
    }

    fn copy_from(&mut self, other: &Self) {
        self.prefix.clone_from(&other.prefix);
        self.enable = other.enable;
        self.summary = other.summary;
    }
}

/// Advertise filter of a BGP aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BgpAggAdvertiseFilter {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub as_path_regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub community_regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extended_community_regex: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub med: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub route_table: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_hops: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_peers: Vec<String>,
}

impl Entry for BgpAggAdvertiseFilter {
    const KIND: Kind = Kind::BgpAggAdvertiseFilter;
    const FAMILY: Family = Family::Network;
    const PARENTS: &'static [Kind] = &[Kind::VirtualRouter, Kind::BgpAggregate];

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
// IKE crypto
// ============================================================================

/// SA lifetime. Exactly one unit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IkeCryptoProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dh_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encryptions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<Lifetime>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub authentication_multiple: i64,
}

impl Entry for IkeCryptoProfile {
    const KIND: Kind = Kind::IkeCryptoProfile;
    const FAMILY: Family = Family::Network;

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
// DHCP relay
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6RelayServer {
    pub server: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interface: String,
}

/// DHCP relay on one interface; the entry is named after the interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpRelay {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ipv4_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ipv6_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6_servers: Vec<Ipv6RelayServer>,
}

impl Entry for DhcpRelay {
    const KIND: Kind = Kind::DhcpRelay;
    const FAMILY: Family = Family::Network;

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

    #[test]
    fn test_virtual_router_copy_keeps_attached_interfaces() {
        let mut live = VirtualRouter {
            name: "vr1".into(),
            interfaces: vec!["ethernet1/1".into()],
            ..Default::default()
        };
        live.copy_from(&VirtualRouter {
            name: "vr1".into(),
            static_dist: 15,
            ..Default::default()
        });
        assert_eq!(live.interfaces, vec!["ethernet1/1"]);
        assert_eq!(live.static_dist, 15);

        live.copy_from(&VirtualRouter {
            name: "vr1".into(),
            interfaces: vec!["ethernet1/2".into()],
            ..Default::default()
        });
        assert_eq!(live.interfaces, vec!["ethernet1/2"]);
        assert_eq!(live.static_dist, 0);
    }

    #[test]
    fn test_lifetime_shape() {
        let value = serde_json::to_value(Lifetime::Hours(8)).unwrap();
        assert_eq!(value, serde_json::json!({"hours": 8}));
    }
}
