//! `panos_dhcp_relay`: DHCP relay on an interface.
//!
//! IPv6 relay servers may be reached through a different interface, so
//! each one is a `{server, interface}` block rather than a plain address.

use crate::provider::fields::flag;
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::{Attribute, Attrs, Block, ResourceData, Schema, identifier};
use panoskit::{DhcpRelay as Relay, Device, Ipv6RelayServer};

identifier! {
    pub struct DhcpRelayId { template, template_stack, name }
}

pub struct DhcpRelay;

impl ObjectResource for DhcpRelay {
    type Entry = Relay;
    type Id = DhcpRelayId;

    const TYPE_NAME: &'static str = "panos_dhcp_relay";
    const LISTING: &'static str = "panos_dhcp_relays";

    fn schema() -> Schema {
        let ipv6_server = Schema::new()
            .attr("server", Attribute::string().required())
            .attr("interface", Attribute::string().optional());
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr(
                "name",
                scope::name().describe("Interface the relay listens on"),
            )
            .attr("ipv4_enabled", flag())
            .attr("ipv4_servers", Attribute::strings().optional())
            .attr("ipv6_enabled", flag())
            .attr("ipv6_server", Attribute::block(ipv6_server).optional())
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Relay> {
        Ok(Relay {
            name: d.get_string("name"),
            ipv4_enabled: d.get_bool("ipv4_enabled"),
            ipv4_servers: d.get_strings("ipv4_servers"),
            ipv6_enabled: d.get_bool("ipv6_enabled"),
            ipv6_servers: d
                .get_blocks("ipv6_server")
                .iter()
                .map(|b| Ipv6RelayServer {
                    server: b.get_string("server"),
                    interface: b.get_string("interface"),
                })
                .collect(),
        })
    }

    fn save(d: &mut ResourceData, relay: &Relay) -> Result<()> {
        d.set("name", relay.name.as_str());
        d.set("ipv4_enabled", relay.ipv4_enabled);
        d.set_strings("ipv4_servers", relay.ipv4_servers.iter().map(String::as_str));
        d.set("ipv6_enabled", relay.ipv6_enabled);
        d.set_blocks(
            "ipv6_server",
            relay
                .ipv6_servers
                .iter()
                .map(|s| {
                    Block::new()
                        .with("server", s.server.as_str())
                        .with("interface", s.interface.as_str())
                })
                .collect(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::testing::{create, firewall, read};
    use panoskit::{Objects, Scope};
    use serde_json::json;

    const RELAY: Managed<DhcpRelay> = Managed::new();

    #[test]
    fn test_ipv6_servers_round_trip() {
        let (fw, _) = firewall();
        let d = create(
            &RELAY,
            &fw,
            json!({
                "name": "ethernet1/3",
                "ipv4_enabled": true,
                "ipv4_servers": ["10.0.0.53"],
                "ipv6_enabled": true,
                "ipv6_server": [
                    {"server": "2001:db8::53", "interface": "ethernet1/4"},
                    {"server": "2001:db8::54"},
                ],
            }),
        );
        assert_eq!(d.id(), "::ethernet1/3");

        let live = Objects::<Relay>::new(&fw)
            .get(&Scope::default(), "ethernet1/3")
            .unwrap();
        assert_eq!(live.ipv6_servers[0].interface, "ethernet1/4");
        assert!(live.ipv6_servers[1].interface.is_empty());

        let servers = read(&RELAY, &fw, &d).get_blocks("ipv6_server");
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].get_string("server"), "2001:db8::53");
        assert!(!servers[1].has("interface"));
    }
}
