//! `panos_snmp_server_profile`: SNMP trap server profiles.
//!
//! A profile speaks either v2c or v3. The v3 auth and priv passwords are
//! tracked per server in `{field}_raw` / `{field}_enc` maps.

use crate::provider::exclusive;
use crate::provider::lifecycle::{ObjectResource, pad_front};
use crate::provider::scope;
use anyhow::Result;
use declarative::sensitive::{INCORRECT_PASSWORD, SecretMap};
use declarative::upgrade::fill_missing;
use declarative::{
    Attribute, Attributes, Attrs, Block, ResourceData, Schema, StateUpgrader, id, identifier,
};
use panoskit::{
    Device, SHARED, SnmpServerProfile as Profile, SnmpV2cServer, SnmpV3Server, SnmpVersion,
};

identifier! {
    pub struct SnmpProfileId { template, template_stack, vsys, name }
}

const SECRETS: [&str; 2] = ["auth_password", "priv_password"];

pub struct SnmpServerProfile;

fn v2c_schema() -> Schema {
    Schema::new()
        .attr("name", Attribute::string().required())
        .attr("manager", Attribute::string().required())
        .attr("community", Attribute::string().required())
}

fn v3_schema() -> Schema {
    Schema::new()
        .attr("name", Attribute::string().required())
        .attr("manager", Attribute::string().required())
        .attr("user", Attribute::string().required())
        .attr("engine_id", Attribute::string().optional())
        .attr("auth_password", Attribute::string().required().sensitive())
        .attr("priv_password", Attribute::string().required().sensitive())
}

// Profiles used to live only on the firewall, at vsys level.
fn add_scope(mut attrs: Attributes) -> declarative::Result<Attributes> {
    fill_missing(&mut attrs, "template", "");
    fill_missing(&mut attrs, "template_stack", "");
    fill_missing(&mut attrs, "vsys", SHARED);
    Ok(attrs)
}

impl ObjectResource for SnmpServerProfile {
    type Entry = Profile;
    type Id = SnmpProfileId;

    const TYPE_NAME: &'static str = "panos_snmp_server_profile";
    const LISTING: &'static str = "panos_snmp_server_profiles";

    fn schema() -> Schema {
        let mut schema = Schema::new()
            .version(1)
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr(
                "v2c_server",
                Attribute::block(v2c_schema())
                    .optional()
                    .conflicts_with(&["v3_server"]),
            )
            .attr(
                "v3_server",
                Attribute::block(v3_schema())
                    .optional()
                    .conflicts_with(&["v2c_server"]),
            );
        for field in SECRETS {
            schema = schema
                .attr(&format!("{field}_raw"), Attribute::string_map().computed().sensitive())
                .attr(&format!("{field}_enc"), Attribute::string_map().computed().sensitive());
        }
        schema
    }

    fn upgraders() -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, add_scope)]
    }

    fn migrate_id(old: &str) -> Option<String> {
        (id::arity(old) == 2).then(|| pad_front(old, &["", ""]))
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        let chosen = exclusive(
            "snmp version",
            &[("v2c_server", d.has("v2c_server")), ("v3_server", d.has("v3_server"))],
        )?;
        let version = if chosen == Some("v3_server") {
            SnmpVersion::V3(
                d.get_blocks("v3_server")
                    .iter()
                    .map(|b| SnmpV3Server {
                        name: b.get_string("name"),
                        manager: b.get_string("manager"),
                        user: b.get_string("user"),
                        engine_id: b.get_string("engine_id"),
                        auth_password: b.get_string("auth_password"),
                        priv_password: b.get_string("priv_password"),
                    })
                    .collect(),
            )
        } else {
            SnmpVersion::V2c(
                d.get_blocks("v2c_server")
                    .iter()
                    .map(|b| SnmpV2cServer {
                        name: b.get_string("name"),
                        manager: b.get_string("manager"),
                        community: b.get_string("community"),
                    })
                    .collect(),
            )
        };
        Ok(Profile {
            name: d.get_string("name"),
            version,
        })
    }

    fn capture(d: &mut ResourceData, live: &Profile) -> Result<()> {
        let servers: &[SnmpV3Server] = match &live.version {
            SnmpVersion::V3(servers) => servers.as_slice(),
            SnmpVersion::V2c(_) => &[],
        };
        let configured = d.get_blocks("v3_server");
        for field in SECRETS {
            let raw: Vec<(String, String)> = configured
                .iter()
                .map(|b| (b.get_string("name"), b.get_string(field)))
                .collect();
            let echo: Vec<(String, String)> = servers
                .iter()
                .map(|s| {
                    let value = if field == "auth_password" {
                        &s.auth_password
                    } else {
                        &s.priv_password
                    };
                    (s.name.clone(), value.clone())
                })
                .collect();
            SecretMap::capture("v3_server", &raw, &echo)?.store(d, field);
        }
        Ok(())
    }

    fn save(d: &mut ResourceData, profile: &Profile) -> Result<()> {
        d.set("name", profile.name.as_str());
        match &profile.version {
            SnmpVersion::V2c(servers) => {
                let blocks = servers
                    .iter()
                    .map(|s| {
                        Block::new()
                            .with("name", s.name.as_str())
                            .with("manager", s.manager.as_str())
                            .with("community", s.community.as_str())
                    })
                    .collect();
                d.set_blocks("v2c_server", blocks);
                d.set_null("v3_server");
            }
            SnmpVersion::V3(servers) => {
                let auth = SecretMap::load(d, "auth_password");
                let privacy = SecretMap::load(d, "priv_password");
                let observe = |map: &SecretMap, server: &str, echo: &str| {
                    let observed = map.observe(server, echo, INCORRECT_PASSWORD);
                    if observed.drift {
                        log::info!("{}: v3 password of {server} changed on the device", profile.name);
                    }
                    observed.value
                };
                let blocks = servers
                    .iter()
                    .map(|s| {
                        Block::new()
                            .with("name", s.name.as_str())
                            .with("manager", s.manager.as_str())
                            .with("user", s.user.as_str())
                            .with("engine_id", s.engine_id.as_str())
                            .with("auth_password", observe(&auth, &s.name, &s.auth_password))
                            .with("priv_password", observe(&privacy, &s.name, &s.priv_password))
                    })
                    .collect();
                d.set_blocks("v3_server", blocks);
                d.set_null("v2c_server");
            }
        }
        Ok(())
    }
}
