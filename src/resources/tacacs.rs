//! `panos_tacacs_plus_profile`

use super::radius::{configured_secrets, load_protocol, observe_secret};
use crate::provider::fields::{flag, set_nonzero};
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::sensitive::SecretMap;
use declarative::{Attribute, Attrs, Block, ResourceData, Schema, identifier};
use panoskit::{AuthProtocol, Device, SHARED, TacacsPlusProfile as Profile, TacacsPlusServer};

identifier! {
    pub struct TacacsProfileId { template, template_stack, vsys, name }
}

pub struct TacacsPlusProfile;

impl ObjectResource for TacacsPlusProfile {
    type Entry = Profile;
    type Id = TacacsProfileId;

    const TYPE_NAME: &'static str = "panos_tacacs_plus_profile";
    const LISTING: &'static str = "panos_tacacs_plus_profiles";

    fn schema() -> Schema {
        let server = Schema::new()
            .attr("name", Attribute::string().required())
            .attr("server", Attribute::string().required())
            .attr("secret", Attribute::string().required().sensitive())
            .attr("port", Attribute::int().optional().default(49));
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr("admin_use_only", flag())
            .attr("timeout", Attribute::int().optional())
            .attr("use_single_connection", flag())
            .attr(
                "protocol",
                Attribute::string().optional().one_of(AuthProtocol::ALL),
            )
            .attr("server", Attribute::block(server).required())
            .attr("secrets_raw", Attribute::string_map().computed().sensitive())
            .attr("secrets_enc", Attribute::string_map().computed().sensitive())
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        Ok(Profile {
            name: d.get_string("name"),
            admin_use_only: d.get_bool("admin_use_only"),
            timeout: d.get_int("timeout"),
            use_single_connection: d.get_bool("use_single_connection"),
            protocol: load_protocol(d)?,
            servers: d
                .get_blocks("server")
                .iter()
                .map(|b| TacacsPlusServer {
                    name: b.get_string("name"),
                    address: b.get_string("server"),
                    secret: b.get_string("secret"),
                    port: b.get_int("port"),
                })
                .collect(),
        })
    }

    fn capture(d: &mut ResourceData, live: &Profile) -> Result<()> {
        let echoes: Vec<(String, String)> = live
            .servers
            .iter()
            .map(|s| (s.name.clone(), s.secret.clone()))
            .collect();
        SecretMap::capture("server", &configured_secrets(d), &echoes)?.store(d, "secrets");
        Ok(())
    }

    fn save(d: &mut ResourceData, profile: &Profile) -> Result<()> {
        let secrets = SecretMap::load(d, "secrets");
        d.set("name", profile.name.as_str());
        d.set("admin_use_only", profile.admin_use_only);
        set_nonzero(d, "timeout", profile.timeout);
        d.set("use_single_connection", profile.use_single_connection);
        d.set("protocol", profile.protocol.map(AuthProtocol::as_str).unwrap_or_default());
        let servers = profile
            .servers
            .iter()
            .map(|s| {
                Block::new()
                    .with("name", s.name.as_str())
                    .with("server", s.address.as_str())
                    .with("secret", observe_secret(&profile.name, &secrets, &s.name, &s.secret))
                    .with("port", s.port)
            })
            .collect();
        d.set_blocks("server", servers);
        Ok(())
    }
}
