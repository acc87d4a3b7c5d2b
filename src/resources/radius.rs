//! `panos_radius_profile`: RADIUS server profiles with per-server secrets.

use crate::provider::fields::{flag, set_nonzero};
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::{Result, anyhow};
use declarative::sensitive::{MISMATCH, SecretMap};
use declarative::{Attribute, Attrs, Block, ResourceData, Schema, identifier};
use panoskit::{AuthProtocol, Device, RadiusProfile as Profile, RadiusServer, SHARED};

identifier! {
    pub struct RadiusProfileId { template, template_stack, vsys, name }
}

pub struct RadiusProfile;

fn server_schema() -> Schema {
    Schema::new()
        .attr("name", Attribute::string().required())
        .attr("server", Attribute::string().required().describe("IP address or FQDN"))
        .attr("secret", Attribute::string().required().sensitive())
        .attr("port", Attribute::int().optional().default(1812))
}

/// Parse the `protocol` attribute; empty means the device default.
pub fn load_protocol(d: &ResourceData) -> Result<Option<AuthProtocol>> {
    match d.get_string("protocol").as_str() {
        "" => Ok(None),
        value => AuthProtocol::parse(value)
            .map(Some)
            .ok_or_else(|| anyhow!("unknown authentication protocol {value:?}")),
    }
}

/// `(server name, secret)` pairs of the configured `server` blocks.
pub fn configured_secrets(d: &ResourceData) -> Vec<(String, String)> {
    d.get_blocks("server")
        .iter()
        .map(|b| (b.get_string("name"), b.get_string("secret")))
        .collect()
}

/// What a read reports for one server's secret.
pub fn observe_secret(profile: &str, secrets: &SecretMap, server: &str, echo: &str) -> String {
    if echo.is_empty() {
        return String::new();
    }
    let observed = secrets.observe(server, echo, MISMATCH);
    if observed.drift {
        log::info!("{profile}: secret of server {server} changed on the device");
    }
    observed.value
}

impl ObjectResource for RadiusProfile {
    type Entry = Profile;
    type Id = RadiusProfileId;

    const TYPE_NAME: &'static str = "panos_radius_profile";
    const LISTING: &'static str = "panos_radius_profiles";

    fn schema() -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr("admin_use_only", flag())
            .attr("timeout", Attribute::int().optional())
            .attr("retries", Attribute::int().optional())
            .attr(
                "protocol",
                Attribute::string().optional().one_of(AuthProtocol::ALL),
            )
            .attr("server", Attribute::block(server_schema()).required())
            .attr("secrets_raw", Attribute::string_map().computed().sensitive())
            .attr("secrets_enc", Attribute::string_map().computed().sensitive())
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        let servers = d
            .get_blocks("server")
            .iter()
            .map(|b| RadiusServer {
                name: b.get_string("name"),
                ip_address: b.get_string("server"),
                secret: b.get_string("secret"),
                port: b.get_int("port"),
            })
            .collect();
        Ok(Profile {
            name: d.get_string("name"),
            admin_use_only: d.get_bool("admin_use_only"),
            timeout: d.get_int("timeout"),
            retries: d.get_int("retries"),
            protocol: load_protocol(d)?,
            servers,
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
        set_nonzero(d, "retries", profile.retries);
        d.set("protocol", profile.protocol.map(AuthProtocol::as_str).unwrap_or_default());
        d.set_blocks(
            "server",
            profile
                .servers
                .iter()
                .map(|s| {
                    Block::new()
                        .with("name", s.name.as_str())
                        .with("server", s.ip_address.as_str())
                        .with("secret", observe_secret(&profile.name, &secrets, &s.name, &s.secret))
                        .with("port", s.port)
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
    use crate::provider::testing::{create, firewall, read, update};
    use panoskit::{MemoryBackend, Objects, Scope};
    use serde_json::json;

    const RADIUS: Managed<RadiusProfile> = Managed::new();

    fn two_servers() -> serde_json::Value {
        json!({
            "name": "corp",
            "protocol": "pap",
            "server": [
                {"name": "r1", "server": "10.0.0.1", "secret": "alpha"},
                {"name": "r2", "server": "10.0.0.2", "secret": "bravo"},
            ],
        })
    }

    fn secret_of(d: &ResourceData, server: &str) -> String {
        d.get_blocks("server")
            .into_iter()
            .find(|b| b.get_string("name") == server)
            .map(|b| b.get_string("secret"))
            .unwrap_or_default()
    }

    #[test]
    fn test_secret_rotation_is_detected_and_healed() {
        let (fw, _) = firewall();
        let d = create(&RADIUS, &fw, two_servers());
        assert_eq!(secret_of(&d, "r1"), "alpha");
        assert_eq!(
            d.get_string_map("secrets_enc")["r2"],
            MemoryBackend::encrypt("bravo")
        );
        assert_eq!(d.get_string("protocol"), "pap");

        // Rotate r2's secret behind our back.
        let profiles = Objects::<Profile>::new(&fw);
        let mut live = profiles.get(&Scope::default(), "corp").unwrap();
        live.servers[1].secret = "charlie".into();
        profiles.edit(&Scope::default(), &live).unwrap();

        let drifted = read(&RADIUS, &fw, &d);
        assert_eq!(secret_of(&drifted, "r1"), "alpha");
        assert_eq!(secret_of(&drifted, "r2"), MISMATCH);

        // Re-applying the configuration restores the configured secret.
        let healed = update(&RADIUS, &fw, &drifted, two_servers());
        assert_eq!(secret_of(&healed, "r2"), "bravo");
        assert_eq!(secret_of(&read(&RADIUS, &fw, &healed), "r2"), "bravo");
    }

    #[test]
    fn test_server_added_out_of_band_reports_sentinel() {
        let (fw, _) = firewall();
        let d = create(&RADIUS, &fw, two_servers());

        let profiles = Objects::<Profile>::new(&fw);
        let mut live = profiles.get(&Scope::default(), "corp").unwrap();
        live.servers.push(RadiusServer {
            name: "r3".into(),
            ip_address: "10.0.0.3".into(),
            secret: "delta".into(),
            port: 1812,
        });
        profiles.edit(&Scope::default(), &live).unwrap();

        let observed = read(&RADIUS, &fw, &d);
        assert_eq!(secret_of(&observed, "r3"), MISMATCH);
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        let mut d = ResourceData::new(two_servers().as_object().cloned().unwrap());
        d.set("protocol", "mschap");
        let (fw, _) = firewall();
        assert!(RadiusProfile::load(&fw, &d).is_err());
    }
}
