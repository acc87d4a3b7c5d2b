//! `panos_ldap_profile`: LDAP server profiles.
//!
//! The bind password comes back encrypted; `password_raw`/`password_enc`
//! hold the pair recorded at the last write.

use crate::provider::fields::{flag, set_nonzero};
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::sensitive::{INCORRECT_PASSWORD, SecretPair};
use declarative::{Attribute, Attrs, Block, ResourceData, Schema, identifier};
use panoskit::{Device, LdapProfile as Profile, LdapServer, SHARED};

identifier! {
    pub struct LdapProfileId { template, template_stack, vsys, name }
}

pub struct LdapProfile;

fn server_schema() -> Schema {
    Schema::new()
        .attr("name", Attribute::string().required())
        .attr("server", Attribute::string().required())
        .attr("port", Attribute::int().optional().default(389))
}

impl ObjectResource for LdapProfile {
    type Entry = Profile;
    type Id = LdapProfileId;

    const TYPE_NAME: &'static str = "panos_ldap_profile";
    const LISTING: &'static str = "panos_ldap_profiles";

    fn schema() -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr("admin_use_only", flag())
            .attr(
                "ldap_type",
                Attribute::string()
                    .optional()
                    .default("other")
                    .one_of(&["active-directory", "e-directory", "sun", "other"]),
            )
            .attr("ssl", flag())
            .attr("verify_server_certificate", flag())
            .attr("disable", flag())
            .attr("base_dn", Attribute::string().optional())
            .attr("bind_dn", Attribute::string().optional())
            .attr("password", Attribute::string().optional().sensitive())
            .attr("password_raw", Attribute::string().computed().sensitive())
            .attr("password_enc", Attribute::string().computed().sensitive())
            .attr("bind_timeout", Attribute::int().optional())
            .attr("search_timeout", Attribute::int().optional())
            .attr("retry_interval", Attribute::int().optional())
            .attr("server", Attribute::block(server_schema()).required())
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        let servers = d
            .get_blocks("server")
            .iter()
            .map(|b| LdapServer {
                name: b.get_string("name"),
                server: b.get_string("server"),
                port: b.get_int("port"),
            })
            .collect();
        Ok(Profile {
            name: d.get_string("name"),
            admin_use_only: d.get_bool("admin_use_only"),
            ldap_type: d.get_string("ldap_type"),
            ssl: d.get_bool("ssl"),
            verify_server_certificate: d.get_bool("verify_server_certificate"),
            disabled: d.get_bool("disable"),
            base_dn: d.get_string("base_dn"),
            bind_dn: d.get_string("bind_dn"),
            bind_password: d.get_string("password"),
            bind_timeout: d.get_int("bind_timeout"),
            search_timeout: d.get_int("search_timeout"),
            retry_interval: d.get_int("retry_interval"),
            servers,
        })
    }

    fn capture(d: &mut ResourceData, live: &Profile) -> Result<()> {
        let raw = d.get_string("password");
        SecretPair::new(raw, live.bind_password.as_str()).store(d, "password");
        Ok(())
    }

    fn save(d: &mut ResourceData, profile: &Profile) -> Result<()> {
        d.set("name", profile.name.as_str());
        d.set("admin_use_only", profile.admin_use_only);
        d.set("ldap_type", profile.ldap_type.as_str());
        d.set("ssl", profile.ssl);
        d.set("verify_server_certificate", profile.verify_server_certificate);
        d.set("disable", profile.disabled);
        d.set("base_dn", profile.base_dn.as_str());
        d.set("bind_dn", profile.bind_dn.as_str());

        let observed = SecretPair::load(d, "password").observe(&profile.bind_password, INCORRECT_PASSWORD);
        if observed.drift {
            log::info!("{}: bind password changed on the device", profile.name);
        }
        d.set("password", observed.value);

        set_nonzero(d, "bind_timeout", profile.bind_timeout);
        set_nonzero(d, "search_timeout", profile.search_timeout);
        set_nonzero(d, "retry_interval", profile.retry_interval);
        d.set_blocks(
            "server",
            profile
                .servers
                .iter()
                .map(|s| {
                    Block::new()
                        .with("name", s.name.as_str())
                        .with("server", s.server.as_str())
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
    use crate::provider::testing::{create, panorama, read};
    use panoskit::{Objects, Scope};
    use serde_json::json;

    const LDAP: Managed<LdapProfile> = Managed::new();

    #[test]
    fn test_bind_password_in_template() {
        let (pano, backend) = panorama();
        backend.add_template("branch").unwrap();
        let d = create(
            &LDAP,
            &pano,
            json!({
                "template": "branch",
                "name": "corp",
                "bind_dn": "cn=svc,dc=corp",
                "password": "s3cret",
                "server": [{"name": "dc1", "server": "10.0.0.10"}],
            }),
        );
        assert_eq!(d.id(), "branch::shared:corp");
        assert_eq!(d.get_string("password"), "s3cret");
        assert!(d.get_string("password_enc").starts_with(panoskit::ENCRYPTED_PREFIX));
        assert_eq!(d.get_blocks("server")[0].get_int("port"), 389);

        let scope = Scope::template("branch", "", "shared");
        let profiles = Objects::<Profile>::new(&pano);
        let mut live = profiles.get(&scope, "corp").unwrap();
        live.bind_password = "rotated".into();
        profiles.edit(&scope, &live).unwrap();

        assert_eq!(read(&LDAP, &pano, &d).get_string("password"), INCORRECT_PASSWORD);
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let (pano, _) = panorama();
        let mut d = crate::provider::testing::config(
            &LdapProfile::schema(),
            json!({"template": "nope", "name": "corp", "server": [{"name": "a", "server": "b"}]}),
        );
        let err = declarative::Resource::create(&LDAP, &pano, &mut d).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }
}
