//! `panos_authentication_profile`

use crate::provider::exclusive;
use crate::provider::fields::{flag, set_nonzero};
use crate::provider::lifecycle::ObjectResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::sensitive::{MISMATCH, SecretPair};
use declarative::upgrade::int_to_string;
use declarative::{Attribute, Attributes, Attrs, Block, ResourceData, Schema, StateUpgrader, identifier};
use panoskit::{AuthType, AuthenticationProfile as Profile, Device, SHARED, SingleSignOn};

identifier! {
    pub struct AuthProfileId { template, template_stack, vsys, name }
}

const METHODS: &[&str] = &["none", "local_database", "radius", "ldap", "kerberos", "tacacs_plus"];

pub struct AuthenticationProfile;

fn others(method: &str) -> Vec<&'static str> {
    METHODS.iter().copied().filter(|m| *m != method).collect()
}

fn method(name: &str, schema: Schema) -> Attribute {
    Attribute::single_block(schema)
        .optional()
        .conflicts_with(&others(name))
}

fn type_schema() -> Schema {
    let server_profile = || Attribute::string().required();
    Schema::new()
        .attr("none", Attribute::bool().optional().conflicts_with(&others("none")))
        .attr(
            "local_database",
            Attribute::bool()
                .optional()
                .conflicts_with(&others("local_database")),
        )
        .attr(
            "radius",
            method(
                "radius",
                Schema::new()
                    .attr("server_profile", server_profile())
                    .attr("retrieve_user_group", flag()),
            ),
        )
        .attr(
            "ldap",
            method(
                "ldap",
                Schema::new()
                    .attr("server_profile", server_profile())
                    .attr("login_attribute", Attribute::string().optional())
                    .attr("password_expiry_warning", Attribute::string().optional()),
            ),
        )
        .attr(
            "kerberos",
            method(
                "kerberos",
                Schema::new()
                    .attr("server_profile", server_profile())
                    .attr("realm", Attribute::string().optional()),
            ),
        )
        .attr(
            "tacacs_plus",
            method(
                "tacacs_plus",
                Schema::new()
                    .attr("server_profile", server_profile())
                    .attr("retrieve_user_group", flag()),
            ),
        )
}

fn load_type(d: &ResourceData) -> Result<AuthType> {
    let Some(block) = d.get_block("type") else {
        return Ok(AuthType::None);
    };
    let present: Vec<(&str, bool)> = METHODS
        .iter()
        .map(|m| {
            let set = match *m {
                "none" | "local_database" => block.get_bool(m),
                _ => block.has(m),
            };
            (*m, set)
        })
        .collect();
    let inner = |key: &str| block.get_block(key).unwrap_or_default();

    Ok(match exclusive("type", &present)? {
        Some("local_database") => AuthType::LocalDatabase,
        Some("radius") => {
            let b = inner("radius");
            AuthType::Radius {
                server_profile: b.get_string("server_profile"),
                retrieve_user_group: b.get_bool("retrieve_user_group"),
            }
        }
        Some("ldap") => {
            let b = inner("ldap");
            AuthType::Ldap {
                server_profile: b.get_string("server_profile"),
                login_attribute: b.get_string("login_attribute"),
                password_expiry_warning: b.get_string("password_expiry_warning"),
            }
        }
        Some("kerberos") => {
            let b = inner("kerberos");
            AuthType::Kerberos {
                server_profile: b.get_string("server_profile"),
                realm: b.get_string("realm"),
            }
        }
        Some("tacacs_plus") => {
            let b = inner("tacacs_plus");
            AuthType::TacacsPlus {
                server_profile: b.get_string("server_profile"),
                retrieve_user_group: b.get_bool("retrieve_user_group"),
            }
        }
        _ => AuthType::None,
    })
}

fn save_type(auth: &AuthType) -> Block {
    let block = Block::new();
    let section = |key: &str, inner: Block| {
        let mut b = Block::new();
        b.set_block(key, Some(inner));
        b
    };
    match auth {
        AuthType::None => block.with("none", true),
        AuthType::LocalDatabase => block.with("local_database", true),
        AuthType::Radius {
            server_profile,
            retrieve_user_group,
        } => section(
            "radius",
            Block::new()
                .with("server_profile", server_profile.as_str())
                .with("retrieve_user_group", *retrieve_user_group),
        ),
        AuthType::Ldap {
            server_profile,
            login_attribute,
            password_expiry_warning,
        } => section(
            "ldap",
            Block::new()
                .with("server_profile", server_profile.as_str())
                .with("login_attribute", login_attribute.as_str())
                .with("password_expiry_warning", password_expiry_warning.as_str()),
        ),
        AuthType::Kerberos {
            server_profile,
            realm,
        } => section(
            "kerberos",
            Block::new()
                .with("server_profile", server_profile.as_str())
                .with("realm", realm.as_str()),
        ),
        AuthType::TacacsPlus {
            server_profile,
            retrieve_user_group,
        } => section(
            "tacacs_plus",
            Block::new()
                .with("server_profile", server_profile.as_str())
                .with("retrieve_user_group", *retrieve_user_group),
        ),
    }
}

fn sso_schema() -> Schema {
    Schema::new()
        .attr("realm", Attribute::string().optional())
        .attr("service_principal", Attribute::string().optional())
        .attr(
            "keytab",
            Attribute::string()
                .optional()
                .sensitive()
                .describe("Kerberos keytab, base64"),
        )
}

fn lockout_attempts_to_string(mut attrs: Attributes) -> declarative::Result<Attributes> {
    int_to_string(&mut attrs, "lockout_failed_attempts");
    Ok(attrs)
}

impl ObjectResource for AuthenticationProfile {
    type Entry = Profile;
    type Id = AuthProfileId;

    const TYPE_NAME: &'static str = "panos_authentication_profile";
    const LISTING: &'static str = "panos_authentication_profiles";

    fn schema() -> Schema {
        Schema::new()
            .version(1)
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(SHARED))
            .attr("name", scope::name())
            .attr("allow_list", Attribute::strings().optional())
            .attr(
                "lockout_failed_attempts",
                Attribute::string()
                    .optional()
                    .pattern(r"^\d*$")
                    .describe("Failed attempts before lockout"),
            )
            .attr("lockout_time", Attribute::int().optional())
            .attr(
                "type",
                Attribute::single_block(type_schema())
                    .optional_computed()
                    .describe("Authentication method; none when unset"),
            )
            .attr("username_modifier", Attribute::string().optional())
            .attr("user_domain", Attribute::string().optional())
            .attr("single_sign_on", Attribute::single_block(sso_schema()).optional())
            .attr("keytab_raw", Attribute::string().computed().sensitive())
            .attr("keytab_enc", Attribute::string().computed().sensitive())
            .attr("factors", Attribute::strings().optional())
    }

    fn upgraders() -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, lockout_attempts_to_string)]
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        let single_sign_on = d.get_block("single_sign_on").map(|b| SingleSignOn {
            realm: b.get_string("realm"),
            service_principal: b.get_string("service_principal"),
            keytab: b.get_string("keytab"),
        });
        Ok(Profile {
            name: d.get_string("name"),
            allow_list: d.get_strings("allow_list"),
            lockout_failed_attempts: d.get_string("lockout_failed_attempts"),
            lockout_time: d.get_int("lockout_time"),
            auth_type: load_type(d)?,
            username_modifier: d.get_string("username_modifier"),
            user_domain: d.get_string("user_domain"),
            single_sign_on,
            factors: d.get_strings("factors"),
        })
    }

    fn capture(d: &mut ResourceData, live: &Profile) -> Result<()> {
        let raw = d
            .get_block("single_sign_on")
            .map(|b| b.get_string("keytab"))
            .unwrap_or_default();
        let echo = live
            .single_sign_on
            .as_ref()
            .map(|sso| sso.keytab.as_str())
            .unwrap_or_default();
        if raw.is_empty() {
            d.set_null("keytab_raw");
            d.set_null("keytab_enc");
        } else {
            SecretPair::new(raw, echo).store(d, "keytab");
        }
        Ok(())
    }

    fn save(d: &mut ResourceData, profile: &Profile) -> Result<()> {
        d.set("name", profile.name.as_str());
        d.set_strings("allow_list", profile.allow_list.clone());
        d.set("lockout_failed_attempts", profile.lockout_failed_attempts.as_str());
        set_nonzero(d, "lockout_time", profile.lockout_time);
        d.set_block("type", Some(save_type(&profile.auth_type)));
        d.set("username_modifier", profile.username_modifier.as_str());
        d.set("user_domain", profile.user_domain.as_str());

        let pair = SecretPair::load(d, "keytab");
        let sso = profile.single_sign_on.as_ref().map(|sso| {
            let keytab = if sso.keytab.is_empty() {
                String::new()
            } else {
                let observed = pair.observe(&sso.keytab, MISMATCH);
                if observed.drift {
                    log::info!("{}: keytab changed on the device", profile.name);
                }
                observed.value
            };
            Block::new()
                .with("realm", sso.realm.as_str())
                .with("service_principal", sso.service_principal.as_str())
                .with("keytab", keytab)
        });
        d.set_block("single_sign_on", sso);
        d.set_strings("factors", profile.factors.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::testing::{create, firewall, read, update};
    use declarative::Resource;
    use declarative::upgrade::upgrade_state;
    use panoskit::{MemoryBackend, Objects, Scope};
    use serde_json::json;

    const PROFILE: Managed<AuthenticationProfile> = Managed::new();

    fn kerberos() -> serde_json::Value {
        json!({
            "name": "corp",
            "lockout_failed_attempts": "5",
            "type": [{"kerberos": [{"server_profile": "krb", "realm": "CORP.EXAMPLE"}]}],
            "single_sign_on": [{"realm": "CORP.EXAMPLE", "keytab": "a2V5dGFi"}],
        })
    }

    #[test]
    fn test_schema_is_valid() {
        AuthenticationProfile::schema().validate_definition().unwrap();
    }

    #[test]
    fn test_keytab_round_trip_and_drift() {
        let (fw, _) = firewall();
        let d = create(&PROFILE, &fw, kerberos());
        assert_eq!(d.id(), "::shared:corp");
        assert_eq!(d.get_string("keytab_raw"), "a2V5dGFi");
        assert_eq!(d.get_string("keytab_enc"), MemoryBackend::encrypt("a2V5dGFi"));
        let sso = d.get_block("single_sign_on").unwrap();
        assert_eq!(sso.get_string("keytab"), "a2V5dGFi");

        let kerberos_type = d.get_block("type").unwrap().get_block("kerberos").unwrap();
        assert_eq!(kerberos_type.get_string("realm"), "CORP.EXAMPLE");

        // Someone replaces the keytab out of band.
        let profiles = Objects::<Profile>::new(&fw);
        let mut live = profiles.get(&Scope::default(), "corp").unwrap();
        if let Some(sso) = live.single_sign_on.as_mut() {
            sso.keytab = "b3RoZXI=".into();
        }
        profiles.edit(&Scope::default(), &live).unwrap();

        let drifted = read(&PROFILE, &fw, &d);
        let sso = drifted.get_block("single_sign_on").unwrap();
        assert_eq!(sso.get_string("keytab"), MISMATCH);

        let healed = update(&PROFILE, &fw, &drifted, kerberos());
        let sso = healed.get_block("single_sign_on").unwrap();
        assert_eq!(sso.get_string("keytab"), "a2V5dGFi");
    }

    #[test]
    fn test_methods_are_exclusive() {
        let (fw, _) = firewall();
        let mut d = ResourceData::new(kerberos().as_object().cloned().unwrap());
        d.set_block(
            "type",
            Some(Block::new().with("local_database", true).with("none", true)),
        );
        assert!(PROFILE.create(&fw, &mut d).is_err());
    }

    #[test]
    fn test_local_database_without_keytab() {
        let (fw, _) = firewall();
        let d = create(
            &PROFILE,
            &fw,
            json!({"name": "local", "type": [{"local_database": true}]}),
        );
        assert!(d.get_block("type").unwrap().get_bool("local_database"));
        assert!(!d.has("keytab_raw"));
        assert!(d.get_block("single_sign_on").is_none());
    }

    #[test]
    fn test_upgrade_recasts_lockout_attempts() {
        let v0 = json!({"name": "corp", "lockout_failed_attempts": 5})
            .as_object()
            .cloned()
            .unwrap();
        let upgraders = AuthenticationProfile::upgraders();
        let once = upgrade_state(0, 1, &upgraders, v0).unwrap();
        assert_eq!(once["lockout_failed_attempts"], json!("5"));
        assert_eq!(upgrade_state(0, 1, &upgraders, once.clone()).unwrap(), once);
    }
}
