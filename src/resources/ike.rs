//! `panos_ike_crypto_profile`

use crate::provider::exclusive;
use crate::provider::fields::set_nonzero;
use crate::provider::lifecycle::{ObjectResource, pad_front};
use crate::provider::scope;
use anyhow::Result;
use declarative::{Attribute, Attrs, ResourceData, Schema, id, identifier};
use panoskit::{Device, IkeCryptoProfile as Profile, Lifetime};

identifier! {
    pub struct IkeCryptoProfileId { template, template_stack, name }
}

const LIFETIME_UNITS: [&str; 4] = [
    "lifetime_seconds",
    "lifetime_minutes",
    "lifetime_hours",
    "lifetime_days",
];

pub struct IkeCryptoProfile;

fn load_lifetime(d: &ResourceData) -> Result<Option<Lifetime>> {
    let chosen = exclusive("lifetime", &LIFETIME_UNITS.map(|unit| (unit, d.has(unit))))?;
    Ok(chosen.map(|unit| {
        let value = d.get_int(unit);
        match unit {
            "lifetime_seconds" => Lifetime::Seconds(value),
            "lifetime_minutes" => Lifetime::Minutes(value),
            "lifetime_hours" => Lifetime::Hours(value),
            _ => Lifetime::Days(value),
        }
    }))
}

fn save_lifetime(d: &mut ResourceData, lifetime: Option<Lifetime>) {
    for unit in LIFETIME_UNITS {
        d.set_null(unit);
    }
    let Some(lifetime) = lifetime else {
        return;
    };
    let (unit, value) = match lifetime {
        Lifetime::Seconds(v) => ("lifetime_seconds", v),
        Lifetime::Minutes(v) => ("lifetime_minutes", v),
        Lifetime::Hours(v) => ("lifetime_hours", v),
        Lifetime::Days(v) => ("lifetime_days", v),
    };
    d.set(unit, value);
}

impl ObjectResource for IkeCryptoProfile {
    type Entry = Profile;
    type Id = IkeCryptoProfileId;

    const TYPE_NAME: &'static str = "panos_ike_crypto_profile";
    const LISTING: &'static str = "panos_ike_crypto_profiles";

    fn schema() -> Schema {
        let mut schema = Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("name", scope::name())
            .attr("dh_groups", Attribute::strings().required())
            .attr("authentications", Attribute::strings().required())
            .attr("encryptions", Attribute::strings().required())
            .attr("authentication_multiple", Attribute::int().optional());
        for unit in LIFETIME_UNITS {
            let others: Vec<&str> = LIFETIME_UNITS.into_iter().filter(|u| *u != unit).collect();
            schema = schema.attr(unit, Attribute::int().optional().conflicts_with(&others));
        }
        schema
    }

    // Ids used to be `name` on a firewall and `template:name` on Panorama.
    fn migrate_id(old: &str) -> Option<String> {
        match id::arity(old) {
            1 => Some(pad_front(old, &["", ""])),
            2 => {
                let parts = id::parse(old);
                Some(id::build(&[parts[0].as_str(), "", parts[1].as_str()]))
            }
            _ => None,
        }
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Profile> {
        Ok(Profile {
            name: d.get_string("name"),
            dh_groups: d.get_strings("dh_groups"),
            authentications: d.get_strings("authentications"),
            encryptions: d.get_strings("encryptions"),
            lifetime: load_lifetime(d)?,
            authentication_multiple: d.get_int("authentication_multiple"),
        })
    }

    fn save(d: &mut ResourceData, profile: &Profile) -> Result<()> {
        d.set("name", profile.name.as_str());
        d.set_strings("dh_groups", profile.dh_groups.iter().map(String::as_str));
        d.set_strings("authentications", profile.authentications.iter().map(String::as_str));
        d.set_strings("encryptions", profile.encryptions.iter().map(String::as_str));
        save_lifetime(d, profile.lifetime);
        set_nonzero(d, "authentication_multiple", profile.authentication_multiple);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::testing::{create, firewall, panorama, update};
    use declarative::Resource;
    use serde_json::json;

    const IKE: Managed<IkeCryptoProfile> = Managed::new();

    fn profile() -> serde_json::Value {
        json!({
            "name": "ike-strong",
            "dh_groups": ["group19", "group20"],
            "authentications": ["sha384"],
            "encryptions": ["aes-256-gcm"],
            "lifetime_hours": 8,
        })
    }

    #[test]
    fn test_lifetime_units() {
        let (fw, _) = firewall();
        let d = create(&IKE, &fw, profile());
        assert_eq!(d.id(), "::ike-strong");
        assert_eq!(d.get_int("lifetime_hours"), 8);

        let mut config = profile();
        config["lifetime_hours"] = json!(null);
        config["lifetime_days"] = json!(1);
        let d = update(&IKE, &fw, &d, config);
        assert_eq!(d.get_int("lifetime_days"), 1);
        assert!(!d.has("lifetime_hours"));
    }

    #[test]
    fn test_two_lifetimes_rejected() {
        let mut d = ResourceData::new(profile().as_object().cloned().unwrap());
        d.set("lifetime_seconds", 30);
        let (fw, _) = firewall();
        assert!(IkeCryptoProfile::load(&fw, &d).is_err());
    }

    #[test]
    fn test_id_migrations() {
        assert_eq!(IkeCryptoProfile::migrate_id("p1").as_deref(), Some("::p1"));
        assert_eq!(IkeCryptoProfile::migrate_id("t1:p1").as_deref(), Some("t1::p1"));
        assert_eq!(IkeCryptoProfile::migrate_id("a:b:c"), None);

        let (pano, backend) = panorama();
        backend.add_template("t1").unwrap();
        let mut config = profile();
        config["template"] = json!("t1");
        create(&IKE, &pano, config);

        let mut d = ResourceData::from_id("t1:ike-strong");
        IKE.read(&pano, &mut d).unwrap();
        assert_eq!(d.id(), "t1::ike-strong");
        assert_eq!(d.get_strings("dh_groups"), vec!["group19", "group20"]);
    }
}
