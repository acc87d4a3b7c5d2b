//! `panos_application_object`: custom applications.

use crate::provider::exclusive;
use crate::provider::fields::{flag, set_nonzero};
use crate::provider::lifecycle::{ObjectResource, pad_front};
use crate::provider::scope;
use anyhow::Result;
use declarative::upgrade::fill_missing;
use declarative::{
    Attribute, Attributes, Attrs, Block, ResourceData, Schema, StateUpgrader, id, identifier,
};
use panoskit::{AppDefaults, Application, DEFAULT_VSYS, Device, SHARED};

identifier! {
    pub struct AppId { device_group, vsys, name }
}

const FLAGS: &[&str] = &[
    "able_to_file_transfer",
    "excessive_bandwidth",
    "tunnels_other_applications",
    "has_known_vulnerability",
    "used_by_malware",
    "evasive_behavior",
    "pervasive_use",
    "prone_to_misuse",
    "continue_scanning_for_other_applications",
    "file_type_identification",
    "virus_identification",
    "data_identification",
    "no_app_id_caching",
    "alg_disable_capability",
];

const TIMEOUTS: &[&str] = &[
    "timeout",
    "tcp_timeout",
    "udp_timeout",
    "tcp_half_closed_timeout",
    "tcp_time_wait_timeout",
];

pub struct ApplicationObject;

fn icmp_schema() -> Schema {
    Schema::new()
        .attr("type", Attribute::int().required())
        .attr("code", Attribute::int().optional())
}

fn defaults_schema() -> Schema {
    Schema::new()
        .attr(
            "port",
            Attribute::strings()
                .optional()
                .conflicts_with(&["ip_protocol", "icmp", "icmp6"])
                .describe("Port specs such as tcp/8080"),
        )
        .attr(
            "ip_protocol",
            Attribute::int()
                .optional()
                .conflicts_with(&["port", "icmp", "icmp6"]),
        )
        .attr(
            "icmp",
            Attribute::single_block(icmp_schema())
                .optional()
                .conflicts_with(&["port", "ip_protocol", "icmp6"]),
        )
        .attr(
            "icmp6",
            Attribute::single_block(icmp_schema())
                .optional()
                .conflicts_with(&["port", "ip_protocol", "icmp"]),
        )
}

fn load_defaults(d: &ResourceData) -> Result<Option<AppDefaults>> {
    let Some(block) = d.get_block("defaults") else {
        return Ok(None);
    };
    let icmp = |key: &str| {
        block.get_block(key).map(|b| (b.get_int("type"), b.get_int("code")))
    };
    let chosen = exclusive(
        "defaults",
        &[
            ("port", block.has("port")),
            ("ip_protocol", block.has("ip_protocol")),
            ("icmp", block.has("icmp")),
            ("icmp6", block.has("icmp6")),
        ],
    )?;
    Ok(match chosen {
        Some("port") => Some(AppDefaults::Port(block.get_strings("port"))),
        Some("ip_protocol") => Some(AppDefaults::IpProtocol(block.get_int("ip_protocol"))),
        Some("icmp") => icmp("icmp").map(|(r#type, code)| AppDefaults::Icmp { r#type, code }),
        Some(_) => icmp("icmp6").map(|(r#type, code)| AppDefaults::Icmp6 { r#type, code }),
        None => None,
    })
}

fn save_defaults(defaults: Option<&AppDefaults>) -> Option<Block> {
    let icmp = |r#type: i64, code: i64| {
        vec![Block::new().with("type", r#type).with("code", code)]
    };
    defaults.map(|defaults| match defaults {
        AppDefaults::Port(ports) => Block::new().with("port", ports.clone()),
        AppDefaults::IpProtocol(protocol) => Block::new().with("ip_protocol", *protocol),
        AppDefaults::Icmp { r#type, code } => {
            let mut b = Block::new();
            b.set_blocks("icmp", icmp(*r#type, *code));
            b
        }
        AppDefaults::Icmp6 { r#type, code } => {
            let mut b = Block::new();
            b.set_blocks("icmp6", icmp(*r#type, *code));
            b
        }
    })
}

fn add_device_group(mut attrs: Attributes) -> declarative::Result<Attributes> {
    fill_missing(&mut attrs, "device_group", SHARED);
    Ok(attrs)
}

impl ObjectResource for ApplicationObject {
    type Entry = Application;
    type Id = AppId;

    const TYPE_NAME: &'static str = "panos_application_object";
    const LISTING: &'static str = "panos_application_objects";

    fn schema() -> Schema {
        let mut schema = Schema::new()
            .version(1)
            .attr("device_group", scope::device_group())
            .attr("vsys", scope::vsys(DEFAULT_VSYS))
            .attr("name", scope::name())
            .attr(
                "defaults",
                Attribute::single_block(defaults_schema())
                    .optional()
                    .describe("How the application is identified by default"),
            )
            .attr("category", Attribute::string().required())
            .attr("subcategory", Attribute::string().required())
            .attr("technology", Attribute::string().required())
            .attr("description", Attribute::string().optional())
            .attr("risk", Attribute::int().optional().default(1))
            .attr("parent_app", Attribute::string().optional());
        for timeout in TIMEOUTS {
            schema = schema.attr(timeout, Attribute::int().optional());
        }
        for name in FLAGS {
            schema = schema.attr(name, flag());
        }
        schema
    }

    fn upgraders() -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, add_device_group)]
    }

    // Firewall-era ids had no device group.
    fn migrate_id(old: &str) -> Option<String> {
        (id::arity(old) == 2).then(|| pad_front(old, &[SHARED]))
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Application> {
        let bit = |key: &str| d.get_bool(key);
        Ok(Application {
            name: d.get_string("name"),
            defaults: load_defaults(d)?,
            category: d.get_string("category"),
            subcategory: d.get_string("subcategory"),
            technology: d.get_string("technology"),
            description: d.get_string("description"),
            risk: d.get_int("risk"),
            parent_app: d.get_string("parent_app"),
            timeout: d.get_int("timeout"),
            tcp_timeout: d.get_int("tcp_timeout"),
            udp_timeout: d.get_int("udp_timeout"),
            tcp_half_closed_timeout: d.get_int("tcp_half_closed_timeout"),
            tcp_time_wait_timeout: d.get_int("tcp_time_wait_timeout"),
            able_to_file_transfer: bit("able_to_file_transfer"),
            excessive_bandwidth: bit("excessive_bandwidth"),
            tunnels_other_applications: bit("tunnels_other_applications"),
            has_known_vulnerability: bit("has_known_vulnerability"),
            used_by_malware: bit("used_by_malware"),
            evasive_behavior: bit("evasive_behavior"),
            pervasive_use: bit("pervasive_use"),
            prone_to_misuse: bit("prone_to_misuse"),
            continue_scanning_for_other_applications: bit(
                "continue_scanning_for_other_applications",
            ),
            file_type_identification: bit("file_type_identification"),
            virus_identification: bit("virus_identification"),
            data_identification: bit("data_identification"),
            no_app_id_caching: bit("no_app_id_caching"),
            alg_disable_capability: bit("alg_disable_capability"),
        })
    }

    fn save(d: &mut ResourceData, app: &Application) -> Result<()> {
        d.set("name", app.name.as_str());
        d.set_block("defaults", save_defaults(app.defaults.as_ref()));
        d.set("category", app.category.as_str());
        d.set("subcategory", app.subcategory.as_str());
        d.set("technology", app.technology.as_str());
        d.set("description", app.description.as_str());
        d.set("risk", app.risk);
        d.set("parent_app", app.parent_app.as_str());
        set_nonzero(d, "timeout", app.timeout);
        set_nonzero(d, "tcp_timeout", app.tcp_timeout);
        set_nonzero(d, "udp_timeout", app.udp_timeout);
        set_nonzero(d, "tcp_half_closed_timeout", app.tcp_half_closed_timeout);
        set_nonzero(d, "tcp_time_wait_timeout", app.tcp_time_wait_timeout);

        let flags = [
            app.able_to_file_transfer,
            app.excessive_bandwidth,
            app.tunnels_other_applications,
            app.has_known_vulnerability,
            app.used_by_malware,
            app.evasive_behavior,
            app.pervasive_use,
            app.prone_to_misuse,
            app.continue_scanning_for_other_applications,
            app.file_type_identification,
            app.virus_identification,
            app.data_identification,
            app.no_app_id_caching,
            app.alg_disable_capability,
        ];
        for (name, value) in FLAGS.iter().zip(flags) {
            d.set(name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::testing::{config, create, firewall, panorama, read, update};
    use declarative::Resource;
    use declarative::upgrade::upgrade_state;
    use panoskit::{DeviceGroup, Objects, Scope};
    use serde_json::json;

    const APP: Managed<ApplicationObject> = Managed::new();

    fn app_config() -> serde_json::Value {
        json!({
            "name": "crm",
            "category": "business-systems",
            "subcategory": "management",
            "technology": "client-server",
            "defaults": [{"port": ["tcp/8443"]}],
        })
    }

    #[test]
    fn test_schema_is_valid() {
        ApplicationObject::schema().validate_definition().unwrap();
    }

    #[test]
    fn test_lifecycle_on_firewall() {
        let (fw, _) = firewall();
        let d = create(&APP, &fw, app_config());
        assert_eq!(d.id(), ":vsys1:crm");
        assert_eq!(d.get_int("risk"), 1);
        assert_eq!(d.get_block("defaults").unwrap().get_strings("port"), vec!["tcp/8443"]);

        let mut changed = app_config();
        changed["description"] = json!("customer records");
        changed["defaults"] = json!([{"icmp": [{"type": 8}]}]);
        let d = update(&APP, &fw, &d, changed);
        assert_eq!(d.get_string("description"), "customer records");
        let icmp = d.get_block("defaults").unwrap().get_block("icmp").unwrap();
        assert_eq!(icmp.get_int("type"), 8);

        let live = Objects::<Application>::new(&fw)
            .get(&Scope::vsys("vsys1"), "crm")
            .unwrap();
        assert_eq!(live.defaults, Some(AppDefaults::Icmp { r#type: 8, code: 0 }));

        let mut gone = d.clone();
        APP.delete(&fw, &mut gone).unwrap();
        assert!(gone.is_gone());

        // Deleting again and reading a deleted object both succeed.
        let mut again = d.clone();
        APP.delete(&fw, &mut again).unwrap();
        assert!(again.is_gone());
        assert!(read(&APP, &fw, &d).is_gone());
    }

    #[test]
    fn test_exclusive_defaults_rejected_at_load() {
        let (fw, _) = firewall();
        let mut d = ResourceData::new(
            app_config()
                .as_object()
                .cloned()
                .unwrap(),
        );
        d.set_blocks(
            "defaults",
            vec![Block::new().with("port", vec!["tcp/1"]).with("ip_protocol", 47)],
        );
        let err = APP.create(&fw, &mut d).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_legacy_id_is_migrated_on_read() {
        let (fw, _) = firewall();
        create(&APP, &fw, app_config());

        let d = read(&APP, &fw, &ResourceData::from_id("vsys1:crm"));
        assert_eq!(d.id(), "shared:vsys1:crm");
        assert_eq!(d.get_string("device_group"), "shared");
        assert_eq!(d.get_string("category"), "business-systems");
    }

    #[test]
    fn test_device_group_scope_on_panorama() {
        let (pano, _) = panorama();
        let mut cfg = app_config();
        cfg["device_group"] = json!("branch");

        let mut d = config(&APP.schema(), cfg.clone());
        assert!(APP.create(&pano, &mut d).is_err());

        Objects::<DeviceGroup>::new(&pano)
            .set(&Scope::default(), &DeviceGroup { name: "branch".into(), ..Default::default() })
            .unwrap();
        let d = create(&APP, &pano, cfg);
        assert_eq!(d.id(), "branch:vsys1:crm");
        assert!(
            Objects::<Application>::new(&pano)
                .get(&Scope::device_group("branch"), "crm")
                .is_ok()
        );
    }

    #[test]
    fn test_unset_device_group_is_shared_on_panorama() {
        let (pano, _) = panorama();
        let d = create(&APP, &pano, app_config());
        assert_eq!(d.id(), ":vsys1:crm");
        assert!(
            Objects::<Application>::new(&pano)
                .get(&Scope::device_group(SHARED), "crm")
                .is_ok()
        );
    }

    #[test]
    fn test_upgrade_fills_device_group_once() {
        let v0 = json!({"vsys": "vsys2", "name": "crm"}).as_object().cloned().unwrap();
        let upgraders = ApplicationObject::upgraders();
        let once = upgrade_state(0, 1, &upgraders, v0).unwrap();
        assert_eq!(once["device_group"], json!("shared"));
        let twice = upgrade_state(0, 1, &upgraders, once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
