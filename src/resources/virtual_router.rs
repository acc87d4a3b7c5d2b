//! `panos_virtual_router` and `panos_virtual_router_entry`.
//!
//! A virtual router is network configuration imported into one vsys. Its
//! interface list is shared with `panos_virtual_router_entry`, which adds a
//! single interface without owning the router, so `interfaces` is optional
//! and computed here.
//!
//! The router named `default` exists on every device and cannot be
//! removed; deleting it resets it to an empty router instead.

use crate::provider::fields::{flag, set_nonzero};
use crate::provider::import;
use crate::provider::lifecycle::{ObjectResource, Target, objects, pad_front};
use crate::provider::member::MemberResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::upgrade::fill_missing;
use declarative::{
    Attribute, Attributes, Attrs, ResourceData, Schema, StateUpgrader, id, identifier,
};
use panoskit::{DEFAULT_VSYS, Device, Kind, VirtualRouter as Router};

identifier! {
    pub struct VirtualRouterId { template, template_stack, vsys, name }
}

identifier! {
    pub struct VirtualRouterEntryId { template, template_stack, virtual_router, interface }
}

const UNREMOVABLE: &str = "default";

const DISTANCES: &[&str] = &[
    "static_dist",
    "static_ipv6_dist",
    "ospf_int_dist",
    "ospf_ext_dist",
    "ospfv3_int_dist",
    "ospfv3_ext_dist",
    "ibgp_dist",
    "ebgp_dist",
    "rip_dist",
];

const LOAD_BALANCE_METHODS: &[&str] = &[
    "ip-modulo",
    "ip-hash",
    "weighted-round-robin",
    "balanced-round-robin",
];

pub struct VirtualRouter;

fn add_vsys(mut attrs: Attributes) -> declarative::Result<Attributes> {
    fill_missing(&mut attrs, "vsys", DEFAULT_VSYS);
    Ok(attrs)
}

fn distance(router: &Router, key: &str) -> i64 {
    match key {
        "static_dist" => router.static_dist,
        "static_ipv6_dist" => router.static_ipv6_dist,
        "ospf_int_dist" => router.ospf_int_dist,
        "ospf_ext_dist" => router.ospf_ext_dist,
        "ospfv3_int_dist" => router.ospfv3_int_dist,
        "ospfv3_ext_dist" => router.ospfv3_ext_dist,
        "ibgp_dist" => router.ibgp_dist,
        "ebgp_dist" => router.ebgp_dist,
        "rip_dist" => router.rip_dist,
        _ => 0,
    }
}

impl ObjectResource for VirtualRouter {
    type Entry = Router;
    type Id = VirtualRouterId;

    const TYPE_NAME: &'static str = "panos_virtual_router";
    const LISTING: &'static str = "panos_virtual_routers";

    fn schema() -> Schema {
        let mut schema = Schema::new()
            .version(1)
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("vsys", scope::vsys(DEFAULT_VSYS))
            .attr("name", scope::name())
            .attr(
                "interfaces",
                Attribute::strings()
                    .optional_computed()
                    .describe("Interfaces; leave unset when using virtual router entries"),
            )
            .attr("enable_ecmp", flag())
            .attr("ecmp_symmetric_return", flag())
            .attr("ecmp_strict_source_path", flag())
            .attr("ecmp_max_path", Attribute::int().optional())
            .attr(
                "ecmp_load_balance_method",
                Attribute::string().optional().one_of(LOAD_BALANCE_METHODS),
            );
        for key in DISTANCES {
            schema = schema.attr(key, Attribute::int().optional());
        }
        schema
    }

    fn upgraders() -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, add_vsys)]
    }

    fn migrate_id(old: &str) -> Option<String> {
        (id::arity(old) == 2).then(|| pad_front(old, &["", ""]))
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Router> {
        Ok(Router {
            name: d.get_string("name"),
            interfaces: d.get_strings("interfaces"),
            static_dist: d.get_int("static_dist"),
            static_ipv6_dist: d.get_int("static_ipv6_dist"),
            ospf_int_dist: d.get_int("ospf_int_dist"),
            ospf_ext_dist: d.get_int("ospf_ext_dist"),
            ospfv3_int_dist: d.get_int("ospfv3_int_dist"),
            ospfv3_ext_dist: d.get_int("ospfv3_ext_dist"),
            ibgp_dist: d.get_int("ibgp_dist"),
            ebgp_dist: d.get_int("ebgp_dist"),
            rip_dist: d.get_int("rip_dist"),
            enable_ecmp: d.get_bool("enable_ecmp"),
            ecmp_symmetric_return: d.get_bool("ecmp_symmetric_return"),
            ecmp_strict_source_path: d.get_bool("ecmp_strict_source_path"),
            ecmp_max_path: d.get_int("ecmp_max_path"),
            ecmp_load_balance_method: d.get_string("ecmp_load_balance_method"),
        })
    }

    fn save(d: &mut ResourceData, router: &Router) -> Result<()> {
        d.set("name", router.name.as_str());
        d.set_strings("interfaces", router.interfaces.iter().map(String::as_str));
        for key in DISTANCES {
            set_nonzero(d, key, distance(router, key));
        }
        d.set("enable_ecmp", router.enable_ecmp);
        d.set("ecmp_symmetric_return", router.ecmp_symmetric_return);
        d.set("ecmp_strict_source_path", router.ecmp_strict_source_path);
        set_nonzero(d, "ecmp_max_path", router.ecmp_max_path);
        d.set("ecmp_load_balance_method", router.ecmp_load_balance_method.as_str());
        Ok(())
    }

    fn after_write(device: &(dyn Device + 'static), target: &Target, _d: &ResourceData) -> Result<()> {
        import::import(device, Kind::VirtualRouter, target)
    }

    fn after_read(device: &(dyn Device + 'static), target: &Target, d: &mut ResourceData) -> Result<()> {
        let vsys = import::verify(device, Kind::VirtualRouter, target)?;
        d.set("vsys", vsys);
        Ok(())
    }

    fn remove(device: &(dyn Device + 'static), target: &Target) -> panoskit::Result<()> {
        let routers = objects::<Self>(device, target);
        if target.name == UNREMOVABLE {
            routers.get(&target.scope, &target.name)?;
            log::debug!("resetting virtual router {UNREMOVABLE}");
            routers.edit(
                &target.scope,
                &Router {
                    name: target.name.clone(),
                    ..Default::default()
                },
            )?;
            return import::unimport(device, Kind::VirtualRouter, target);
        }
        import::unimport(device, Kind::VirtualRouter, target)?;
        routers.delete(&target.scope, &target.name)
    }
}

/// One interface of a virtual router.
pub struct VirtualRouterEntry;

impl MemberResource for VirtualRouterEntry {
    type Parent = Router;
    type Id = VirtualRouterEntryId;

    const TYPE_NAME: &'static str = "panos_virtual_router_entry";
    const PARENT_FIELD: &'static str = "virtual_router";
    const KEY_FIELD: &'static str = "interface";
    const FIELD: &'static str = "interfaces";

    fn schema() -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("virtual_router", scope::parent("Virtual router"))
            .attr("interface", scope::parent("Interface to add"))
    }

    fn observe(parent: &Router, key: &str, _d: &mut ResourceData) -> bool {
        parent.interfaces.iter().any(|i| i == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::member::Member;
    use crate::provider::testing::{create, firewall, panorama, read, update};
    use declarative::Resource;
    use declarative::upgrade::upgrade_state;
    use panoskit::{Backend, Location, Objects, Scope};
    use serde_json::json;

    const ROUTER: Managed<VirtualRouter> = Managed::new();
    const ENTRY: Member<VirtualRouterEntry> = Member::new();

    #[test]
    fn test_import_drift_is_reported() {
        let (fw, backend) = firewall();
        let d = create(&ROUTER, &fw, json!({"name": "vr1", "static_dist": 15}));
        assert_eq!(d.id(), "::vsys1:vr1");
        assert_eq!(d.get_string("vsys"), "vsys1");
        assert_eq!(d.get_int("static_dist"), 15);
        assert!(!d.has("ebgp_dist"));

        backend.unimport(&Location::Device, Kind::VirtualRouter, "vr1").unwrap();
        backend
            .import(&Location::Device, Kind::VirtualRouter, "vsys2", "vr1")
            .unwrap();
        assert_eq!(read(&ROUTER, &fw, &d).get_string("vsys"), "(not vsys1)");

        backend.unimport(&Location::Device, Kind::VirtualRouter, "vr1").unwrap();
        assert_eq!(read(&ROUTER, &fw, &d).get_string("vsys"), "(not vsys1)");
    }

    #[test]
    fn test_entries_survive_router_updates() {
        let (fw, _) = firewall();
        let router = create(&ROUTER, &fw, json!({"name": "vr1"}));
        let entry = create(
            &ENTRY,
            &fw,
            json!({"virtual_router": "vr1", "interface": "ethernet1/1"}),
        );
        assert_eq!(entry.id(), "::vr1:ethernet1/1");

        let updated = update(&ROUTER, &fw, &router, json!({"name": "vr1", "enable_ecmp": true}));
        assert!(updated.get_bool("enable_ecmp"));
        assert_eq!(updated.get_strings("interfaces"), vec!["ethernet1/1"]);
        assert!(!read(&ENTRY, &fw, &entry).is_gone());

        let mut removed = entry.clone();
        ENTRY.delete(&fw, &mut removed).unwrap();
        assert!(read(&ENTRY, &fw, &entry).is_gone());
        assert!(read(&ROUTER, &fw, &router).get_strings("interfaces").is_empty());
    }

    #[test]
    fn test_default_router_is_reset() {
        let (fw, _) = firewall();
        let d = create(&ROUTER, &fw, json!({"name": "default", "rip_dist": 120}));
        let mut gone = d.clone();
        ROUTER.delete(&fw, &mut gone).unwrap();
        assert!(gone.is_gone());

        let routers = Objects::<Router>::new(&fw);
        let live = routers.get(&Scope::default(), "default").unwrap();
        assert_eq!(live.rip_dist, 0);
        assert_eq!(read(&ROUTER, &fw, &d).get_string("vsys"), "(not vsys1)");
    }

    #[test]
    fn test_panorama_needs_a_template() {
        let (pano, backend) = panorama();
        let mut d = crate::provider::testing::config(&ROUTER.schema(), json!({"name": "vr1"}));
        assert!(ROUTER.create(&pano, &mut d).is_err());

        backend.add_template_stack("edge").unwrap();
        let d = create(&ROUTER, &pano, json!({"template_stack": "edge", "name": "vr1"}));
        assert_eq!(d.id(), ":edge:vsys1:vr1");
        assert_eq!(d.get_string("vsys"), "vsys1");
    }

    #[test]
    fn test_legacy_state() {
        let (fw, _) = firewall();
        create(&ROUTER, &fw, json!({"name": "vr1"}));

        let v0 = json!({"name": "vr1"}).as_object().cloned().unwrap();
        let attrs = upgrade_state(0, 1, &VirtualRouter::upgraders(), v0).unwrap();
        assert_eq!(attrs["vsys"], json!("vsys1"));

        let mut d = ResourceData::new(attrs);
        d.set_id("vsys1:vr1");
        ROUTER.read(&fw, &mut d).unwrap();
        assert_eq!(d.id(), "::vsys1:vr1");
    }
}
