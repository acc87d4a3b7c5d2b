//! `panos_bgp_aggregate_advertise_filter`: advertise filters of a BGP
//! aggregate address, nested two levels deep inside a virtual router.

use crate::provider::lifecycle::{ObjectResource, pad_front};
use crate::provider::scope;
use anyhow::Result;
use declarative::{Attribute, Attrs, ResourceData, Schema, id, identifier};
use panoskit::{BgpAggAdvertiseFilter as Filter, Device};

identifier! {
    pub struct AdvertiseFilterId { template, template_stack, virtual_router, bgp_aggregate, name }
}

const ROUTE_TABLES: &[&str] = &["unicast", "multicast", "both"];

pub struct AggregateAdvertiseFilter;

impl ObjectResource for AggregateAdvertiseFilter {
    type Entry = Filter;
    type Id = AdvertiseFilterId;

    const TYPE_NAME: &'static str = "panos_bgp_aggregate_advertise_filter";
    const LISTING: &'static str = "panos_bgp_aggregate_advertise_filters";
    const PARENT_FIELDS: &'static [&'static str] = &["virtual_router", "bgp_aggregate"];

    fn schema() -> Schema {
        Schema::new()
            .attr("template", scope::template())
            .attr("template_stack", scope::template_stack())
            .attr("virtual_router", scope::parent("Virtual router"))
            .attr("bgp_aggregate", scope::parent("BGP aggregate address"))
            .attr("name", scope::name())
            .attr("enable", Attribute::bool().optional().default(true))
            .attr("prefixes", Attribute::strings().optional())
            .attr("as_path_regex", Attribute::string().optional())
            .attr("community_regex", Attribute::string().optional())
            .attr("extended_community_regex", Attribute::string().optional())
            .attr("med", Attribute::string().optional().pattern(r"^\d*$"))
            .attr(
                "route_table",
                Attribute::string().optional().one_of(ROUTE_TABLES),
            )
            .attr("next_hops", Attribute::strings().optional())
            .attr("from_peers", Attribute::strings().optional())
    }

    // Firewall-only ids had no template fields.
    fn migrate_id(old: &str) -> Option<String> {
        (id::arity(old) == 3).then(|| pad_front(old, &["", ""]))
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Filter> {
        Ok(Filter {
            name: d.get_string("name"),
            enable: d.get_bool("enable"),
            prefixes: d.get_strings("prefixes"),
            as_path_regex: d.get_string("as_path_regex"),
            community_regex: d.get_string("community_regex"),
            extended_community_regex: d.get_string("extended_community_regex"),
            med: d.get_string("med"),
            route_table: d.get_string("route_table"),
            next_hops: d.get_strings("next_hops"),
            from_peers: d.get_strings("from_peers"),
        })
    }

    fn save(d: &mut ResourceData, filter: &Filter) -> Result<()> {
        d.set("name", filter.name.as_str());
        d.set("enable", filter.enable);
        d.set_strings("prefixes", filter.prefixes.iter().map(String::as_str));
        d.set("as_path_regex", filter.as_path_regex.as_str());
        d.set("community_regex", filter.community_regex.as_str());
        d.set("extended_community_regex", filter.extended_community_regex.as_str());
        d.set("med", filter.med.as_str());
        d.set("route_table", filter.route_table.as_str());
        d.set_strings("next_hops", filter.next_hops.iter().map(String::as_str));
        d.set_strings("from_peers", filter.from_peers.iter().map(String::as_str));
        Ok(())
    }
}
