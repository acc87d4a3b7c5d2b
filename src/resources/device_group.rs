//! `panos_device_group` and `panos_device_group_entry` (Panorama only).
//!
//! A device group entry is one managed firewall, by serial number, with the
//! vsys it contributes (all of them when the list is empty).

use crate::provider::lifecycle::ObjectResource;
use crate::provider::member::MemberResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::{Attribute, Attrs, ResourceData, Schema, identifier};
use panoskit::{Device, DeviceGroup as Group, Objects, Scope};

identifier! {
    pub struct DeviceGroupId { name }
}

identifier! {
    pub struct DeviceGroupEntryId { device_group, serial }
}

pub struct DeviceGroup;

impl ObjectResource for DeviceGroup {
    type Entry = Group;
    type Id = DeviceGroupId;

    const TYPE_NAME: &'static str = "panos_device_group";
    const LISTING: &'static str = "panos_device_groups";

    fn schema() -> Schema {
        Schema::new()
            .attr("name", scope::name())
            .attr("description", Attribute::string().optional())
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Group> {
        Ok(Group {
            name: d.get_string("name"),
            description: d.get_string("description"),
            ..Default::default()
        })
    }

    fn save(d: &mut ResourceData, group: &Group) -> Result<()> {
        d.set("name", group.name.as_str());
        d.set("description", group.description.as_str());
        Ok(())
    }
}

/// One firewall in a device group.
pub struct DeviceGroupEntry;

impl MemberResource for DeviceGroupEntry {
    type Parent = Group;
    type Id = DeviceGroupEntryId;

    const TYPE_NAME: &'static str = "panos_device_group_entry";
    const PARENT_FIELD: &'static str = "device_group";
    const KEY_FIELD: &'static str = "serial";
    const FIELD: &'static str = "devices";
    const UPDATABLE: bool = true;

    fn schema() -> Schema {
        Schema::new()
            .attr("device_group", scope::parent("Device group"))
            .attr("serial", scope::parent("Firewall serial number"))
            .attr(
                "vsys_list",
                Attribute::string_set()
                    .optional()
                    .describe("Vsys to include; all when unset"),
            )
    }

    fn observe(parent: &Group, key: &str, d: &mut ResourceData) -> bool {
        let Some(vsys) = parent.devices.get(key) else {
            return false;
        };
        d.set_strings("vsys_list", vsys.iter().map(String::as_str));
        true
    }

    fn write(
        objects: &Objects<'_, Group>,
        scope: &Scope,
        parent: &str,
        key: &str,
        d: &ResourceData,
    ) -> panoskit::Result<()> {
        objects.set_map_entry(scope, parent, Self::FIELD, key, &d.get_strings("vsys_list"))
    }

    fn remove(
        objects: &Objects<'_, Group>,
        scope: &Scope,
        parent: &str,
        key: &str,
    ) -> panoskit::Result<()> {
        objects.delete_map_entry(scope, parent, Self::FIELD, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::member::Member;
    use crate::provider::testing::{create, firewall, panorama, read, update};
    use declarative::Resource;
    use serde_json::json;

    const GROUP: Managed<DeviceGroup> = Managed::new();
    const ENTRY: Member<DeviceGroupEntry> = Member::new();

    #[test]
    fn test_device_group_entry() {
        let (pano, _) = panorama();
        let group = create(&GROUP, &pano, json!({"name": "branch"}));
        assert_eq!(group.id(), "branch");

        let entry = create(
            &ENTRY,
            &pano,
            json!({"device_group": "branch", "serial": "001122", "vsys_list": ["vsys1"]}),
        );
        assert_eq!(entry.id(), "branch:001122");
        assert_eq!(entry.get_strings("vsys_list"), vec!["vsys1"]);

        let widened = update(
            &ENTRY,
            &pano,
            &entry,
            json!({"device_group": "branch", "serial": "001122", "vsys_list": ["vsys1", "vsys2"]}),
        );
        assert_eq!(widened.get_strings("vsys_list"), vec!["vsys1", "vsys2"]);

        // Editing the group leaves its members alone.
        update(&GROUP, &pano, &group, json!({"name": "branch", "description": "east"}));
        assert!(!read(&ENTRY, &pano, &widened).is_gone());

        let mut removed = widened.clone();
        ENTRY.delete(&pano, &mut removed).unwrap();
        assert!(read(&ENTRY, &pano, &widened).is_gone());
        ENTRY.delete(&pano, &mut widened.clone()).unwrap();
    }

    #[test]
    fn test_whole_firewall() {
        let (pano, _) = panorama();
        create(&GROUP, &pano, json!({"name": "dc"}));
        let entry = create(&ENTRY, &pano, json!({"device_group": "dc", "serial": "0099"}));
        assert!(!entry.is_gone());
        assert!(!entry.has("vsys_list"));
    }

    #[test]
    fn test_not_on_firewall() {
        let (fw, _) = firewall();
        let mut d = crate::provider::testing::config(&GROUP.schema(), json!({"name": "x"}));
        let err = GROUP.create(&fw, &mut d).unwrap_err();
        assert!(format!("{err:#}").contains("not supported"));
    }
}
