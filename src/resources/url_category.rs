//! `panos_url_category` and `panos_url_category_entry`: custom URL
//! categories and single sites within them.

use crate::provider::lifecycle::ObjectResource;
use crate::provider::member::MemberResource;
use crate::provider::scope;
use anyhow::Result;
use declarative::{Attribute, Attrs, ResourceData, Schema, identifier};
use panoskit::{DEFAULT_VSYS, Device, UrlCategory as Category};

identifier! {
    pub struct UrlCategoryId { device_group, vsys, name }
}

identifier! {
    pub struct UrlCategoryEntryId { device_group, vsys, url_category, site }
}

const CATEGORY_TYPES: &[&str] = &["URL List", "Category Match"];

pub struct UrlCategory;

impl ObjectResource for UrlCategory {
    type Entry = Category;
    type Id = UrlCategoryId;

    const TYPE_NAME: &'static str = "panos_url_category";
    const LISTING: &'static str = "panos_url_categories";

    fn schema() -> Schema {
        Schema::new()
            .attr("device_group", scope::device_group())
            .attr("vsys", scope::vsys(DEFAULT_VSYS))
            .attr("name", scope::name())
            .attr("description", Attribute::string().optional())
            .attr(
                "sites",
                Attribute::strings()
                    .optional_computed()
                    .describe("Sites; leave unset when using URL category entries"),
            )
            .attr(
                "type",
                Attribute::string()
                    .optional_computed()
                    .one_of(CATEGORY_TYPES),
            )
    }

    fn load(_device: &(dyn Device + 'static), d: &ResourceData) -> Result<Category> {
        Ok(Category {
            name: d.get_string("name"),
            description: d.get_string("description"),
            sites: d.get_strings("sites"),
            category_type: d.get_string("type"),
        })
    }

    fn save(d: &mut ResourceData, category: &Category) -> Result<()> {
        d.set("name", category.name.as_str());
        d.set("description", category.description.as_str());
        d.set_strings("sites", category.sites.iter().map(String::as_str));
        d.set("type", category.category_type.as_str());
        Ok(())
    }
}

/// One site in a custom URL category.
pub struct UrlCategoryEntry;

impl MemberResource for UrlCategoryEntry {
    type Parent = Category;
    type Id = UrlCategoryEntryId;

    const TYPE_NAME: &'static str = "panos_url_category_entry";
    const PARENT_FIELD: &'static str = "url_category";
    const KEY_FIELD: &'static str = "site";
    const FIELD: &'static str = "sites";

    fn schema() -> Schema {
        Schema::new()
            .attr("device_group", scope::device_group())
            .attr("vsys", scope::vsys(DEFAULT_VSYS))
            .attr("url_category", scope::parent("URL category"))
            .attr("site", scope::parent("Site to add"))
    }

    fn observe(parent: &Category, key: &str, _d: &mut ResourceData) -> bool {
        parent.sites.iter().any(|s| s == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::lifecycle::Managed;
    use crate::provider::member::Member;
    use crate::provider::testing::{create, firewall, panorama, read, update};
    use declarative::Resource;
    use panoskit::{DeviceGroup, Objects, Scope};
    use serde_json::json;

    const CATEGORY: Managed<UrlCategory> = Managed::new();
    const SITE: Member<UrlCategoryEntry> = Member::new();

    #[test]
    fn test_sites_as_entries() {
        let (fw, _) = firewall();
        let category = create(&CATEGORY, &fw, json!({"name": "blocked", "type": "URL List"}));
        assert_eq!(category.id(), ":vsys1:blocked");

        let a = create(&SITE, &fw, json!({"url_category": "blocked", "site": "a.example"}));
        create(&SITE, &fw, json!({"url_category": "blocked", "site": "b.example"}));
        assert_eq!(a.id(), ":vsys1:blocked:a.example");

        let updated = update(
            &CATEGORY,
            &fw,
            &category,
            json!({"name": "blocked", "description": "no", "type": "URL List"}),
        );
        assert_eq!(updated.get_strings("sites"), vec!["a.example", "b.example"]);
        assert_eq!(updated.get_string("description"), "no");

        // Removed from the category directly.
        let categories = Objects::<Category>::new(&fw);
        categories
            .delete_member(&Scope::vsys("vsys1"), "blocked", "sites", "a.example")
            .unwrap();
        assert!(read(&SITE, &fw, &a).is_gone());

        let mut again = a.clone();
        SITE.delete(&fw, &mut again).unwrap();
        assert!(again.is_gone());
    }

    #[test]
    fn test_entry_of_missing_category() {
        let (fw, _) = firewall();
        let mut d = crate::provider::testing::config(
            &SITE.schema(),
            json!({"url_category": "nope", "site": "a.example"}),
        );
        assert!(SITE.create(&fw, &mut d).is_err());

        let mut orphan = ResourceData::from_id(":vsys1:nope:a.example");
        SITE.read(&fw, &mut orphan).unwrap();
        assert!(orphan.is_gone());
    }

    #[test]
    fn test_device_group_scope() {
        let (pano, _) = panorama();
        Objects::<DeviceGroup>::new(&pano)
            .set(
                &Scope::default(),
                &DeviceGroup {
                    name: "branch".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let d = create(
            &CATEGORY,
            &pano,
            json!({"device_group": "branch", "name": "blocked", "sites": ["x.example"]}),
        );
        assert_eq!(d.id(), "branch:vsys1:blocked");
        assert_eq!(d.get_strings("sites"), vec!["x.example"]);
    }
}
