//! Provider registry
//!
//! A [`Provider`] collects every resource and data source type under its
//! registered name so a driver can dispatch on the type string found in
//! configuration or state.

use crate::error::{Error, Result};
use crate::resource::{BoxedDataSource, BoxedResource, DataSource, Resource};
use crate::schema::Schema;
use std::collections::BTreeMap;

/// Registry of resource and data source types for one client type.
pub struct Provider<C: ?Sized> {
    name: &'static str,
    resources: BTreeMap<&'static str, BoxedResource<C>>,
    data_sources: BTreeMap<&'static str, BoxedDataSource<C>>,
}

impl<C: ?Sized> Provider<C> {
    /// Empty registry.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    /// Provider name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a resource type. A later registration under the same name
    /// replaces the earlier one.
    pub fn register_resource(&mut self, resource: impl Resource<C> + 'static) -> &mut Self {
        self.resources.insert(resource.type_name(), Box::new(resource));
        self
    }

    /// Register a data source type.
    pub fn register_data_source(&mut self, source: impl DataSource<C> + 'static) -> &mut Self {
        self.data_sources.insert(source.type_name(), Box::new(source));
        self
    }

    /// Look up a resource type.
    pub fn resource(&self, type_name: &str) -> Result<&dyn Resource<C>> {
        self.resources
            .get(type_name)
            .map(|r| &**r)
            .ok_or_else(|| Error::UnknownType {
                kind: "resource",
                name: type_name.to_string(),
            })
    }

    /// Look up a data source type.
    pub fn data_source(&self, type_name: &str) -> Result<&dyn DataSource<C>> {
        self.data_sources
            .get(type_name)
            .map(|r| &**r)
            .ok_or_else(|| Error::UnknownType {
                kind: "data source",
                name: type_name.to_string(),
            })
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    /// Resource schemas by type name.
    pub fn resource_schemas(&self) -> BTreeMap<&'static str, Schema> {
        self.resources
            .iter()
            .map(|(name, r)| (*name, r.schema()))
            .collect()
    }

    /// Data source schemas by type name.
    pub fn data_source_schemas(&self) -> BTreeMap<&'static str, Schema> {
        self.data_sources
            .iter()
            .map(|(name, s)| (*name, s.schema()))
            .collect()
    }

    /// Check every registered schema definition.
    pub fn validate(&self) -> Result<()> {
        let all = self
            .resource_schemas()
            .into_iter()
            .chain(self.data_source_schemas());
        for (type_name, schema) in all {
            schema.validate_definition().map_err(|e| match e {
                Error::SchemaDefinition { attribute, message } => Error::SchemaDefinition {
                    attribute: format!("{type_name}.{attribute}"),
                    message,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}

impl<C: ?Sized> std::fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResourceData;
    use crate::schema::Attribute;

    struct Thing;

    impl Resource<()> for Thing {
        fn type_name(&self) -> &'static str {
            "thing"
        }

        fn schema(&self) -> Schema {
            Schema::new().attr("name", Attribute::string().required())
        }

        fn create(&self, _: &(), d: &mut ResourceData) -> anyhow::Result<()> {
            d.set_id("x");
            Ok(())
        }

        fn read(&self, _: &(), _: &mut ResourceData) -> anyhow::Result<()> {
            Ok(())
        }

        fn delete(&self, _: &(), d: &mut ResourceData) -> anyhow::Result<()> {
            d.clear_id();
            Ok(())
        }
    }

    struct Broken;

    impl DataSource<()> for Broken {
        fn type_name(&self) -> &'static str {
            "broken"
        }

        fn schema(&self) -> Schema {
            Schema::new().attr("a", Attribute::string().conflicts_with(&["missing"]))
        }

        fn read(&self, _: &(), _: &mut ResourceData) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup() {
        let mut provider = Provider::new("test");
        provider.register_resource(Thing);

        assert!(provider.resource("thing").is_ok());
        assert!(matches!(
            provider.resource("other"),
            Err(Error::UnknownType { kind: "resource", .. })
        ));
        assert_eq!(provider.resource_types().collect::<Vec<_>>(), vec!["thing"]);
        provider.validate().unwrap();
    }

    #[test]
    fn test_update_defaults_to_error() {
        let mut provider = Provider::new("test");
        provider.register_resource(Thing);
        let mut d = ResourceData::default();
        let err = provider
            .resource("thing")
            .unwrap()
            .update(&(), &mut d)
            .unwrap_err();
        assert_eq!(err.to_string(), "thing cannot be updated in place");
    }

    #[test]
    fn test_validate_names_type() {
        let mut provider = Provider::new("test");
        provider.register_data_source(Broken);
        let err = provider.validate().unwrap_err();
        assert!(err.to_string().contains("broken.a"));
    }
}
