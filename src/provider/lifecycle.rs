//! Shared CRUD choreography for device objects
//!
//! Most resources are one typed entry at one location. They describe
//! themselves through [`ObjectResource`] (schema, identifier layout, field
//! mapping, sensitive-value hooks) and [`Managed`] runs the lifecycle:
//!
//! - create: load, pin scoping, set, re-get for echoes, set id, read
//! - read: migrate the id, decode, get; not found empties the id
//! - update: load, get live (must exist), copy the mutable subset, edit,
//!   re-get for echoes, read
//! - delete: decode, delete; not found is success

use anyhow::{Context, Result};
use declarative::id::{self, Identifier};
use declarative::{Resource, ResourceData, Schema, StateUpgrader};
use panoskit::{Device, Entry, Objects, Scope};
use std::marker::PhantomData;

/// Where one object lives, decoded from its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scope: Scope,
    /// Enclosing object names, outermost first
    pub parents: Vec<String>,
    pub name: String,
}

impl Target {
    /// Read the scoping components out of an identifier.
    pub fn of<I: Identifier>(id: &I, parent_fields: &[&str]) -> Self {
        let field = |f: &str| id.component(f).unwrap_or_default().to_string();
        Self {
            scope: Scope {
                vsys: field("vsys"),
                device_group: field("device_group"),
                template: field("template"),
                template_stack: field("template_stack"),
            },
            parents: parent_fields.iter().map(|&f| field(f)).collect(),
            name: field("name"),
        }
    }
}

/// A resource managing one typed entry per instance.
pub trait ObjectResource: Send + Sync + 'static {
    type Entry: Entry;
    type Id: Identifier;

    /// Resource (and single-object data source) type name
    const TYPE_NAME: &'static str;

    /// Listing data source type name
    const LISTING: &'static str;

    /// Identifier fields naming enclosing objects, outermost first
    const PARENT_FIELDS: &'static [&'static str] = &[];

    fn schema() -> Schema;

    fn upgraders() -> Vec<StateUpgrader> {
        Vec::new()
    }

    /// Rewrite an identifier of an older layout; `None` if not recognized.
    fn migrate_id(id: &str) -> Option<String> {
        let _ = id;
        None
    }

    /// Build the entry from configuration.
    fn load(device: &(dyn Device + 'static), d: &ResourceData) -> Result<Self::Entry>;

    /// Write the observed entry into the resource data.
    fn save(d: &mut ResourceData, entry: &Self::Entry) -> Result<()>;

    /// Record sensitive echoes right after a write.
    fn capture(d: &mut ResourceData, live: &Self::Entry) -> Result<()> {
        let _ = (d, live);
        Ok(())
    }

    /// Extra device calls after the entry is written.
    fn after_write(device: &(dyn Device + 'static), target: &Target, d: &ResourceData) -> Result<()> {
        let _ = (device, target, d);
        Ok(())
    }

    /// Extra verification after the entry is read.
    fn after_read(device: &(dyn Device + 'static), target: &Target, d: &mut ResourceData) -> Result<()> {
        let _ = (device, target, d);
        Ok(())
    }

    /// Remove the object from the device.
    fn remove(device: &(dyn Device + 'static), target: &Target) -> panoskit::Result<()> {
        objects::<Self>(device, target).delete(&target.scope, &target.name)
    }
}

/// Typed accessor for a resource's entries at a target.
pub fn objects<'a, R: ObjectResource + ?Sized>(
    device: &'a (dyn Device + 'static),
    target: &Target,
) -> Objects<'a, R::Entry> {
    Objects::nested(device, target.parents.clone())
}

/// Decode the identifier, migrating older layouts first.
pub fn decode_id<I: Identifier>(
    d: &mut ResourceData,
    type_name: &str,
    migrate: fn(&str) -> Option<String>,
) -> Result<I> {
    let current = d.id().to_string();
    if id::arity(&current) != I::ARITY
        && let Some(migrated) = migrate(&current)
    {
        log::info!("{type_name}: migrating id {current:?} to {migrated:?}");
        d.set_id(migrated);
    }
    I::decode(d.id()).with_context(|| format!("{type_name}: unrecognized id {:?}", d.id()))
}

/// Prefix an identifier with extra leading components.
pub fn pad_front(old: &str, fill: &[&str]) -> String {
    let mut parts: Vec<String> = fill.iter().map(ToString::to_string).collect();
    parts.extend(id::parse(old));
    id::build(&parts)
}

/// Runs the lifecycle of an [`ObjectResource`].
pub struct Managed<R>(PhantomData<fn() -> R>);

impl<R> Managed<R> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Managed<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ObjectResource> Resource<dyn Device> for Managed<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        R::schema()
    }

    fn upgraders(&self) -> Vec<StateUpgrader> {
        R::upgraders()
    }

    fn create(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::from_data(d);
        id.validate()?;
        let target = Target::of(&id, R::PARENT_FIELDS);
        let entry = R::load(device, d)?;

        log::debug!("{}: creating {}", R::TYPE_NAME, id.encode());
        let objects = objects::<R>(device, &target);
        objects
            .set(&target.scope, &entry)
            .with_context(|| format!("creating {} {}", R::TYPE_NAME, target.name))?;

        let live = objects.get(&target.scope, &target.name)?;
        R::capture(d, &live)?;
        R::after_write(device, &target, d)?;

        d.set_id(id.encode());
        self.read(device, d)
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id: R::Id = decode_id(d, R::TYPE_NAME, R::migrate_id)?;
        id.write_to(d);
        let target = Target::of(&id, R::PARENT_FIELDS);

        let live = match objects::<R>(device, &target).get(&target.scope, &target.name) {
            Ok(live) => live,
            Err(e) if e.is_not_found() => {
                log::info!("{}: {} is gone ({e})", R::TYPE_NAME, d.id());
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", d.id())),
        };

        R::save(d, &live)?;
        R::after_read(device, &target, d)
    }

    fn update(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id: R::Id = decode_id(d, R::TYPE_NAME, R::migrate_id)?;
        let target = Target::of(&id, R::PARENT_FIELDS);
        let proposed = R::load(device, d)?;

        log::debug!("{}: updating {}", R::TYPE_NAME, id.encode());
        let objects = objects::<R>(device, &target);
        let mut live = objects
            .get(&target.scope, &target.name)
            .with_context(|| format!("{} {} must exist to be updated", R::TYPE_NAME, id.encode()))?;
        live.copy_from(&proposed);
        objects.edit(&target.scope, &live)?;

        let echoed = objects.get(&target.scope, &target.name)?;
        R::capture(d, &echoed)?;
        R::after_write(device, &target, d)?;
        self.read(device, d)
    }

    fn delete(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id: R::Id = decode_id(d, R::TYPE_NAME, R::migrate_id)?;
        let target = Target::of(&id, R::PARENT_FIELDS);

        match R::remove(device, &target) {
            Ok(()) => log::debug!("{}: deleted {}", R::TYPE_NAME, id.encode()),
            Err(e) if e.is_not_found() => {
                log::debug!("{}: {} already gone", R::TYPE_NAME, id.encode());
            }
            Err(e) => return Err(e).with_context(|| format!("deleting {}", id.encode())),
        }
        d.clear_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::identifier;

    identifier! {
        struct FilterId { template, template_stack, virtual_router, bgp_aggregate, name }
    }

    #[test]
    fn test_target_from_id() {
        let id = FilterId::decode("t1::vr1:agg:f1").unwrap();
        let target = Target::of(&id, &["virtual_router", "bgp_aggregate"]);
        assert_eq!(target.scope.template, "t1");
        assert!(target.scope.vsys.is_empty());
        assert_eq!(target.parents, vec!["vr1", "agg"]);
        assert_eq!(target.name, "f1");
    }

    #[test]
    fn test_pad_front() {
        assert_eq!(pad_front("vsys1:app1", &["shared"]), "shared:vsys1:app1");
        assert_eq!(pad_front("vsys1:vr1", &["", ""]), "::vsys1:vr1");
    }

    #[test]
    fn test_decode_migrates_then_checks_arity() {
        fn migrate(old: &str) -> Option<String> {
            (id::arity(old) == 3).then(|| pad_front(old, &["", ""]))
        }

        let mut d = ResourceData::from_id("vr1:agg:f1");
        let id: FilterId = decode_id(&mut d, "filter", migrate).unwrap();
        assert_eq!(d.id(), "::vr1:agg:f1");
        assert_eq!(id.name, "f1");

        let mut bad = ResourceData::from_id("a:b");
        assert!(decode_id::<FilterId>(&mut bad, "filter", migrate).is_err());
    }
}
