//! Collection elements managed as their own resources
//!
//! A URL category site, a virtual router interface or a device group's
//! serial number is one element of a collection owned by a parent object.
//! Each element resource is identified by the parent's identifier plus the
//! element key. Writes go through element-level mutators so siblings and the
//! parent's other fields are never touched; reads fetch the parent and scan.

use crate::provider::lifecycle::Target;
use anyhow::{Context, Result, bail};
use declarative::{Identifier, Resource, ResourceData, Schema};
use panoskit::{Device, Entry, Objects, Scope};
use std::marker::PhantomData;

/// One element of a parent object's collection.
pub trait MemberResource: Send + Sync + 'static {
    type Parent: Entry;
    type Id: Identifier;

    const TYPE_NAME: &'static str;

    /// Identifier field naming the parent object
    const PARENT_FIELD: &'static str;

    /// Identifier field holding the element key
    const KEY_FIELD: &'static str;

    /// Parent field holding the collection
    const FIELD: &'static str;

    /// Whether the element carries a value that can change in place
    const UPDATABLE: bool = false;

    fn schema() -> Schema;

    /// Report the element from the parent; `false` if it is absent.
    fn observe(parent: &Self::Parent, key: &str, d: &mut ResourceData) -> bool;

    /// Ensure the element is present with its configured value.
    fn write(
        objects: &Objects<'_, Self::Parent>,
        scope: &Scope,
        parent: &str,
        key: &str,
        d: &ResourceData,
    ) -> panoskit::Result<()> {
        let _ = d;
        objects.set_member(scope, parent, Self::FIELD, key)
    }

    /// Remove the element.
    fn remove(
        objects: &Objects<'_, Self::Parent>,
        scope: &Scope,
        parent: &str,
        key: &str,
    ) -> panoskit::Result<()> {
        objects.delete_member(scope, parent, Self::FIELD, key)
    }
}

/// Parent location, parent name and element key of an element identifier.
fn locate<R: MemberResource>(id: &R::Id) -> (Scope, String, String) {
    let target = Target::of(id, &[]);
    let component = |field: &str| id.component(field).unwrap_or_default().to_string();
    (
        target.scope,
        component(R::PARENT_FIELD),
        component(R::KEY_FIELD),
    )
}

/// Runs the lifecycle of a [`MemberResource`].
pub struct Member<R>(PhantomData<fn() -> R>);

impl<R> Member<R> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Member<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MemberResource> Member<R> {
    fn write(&self, device: &(dyn Device + 'static), d: &mut ResourceData, id: &R::Id) -> Result<()> {
        let (scope, parent, key) = locate::<R>(id);
        let objects = Objects::<R::Parent>::new(device);
        R::write(&objects, &scope, &parent, &key, d).with_context(|| {
            format!("{}: adding {key:?} to {parent}", R::TYPE_NAME)
        })?;
        d.set_id(id.encode());
        self.read(device, d)
    }
}

impl<R: MemberResource> Resource<dyn Device> for Member<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        R::schema()
    }

    fn create(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::from_data(d);
        id.validate()?;
        log::debug!("{}: creating {}", R::TYPE_NAME, id.encode());
        self.write(device, d, &id)
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::decode(d.id())
            .with_context(|| format!("{}: unrecognized id {:?}", R::TYPE_NAME, d.id()))?;
        id.write_to(d);
        let (scope, parent, key) = locate::<R>(&id);

        let owner = match Objects::<R::Parent>::new(device).get(&scope, &parent) {
            Ok(owner) => owner,
            Err(e) if e.is_not_found() => {
                log::info!("{}: {parent} is gone ({e})", R::TYPE_NAME);
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", d.id())),
        };

        if !R::observe(&owner, &key, d) {
            log::info!("{}: {key:?} is no longer in {parent}", R::TYPE_NAME);
            d.clear_id();
        }
        Ok(())
    }

    fn update(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        if !R::UPDATABLE {
            bail!("{} elements cannot be updated in place", R::TYPE_NAME);
        }
        let id = R::Id::decode(d.id())?;
        log::debug!("{}: updating {}", R::TYPE_NAME, id.encode());
        self.write(device, d, &id)
    }

    fn delete(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::decode(d.id())?;
        let (scope, parent, key) = locate::<R>(&id);

        match R::remove(&Objects::new(device), &scope, &parent, &key) {
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
