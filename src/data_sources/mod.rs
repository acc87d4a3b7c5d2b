//! Read-only data sources.
//!
//! Every object resource gets two for free: a single-object lookup that
//! reuses the resource's read path, and a listing of entry names at a
//! location. Audit comment history is the one hand-written source.

pub mod audit;

use crate::provider::lifecycle::{Managed, ObjectResource, Target, objects};
use anyhow::{Context, Result, bail};
use declarative::id::{self, Identifier};
use declarative::sensitive::{ECHO_SUFFIX, RAW_SUFFIX};
use declarative::{
    AttrType, Attribute, Attributes, Attrs, DataSource, Resource, ResourceData, Schema,
};
use panoskit::Device;
use serde_json::Value;
use std::marker::PhantomData;

/// One object, looked up by its identifier fields.
pub struct Single<R>(PhantomData<fn() -> R>);

impl<R> Single<R> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Single<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn hidden(name: &str, attr: &Attribute) -> bool {
    attr.sensitive || name.ends_with(RAW_SUFFIX) || name.ends_with(ECHO_SUFFIX)
}

/// Drop sensitive attributes and their bookkeeping, at every depth.
fn scrub(schema: &mut Schema) {
    schema.attributes.retain(|name, attr| !hidden(name, attr));
    for attr in schema.attributes.values_mut() {
        if let AttrType::Block(inner) = &mut attr.kind {
            scrub(inner);
        }
    }
}

/// Keep only what the schema declares, at every depth.
fn prune(attrs: &mut Attributes, schema: &Schema) {
    attrs.retain(|name, _| schema.get(name).is_some());
    for (name, value) in attrs.iter_mut() {
        let inner = match schema.get(name).map(|a| &a.kind) {
            Some(AttrType::Block(inner)) => inner,
            _ => continue,
        };
        if let Value::Array(items) = value {
            for item in items.iter_mut() {
                if let Value::Object(block) = item {
                    prune(block, inner);
                }
            }
        }
    }
}

impl<R: ObjectResource> DataSource<dyn Device> for Single<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let mut schema = R::schema().to_data_source(<R::Id as Identifier>::FIELDS);
        scrub(&mut schema);
        schema
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::from_data(d);
        id.validate()?;
        d.set_id(id.encode());

        Managed::<R>::new().read(device, d)?;
        if d.is_gone() {
            bail!("{} {} not found", R::TYPE_NAME, id.encode());
        }

        prune(d.attributes_mut(), &self.schema());
        Ok(())
    }
}

/// Names of all objects of one type at a location.
pub struct Listing<R>(PhantomData<fn() -> R>);

impl<R> Listing<R> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for Listing<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ObjectResource> Listing<R> {
    fn lookup() -> Vec<&'static str> {
        <R::Id as Identifier>::FIELDS
            .iter()
            .copied()
            .filter(|f| *f != "name")
            .collect()
    }
}

impl<R: ObjectResource> DataSource<dyn Device> for Listing<R> {
    fn type_name(&self) -> &'static str {
        R::LISTING
    }

    fn schema(&self) -> Schema {
        let lookup = Self::lookup();
        let mut schema = R::schema().to_data_source(&lookup);
        schema.attributes.retain(|name, _| lookup.contains(&name.as_str()));
        schema
            .attr("total", Attribute::int().computed())
            .attr("listing", Attribute::strings().computed())
    }

    fn read(&self, device: &(dyn Device + 'static), d: &mut ResourceData) -> Result<()> {
        let id = R::Id::from_data(d);
        let target = Target::of(&id, R::PARENT_FIELDS);
        let names = objects::<R>(device, &target)
            .list_names(&target.scope)
            .with_context(|| format!("listing {}", R::TYPE_NAME))?;

        let location: Vec<&str> = Self::lookup()
            .into_iter()
            .filter_map(|field| id.component(field))
            .collect();
        d.set_id(id::build(&location));
        d.set("total", names.len());
        d.set_strings("listing", names);
        Ok(())
    }
}
