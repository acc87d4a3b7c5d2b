//! Helpers for resource tests: in-memory devices and configuration data.

use declarative::{DataSource, Resource, ResourceData, Schema};
use panoskit::{Device, Firewall, MemoryBackend, Panorama};
use serde_json::Value;
use std::sync::Arc;

pub fn firewall() -> (Firewall, MemoryBackend) {
    let backend = MemoryBackend::new();
    (Firewall::new("fw.test", Arc::new(backend.clone())), backend)
}

pub fn panorama() -> (Panorama, MemoryBackend) {
    let backend = MemoryBackend::new();
    (Panorama::new("pano.test", Arc::new(backend.clone())), backend)
}

/// Validated configuration with schema defaults applied.
pub fn config(schema: &Schema, value: Value) -> ResourceData {
    let Value::Object(mut attrs) = value else {
        panic!("configuration must be an object");
    };
    schema.validate_config(&attrs).unwrap();
    schema.apply_defaults(&mut attrs);
    ResourceData::new(attrs)
}

pub fn create(resource: &dyn Resource<dyn Device>, device: &(dyn Device + 'static), value: Value) -> ResourceData {
    let mut d = config(&resource.schema(), value);
    resource.create(device, &mut d).unwrap();
    assert!(!d.is_gone(), "{} vanished after create", resource.type_name());
    d
}

/// Apply a configuration change to existing state, the way a plan would.
pub fn update(
    resource: &dyn Resource<dyn Device>,
    device: &(dyn Device + 'static),
    prior: &ResourceData,
    value: Value,
) -> ResourceData {
    let config = config(&resource.schema(), value);
    let mut d = prior.clone();
    for (key, value) in config.into_attributes() {
        d.attributes_mut().insert(key, value);
    }
    resource.update(device, &mut d).unwrap();
    d
}

pub fn read(resource: &dyn Resource<dyn Device>, device: &(dyn Device + 'static), prior: &ResourceData) -> ResourceData {
    let mut d = prior.clone();
    resource.read(device, &mut d).unwrap();
    d
}

pub fn lookup(source: &dyn DataSource<dyn Device>, device: &(dyn Device + 'static), value: Value) -> ResourceData {
    let mut d = config(&source.schema(), value);
    source.read(device, &mut d).unwrap();
    d
}
