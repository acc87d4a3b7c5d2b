//! Planning: refresh stored state against the device and diff it with the
//! declarations.

use crate::config::Declarations;
use anyhow::{Context, Result};
use declarative::{ResourceDiff, StoredResource, executor};
use panoskit::Device;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};

type Registry = declarative::Provider<dyn Device>;

/// Planned changes plus the refreshed state they were computed from.
#[derive(Debug, Default)]
pub struct Plan {
    /// One entry per declared or stored address
    pub diffs: Vec<ResourceDiff>,
    /// Refreshed state per stored address; `None` means it vanished
    pub refreshed: BTreeMap<String, Option<StoredResource>>,
}

impl Plan {
    pub fn changes(&self) -> impl Iterator<Item = &ResourceDiff> {
        self.diffs.iter().filter(|d| d.action.is_change())
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    /// Keep only changes matching `target`.
    pub fn retain_target(&mut self, target: &str) {
        self.diffs.retain(|d| matches_target(&d.address, &d.type_name, target));
    }
}

/// Check if an address matches a `type` or `type.name` target
pub fn matches_target(address: &str, type_name: &str, target: &str) -> bool {
    if target.contains('.') {
        address == target
    } else {
        type_name == target
    }
}

/// Upgrade and re-read every stored resource, `jobs` at a time.
pub fn refresh_all(
    provider: &Registry,
    device: &(dyn Device + 'static),
    stored: &[StoredResource],
    jobs: usize,
) -> Result<BTreeMap<String, Option<StoredResource>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create refresh thread pool")?;

    let refreshed: Vec<Result<(String, Option<StoredResource>)>> = pool.install(|| {
        stored
            .par_iter()
            .map(|s| -> Result<(String, Option<StoredResource>)> {
                let resource = provider.resource(&s.type_name)?;
                let state = executor::refresh(resource, device, s)?;
                Ok((s.address.clone(), state))
            })
            .collect()
    });
    refreshed.into_iter().collect()
}

/// Build the plan for `decls` against refreshed state.
pub fn plan(
    provider: &Registry,
    device: &(dyn Device + 'static),
    decls: &Declarations,
    stored: &[StoredResource],
    jobs: usize,
) -> Result<Plan> {
    let refreshed = refresh_all(provider, device, stored, jobs)?;
    let prior = |address: &str| {
        refreshed
            .get(address)
            .and_then(Option::as_ref)
            .map(|s| s.data.clone())
    };

    let mut diffs = Vec::new();
    let mut declared = HashSet::new();
    for decl in &decls.resource {
        let address = decl.address();
        let schema = provider.resource(&decl.type_name)?.schema();
        let mut config = decl.config.clone();
        schema
            .validate_config(&config)
            .with_context(|| format!("invalid configuration for {address}"))?;
        schema.apply_defaults(&mut config);

        diffs.push(ResourceDiff::compute(
            &address,
            &decl.type_name,
            &schema,
            prior(&address),
            Some(config),
            decl.depends_on.clone(),
        ));
        declared.insert(address);
    }

    for s in stored.iter().filter(|s| !declared.contains(&s.address)) {
        let schema = provider.resource(&s.type_name)?.schema();
        diffs.push(ResourceDiff::compute(
            &s.address,
            &s.type_name,
            &schema,
            prior(&s.address),
            None,
            s.depends_on.clone(),
        ));
    }

    Ok(Plan { diffs, refreshed })
}
