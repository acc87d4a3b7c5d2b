//! Execution engine - refreshes stored state and applies planned changes
//!
//! Changes are grouped into waves by `depends_on`. Deletions run first,
//! dependents before the things they depend on; creations and updates run
//! after, dependencies first. Within one wave every change is independent
//! and the wave runs on a rayon pool. A failed change skips everything that
//! depends on it.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::data::ResourceData;
use crate::diff::{Action, ResourceDiff};
use crate::provider::Provider;
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary, StoredResource};
use crate::upgrade::upgrade_state;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Result of executing a plan.
#[derive(Debug, Default)]
pub struct ExecuteOutcome {
    /// Counts per result kind
    pub summary: ExecuteSummary,
    /// Result per address, in execution order
    pub results: Vec<(String, ApplyResult)>,
    /// New state per successfully applied address; `None` means removed
    pub states: BTreeMap<String, Option<StoredResource>>,
}

/// Upgrade stored attributes to the resource's current schema version.
pub fn upgrade_stored<C: ?Sized>(
    resource: &dyn Resource<C>,
    stored: &StoredResource,
) -> Result<StoredResource> {
    let schema = resource.schema();
    let attrs = upgrade_state(
        stored.schema_version,
        schema.version,
        &resource.upgraders(),
        stored.data.attributes().clone(),
    )
    .with_context(|| format!("upgrading state of {}", stored.address))?;

    let mut data = ResourceData::new(attrs);
    data.set_id(stored.data.id());
    Ok(StoredResource {
        schema_version: schema.version,
        data,
        ..stored.clone()
    })
}

/// Upgrade and re-read one stored resource.
///
/// Returns `None` when the object no longer exists on the device.
pub fn refresh<C: ?Sized>(
    resource: &dyn Resource<C>,
    client: &C,
    stored: &StoredResource,
) -> Result<Option<StoredResource>> {
    let mut upgraded = upgrade_stored(resource, stored)?;
    resource
        .read(client, &mut upgraded.data)
        .with_context(|| format!("reading {}", stored.address))?;

    if upgraded.data.is_gone() {
        log::info!("{} no longer exists on the device", stored.address);
        return Ok(None);
    }
    Ok(Some(upgraded))
}

/// Execute planned changes.
///
/// # Arguments
/// * `provider` - Registry used to resolve each change's resource type
/// * `client` - Handed to every resource operation
/// * `diffs` - Planned changes; no-ops are ignored
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
pub fn execute<C, P, F>(
    provider: &Provider<C>,
    client: &C,
    diffs: &[ResourceDiff],
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut F,
) -> Result<ExecuteOutcome>
where
    C: ?Sized + Sync,
    P: ProgressCallback,
    F: ConfirmCallback,
{
    let pending: Vec<&ResourceDiff> = diffs.iter().filter(|d| d.action.is_change()).collect();
    if pending.is_empty() {
        return Ok(ExecuteOutcome::default());
    }

    let waves = schedule(&pending)?;

    if !opts.dry_run && !confirm.confirm("Apply changes?")? {
        let mut outcome = ExecuteOutcome::default();
        for diff in &pending {
            let result = ApplyResult::Skipped {
                reason: "Not confirmed".into(),
            };
            outcome.summary.add_result(&result);
            outcome.results.push((diff.address.clone(), result));
        }
        return Ok(outcome);
    }

    if opts.dry_run {
        return Ok(ExecuteOutcome::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let mut outcome = ExecuteOutcome::default();
    let mut failed: Vec<&ResourceDiff> = Vec::new();

    for (number, wave) in waves.iter().enumerate() {
        let (blocked, runnable): (Vec<&ResourceDiff>, Vec<&ResourceDiff>) = wave
            .iter()
            .map(|&i| pending[i])
            .partition(|diff| blocked_by(diff, &failed).is_some());

        progress.on_wave_start(number, wave.len());

        for diff in blocked {
            let reason = blocked_by(diff, &failed)
                .map(|dep| format!("dependency {dep} failed"))
                .unwrap_or_default();
            let result = ApplyResult::Skipped { reason };
            progress.on_resource_complete(&diff.address, &result);
            outcome.summary.add_result(&result);
            outcome.results.push((diff.address.clone(), result));
            failed.push(diff);
        }

        let applied: Vec<(&ResourceDiff, Result<Option<StoredResource>>)> =
            if opts.jobs <= 1 || runnable.len() == 1 {
                let mut applied = Vec::with_capacity(runnable.len());
                for diff in runnable {
                    progress.on_resource_start(&diff.address, diff.action.label());
                    let state = apply_change(provider, client, diff);
                    progress.on_resource_complete(&diff.address, &result_of(diff, &state));
                    applied.push((diff, state));
                }
                applied
            } else {
                let applied: Vec<_> = pool.install(|| {
                    runnable
                        .par_iter()
                        .map(|diff| (*diff, apply_change(provider, client, diff)))
                        .collect()
                });
                for (diff, state) in &applied {
                    progress.on_resource_complete(&diff.address, &result_of(diff, state));
                }
                applied
            };

        for (diff, state) in applied {
            let result = result_of(diff, &state);
            match state {
                Ok(state) => {
                    outcome.states.insert(diff.address.clone(), state);
                }
                Err(e) => {
                    log::warn!("{} failed: {e:#}", diff.address);
                    failed.push(diff);
                }
            }
            outcome.summary.add_result(&result);
            outcome.results.push((diff.address.clone(), result));
        }

        progress.on_wave_complete();
    }

    Ok(outcome)
}

/// Apply a single change, returning the new state.
fn apply_change<C: ?Sized>(
    provider: &Provider<C>,
    client: &C,
    diff: &ResourceDiff,
) -> Result<Option<StoredResource>> {
    let resource = provider.resource(&diff.type_name)?;
    let schema = resource.schema();
    log::debug!("{} {}", diff.action.label(), diff.address);

    let store = |data: ResourceData| {
        let mut stored = StoredResource::new(&diff.address, &diff.type_name, schema.version, data);
        stored.depends_on = diff.depends_on.clone();
        stored
    };

    match diff.action {
        Action::NoOp => Ok(diff.prior.clone().map(store)),
        Action::Delete => {
            let mut d = diff.prior.clone().unwrap_or_default();
            resource.delete(client, &mut d)?;
            Ok(None)
        }
        Action::Create | Action::Replace | Action::Update => {
            if diff.action == Action::Replace {
                let mut old = diff.prior.clone().unwrap_or_default();
                resource.delete(client, &mut old)?;
            }

            let Some(mut d) = diff.planned(&schema) else {
                bail!("{} has no configuration", diff.address);
            };
            if diff.action == Action::Update {
                resource.update(client, &mut d)?;
            } else {
                resource.create(client, &mut d)?;
            }

            if d.is_gone() {
                bail!("{} was not found after {}", diff.address, diff.action.label());
            }
            Ok(Some(store(d)))
        }
    }
}

fn result_of(diff: &ResourceDiff, state: &Result<Option<StoredResource>>) -> ApplyResult {
    match state {
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
        Ok(_) => match diff.action {
            Action::NoOp => ApplyResult::NoChange,
            Action::Create => ApplyResult::Created,
            Action::Update => ApplyResult::Modified,
            Action::Replace => ApplyResult::Replaced,
            Action::Delete => ApplyResult::Removed,
        },
    }
}

/// Address whose failure blocks this change.
fn blocked_by<'a>(diff: &ResourceDiff, failed: &[&'a ResourceDiff]) -> Option<&'a str> {
    if diff.action == Action::Delete {
        failed
            .iter()
            .find(|f| f.action == Action::Delete && f.depends_on.contains(&diff.address))
            .map(|f| f.address.as_str())
    } else {
        failed
            .iter()
            .find(|f| diff.depends_on.contains(&f.address))
            .map(|f| f.address.as_str())
    }
}

/// Group pending changes into waves of indices into `pending`.
fn schedule(pending: &[&ResourceDiff]) -> Result<Vec<Vec<usize>>> {
    let (deletes, others): (Vec<usize>, Vec<usize>) =
        (0..pending.len()).partition(|&i| pending[i].action == Action::Delete);

    let mut waves = levels(pending, &deletes)?;
    waves.reverse();
    waves.extend(levels(pending, &others)?);
    Ok(waves)
}

/// Dependency depth of each member of `group`, grouped by depth.
fn levels(pending: &[&ResourceDiff], group: &[usize]) -> Result<Vec<Vec<usize>>> {
    let index: HashMap<&str, usize> = group
        .iter()
        .map(|&i| (pending[i].address.as_str(), i))
        .collect();
    let mut depth: HashMap<usize, usize> = HashMap::new();
    let mut visiting: Vec<usize> = Vec::new();

    fn visit(
        i: usize,
        pending: &[&ResourceDiff],
        index: &HashMap<&str, usize>,
        depth: &mut HashMap<usize, usize>,
        visiting: &mut Vec<usize>,
    ) -> Result<usize> {
        if let Some(&d) = depth.get(&i) {
            return Ok(d);
        }
        if visiting.contains(&i) {
            bail!("dependency cycle involving {}", pending[i].address);
        }
        visiting.push(i);
        let mut level = 0;
        for dep in &pending[i].depends_on {
            if let Some(&j) = index.get(dep.as_str()) {
                level = level.max(visit(j, pending, index, depth, visiting)? + 1);
            }
        }
        visiting.pop();
        depth.insert(i, level);
        Ok(level)
    }

    let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &i in group {
        let level = visit(i, pending, &index, &mut depth, &mut visiting)?;
        grouped.entry(level).or_default().push(i);
    }
    Ok(grouped.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::data::{Attributes, Attrs};
    use crate::schema::{Attribute, Schema};
    use crate::upgrade::{StateUpgrader, fill_missing};
    use serde_json::json;
    use std::sync::Mutex;

    /// Device double: objects by name plus a log of calls.
    #[derive(Default)]
    struct Store {
        objects: Mutex<BTreeMap<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl Store {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    struct Note;

    fn upgrade_v0(mut attrs: Attributes) -> crate::Result<Attributes> {
        fill_missing(&mut attrs, "text", "legacy");
        Ok(attrs)
    }

    impl Resource<Store> for Note {
        fn type_name(&self) -> &'static str {
            "note"
        }

        fn schema(&self) -> Schema {
            Schema::new()
                .version(1)
                .attr("name", Attribute::string().required().force_new())
                .attr("text", Attribute::string().optional())
        }

        fn upgraders(&self) -> Vec<StateUpgrader> {
            vec![StateUpgrader::new(0, upgrade_v0)]
        }

        fn create(&self, store: &Store, d: &mut ResourceData) -> anyhow::Result<()> {
            let name = d.get_string("name");
            if name == "bad" {
                bail!("device rejected {name}");
            }
            store.log(format!("create {name}"));
            store
                .objects
                .lock()
                .unwrap()
                .insert(name.clone(), d.get_string("text"));
            d.set_id(name);
            self.read(store, d)
        }

        fn read(&self, store: &Store, d: &mut ResourceData) -> anyhow::Result<()> {
            let text = store.objects.lock().unwrap().get(d.id()).cloned();
            match text {
                Some(text) => {
                    let name = d.id().to_string();
                    d.set("name", name);
                    d.set("text", text);
                }
                None => d.clear_id(),
            }
            Ok(())
        }

        fn update(&self, store: &Store, d: &mut ResourceData) -> anyhow::Result<()> {
            store.log(format!("update {}", d.id()));
            store
                .objects
                .lock()
                .unwrap()
                .insert(d.id().to_string(), d.get_string("text"));
            self.read(store, d)
        }

        fn delete(&self, store: &Store, d: &mut ResourceData) -> anyhow::Result<()> {
            store.log(format!("delete {}", d.id()));
            store.objects.lock().unwrap().remove(d.id());
            d.clear_id();
            Ok(())
        }
    }

    fn provider() -> Provider<Store> {
        let mut provider = Provider::new("test");
        provider.register_resource(Note);
        provider
    }

    fn config(name: &str, text: &str) -> Option<Attributes> {
        json!({"name": name, "text": text}).as_object().cloned()
    }

    fn prior(name: &str, text: &str) -> Option<ResourceData> {
        let mut d = ResourceData::new(config(name, text).unwrap());
        d.set_id(name);
        Some(d)
    }

    fn diff(
        address: &str,
        prior: Option<ResourceData>,
        config: Option<Attributes>,
        deps: &[&str],
    ) -> ResourceDiff {
        ResourceDiff::compute(
            address,
            "note",
            &Note.schema(),
            prior,
            config,
            deps.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    fn sequential() -> ExecuteOptions {
        ExecuteOptions {
            dry_run: false,
            jobs: 1,
        }
    }

    #[test]
    fn test_execute_empty_plan() {
        let outcome = execute(
            &provider(),
            &Store::default(),
            &[],
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(outcome.summary.total(), 0);
    }

    #[test]
    fn test_dependency_waves() {
        let store = Store::default();
        store.objects.lock().unwrap().insert("old-child".into(), "x".into());
        store.objects.lock().unwrap().insert("old-parent".into(), "x".into());

        let diffs = vec![
            diff("note.child", None, config("child", "c"), &["note.parent"]),
            diff("note.old_parent", prior("old-parent", "x"), None, &[]),
            diff("note.parent", None, config("parent", "p"), &[]),
            diff("note.old_child", prior("old-child", "x"), None, &["note.old_parent"]),
        ];

        let outcome = execute(
            &provider(),
            &store,
            &diffs,
            &sequential(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(
            *store.calls.lock().unwrap(),
            vec![
                "delete old-child",
                "delete old-parent",
                "create parent",
                "create child"
            ]
        );
        assert_eq!(outcome.summary.created, 2);
        assert_eq!(outcome.summary.removed, 2);
        assert_eq!(outcome.states["note.old_child"], None);
        let child = outcome.states["note.child"].as_ref().unwrap();
        assert_eq!(child.data.id(), "child");
        assert_eq!(child.depends_on, vec!["note.parent"]);
        assert_eq!(child.schema_version, 1);
    }

    #[test]
    fn test_failed_dependency_skips_dependents() {
        let store = Store::default();
        let diffs = vec![
            diff("note.bad", None, config("bad", ""), &[]),
            diff("note.child", None, config("child", ""), &["note.bad"]),
            diff("note.other", None, config("other", ""), &[]),
        ];

        let outcome = execute(
            &provider(),
            &store,
            &diffs,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.skipped, 1);
        assert_eq!(outcome.summary.created, 1);
        assert!(!outcome.states.contains_key("note.child"));
    }

    #[test]
    fn test_update_and_replace() {
        let store = Store::default();
        store.objects.lock().unwrap().insert("a".into(), "old".into());
        store.objects.lock().unwrap().insert("b".into(), "old".into());

        let diffs = vec![
            diff("note.a", prior("a", "old"), config("a", "new"), &[]),
            diff("note.b", prior("b", "old"), config("b2", "old"), &[]),
        ];
        assert_eq!(diffs[0].action, Action::Update);
        assert_eq!(diffs[1].action, Action::Replace);

        let outcome = execute(
            &provider(),
            &store,
            &diffs,
            &sequential(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(outcome.summary.modified, 1);
        assert_eq!(outcome.summary.replaced, 1);
        let objects = store.objects.lock().unwrap();
        assert_eq!(objects["a"], "new");
        assert!(!objects.contains_key("b"));
        assert_eq!(objects["b2"], "old");
    }

    #[test]
    fn test_cycle_detected() {
        let diffs = vec![
            diff("note.a", None, config("a", ""), &["note.b"]),
            diff("note.b", None, config("b", ""), &["note.a"]),
        ];
        let err = execute(
            &provider(),
            &Store::default(),
            &diffs,
            &sequential(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap_err();
        assert!(err.to_string().contains("dependency cycle"));
    }

    #[test]
    fn test_declined_skips_everything() {
        let store = Store::default();
        let diffs = vec![diff("note.a", None, config("a", ""), &[])];
        let outcome = execute(
            &provider(),
            &store,
            &diffs,
            &sequential(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(outcome.summary.skipped, 1);
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_upgrades_then_reads() {
        let store = Store::default();
        store.objects.lock().unwrap().insert("a".into(), "device".into());

        let mut data = ResourceData::new(json!({"name": "a"}).as_object().cloned().unwrap());
        data.set_id("a");
        let stored = StoredResource::new("note.a", "note", 0, data);
        let note: &dyn Resource<Store> = &Note;

        let upgraded = upgrade_stored(note, &stored).unwrap();
        assert_eq!(upgraded.schema_version, 1);
        assert_eq!(upgraded.data.attributes()["text"], json!("legacy"));

        let refreshed = refresh(note, &store, &stored).unwrap().unwrap();
        assert_eq!(refreshed.data.attributes()["text"], json!("device"));

        store.objects.lock().unwrap().clear();
        assert!(refresh(note, &store, &stored).unwrap().is_none());
    }
}
