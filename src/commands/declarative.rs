//! Declarative commands
//!
//! - `validate` - Check declarations without contacting the device
//! - `plan` - Show what apply would change
//! - `apply` - Make the device match the declarations
//! - `refresh` - Re-read stored resources into state
//! - `import` - Adopt an existing object into state
//! - `read` - Evaluate data sources

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::{ExecuteOptions, ResourceData, StoredResource};
use panoskit::Device;
use serde_json::{Map, Value, json};
use std::path::PathBuf;

use crate::Context;
use crate::cli::{ApplyArgs, PlanArgs, ReadArgs};
use crate::config::{DataDecl, Declarations, ProviderConfig};
use crate::engine::{self, Plan, PromptConfirm, TerminalProgress, display};
use crate::progress;
use crate::provider::provider;
use crate::state::StateFile;
use crate::ui;

type Registry = declarative::Provider<dyn Device>;

/// Settings, registry and state shared by every command.
pub struct Workspace {
    pub settings: ProviderConfig,
    pub registry: Registry,
    pub state_path: PathBuf,
    pub state: StateFile,
}

impl Workspace {
    pub fn open(ctx: &Context) -> Result<Self> {
        let settings = ProviderConfig::load(ctx.config.as_deref())?;
        let state_path = settings.state_path()?;
        let state = StateFile::load(&state_path)?;
        Ok(Self {
            settings,
            registry: provider(),
            state_path,
            state,
        })
    }

    /// Load and validate the declarations file.
    pub fn declarations(&self, ctx: &Context) -> Result<Declarations> {
        let decls = Declarations::load(&ctx.file)?;
        decls
            .validate(&self.registry)
            .with_context(|| format!("Invalid declarations in {}", ctx.file.display()))?;
        Ok(decls)
    }

    fn plan(
        &self,
        ctx: &Context,
        device: &(dyn Device + 'static),
        decls: &Declarations,
        jobs: usize,
        target: Option<&str>,
    ) -> Result<Plan> {
        let pb = (!ctx.quiet).then(|| {
            progress::spinner(&format!(
                "Refreshing {} resources...",
                self.state.resources.len()
            ))
        });
        let planned = engine::plan(&self.registry, device, decls, &self.state.resources, jobs);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let mut planned = planned?;
        if let Some(target) = target {
            planned.retain_target(target);
        }
        Ok(planned)
    }

    pub fn save(&mut self) -> Result<()> {
        self.state.save(&self.state_path)
    }
}

// ============================================================================
// Commands
// ============================================================================

pub fn validate(ctx: &Context) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let decls = ws.declarations(ctx)?;
    ws.registry.validate()?;
    ui::success(&format!(
        "{} resources and {} data sources are valid",
        decls.resource.len(),
        decls.data.len()
    ));
    Ok(())
}

pub fn plan(ctx: &Context, args: PlanArgs) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let decls = ws.declarations(ctx)?;
    let session = ws.settings.connect()?;
    let jobs = args.jobs.unwrap_or_else(|| ws.settings.jobs());

    let planned = ws.plan(ctx, session.device.as_ref(), &decls, jobs, args.target.as_deref())?;
    display::display_plan(&planned.diffs, ctx.verbose > 0);
    Ok(())
}

pub fn apply(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    let decls = ws.declarations(ctx)?;
    let session = ws.settings.connect()?;
    let jobs = args.jobs.unwrap_or_else(|| ws.settings.jobs());

    let planned = ws.plan(ctx, session.device.as_ref(), &decls, jobs, args.target.as_deref())?;
    display::display_plan(&planned.diffs, ctx.verbose > 0);

    if args.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    ws.state.merge(planned.refreshed.clone());
    if !planned.has_changes() {
        return ws.save();
    }

    println!();
    let outcome = declarative::execute(
        &ws.registry,
        session.device.as_ref(),
        &planned.diffs,
        &ExecuteOptions {
            dry_run: false,
            jobs,
        },
        &mut TerminalProgress::new(ctx.quiet),
        &mut PromptConfirm::new(args.yes),
    )?;

    let summary = outcome.summary;
    if summary.total() == summary.skipped {
        ws.save()?;
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    ws.state.merge(outcome.states);
    ws.save()?;
    session.save()?;

    engine::print_summary(&summary);
    if !summary.is_success() {
        bail!("{} resources failed to apply", summary.failed);
    }
    Ok(())
}

pub fn refresh(ctx: &Context) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    if ws.state.resources.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }
    let session = ws.settings.connect()?;

    let refreshed = engine::refresh_all(
        &ws.registry,
        session.device.as_ref(),
        &ws.state.resources,
        ws.settings.jobs(),
    )?;
    for (address, state) in &refreshed {
        match state {
            Some(_) => println!("  {} {address}", "✓".green()),
            None => println!("  {} {address} {}", "-".red(), "(gone from device)".dimmed()),
        }
    }

    ws.state.merge(refreshed);
    ws.save()?;
    ui::success("State refreshed");
    Ok(())
}

pub fn import(ctx: &Context, type_name: &str, address: &str, id: &str) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    let session = ws.settings.connect()?;

    let stored = import_into(&ws.registry, session.device.as_ref(), &ws.state, type_name, address, id)?;
    ws.state.upsert(stored);
    ws.save()?;
    ui::success(&format!("Imported {address} ({id})"));
    Ok(())
}

/// Read the object with identifier `id` into a state entry at `address`.
pub fn import_into(
    registry: &Registry,
    device: &(dyn Device + 'static),
    state: &StateFile,
    type_name: &str,
    address: &str,
    id: &str,
) -> Result<StoredResource> {
    let Some(name) = address.strip_prefix(&format!("{type_name}.")) else {
        bail!("Address {address} must look like {type_name}.<name>");
    };
    if name.is_empty() {
        bail!("Address {address} has no name");
    }
    if state.get(address).is_some() {
        bail!("{address} is already managed; remove it from state first");
    }

    let resource = registry.resource(type_name)?;
    let mut data = ResourceData::from_id(id);
    resource
        .import(device, &mut data)
        .with_context(|| format!("importing {address}"))?;
    if data.is_gone() {
        bail!("No {type_name} with id {id:?} on the device");
    }
    Ok(StoredResource::new(
        address,
        type_name,
        resource.schema().version,
        data,
    ))
}

pub fn read(ctx: &Context, args: ReadArgs) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let decls = ws.declarations(ctx)?;
    let requests: Vec<&DataDecl> = decls
        .data
        .iter()
        .filter(|d| args.address.as_deref().is_none_or(|a| d.address() == a))
        .collect();
    if requests.is_empty() {
        bail!("No matching [[data]] declarations in {}", ctx.file.display());
    }
    let session = ws.settings.connect()?;

    let mut results = Map::new();
    for decl in requests {
        let data = read_data(&ws.registry, session.device.as_ref(), decl)?;
        results.insert(
            decl.address(),
            json!({"id": data.id(), "attributes": data.attributes()}),
        );
        if !args.json {
            ui::section(&decl.address());
            ui::kv("id", data.id());
            for (name, value) in data.attributes() {
                if !value.is_null() {
                    ui::kv(name, &display::render_value(Some(value), false));
                }
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Value::Object(results))?);
    }
    Ok(())
}

/// Evaluate one data source request.
pub fn read_data(
    registry: &Registry,
    device: &(dyn Device + 'static),
    decl: &DataDecl,
) -> Result<ResourceData> {
    let source = registry.data_source(&decl.type_name)?;
    let schema = source.schema();
    let mut config = decl.config.clone();
    schema.validate_config(&config)?;
    schema.apply_defaults(&mut config);

    let mut data = ResourceData::new(config);
    source
        .read(device, &mut data)
        .with_context(|| format!("reading {}", decl.address()))?;
    Ok(data)
}
