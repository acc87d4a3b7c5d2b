//! `state`: inspect and migrate stored state without touching the device.

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{StoredResource, upgrade_stored};
use panoskit::Device;

use crate::Context;
use crate::cli::StateCommand;
use crate::commands::declarative::Workspace;
use crate::engine::display;
use crate::ui;

type Registry = declarative::Provider<dyn Device>;

pub fn run(ctx: &Context, cmd: StateCommand) -> Result<()> {
    match cmd {
        StateCommand::Show { address } => show(ctx, address.as_deref()),
        StateCommand::Upgrade { dry_run } => upgrade(ctx, dry_run),
        StateCommand::Rm { address } => rm(ctx, &address),
    }
}

fn show(ctx: &Context, address: Option<&str>) -> Result<()> {
    let ws = Workspace::open(ctx)?;

    if let Some(address) = address {
        let Some(stored) = ws.state.get(address) else {
            bail!("{address} is not in state");
        };
        let schema = ws.registry.resource(&stored.type_name)?.schema();
        ui::header(address);
        ui::kv("type", &stored.type_name);
        ui::kv("id", stored.data.id());
        ui::kv("schema_version", &stored.schema_version.to_string());
        if !stored.depends_on.is_empty() {
            ui::kv("depends_on", &stored.depends_on.join(", "));
        }
        println!();
        for (name, value) in display::redact(stored.data.attributes(), &schema) {
            if !value.is_null() {
                ui::kv(&name, &display::render_value(Some(&value), false));
            }
        }
        return Ok(());
    }

    if ws.state.resources.is_empty() {
        ui::info("No resources in state");
        return Ok(());
    }
    ui::header(&format!(
        "State ({} resources, updated {})",
        ws.state.resources.len(),
        ws.state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    for stored in &ws.state.resources {
        println!(
            "  {} {} {}",
            stored.address.bold(),
            stored.data.id().cyan(),
            format!("v{}", stored.schema_version).dimmed()
        );
        if ctx.verbose > 0 {
            let shown = match ws.registry.resource(&stored.type_name) {
                Ok(resource) => display::redact(stored.data.attributes(), &resource.schema()),
                Err(_) => stored.data.attributes().clone(),
            };
            ui::dim(&display::describe_attributes(&shown, 100));
        }
    }
    Ok(())
}

/// Upgrade every stored resource whose schema version is behind.
///
/// Returns the upgraded entries with their previous versions.
pub fn upgrade_all(
    registry: &Registry,
    resources: &[StoredResource],
) -> Result<Vec<(u32, StoredResource)>> {
    let mut upgraded = Vec::new();
    for stored in resources {
        let resource = registry.resource(&stored.type_name)?;
        if stored.schema_version >= resource.schema().version {
            continue;
        }
        upgraded.push((stored.schema_version, upgrade_stored(resource, stored)?));
    }
    Ok(upgraded)
}

fn upgrade(ctx: &Context, dry_run: bool) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    let upgraded = upgrade_all(&ws.registry, &ws.state.resources)?;
    if upgraded.is_empty() {
        ui::success("State is up to date");
        return Ok(());
    }

    for (from, stored) in &upgraded {
        println!(
            "  {} {} v{from} → v{}",
            "~".yellow(),
            stored.address,
            stored.schema_version
        );
    }
    if dry_run {
        ui::info("Dry run - state not written");
        return Ok(());
    }

    let count = upgraded.len();
    for (_, stored) in upgraded {
        ws.state.upsert(stored);
    }
    ws.save()?;
    ui::success(&format!("Upgraded {count} resources"));
    Ok(())
}

fn rm(ctx: &Context, address: &str) -> Result<()> {
    let mut ws = Workspace::open(ctx)?;
    if ws.state.remove(address).is_none() {
        bail!("{address} is not in state");
    }
    ws.save()?;
    ui::success(&format!("Removed {address} from state; the device object is untouched"));
    Ok(())
}
