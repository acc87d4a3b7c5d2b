//! `schema`: what each resource and data source accepts.

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{AttrType, Attribute, Mode, Schema};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::Context;
use crate::cli::{SchemaArgs, SchemaFormat};
use crate::provider::provider;
use crate::ui;

#[derive(Serialize)]
struct SchemaDump {
    provider: &'static str,
    resources: BTreeMap<&'static str, Schema>,
    data_sources: BTreeMap<&'static str, Schema>,
}

pub fn run(_ctx: &Context, args: SchemaArgs) -> Result<()> {
    let registry = provider();
    let mut dump = SchemaDump {
        provider: registry.name(),
        resources: registry.resource_schemas(),
        data_sources: registry.data_source_schemas(),
    };

    if let Some(type_name) = &args.type_name {
        dump.resources.retain(|name, _| *name == type_name.as_str());
        dump.data_sources.retain(|name, _| *name == type_name.as_str());
        if dump.resources.is_empty() && dump.data_sources.is_empty() {
            bail!("No resource or data source named {type_name}");
        }
    }

    if args.format == SchemaFormat::Json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    for (name, schema) in &dump.resources {
        print_schema("resource", name, schema);
    }
    for (name, schema) in &dump.data_sources {
        print_schema("data source", name, schema);
    }
    Ok(())
}

pub fn kind_label(kind: &AttrType) -> String {
    match kind {
        AttrType::String => "string".to_string(),
        AttrType::Int => "int".to_string(),
        AttrType::Bool => "bool".to_string(),
        AttrType::List(inner) => format!("list({})", kind_label(inner)),
        AttrType::Set(inner) => format!("set({})", kind_label(inner)),
        AttrType::Map => "map".to_string(),
        AttrType::Block(_) => "block".to_string(),
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Required => "required",
        Mode::Optional => "optional",
        Mode::Computed => "computed",
        Mode::OptionalComputed => "optional, computed",
    }
}

fn flags(attr: &Attribute) -> String {
    let mut flags = vec![mode_label(attr.mode).to_string()];
    if attr.force_new {
        flags.push("forces replacement".into());
    }
    if attr.sensitive {
        flags.push("sensitive".into());
    }
    if let Some(default) = &attr.default {
        flags.push(format!("default {default}"));
    }
    if !attr.conflicts_with.is_empty() {
        flags.push(format!("conflicts with {}", attr.conflicts_with.join(", ")));
    }
    flags.join(", ")
}

fn print_attributes(schema: &Schema, depth: usize) {
    let indent = "  ".repeat(depth);
    for (name, attr) in &schema.attributes {
        println!(
            "{indent}  {} {} {}",
            name.bold(),
            kind_label(&attr.kind).cyan(),
            format!("({})", flags(attr)).dimmed()
        );
        if !attr.description.is_empty() {
            println!("{indent}    {}", attr.description.dimmed());
        }
        if let AttrType::Block(inner) = &attr.kind {
            print_attributes(inner, depth + 1);
        }
    }
}

fn print_schema(what: &str, name: &str, schema: &Schema) {
    ui::header(&format!("{name} ({what}, v{})", schema.version));
    print_attributes(schema, 0);
}
