//! Plan rendering

use colored::{ColoredString, Colorize};
use declarative::sensitive::RAW_SUFFIX;
use declarative::{
    Action, AttrType, AttributeChange, Attributes, DiffSummary, ResourceDiff, Schema,
    group_by_type,
};
use serde_json::Value;

use crate::ui;

/// Strings longer than this get a line diff instead of `old → new`.
const LONG_VALUE: usize = 60;

fn symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => "+".green(),
        Action::Delete => "-".red(),
        Action::Update => "~".yellow(),
        Action::Replace => "-/+".magenta(),
        Action::NoOp => " ".normal(),
    }
}

/// One attribute value as shown in a plan.
pub fn render_value(value: Option<&Value>, sensitive: bool) -> String {
    match value {
        None => "(unset)".to_string(),
        Some(_) if sensitive => "(sensitive)".to_string(),
        Some(Value::String(s)) => format!("{s:?}"),
        Some(other) => other.to_string(),
    }
}

fn is_long(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.len() > LONG_VALUE || s.contains('\n'))
}

/// Lines of a unified diff between two long strings.
pub fn text_diff(before: &str, after: &str) -> Vec<String> {
    let diff = similar::TextDiff::from_lines(before, after);
    let mut lines = Vec::new();
    for change in diff.iter_all_changes() {
        let text = change.value().trim_end_matches('\n');
        match change.tag() {
            similar::ChangeTag::Delete => lines.push(format!("- {text}").red().to_string()),
            similar::ChangeTag::Insert => lines.push(format!("+ {text}").green().to_string()),
            similar::ChangeTag::Equal => {}
        }
    }
    lines
}

fn display_change(change: &AttributeChange) {
    let replace = if change.forces_replacement {
        " (forces replacement)".red().to_string()
    } else {
        String::new()
    };

    let long = !change.sensitive && (is_long(change.before.as_ref()) || is_long(change.after.as_ref()));
    if long {
        println!("│       {}:{}", change.name, replace);
        let before = change.before.as_ref().and_then(Value::as_str).unwrap_or_default();
        let after = change.after.as_ref().and_then(Value::as_str).unwrap_or_default();
        for line in text_diff(before, after) {
            println!("│         {line}");
        }
        return;
    }

    let after = render_value(change.after.as_ref(), change.sensitive);
    match &change.before {
        None => println!("│       {} = {}{}", change.name, after, replace),
        Some(_) => println!(
            "│       {} = {} → {}{}",
            change.name,
            render_value(change.before.as_ref(), change.sensitive).dimmed(),
            after,
            replace
        ),
    }
}

/// Display planned changes grouped by resource type
pub fn display_plan(diffs: &[ResourceDiff], verbose: bool) {
    let changes: Vec<ResourceDiff> = diffs
        .iter()
        .filter(|d| d.action.is_change())
        .cloned()
        .collect();
    if changes.is_empty() {
        println!();
        println!("  {} No changes. Device matches the configuration.", "✓".green());
        return;
    }

    let groups = group_by_type(&changes);
    let mut types: Vec<&String> = groups.keys().collect();
    types.sort();

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");
    for type_name in types {
        println!("│ {}", type_name.bold());
        for diff in &groups[type_name] {
            println!(
                "│   {} {} {}",
                symbol(diff.action),
                diff.address,
                format!("({})", diff.action.label()).dimmed()
            );
            if verbose || diff.action != Action::Create {
                for change in &diff.changes {
                    display_change(change);
                }
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(&changes);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to add, {} to change, {} to replace, {} to destroy",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.replacements.to_string().magenta(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

const REDACTED: &str = "(sensitive)";

/// Copy of `attrs` with sensitive values, at any depth, replaced.
pub fn redact(attrs: &Attributes, schema: &Schema) -> Attributes {
    attrs
        .iter()
        .map(|(name, value)| {
            let attr = schema.get(name);
            let hidden = name.ends_with(RAW_SUFFIX) || attr.is_some_and(|a| a.sensitive);
            let value = match (attr.map(|a| &a.kind), value) {
                _ if hidden && !value.is_null() => Value::String(REDACTED.to_string()),
                (Some(AttrType::Block(inner)), Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::Object(block) => Value::Object(redact(block, inner)),
                            other => other.clone(),
                        })
                        .collect(),
                ),
                _ => value.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Short one-line summary of stored attributes, for `state show`.
pub fn describe_attributes(attrs: &Attributes, max_len: usize) -> String {
    let rendered: Vec<String> = attrs
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| format!("{k}={}", render_value(Some(v), false)))
        .collect();
    ui::truncate(&rendered.join(" "), max_len)
}
