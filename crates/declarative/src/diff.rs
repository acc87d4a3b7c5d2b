//! Diff computation for resources
//!
//! Compares the prior observed state of a resource with its configuration
//! and decides what has to happen. Only attributes the configuration can
//! set take part; computed attributes follow whatever the device reports.
//! Values are compared in a normalized form so that `null`, `""`, and `[]`
//! all mean "unset", numbers match their string forms, and sets ignore
//! order.

use crate::data::{Attributes, ResourceData, is_empty_value, value_as_string};
use crate::schema::{AttrType, Mode, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// What a plan does with one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Nothing to do
    NoOp,
    /// Create a new object
    Create,
    /// Change the object in place
    Update,
    /// Destroy and recreate
    Replace,
    /// Destroy
    Delete,
}

impl Action {
    /// Whether the action touches the device.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp)
    }

    /// Verb used in progress output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
            Self::Delete => "destroy",
        }
    }

    /// Marker used in plan output.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoOp => " ",
            Self::Create => "+",
            Self::Update => "~",
            Self::Replace => "-/+",
            Self::Delete => "-",
        }
    }
}

/// One attribute that differs between prior state and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name
    pub name: String,
    /// Prior value, `None` if unset
    pub before: Option<Value>,
    /// Configured value, `None` if unset
    pub after: Option<Value>,
    /// Whether the value must not be displayed
    pub sensitive: bool,
    /// Whether this change alone forces replacement
    pub forces_replacement: bool,
}

/// The planned change for one resource instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Address of the instance
    pub address: String,
    /// Resource type
    pub type_name: String,
    /// What will happen
    pub action: Action,
    /// Attribute-level differences
    pub changes: Vec<AttributeChange>,
    /// Observed state before the change
    pub prior: Option<ResourceData>,
    /// Configuration with defaults applied; `None` when no longer declared
    pub config: Option<Attributes>,
    /// Addresses that must be applied first
    pub depends_on: Vec<String>,
}

impl ResourceDiff {
    /// Plan one instance from its prior state and configuration.
    pub fn compute(
        address: impl Into<String>,
        type_name: impl Into<String>,
        schema: &Schema,
        prior: Option<ResourceData>,
        config: Option<Attributes>,
        depends_on: Vec<String>,
    ) -> Self {
        let prior = prior.filter(|p| !p.is_gone());
        let (action, changes) = plan_change(schema, prior.as_ref(), config.as_ref());
        Self {
            address: address.into(),
            type_name: type_name.into(),
            action,
            changes,
            prior,
            config,
            depends_on,
        }
    }

    /// Data to hand to create (no prior) or update (with prior).
    pub fn planned(&self, schema: &Schema) -> Option<ResourceData> {
        let prior = match self.action {
            Action::Update | Action::NoOp => self.prior.as_ref(),
            _ => None,
        };
        self.config.as_ref().map(|c| planned_data(schema, prior, c))
    }
}

/// Decide the action for one resource and list the differing attributes.
///
/// `config` is expected to have had schema defaults applied.
pub fn plan_change(
    schema: &Schema,
    prior: Option<&ResourceData>,
    config: Option<&Attributes>,
) -> (Action, Vec<AttributeChange>) {
    let prior = prior.filter(|p| !p.is_gone());
    match (prior, config) {
        (None, None) => (Action::NoOp, Vec::new()),
        (None, Some(config)) => {
            let changes = schema
                .attributes
                .iter()
                .filter_map(|(name, attr)| {
                    let after = config.get(name).filter(|v| !is_empty_value(v))?;
                    Some(AttributeChange {
                        name: name.clone(),
                        before: None,
                        after: Some(after.clone()),
                        sensitive: attr.sensitive,
                        forces_replacement: false,
                    })
                })
                .collect();
            (Action::Create, changes)
        }
        (Some(_), None) => (Action::Delete, Vec::new()),
        (Some(prior), Some(config)) => {
            let changes = attribute_changes(schema, prior.attributes(), config);
            let action = if changes.is_empty() {
                Action::NoOp
            } else if changes.iter().any(|c| c.forces_replacement) {
                Action::Replace
            } else {
                Action::Update
            };
            (action, changes)
        }
    }
}

fn attribute_changes(schema: &Schema, prior: &Attributes, config: &Attributes) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    for (name, attr) in &schema.attributes {
        if !attr.mode.is_configurable() {
            continue;
        }
        let after = config.get(name).filter(|v| !is_empty_value(v));
        if after.is_none() && attr.mode == Mode::OptionalComputed {
            continue;
        }
        let before = prior.get(name).filter(|v| !is_empty_value(v));
        if normalize(&attr.kind, before) == normalize(&attr.kind, after) {
            continue;
        }
        changes.push(AttributeChange {
            name: name.clone(),
            before: before.cloned(),
            after: after.cloned(),
            sensitive: attr.sensitive,
            forces_replacement: attr.force_new,
        });
    }
    changes
}

/// Data to hand to create or update.
///
/// Starts from the prior observed attributes so computed bookkeeping (echo
/// pairs, device-assigned values) survives, then lays the configuration on
/// top. Configurable attributes the configuration leaves out are cleared,
/// except optional-computed ones, which keep the device's value.
pub fn planned_data(schema: &Schema, prior: Option<&ResourceData>, config: &Attributes) -> ResourceData {
    let mut data = prior.filter(|p| !p.is_gone()).cloned().unwrap_or_default();
    for (name, attr) in &schema.attributes {
        match config.get(name) {
            Some(value) if !value.is_null() => {
                data.attributes_mut().insert(name.clone(), value.clone());
            }
            _ if attr.mode == Mode::Required || attr.mode == Mode::Optional => {
                data.attributes_mut().insert(name.clone(), Value::Null);
            }
            _ => {}
        }
    }
    data
}

/// Normalized form used for equality.
fn normalize(kind: &AttrType, value: Option<&Value>) -> Option<Value> {
    let value = value.filter(|v| !is_empty_value(v))?;
    let normalized = match (kind, value) {
        (AttrType::List(inner), Value::Array(items)) => {
            Value::Array(items.iter().filter_map(|v| normalize(inner, Some(v))).collect())
        }
        (AttrType::Set(inner), Value::Array(items)) => {
            let mut items: Vec<Value> = items.iter().filter_map(|v| normalize(inner, Some(v))).collect();
            items.sort_by_key(ToString::to_string);
            items.dedup();
            Value::Array(items)
        }
        (AttrType::Map, Value::Object(map)) => Value::Object(
            map.iter()
                .filter(|(_, v)| !is_empty_value(v))
                .map(|(k, v)| (k.clone(), Value::String(value_as_string(v))))
                .collect(),
        ),
        (AttrType::Block(inner), Value::Array(items)) => Value::Array(
            items
                .iter()
                .filter_map(|item| item.as_object().map(|block| normalize_block(inner, block)))
                .collect(),
        ),
        (_, Value::Array(_) | Value::Object(_)) => value.clone(),
        (_, scalar) => Value::String(value_as_string(scalar)),
    };
    Some(normalized)
}

fn normalize_block(schema: &Schema, block: &Map<String, Value>) -> Value {
    let fields = schema
        .attributes
        .iter()
        .filter(|(_, attr)| attr.mode.is_configurable())
        .filter_map(|(name, attr)| {
            normalize(&attr.kind, block.get(name)).map(|v| (name.clone(), v))
        })
        .collect();
    Value::Object(fields)
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to create
    pub additions: usize,
    /// Number of resources to change in place
    pub modifications: usize,
    /// Number of resources to replace
    pub replacements: usize,
    /// Number of resources to destroy
    pub removals: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.action {
                Action::Create => summary.additions += 1,
                Action::Update => summary.modifications += 1,
                Action::Replace => summary.replacements += 1,
                Action::Delete => summary.removals += 1,
                Action::NoOp => {}
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications + self.replacements + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(diffs: &[ResourceDiff]) -> HashMap<String, Vec<&ResourceDiff>> {
    let mut groups: HashMap<String, Vec<&ResourceDiff>> = HashMap::new();
    for diff in diffs {
        groups.entry(diff.type_name.clone()).or_default().push(diff);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .attr("vsys", Attribute::string().optional().force_new().default("vsys1"))
            .attr("name", Attribute::string().required().force_new())
            .attr("description", Attribute::string().optional())
            .attr("sites", Attribute::string_set().optional())
            .attr("uuid", Attribute::string().optional_computed())
            .attr("secret_enc", Attribute::string().computed().sensitive())
            .attr(
                "server",
                Attribute::block(
                    Schema::new()
                        .attr("name", Attribute::string().required())
                        .attr("port", Attribute::int().optional()),
                ),
            )
    }

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn prior(id: &str, value: Value) -> ResourceData {
        let mut d = ResourceData::new(attrs(value));
        d.set_id(id);
        d
    }

    #[test]
    fn test_create_and_delete() {
        let config = attrs(json!({"vsys": "vsys1", "name": "a", "description": ""}));
        let (action, changes) = plan_change(&schema(), None, Some(&config));
        assert_eq!(action, Action::Create);
        assert_eq!(changes.len(), 2);

        let p = prior("vsys1:a", json!({"name": "a"}));
        assert_eq!(plan_change(&schema(), Some(&p), None).0, Action::Delete);
        assert_eq!(plan_change(&schema(), None, None).0, Action::NoOp);
    }

    #[test]
    fn test_gone_prior_plans_create() {
        let gone = ResourceData::new(attrs(json!({"name": "a"})));
        let config = attrs(json!({"name": "a"}));
        assert_eq!(plan_change(&schema(), Some(&gone), Some(&config)).0, Action::Create);
    }

    #[test]
    fn test_normalized_equality_is_noop() {
        let p = prior(
            "vsys1:a",
            json!({
                "vsys": "vsys1",
                "name": "a",
                "description": null,
                "sites": ["b.com", "a.com"],
                "uuid": "1234",
                "secret_enc": "-AQ==x",
                "server": [{"name": "s1", "port": 1812}],
            }),
        );
        let config = attrs(json!({
            "vsys": "vsys1",
            "name": "a",
            "description": "",
            "sites": ["a.com", "b.com"],
            "server": [{"name": "s1", "port": "1812"}],
        }));
        let (action, changes) = plan_change(&schema(), Some(&p), Some(&config));
        assert_eq!(action, Action::NoOp, "{changes:?}");
    }

    #[test]
    fn test_update_vs_replace() {
        let p = prior("vsys1:a", json!({"vsys": "vsys1", "name": "a", "description": "x"}));

        let update = attrs(json!({"vsys": "vsys1", "name": "a", "description": "y"}));
        assert_eq!(plan_change(&schema(), Some(&p), Some(&update)).0, Action::Update);

        let replace = attrs(json!({"vsys": "vsys2", "name": "a", "description": "x"}));
        let (action, changes) = plan_change(&schema(), Some(&p), Some(&replace));
        assert_eq!(action, Action::Replace);
        assert!(changes.iter().any(|c| c.name == "vsys" && c.forces_replacement));
    }

    #[test]
    fn test_planned_data_keeps_computed() {
        let p = prior(
            "vsys1:a",
            json!({"vsys": "vsys1", "name": "a", "description": "x", "uuid": "1", "secret_enc": "e"}),
        );
        let config = attrs(json!({"vsys": "vsys1", "name": "a"}));
        let d = planned_data(&schema(), Some(&p), &config);

        assert_eq!(d.id(), "vsys1:a");
        assert_eq!(d.attributes()["description"], Value::Null);
        assert_eq!(d.attributes()["uuid"], json!("1"));
        assert_eq!(d.attributes()["secret_enc"], json!("e"));
    }

    #[test]
    fn test_summary() {
        let s = schema();
        let config = attrs(json!({"name": "a"}));
        let diffs = vec![
            ResourceDiff::compute("x.a", "x", &s, None, Some(config), vec![]),
            ResourceDiff::compute("x.b", "x", &s, Some(prior("vsys1:b", json!({}))), None, vec![]),
        ];
        let summary = DiffSummary::from_diffs(&diffs);
        assert_eq!(summary.additions, 1);
        assert_eq!(summary.removals, 1);
        assert!(summary.has_changes());
        assert_eq!(group_by_type(&diffs)["x"].len(), 2);
    }
}
