//! Attribute schemas
//!
//! A [`Schema`] declares every attribute a resource understands: its type,
//! whether the user supplies it or the device computes it, whether changing
//! it forces replacement, and the constraints the configuration must meet
//! before the resource ever runs.
//!
//! ```
//! use declarative::{Attribute, Schema};
//!
//! let schema = Schema::new()
//!     .attr("template", Attribute::string().optional().force_new().conflicts_with(&["template_stack"]))
//!     .attr("template_stack", Attribute::string().optional().force_new().conflicts_with(&["template"]))
//!     .attr("name", Attribute::string().required().force_new());
//!
//! schema.validate_definition().unwrap();
//! ```

use crate::data::{Attributes, is_empty_value};
use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Type of an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrType {
    /// String scalar
    String,
    /// Integer scalar
    Int,
    /// Boolean scalar
    Bool,
    /// Ordered list
    List(Box<AttrType>),
    /// Unordered set
    Set(Box<AttrType>),
    /// Map of string to string
    Map,
    /// List of nested blocks
    Block(Box<Schema>),
}

impl AttrType {
    fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Block(_))
    }

    fn check(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::String(_) | Value::Number(_) | Value::Bool(_)) => true,
            (Self::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Int, Value::String(s)) => s.trim().parse::<i64>().is_ok(),
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Bool, Value::String(s)) => matches!(s.as_str(), "true" | "false" | "yes" | "no"),
            (Self::List(inner) | Self::Set(inner), Value::Array(items)) => {
                items.iter().all(|v| inner.check(v))
            }
            (Self::Map, Value::Object(map)) => map.values().all(|v| !v.is_array() && !v.is_object()),
            (Self::Block(_), Value::Array(items)) => items.iter().all(Value::is_object),
            _ => false,
        }
    }
}

/// Who supplies an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The configuration must set it
    Required,
    /// The configuration may set it
    Optional,
    /// Only the device sets it
    Computed,
    /// The configuration may set it; otherwise the device does
    OptionalComputed,
}

impl Mode {
    /// Whether the configuration may set the attribute.
    pub fn is_configurable(&self) -> bool {
        !matches!(self, Self::Computed)
    }

    /// Whether the device may supply the value.
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed | Self::OptionalComputed)
    }
}

/// Definition of one attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    /// Value type
    pub kind: AttrType,
    /// Who supplies the value
    pub mode: Mode,
    /// Changing the value destroys and recreates the resource
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_new: bool,
    /// The value is never displayed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    /// Value used when the configuration omits the attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Attributes that may not be set alongside this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    /// Upper bound on list length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Allowed string values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
    /// Regex string values must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Human-readable description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Attribute {
    fn of(kind: AttrType) -> Self {
        Self {
            kind,
            mode: Mode::Optional,
            force_new: false,
            sensitive: false,
            default: None,
            conflicts_with: Vec::new(),
            max_items: None,
            one_of: Vec::new(),
            pattern: None,
            description: String::new(),
        }
    }

    /// String attribute.
    pub fn string() -> Self {
        Self::of(AttrType::String)
    }

    /// Integer attribute.
    pub fn int() -> Self {
        Self::of(AttrType::Int)
    }

    /// Boolean attribute.
    pub fn bool() -> Self {
        Self::of(AttrType::Bool)
    }

    /// Ordered list of strings.
    pub fn strings() -> Self {
        Self::of(AttrType::List(Box::new(AttrType::String)))
    }

    /// Unordered set of strings.
    pub fn string_set() -> Self {
        Self::of(AttrType::Set(Box::new(AttrType::String)))
    }

    /// Map of string to string.
    pub fn string_map() -> Self {
        Self::of(AttrType::Map)
    }

    /// List of nested blocks.
    pub fn block(schema: Schema) -> Self {
        Self::of(AttrType::Block(Box::new(schema)))
    }

    /// Single nested block (a block list capped at one element).
    pub fn single_block(schema: Schema) -> Self {
        Self::block(schema).max_items(1)
    }

    /// Must be set.
    pub fn required(mut self) -> Self {
        self.mode = Mode::Required;
        self
    }

    /// May be set.
    pub fn optional(mut self) -> Self {
        self.mode = Mode::Optional;
        self
    }

    /// Set only by the device.
    pub fn computed(mut self) -> Self {
        self.mode = Mode::Computed;
        self
    }

    /// May be set, otherwise filled in by the device.
    pub fn optional_computed(mut self) -> Self {
        self.mode = Mode::OptionalComputed;
        self
    }

    /// Changes force replacement.
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Never displayed.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mutually exclusive siblings.
    pub fn conflicts_with(mut self, others: &[&str]) -> Self {
        self.conflicts_with = others.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Cap on list length.
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Enumerated string values.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = values.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Regex the value must match.
    pub fn pattern(mut self, regex: &str) -> Self {
        self.pattern = Some(regex.to_string());
        self
    }

    /// Description.
    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }
}

/// Schema of a resource, data source, or nested block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// Schema revision; stored state older than this is upgraded
    pub version: u32,
    /// Attributes by name
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    /// Empty schema at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema version.
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    /// Look up an attribute.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Names of attributes whose change forces replacement.
    pub fn force_new_keys(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.force_new)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Names of sensitive attributes.
    pub fn sensitive_keys(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.sensitive)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Check the schema itself: references resolve and options make sense.
    pub fn validate_definition(&self) -> Result<()> {
        for (name, attr) in &self.attributes {
            for other in &attr.conflicts_with {
                if other == name {
                    return Err(definition_error(name, "conflicts with itself"));
                }
                if !self.attributes.contains_key(other) {
                    return Err(definition_error(
                        name,
                        &format!("conflicts_with references unknown attribute {other}"),
                    ));
                }
            }
            if attr.mode == Mode::Required && attr.default.is_some() {
                return Err(definition_error(name, "required attributes cannot have a default"));
            }
            if attr.mode == Mode::Required && !attr.conflicts_with.is_empty() {
                return Err(definition_error(name, "required attributes cannot conflict"));
            }
            if attr.max_items.is_some() && !attr.kind.is_collection() {
                return Err(definition_error(name, "max_items only applies to collections"));
            }
            if let Some(pattern) = &attr.pattern {
                Regex::new(pattern)
                    .map_err(|e| definition_error(name, &format!("bad pattern: {e}")))?;
            }
            if let AttrType::Block(inner) = &attr.kind {
                inner.validate_definition().map_err(|e| match e {
                    Error::SchemaDefinition { attribute, message } => Error::SchemaDefinition {
                        attribute: format!("{name}.{attribute}"),
                        message,
                    },
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    /// Check configuration attributes against the schema.
    pub fn validate_config(&self, attrs: &Attributes) -> Result<()> {
        self.validate_at("", attrs)
    }

    fn validate_at(&self, prefix: &str, attrs: &Attributes) -> Result<()> {
        let path = |name: &str| format!("{prefix}{name}");

        for key in attrs.keys() {
            if !self.attributes.contains_key(key) {
                return Err(Error::validation(path(key), "unsupported attribute"));
            }
        }

        for (name, attr) in &self.attributes {
            let value = attrs.get(name).filter(|v| !v.is_null());
            let set = value.is_some_and(|v| !is_empty_value(v));

            if attr.mode == Mode::Required && !set {
                return Err(Error::validation(path(name), "required attribute is missing"));
            }
            if attr.mode == Mode::Computed && set {
                return Err(Error::validation(path(name), "computed attribute cannot be set"));
            }
            let Some(value) = value else { continue };

            if !attr.kind.check(value) {
                return Err(Error::validation(path(name), "value has the wrong type"));
            }

            if set {
                for other in &attr.conflicts_with {
                    if attrs.get(other).is_some_and(|v| !is_empty_value(v)) {
                        return Err(Error::Conflict {
                            first: path(name),
                            second: path(other),
                        });
                    }
                }
            }

            if let (Some(max), Value::Array(items)) = (attr.max_items, value)
                && items.len() > max
            {
                return Err(Error::validation(
                    path(name),
                    format!("at most {max} item(s) allowed, found {}", items.len()),
                ));
            }

            if let Value::String(s) = value {
                if !attr.one_of.is_empty() && !s.is_empty() && !attr.one_of.contains(s) {
                    return Err(Error::validation(
                        path(name),
                        format!("{s:?} is not one of {}", attr.one_of.join(", ")),
                    ));
                }
                if let Some(pattern) = &attr.pattern {
                    let re = Regex::new(pattern)
                        .map_err(|e| definition_error(name, &format!("bad pattern: {e}")))?;
                    if !re.is_match(s) {
                        return Err(Error::validation(
                            path(name),
                            format!("{s:?} does not match {pattern}"),
                        ));
                    }
                }
            }

            if let (AttrType::Block(inner), Value::Array(items)) = (&attr.kind, value) {
                for (i, item) in items.iter().enumerate() {
                    if let Value::Object(block) = item {
                        inner.validate_at(&format!("{prefix}{name}.{i}."), block)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fill defaults for attributes the configuration omitted.
    pub fn apply_defaults(&self, attrs: &mut Attributes) {
        for (name, attr) in &self.attributes {
            let missing = attrs.get(name).is_none_or(Value::is_null);
            if missing && let Some(default) = &attr.default {
                attrs.insert(name.clone(), default.clone());
            }
            if let (AttrType::Block(inner), Some(Value::Array(items))) =
                (&attr.kind, attrs.get_mut(name))
            {
                for item in items.iter_mut() {
                    if let Value::Object(block) = item {
                        inner.apply_defaults(block);
                    }
                }
            }
        }
    }

    /// Derive a read-only data source schema.
    ///
    /// Attributes named in `lookup` stay configurable (they identify the
    /// object); everything else becomes computed. Replacement and conflict
    /// rules are dropped since a data source never writes.
    pub fn to_data_source(&self, lookup: &[&str]) -> Self {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let mut attr = attr.clone();
                attr.force_new = false;
                attr.conflicts_with.clear();
                if lookup.contains(&name.as_str()) {
                    if attr.mode == Mode::Computed {
                        attr.mode = Mode::Optional;
                    }
                } else {
                    attr.mode = Mode::Computed;
                    attr.default = None;
                    attr.max_items = None;
                }
                (name.clone(), attr)
            })
            .collect();
        Self {
            version: 0,
            attributes,
        }
    }
}

fn definition_error(attribute: &str, message: &str) -> Error {
    Error::SchemaDefinition {
        attribute: attribute.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scoped() -> Schema {
        Schema::new()
            .attr(
                "template",
                Attribute::string()
                    .optional()
                    .force_new()
                    .conflicts_with(&["template_stack"]),
            )
            .attr(
                "template_stack",
                Attribute::string()
                    .optional()
                    .force_new()
                    .conflicts_with(&["template"]),
            )
            .attr("vsys", Attribute::string().optional().default("shared"))
            .attr("name", Attribute::string().required().force_new())
            .attr("protocol", Attribute::string().optional().one_of(&["CHAP", "PAP"]))
            .attr("enc", Attribute::string().computed())
            .attr(
                "server",
                Attribute::block(
                    Schema::new()
                        .attr("name", Attribute::string().required())
                        .attr("port", Attribute::int().optional().default(1812)),
                ),
            )
    }

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_definition_ok() {
        scoped().validate_definition().unwrap();
    }

    #[test]
    fn test_definition_unknown_conflict() {
        let schema = Schema::new().attr("a", Attribute::string().conflicts_with(&["b"]));
        assert!(matches!(
            schema.validate_definition(),
            Err(Error::SchemaDefinition { .. })
        ));
    }

    #[test]
    fn test_required_missing() {
        let err = scoped().validate_config(&attrs(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "name: required attribute is missing");
    }

    #[test]
    fn test_conflict_detected() {
        let err = scoped()
            .validate_config(&attrs(json!({
                "name": "x",
                "template": "t",
                "template_stack": "s",
            })))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[test]
    fn test_empty_conflict_sibling_is_fine() {
        scoped()
            .validate_config(&attrs(json!({
                "name": "x",
                "template": "t",
                "template_stack": "",
            })))
            .unwrap();
    }

    #[test]
    fn test_enum_and_computed() {
        let schema = scoped();
        assert!(
            schema
                .validate_config(&attrs(json!({"name": "x", "protocol": "EAP"})))
                .is_err()
        );
        assert!(
            schema
                .validate_config(&attrs(json!({"name": "x", "enc": "abc"})))
                .is_err()
        );
    }

    #[test]
    fn test_nested_block_validation() {
        let err = scoped()
            .validate_config(&attrs(json!({
                "name": "x",
                "server": [{"name": "s1"}, {"port": 1}],
            })))
            .unwrap_err();
        assert_eq!(err.to_string(), "server.1.name: required attribute is missing");
    }

    #[test]
    fn test_apply_defaults() {
        let mut config = attrs(json!({"name": "x", "server": [{"name": "s1"}]}));
        scoped().apply_defaults(&mut config);
        assert_eq!(config["vsys"], json!("shared"));
        assert_eq!(config["server"][0]["port"], json!(1812));
    }

    #[test]
    fn test_data_source_derivation() {
        let ds = scoped().to_data_source(&["template", "template_stack", "vsys", "name"]);
        assert_eq!(ds.get("name").unwrap().mode, Mode::Required);
        assert_eq!(ds.get("protocol").unwrap().mode, Mode::Computed);
        assert_eq!(ds.get("server").unwrap().mode, Mode::Computed);
        assert!(ds.get("template").unwrap().conflicts_with.is_empty());
        assert!(ds.force_new_keys().is_empty());
    }
}
