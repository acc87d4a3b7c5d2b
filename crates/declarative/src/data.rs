//! Resource data - the declarative side of a resource
//!
//! [`ResourceData`] carries a resource's opaque identifier plus its
//! attributes as JSON values. Resources read their configuration out of it
//! and write observed state back into it; the identifier going empty is how
//! a resource signals that it no longer exists.
//!
//! Getters are lenient the way configuration languages are: a missing or
//! null attribute reads as the zero value, numbers read back from strings,
//! and lists read as empty. Setters for collections store `null` instead of
//! an empty collection so that "nothing" has a single representation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute map, keyed by attribute name.
pub type Attributes = Map<String, Value>;

/// Read and write access to a set of attributes.
///
/// Implemented by [`ResourceData`] (top level) and [`Block`] (one element of
/// a nested block list), so mapping code reads the same at every depth.
pub trait Attrs {
    /// Raw value for a key, `None` if missing or null.
    fn value(&self, key: &str) -> Option<&Value>;

    /// Store a raw value.
    fn insert(&mut self, key: &str, value: Value);

    /// Whether the attribute holds a non-empty value.
    fn has(&self, key: &str) -> bool {
        self.value(key).is_some_and(|v| !is_empty_value(v))
    }

    /// String value, empty if unset.
    fn get_string(&self, key: &str) -> String {
        self.value(key).map(value_as_string).unwrap_or_default()
    }

    /// Integer value, zero if unset or unparsable.
    fn get_int(&self, key: &str) -> i64 {
        self.value(key).map(value_as_int).unwrap_or_default()
    }

    /// Boolean value, false if unset.
    fn get_bool(&self, key: &str) -> bool {
        self.value(key).is_some_and(value_as_bool)
    }

    /// List (or set) of strings, empty if unset.
    fn get_strings(&self, key: &str) -> Vec<String> {
        match self.value(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(value_as_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Map of strings, empty if unset.
    fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        match self.value(key) {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), value_as_string(v)))
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Nested block list, empty if unset.
    fn get_blocks(&self, key: &str) -> Vec<Block> {
        match self.value(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_object().cloned().map(Block))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First element of a single-item block list.
    fn get_block(&self, key: &str) -> Option<Block> {
        self.get_blocks(key).into_iter().next()
    }

    /// Store any JSON-convertible value.
    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key, value.into());
    }

    /// Store `null`.
    fn set_null(&mut self, key: &str) {
        self.insert(key, Value::Null);
    }

    /// Store a string list, `null` when empty.
    fn set_strings<I, S>(&mut self, key: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<Value> = values
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        if items.is_empty() {
            self.set_null(key);
        } else {
            self.insert(key, Value::Array(items));
        }
    }

    /// Store a string map, `null` when empty.
    fn set_string_map(&mut self, key: &str, map: &BTreeMap<String, String>) {
        if map.is_empty() {
            self.set_null(key);
        } else {
            let object: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            self.insert(key, Value::Object(object));
        }
    }

    /// Store a block list, `null` when empty.
    fn set_blocks(&mut self, key: &str, blocks: Vec<Block>) {
        if blocks.is_empty() {
            self.set_null(key);
        } else {
            let items = blocks.into_iter().map(|b| Value::Object(b.0)).collect();
            self.insert(key, Value::Array(items));
        }
    }

    /// Store a single-item block list, `null` for `None`.
    fn set_block(&mut self, key: &str, block: Option<Block>) {
        self.set_blocks(key, block.into_iter().collect());
    }
}

/// The declarative state of one resource instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: Attributes,
}

impl ResourceData {
    /// Create resource data from configuration attributes, with no identifier.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    /// Create resource data from a JSON object.
    pub fn from_value(value: Value) -> crate::Result<Self> {
        match value {
            Value::Object(attributes) => Ok(Self::new(attributes)),
            Value::Null => Ok(Self::default()),
            other => Err(crate::Error::validation(
                "<root>",
                format!("expected an object, found {other}"),
            )),
        }
    }

    /// Resource data for an existing identifier with no known attributes,
    /// as used when importing.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// The opaque identifier; empty means the resource does not exist.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Whether the identifier is empty.
    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    /// All attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable access to all attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Consume into the attribute map.
    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }

    /// Remove an attribute entirely.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }
}

impl Attrs for ResourceData {
    fn value(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    fn insert(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }
}

/// One element of a nested block list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(pub Map<String, Value>);

impl Block {
    /// Empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

impl Attrs for Block {
    fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }
}

/// Whether a value is null or an empty string, list, or map.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Render a scalar as a string.
pub fn value_as_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Read a scalar as an integer.
pub fn value_as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

/// Read a scalar as a boolean.
pub fn value_as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.as_str(), "true" | "yes"),
        Value::Number(n) => n.as_i64().is_some_and(|i| i != 0),
        _ => false,
    }
}
