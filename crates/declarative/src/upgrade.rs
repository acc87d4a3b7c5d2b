//! Stored-state upgrades
//!
//! Every resource schema carries a version. State written by an older
//! version is run through the resource's upgraders, in version order, before
//! anything reads it. Each upgrader is a pure function from the attribute
//! map at one version to the map at the next; a version with no upgrader
//! needs no changes.
//!
//! Upgraders must be idempotent: running the pipeline over state that is
//! already current leaves it untouched.

use crate::data::Attributes;
use crate::error::{Error, Result};
use serde_json::Value;

/// Signature of a single upgrade step.
pub type UpgradeFn = fn(Attributes) -> Result<Attributes>;

/// Upgrade from one schema version to the next.
#[derive(Debug, Clone, Copy)]
pub struct StateUpgrader {
    /// Version the step reads
    pub from: u32,
    /// The step itself
    pub upgrade: UpgradeFn,
}

impl StateUpgrader {
    /// Upgrader for state written at `from`.
    pub const fn new(from: u32, upgrade: UpgradeFn) -> Self {
        Self { from, upgrade }
    }
}

/// Bring attributes written at `stored` up to `current`.
pub fn upgrade_state(
    stored: u32,
    current: u32,
    upgraders: &[StateUpgrader],
    mut attrs: Attributes,
) -> Result<Attributes> {
    if stored > current {
        return Err(Error::Upgrade {
            from: stored,
            message: format!("state is newer than schema version {current}"),
        });
    }

    for version in stored..current {
        if let Some(step) = upgraders.iter().find(|u| u.from == version) {
            log::debug!("upgrading state from schema version {version}");
            attrs = (step.upgrade)(attrs)?;
        }
    }
    Ok(attrs)
}

/// Set `key` to `value` if it is missing or null.
pub fn fill_missing(attrs: &mut Attributes, key: &str, value: impl Into<Value>) {
    if attrs.get(key).is_none_or(Value::is_null) {
        attrs.insert(key.to_string(), value.into());
    }
}

/// Recast a numeric attribute to its string form.
pub fn int_to_string(attrs: &mut Attributes, key: &str) {
    if let Some(Value::Number(n)) = attrs.get(key) {
        let recast = Value::String(n.to_string());
        attrs.insert(key.to_string(), recast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v0_to_v1(mut attrs: Attributes) -> Result<Attributes> {
        fill_missing(&mut attrs, "vsys", "vsys1");
        Ok(attrs)
    }

    fn v1_to_v2(mut attrs: Attributes) -> Result<Attributes> {
        int_to_string(&mut attrs, "attempts");
        Ok(attrs)
    }

    const UPGRADERS: &[StateUpgrader] = &[
        StateUpgrader::new(0, v0_to_v1),
        StateUpgrader::new(1, v1_to_v2),
    ];

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_pipeline_in_order() {
        let out = upgrade_state(0, 2, UPGRADERS, attrs(json!({"name": "vr", "attempts": 5})))
            .unwrap();
        assert_eq!(out["vsys"], json!("vsys1"));
        assert_eq!(out["attempts"], json!("5"));
    }

    #[test]
    fn test_partial_pipeline() {
        let out = upgrade_state(1, 2, UPGRADERS, attrs(json!({"attempts": 3}))).unwrap();
        assert!(!out.contains_key("vsys"));
        assert_eq!(out["attempts"], json!("3"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let once = upgrade_state(0, 2, UPGRADERS, attrs(json!({"name": "vr", "attempts": 5})))
            .unwrap();
        let twice = upgrade_state(0, 2, UPGRADERS, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut a = attrs(json!({"vsys": "vsys3"}));
        fill_missing(&mut a, "vsys", "vsys1");
        assert_eq!(a["vsys"], json!("vsys3"));
    }

    #[test]
    fn test_newer_state_rejected() {
        assert!(matches!(
            upgrade_state(3, 2, UPGRADERS, Attributes::new()),
            Err(Error::Upgrade { from: 3, .. })
        ));
    }
}
