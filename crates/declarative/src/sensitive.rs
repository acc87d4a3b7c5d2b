//! Sensitive-value bookkeeping
//!
//! Devices hand sensitive values back transformed: a password comes back as
//! a hash, a shared secret as ciphertext. Nothing here ever decrypts those
//! echoes. Instead, right after writing a value the resource records the
//! pair `(raw, echo)`; on later reads the device's echo is compared against
//! the recorded one:
//!
//! - same echo: the raw value we wrote is still in place, report it
//! - different echo: something changed the value out of band, report a
//!   sentinel so the next plan rewrites it
//!
//! ```
//! use declarative::sensitive::{SecretPair, MISMATCH};
//!
//! let pair = SecretPair::new("hunter2", "-AQ==abc");
//! assert_eq!(pair.observe("-AQ==abc", MISMATCH).value, "hunter2");
//!
//! let drifted = pair.observe("-AQ==def", MISMATCH);
//! assert!(drifted.drift);
//! assert_eq!(drifted.value, MISMATCH);
//! ```

use crate::data::Attrs;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reported in place of a secret whose device echo changed.
pub const MISMATCH: &str = "(mismatch)";

/// Reported in place of a password whose device hash changed.
pub const INCORRECT_PASSWORD: &str = "(incorrect password)";

/// Suffix of the attribute holding the raw value.
pub const RAW_SUFFIX: &str = "_raw";

/// Suffix of the attribute holding the device echo.
pub const ECHO_SUFFIX: &str = "_enc";

/// What a read should report for a sensitive field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    /// Value to place in the user-facing attribute
    pub value: String,
    /// Whether the device-side value changed since we wrote it
    pub drift: bool,
}

/// The raw value last written plus the echo the device returned for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretPair {
    /// Value as the user supplied it
    pub raw: String,
    /// Device-transformed form read back right after the write
    pub echo: String,
}

impl SecretPair {
    /// Pair a raw value with its echo.
    pub fn new(raw: impl Into<String>, echo: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            echo: echo.into(),
        }
    }

    /// Compare the device's current echo with the recorded one.
    pub fn observe(&self, device_echo: &str, sentinel: &str) -> Observed {
        if device_echo == self.echo {
            Observed {
                value: self.raw.clone(),
                drift: false,
            }
        } else {
            Observed {
                value: sentinel.to_string(),
                drift: true,
            }
        }
    }

    /// Load the pair stored under `{field}_raw` / `{field}_enc`.
    pub fn load(d: &impl Attrs, field: &str) -> Self {
        Self {
            raw: d.get_string(&format!("{field}{RAW_SUFFIX}")),
            echo: d.get_string(&format!("{field}{ECHO_SUFFIX}")),
        }
    }

    /// Store the pair under `{field}_raw` / `{field}_enc`.
    pub fn store(&self, d: &mut impl Attrs, field: &str) {
        d.set(&format!("{field}{RAW_SUFFIX}"), self.raw.as_str());
        d.set(&format!("{field}{ECHO_SUFFIX}"), self.echo.as_str());
    }
}

/// Secret pairs for a collection, keyed by element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMap {
    /// Raw values by element name
    pub raw: BTreeMap<String, String>,
    /// Device echoes by element name
    pub echo: BTreeMap<String, String>,
}

impl SecretMap {
    /// Pair configured secrets with the echoes read back from the device.
    ///
    /// Both slices hold `(element name, value)` in device order. The device
    /// must report exactly the elements that were just written, in the same
    /// order; anything else means the write did not land the way it was
    /// sent.
    pub fn capture(
        field: &str,
        configured: &[(String, String)],
        live: &[(String, String)],
    ) -> Result<Self> {
        if configured.len() != live.len() {
            return Err(Error::StateInconsistency {
                field: field.to_string(),
                index: configured.len().min(live.len()),
                message: format!(
                    "configuration has {} entries, device has {}",
                    configured.len(),
                    live.len()
                ),
            });
        }

        let mut map = Self::default();
        for (index, ((name, raw), (live_name, echo))) in configured.iter().zip(live).enumerate() {
            if name != live_name {
                return Err(Error::StateInconsistency {
                    field: field.to_string(),
                    index,
                    message: format!("configured entry {name:?} but device has {live_name:?}"),
                });
            }
            map.raw.insert(name.clone(), raw.clone());
            map.echo.insert(name.clone(), echo.clone());
        }
        Ok(map)
    }

    /// Pair for one element; empty when nothing was recorded for it.
    pub fn pair(&self, name: &str) -> SecretPair {
        SecretPair {
            raw: self.raw.get(name).cloned().unwrap_or_default(),
            echo: self.echo.get(name).cloned().unwrap_or_default(),
        }
    }

    /// Compare one element's current echo with the recorded one.
    pub fn observe(&self, name: &str, device_echo: &str, sentinel: &str) -> Observed {
        self.pair(name).observe(device_echo, sentinel)
    }

    /// Load the maps stored under `{field}_raw` / `{field}_enc`.
    pub fn load(d: &impl Attrs, field: &str) -> Self {
        Self {
            raw: d.get_string_map(&format!("{field}{RAW_SUFFIX}")),
            echo: d.get_string_map(&format!("{field}{ECHO_SUFFIX}")),
        }
    }

    /// Store the maps under `{field}_raw` / `{field}_enc`.
    pub fn store(&self, d: &mut impl Attrs, field: &str) {
        d.set_string_map(&format!("{field}{RAW_SUFFIX}"), &self.raw);
        d.set_string_map(&format!("{field}{ECHO_SUFFIX}"), &self.echo);
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.echo.is_empty()
    }
}
