use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::StoredResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current state file format.
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Everything recorded about applied resources between runs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    /// File format version
    #[serde(default = "format_version")]
    pub version: u32,

    /// Last time the resources changed
    pub last_updated: DateTime<Utc>,

    /// blake3 digest of `resources` as last written
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,

    /// Resources in address order
    #[serde(default)]
    pub resources: Vec<StoredResource>,
}

fn format_version() -> u32 {
    FORMAT_VERSION
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            last_updated: Utc::now(),
            digest: String::new(),
            resources: Vec::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
        if state.version > FORMAT_VERSION {
            anyhow::bail!(
                "State file {} has format {}, newer than supported {FORMAT_VERSION}",
                path.display(),
                state.version
            );
        }

        log::debug!(
            "Loaded {} resources from {}",
            state.resources.len(),
            path.display()
        );
        Ok(state)
    }

    /// Save state to disk.
    ///
    /// `last_updated` only moves when the resources differ from what was
    /// last written.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.resources.sort_by(|a, b| a.address.cmp(&b.address));
        let digest = self.compute_digest()?;
        if digest == self.digest && path.exists() {
            log::debug!("State unchanged, not rewriting {}", path.display());
            return Ok(());
        }
        self.digest = digest;
        self.last_updated = Utc::now();
        self.version = FORMAT_VERSION;

        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create state directory: {}", dir.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;
        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    fn compute_digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.resources).context("Failed to serialize state")?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    // ========================================================================
    // Resource Helpers
    // ========================================================================

    pub fn get(&self, address: &str) -> Option<&StoredResource> {
        self.resources.iter().find(|r| r.address == address)
    }

    /// Insert or replace the resource at its address.
    pub fn upsert(&mut self, resource: StoredResource) {
        self.remove(&resource.address);
        self.resources.push(resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<StoredResource> {
        let index = self.resources.iter().position(|r| r.address == address)?;
        Some(self.resources.remove(index))
    }

    /// Record new states by address; `None` drops the address.
    pub fn merge(&mut self, states: BTreeMap<String, Option<StoredResource>>) {
        for (address, state) in states {
            match state {
                Some(resource) => self.upsert(resource),
                None => {
                    self.remove(&address);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Attrs, ResourceData};
    use serde_json::json;
    use tempfile::TempDir;

    fn stored(address: &str, id: &str) -> StoredResource {
        let mut data = ResourceData::new(
            json!({"name": id, "description": "managed"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        data.set_id(id);
        StoredResource::new(address, "panos_device_group", 0, data)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let state = StateFile::load(&dir.path().join("state.json")).unwrap();
        assert!(state.resources.is_empty());
        assert_eq!(state.version, FORMAT_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut state = StateFile::default();
        state.upsert(stored("panos_device_group.b", "b"));
        state.upsert(stored("panos_device_group.a", "a"));
        state.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"type\": \"panos_device_group\""));
        assert!(content.contains("\"schema_version\": 0"));

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded.resources[0].address, "panos_device_group.a");
        let b = loaded.get("panos_device_group.b").unwrap();
        assert_eq!(b.data.id(), "b");
        assert_eq!(b.data.get_string("description"), "managed");
        assert_eq!(loaded.digest, state.digest);
    }

    #[test]
    fn test_unchanged_save_keeps_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut state = StateFile::default();
        state.upsert(stored("panos_device_group.a", "a"));
        state.save(&path).unwrap();

        let mut loaded = StateFile::load(&path).unwrap();
        let written = loaded.last_updated;
        loaded.save(&path).unwrap();
        assert_eq!(loaded.last_updated, written);

        loaded.remove("panos_device_group.a");
        loaded.save(&path).unwrap();
        assert_ne!(loaded.digest, state.digest);
    }

    #[test]
    fn test_merge() {
        let mut state = StateFile::default();
        state.upsert(stored("panos_device_group.a", "a"));
        state.upsert(stored("panos_device_group.b", "b"));

        let mut updated = stored("panos_device_group.a", "a");
        updated.data.set("description", "changed");
        state.merge(BTreeMap::from([
            ("panos_device_group.a".to_string(), Some(updated)),
            ("panos_device_group.b".to_string(), None),
        ]));

        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state
                .get("panos_device_group.a")
                .unwrap()
                .data
                .get_string("description"),
            "changed"
        );
    }

    #[test]
    fn test_newer_format_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"version": 9, "last_updated": "2024-01-01T00:00:00Z", "resources": []}"#,
        )
        .unwrap();
        assert!(StateFile::load(&path).is_err());
    }
}
