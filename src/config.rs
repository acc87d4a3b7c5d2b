//! Provider settings and resource declarations.
//!
//! Settings live in `~/.config/panos-provider/config.toml` and say which
//! device to talk to and where state is kept. Declarations are a separate
//! TOML file of `[[resource]]` and `[[data]]` tables:
//!
//! ```toml
//! [[resource]]
//! type = "panos_ldap_profile"
//! name = "corp"
//! depends_on = ["panos_device_group.emea"]
//!
//! [resource.config]
//! name = "corp-ldap"
//! server = [{ name = "dc1", server = "10.0.0.10" }]
//! ```

use anyhow::{Context, Result};
use declarative::{Attributes, Provider};
use panoskit::{Device, DeviceKind, Firewall, MemoryBackend, Panorama};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

#[allow(clippy::expect_used)]
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("name pattern compiles"));

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("panos-provider"))
}

/// Get the state directory path (~/.local/state/panos-provider)
pub fn state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".local").join("state").join("panos-provider"))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Provider settings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_kind")]
    pub kind: DeviceKind,
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

fn default_kind() -> DeviceKind {
    DeviceKind::Firewall
}

fn default_hostname() -> String {
    "localhost".to_string()
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            hostname: default_hostname(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub device: DeviceSettings,
    /// Device image backing the offline device
    #[serde(default)]
    pub image: Option<String>,
    /// State file
    #[serde(default)]
    pub state: Option<String>,
    /// Changes applied concurrently within one wave
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl ProviderConfig {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing default file yields default settings; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_dir()?.join("config.toml");
                if !path.exists() {
                    log::debug!("No config at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn image_path(&self) -> Result<PathBuf> {
        match &self.image {
            Some(path) => Ok(expand(path)),
            None => Ok(state_dir()?.join("device.json")),
        }
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state {
            Some(path) => Ok(expand(path)),
            None => Ok(state_dir()?.join("state.json")),
        }
    }

    pub fn jobs(&self) -> usize {
        self.parallelism.unwrap_or(4).max(1)
    }

    /// Open the configured device over its image.
    pub fn connect(&self) -> Result<Session> {
        let image = self.image_path()?;
        let backend = MemoryBackend::load(&image)
            .with_context(|| format!("Failed to load device image: {}", image.display()))?;
        let transport = Arc::new(backend.clone());
        let device: Box<dyn Device> = match self.device.kind {
            DeviceKind::Firewall => Box::new(Firewall::new(&self.device.hostname, transport)),
            DeviceKind::Panorama => Box::new(Panorama::new(&self.device.hostname, transport)),
        };
        log::info!("Connected to {} {}", self.device.kind, self.device.hostname);
        Ok(Session {
            device,
            backend,
            image,
        })
    }
}

/// An open device and the image it persists to.
pub struct Session {
    pub device: Box<dyn Device>,
    backend: MemoryBackend,
    image: PathBuf,
}

impl Session {
    /// Write the device image back.
    pub fn save(&self) -> Result<()> {
        self.backend
            .save(&self.image)
            .with_context(|| format!("Failed to save device image: {}", self.image.display()))
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("invalid name {name:?}: use letters, digits, '_' and '-'")]
    InvalidName { name: String },

    #[error("{address} is declared twice")]
    Duplicate { address: String },

    #[error("unknown {what} type {type_name:?}")]
    UnknownType {
        what: &'static str,
        type_name: String,
    },

    #[error("{address} depends on undeclared {dependency}")]
    UnknownDependency { address: String, dependency: String },

    #[error("{address}: {source}")]
    InvalidConfig {
        address: String,
        #[source]
        source: declarative::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub config: Attributes,
}

impl ResourceDecl {
    pub fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDecl {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub config: Attributes,
}

impl DataDecl {
    pub fn address(&self) -> String {
        format!("data.{}.{}", self.type_name, self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Declarations {
    #[serde(default)]
    pub resource: Vec<ResourceDecl>,
    #[serde(default)]
    pub data: Vec<DataDecl>,
}

impl Declarations {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid declarations in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check names, addresses, types, dependencies and each configuration
    /// against its schema.
    pub fn validate(&self, provider: &Provider<dyn Device>) -> Result<(), DeclarationError> {
        let mut seen = HashSet::new();
        for decl in &self.resource {
            check_name(&decl.name)?;
            let address = decl.address();
            if !seen.insert(address.clone()) {
                return Err(DeclarationError::Duplicate { address });
            }
            let resource = provider
                .resource(&decl.type_name)
                .map_err(|_| DeclarationError::UnknownType {
                    what: "resource",
                    type_name: decl.type_name.clone(),
                })?;
            resource
                .schema()
                .validate_config(&decl.config)
                .map_err(|source| DeclarationError::InvalidConfig { address, source })?;
        }

        for decl in &self.resource {
            if let Some(dependency) = decl.depends_on.iter().find(|d| !seen.contains(*d)) {
                return Err(DeclarationError::UnknownDependency {
                    address: decl.address(),
                    dependency: dependency.clone(),
                });
            }
        }

        for decl in &self.data {
            check_name(&decl.name)?;
            let address = decl.address();
            if !seen.insert(address.clone()) {
                return Err(DeclarationError::Duplicate { address });
            }
            let source = provider
                .data_source(&decl.type_name)
                .map_err(|_| DeclarationError::UnknownType {
                    what: "data source",
                    type_name: decl.type_name.clone(),
                })?;
            source
                .schema()
                .validate_config(&decl.config)
                .map_err(|source| DeclarationError::InvalidConfig { address, source })?;
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), DeclarationError> {
    if NAME.is_match(name) {
        Ok(())
    } else {
        Err(DeclarationError::InvalidName {
            name: name.to_string(),
        })
    }
}
