//! # Declarative
//!
//! A framework for declarative resource providers.
//!
//! A provider exposes typed objects on some remote system as resources with
//! a Create/Read/Update/Delete lifecycle. This crate holds everything that
//! is the same for every resource: the attribute data model, schemas,
//! opaque identifiers, sensitive-value bookkeeping, stored-state upgrades,
//! planning, and execution.
//!
//! ## Core Concepts
//!
//! - **ResourceData**: a resource's identifier plus its attributes
//! - **Schema**: what attributes a resource understands and how they behave
//! - **Identifier**: a typed tuple encoded as a `:`-joined opaque id
//! - **Resource / DataSource**: the lifecycle a provider implements
//! - **Provider**: a registry of resource and data source types
//! - **ResourceDiff / execute**: plan changes and apply them in dependency waves
//!
//! ## Example
//!
//! ```
//! use declarative::{identifier, Attribute, Identifier, ResourceData, Schema};
//!
//! identifier! {
//!     pub struct ProfileId { template, template_stack, vsys, name }
//! }
//!
//! let schema = Schema::new()
//!     .attr("template", Attribute::string().optional().force_new())
//!     .attr("template_stack", Attribute::string().optional().force_new())
//!     .attr("vsys", Attribute::string().optional().force_new().default("shared"))
//!     .attr("name", Attribute::string().required().force_new());
//!
//! let mut config = serde_json::json!({"name": "corp-ldap"}).as_object().cloned().unwrap();
//! schema.apply_defaults(&mut config);
//!
//! let d = ResourceData::new(config);
//! let id = ProfileId::from_data(&d);
//! assert_eq!(id.encode(), "::shared:corp-ldap");
//! ```
//!
//! ## Callback Traits
//!
//! Execution reports through traits so the crate carries no UI dependency:
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations

pub mod context;
pub mod data;
pub mod diff;
pub mod error;
pub mod executor;
pub mod id;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod sensitive;
pub mod types;
pub mod upgrade;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use data::{Attributes, Attrs, Block, ResourceData};
pub use diff::{Action, AttributeChange, DiffSummary, ResourceDiff, group_by_type};
pub use error::{Error, Result};
pub use executor::{ExecuteOutcome, execute, refresh, upgrade_stored};
pub use id::Identifier;
pub use provider::Provider;
pub use resource::{BoxedDataSource, BoxedResource, DataSource, Resource};
pub use schema::{AttrType, Attribute, Mode, Schema};
pub use sensitive::{Observed, SecretMap, SecretPair};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary, StoredResource};
pub use upgrade::StateUpgrader;
