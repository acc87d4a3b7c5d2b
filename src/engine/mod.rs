//! Execution engine for the provider driver
//!
//! The engine orchestrates:
//! 1. Planning - Refresh stored state and diff it with declarations
//! 2. Display - Render the plan
//! 3. Executing - Apply changes in dependency waves with terminal progress

pub mod display;
pub mod executor;
pub mod planner;

pub use executor::{PromptConfirm, TerminalProgress, print_summary};
pub use planner::{Plan, plan, refresh_all};
