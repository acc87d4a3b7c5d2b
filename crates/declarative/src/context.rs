//! Progress and confirmation hooks for [`execute`](crate::execute)
//!
//! The executor reports through these traits so it stays free of any
//! terminal dependency.

use crate::types::ApplyResult;
use anyhow::Result;

/// Receives execution events in order: a wave starts, each of its changes
/// starts and completes, the wave completes.
pub trait ProgressCallback: Send {
    /// `wave` counts from 0; deletion waves come first.
    fn on_wave_start(&mut self, wave: usize, count: usize);

    /// `description` is the planned action's label.
    fn on_resource_start(&mut self, address: &str, description: &str);

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult);

    fn on_wave_complete(&mut self);
}

/// Gate asked once before any change reaches the device.
pub trait ConfirmCallback: Send {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Drops every event.
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_wave_start(&mut self, _wave: usize, _count: usize) {}
    fn on_resource_start(&mut self, _address: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _address: &str, _result: &ApplyResult) {}
    fn on_wave_complete(&mut self) {}
}

/// Always proceeds.
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Never proceeds; every change is reported as skipped.
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
