//! Terminal side of execution: progress, confirmation and the summary.

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ExecuteSummary, ProgressCallback};
use indicatif::ProgressBar;

use crate::progress;
use crate::ui;

/// Reports each wave on an indicatif bar.
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: None,
            hidden: quiet,
        }
    }
}

fn result_symbol(result: &ApplyResult) -> colored::ColoredString {
    match result {
        ApplyResult::NoChange => "○".dimmed(),
        ApplyResult::Created
        | ApplyResult::Modified
        | ApplyResult::Replaced
        | ApplyResult::Removed => "✓".green(),
        ApplyResult::Failed { .. } => "✗".red(),
        ApplyResult::Skipped { .. } => "⊘".yellow(),
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_wave_start(&mut self, wave: usize, count: usize) {
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            progress::bar(count as u64, &format!("Wave {}", wave + 1))
        };
        self.bar = Some(pb);
    }

    fn on_resource_start(&mut self, address: &str, description: &str) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("{description} {address}"));
        }
    }

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult) {
        let Some(pb) = &self.bar else {
            return;
        };
        pb.inc(1);
        pb.set_message(format!("{} {address}", result_symbol(result)));
        if self.hidden {
            return;
        }
        match result {
            ApplyResult::Failed { error } => pb.suspend(|| {
                println!("  {} {address}: {error}", result_symbol(result));
            }),
            ApplyResult::Skipped { reason } => pb.suspend(|| {
                println!("  {} {address} ({reason})", result_symbol(result));
            }),
            _ => {}
        }
    }

    fn on_wave_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}

/// Asks before applying, unless pre-approved.
///
/// Without a terminal to ask on, the answer is no.
pub struct PromptConfirm {
    assume_yes: bool,
    attended: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            attended: console::Term::stdout().is_term(),
        }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !self.attended {
            ui::warn("Not running in a terminal; pass --yes to apply without confirmation");
            return Ok(false);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources modified", summary.modified);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_gates() {
        let mut yes = PromptConfirm {
            assume_yes: true,
            attended: false,
        };
        assert!(yes.confirm("Apply changes?").unwrap());

        let mut unattended = PromptConfirm {
            assume_yes: false,
            attended: false,
        };
        assert!(!unattended.confirm("Apply changes?").unwrap());
    }

    #[test]
    fn test_quiet_progress_counts() {
        let mut progress = TerminalProgress::new(true);
        progress.on_wave_start(0, 2);
        progress.on_resource_start("panos_dhcp_relay.e1", "create");
        progress.on_resource_complete("panos_dhcp_relay.e1", &ApplyResult::Created);
        progress.on_resource_complete(
            "panos_dhcp_relay.e2",
            &ApplyResult::Failed {
                error: "boom".into(),
            },
        );
        assert_eq!(progress.bar.as_ref().map(ProgressBar::position), Some(2));
        progress.on_wave_complete();
        assert!(progress.bar.is_none());
    }
}
