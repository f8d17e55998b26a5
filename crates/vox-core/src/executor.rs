//! Runs plan steps against the host desktop.
//!
//! A step never fails its caller: every error is logged and counted, and
//! the next step still runs.

use crate::narrator::{step_announcement, Narrator, NullNarrator};
use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vox_computer_control::{parse_keys, ComputerController, Key};
use vox_config::ExecutorConfig;
use vox_planner::{Plan, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    /// Nothing to do: missing target, empty key list, unknown action
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanReport {
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Cancellation stopped the plan before its last step
    pub cancelled: bool,
}

impl PlanReport {
    fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Executed => self.executed += 1,
            StepOutcome::Skipped => self.skipped += 1,
            StepOutcome::Failed => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.executed + self.skipped + self.failed
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} executed, {} skipped, {} failed",
            self.executed, self.skipped, self.failed
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

pub struct StepExecutor {
    controller: Arc<dyn ComputerController>,
    timing: ExecutorConfig,
    narrator: Arc<dyn Narrator>,
}

impl StepExecutor {
    pub fn new(controller: Arc<dyn ComputerController>, timing: ExecutorConfig) -> Self {
        Self {
            controller,
            timing,
            narrator: Arc::new(NullNarrator),
        }
    }

    /// Builder: announce app and link steps before running them
    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Run every step in order. Failed steps don't stop the plan; a
    /// cancelled token stops it between steps.
    pub async fn execute_plan(&self, plan: &Plan, cancel: &CancellationToken) -> PlanReport {
        let mut report = PlanReport::default();

        for (index, step) in plan.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    "Cancelled before step {}/{}; {} not run",
                    index + 1,
                    plan.len(),
                    plan.len() - index
                );
                report.cancelled = true;
                break;
            }

            if let Some(announcement) = step_announcement(step) {
                self.narrator.say(&announcement);
            }

            debug!("Step {}/{}: {}", index + 1, plan.len(), step);
            report.record(self.execute_step(step, cancel).await);
        }

        info!("Plan finished: {}", report);
        report
    }

    pub async fn execute_step(&self, step: &Step, cancel: &CancellationToken) -> StepOutcome {
        match self.run_step(step, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Step failed ({}): {:#}", step, e);
                StepOutcome::Failed
            }
        }
    }

    async fn run_step(&self, step: &Step, cancel: &CancellationToken) -> Result<StepOutcome> {
        match step {
            Step::Wait { seconds } => {
                let duration = wait_duration(*seconds);
                debug!("Waiting {:?}", duration);
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = cancel.cancelled() => debug!("Wait interrupted by cancellation"),
                }
                Ok(StepOutcome::Executed)
            }

            Step::OpenApp { app } => {
                let Some(app) = non_blank(app.as_deref()) else {
                    warn!("OPEN_APP without an app name; skipping");
                    return Ok(StepOutcome::Skipped);
                };
                info!("Opening app {}", app);
                self.open_app(app).await?;
                Ok(StepOutcome::Executed)
            }

            Step::OpenUrl { url } => {
                let Some(url) = non_blank(url.as_deref()) else {
                    warn!("OPEN_URL without a url; skipping");
                    return Ok(StepOutcome::Skipped);
                };
                info!("Opening {}", url);
                self.controller.open_url(url)?;
                Ok(StepOutcome::Executed)
            }

            Step::Type { text } => {
                debug!("Pasting {} chars", text.chars().count());
                self.paste(text).await?;
                Ok(StepOutcome::Executed)
            }

            Step::Press { keys } => {
                if keys.is_empty() {
                    warn!("PRESS without keys; skipping");
                    return Ok(StepOutcome::Skipped);
                }
                let keys = parse_keys(keys)?;
                info!(
                    "Pressing {}",
                    keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join("+")
                );
                self.press(&keys).await?;
                Ok(StepOutcome::Executed)
            }

            Step::Unknown { action } => {
                debug!("Ignoring unknown action {:?}", action);
                Ok(StepOutcome::Skipped)
            }
        }
    }

    /// System launcher: open it, type the name, confirm
    async fn open_app(&self, app: &str) -> Result<()> {
        self.controller
            .hotkey(&self.controller.launcher_chord())
            .context("Failed to open the launcher")?;
        pause(self.timing.launcher_open_delay_ms).await;
        self.controller.type_text(app)?;
        pause(self.timing.launcher_type_delay_ms).await;
        self.controller.tap(Key::Enter)
    }

    async fn paste(&self, text: &str) -> Result<()> {
        self.controller.set_clipboard_text(text)?;
        pause(self.timing.paste_delay_ms).await;
        self.controller.hotkey(&self.controller.paste_chord())
    }

    async fn press(&self, keys: &[Key]) -> Result<()> {
        if keys.contains(&Key::Meta) && keys.contains(&Key::PrintScreen) {
            // The OS only saves the capture when the system key is held
            // across the printscreen tap
            self.controller.key_down(Key::Meta)?;
            let tapped = self.controller.tap(Key::PrintScreen);
            pause(self.timing.chord_hold_ms).await;
            let released = self.controller.key_up(Key::Meta);
            return tapped.and(released);
        }

        self.controller.hotkey(keys)
    }
}

/// Negative or NaN waits don't wait; unrepresentably long ones wait forever
pub fn wait_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_duration_clamps() {
        assert_eq!(wait_duration(1.5), Duration::from_millis(1500));
        assert_eq!(wait_duration(0.0), Duration::ZERO);
        assert_eq!(wait_duration(-3.0), Duration::ZERO);
        assert_eq!(wait_duration(f64::NAN), Duration::ZERO);
        assert_eq!(wait_duration(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn test_report_display() {
        let report = PlanReport {
            executed: 3,
            skipped: 1,
            failed: 0,
            cancelled: true,
        };
        assert_eq!(report.to_string(), "3 executed, 1 skipped, 0 failed (cancelled)");
        assert_eq!(report.attempted(), 4);
    }
}
