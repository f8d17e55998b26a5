//! Executes plans against the host and runs the utterance pipeline.

pub mod executor;
pub mod narrator;
pub mod pipeline;

pub use executor::{wait_duration, PlanReport, StepExecutor, StepOutcome};
pub use narrator::{step_announcement, Narrator, NullNarrator, RecordingNarrator, NOT_UNDERSTOOD};
pub use pipeline::{Pipeline, PipelineHandle, RunOutcome};
