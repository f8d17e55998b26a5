//! Utterance pipeline: route to a plan, then execute it, on a worker task.

use crate::executor::{PlanReport, StepExecutor};
use crate::narrator::{Narrator, NOT_UNDERSTOOD};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use vox_planner::{Plan, PlanGenerator};

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Cancelled before anything was executed
    Cancelled,
    /// The planner produced nothing usable
    NoPlan,
    Executed { plan: Plan, report: PlanReport },
}

pub struct Pipeline {
    generator: PlanGenerator,
    executor: StepExecutor,
    narrator: Arc<dyn Narrator>,
    // One utterance at a time
    in_flight: Mutex<()>,
}

impl Pipeline {
    pub fn new(
        generator: PlanGenerator,
        executor: StepExecutor,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            generator,
            executor: executor.with_narrator(Arc::clone(&narrator)),
            narrator,
            in_flight: Mutex::new(()),
        }
    }

    pub fn generator(&self) -> &PlanGenerator {
        &self.generator
    }

    /// Route and execute one utterance. Waits for any run already in flight.
    pub async fn run(&self, utterance: &str, cancel: &CancellationToken) -> RunOutcome {
        let _guard = self.in_flight.lock().await;

        if cancel.is_cancelled() {
            info!("Cancelled before planning");
            return RunOutcome::Cancelled;
        }

        let Some(plan) = self.generator.route_intent(utterance).await else {
            self.narrator.say(NOT_UNDERSTOOD);
            return RunOutcome::NoPlan;
        };

        if cancel.is_cancelled() {
            info!("Cancelled before executing {} steps", plan.len());
            return RunOutcome::Cancelled;
        }

        let report = self.executor.execute_plan(&plan, cancel).await;
        RunOutcome::Executed { plan, report }
    }

    /// Run an utterance on its own task
    pub fn spawn(
        self: &Arc<Self>,
        utterance: impl Into<String>,
        cancel: CancellationToken,
    ) -> PipelineHandle {
        let utterance = utterance.into();
        let run_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let span = info_span!("run", id = %run_id);

        let pipeline = Arc::clone(self);
        let token = cancel.clone();
        let join = tokio::spawn(
            async move { pipeline.run(&utterance, &token).await }.instrument(span),
        );

        PipelineHandle {
            run_id,
            cancel,
            join,
        }
    }

    /// Run an utterance on its own task with a fresh cancellation token
    pub fn dispatch(self: &Arc<Self>, utterance: impl Into<String>) -> PipelineHandle {
        self.spawn(utterance, CancellationToken::new())
    }
}

/// A running utterance
pub struct PipelineHandle {
    run_id: String,
    cancel: CancellationToken,
    join: JoinHandle<RunOutcome>,
}

impl PipelineHandle {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Stop the run at the next step boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> Result<RunOutcome> {
        self.join
            .await
            .map_err(|e| anyhow::anyhow!("pipeline task {} failed: {}", self.run_id, e))
    }
}
