//! vox CLI: single-shot and interactive front ends over the utterance pipeline.

pub mod cli_args;
pub mod console;
pub mod interactive;
pub mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use vox_computer_control::create_controller;
use vox_config::Config;
use vox_core::{Narrator, Pipeline, RunOutcome, StepExecutor, NOT_UNDERSTOOD};
use vox_planner::{PlanGenerator, RoutingPolicy};

use cli_args::Cli;
use console::{print_outcome, print_plan, ConsoleNarrator};
use interactive::run_interactive;
use utils::{initialize_logging, load_config_with_cli_overrides};

pub async fn run() -> Result<()> {
    // API keys may live in a .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    initialize_logging(cli.verbose);

    let config = load_config_with_cli_overrides(&cli)?;

    if cli.show_policy {
        return show_policy(&config);
    }

    let generator = PlanGenerator::from_config(&config)?;
    info!(
        "Planner: {} ({}), policy {}",
        generator.provider_name(),
        generator.model(),
        generator.policy().short_fingerprint()
    );

    let runner = if cli.dry_run {
        Runner::DryRun(generator)
    } else {
        let controller = create_controller().context("Failed to initialize input control")?;
        debug!("Input controller: {}", controller.name());
        let executor = StepExecutor::new(Arc::from(controller), config.executor.clone());
        Runner::Pipeline(Arc::new(Pipeline::new(
            generator,
            executor,
            Arc::new(ConsoleNarrator),
        )))
    };

    match cli.utterance {
        Some(utterance) => runner.handle(&utterance).await,
        None => run_interactive(&runner).await,
    }
}

fn show_policy(config: &Config) -> Result<()> {
    let policy = RoutingPolicy::from_config(&config.planner)?;
    println!("{}", policy.text());
    println!();
    println!("source: {}", policy.source());
    println!("fingerprint: {}", policy.fingerprint());
    Ok(())
}

/// What happens to each utterance
pub enum Runner {
    /// Route and execute on the host
    Pipeline(Arc<Pipeline>),
    /// Route only and print the plan
    DryRun(PlanGenerator),
}

impl Runner {
    pub async fn handle(&self, utterance: &str) -> Result<()> {
        match self {
            Runner::Pipeline(pipeline) => {
                let handle = pipeline.dispatch(utterance);
                let token = handle.cancellation_token();
                let wait = handle.wait();
                tokio::pin!(wait);

                let outcome = tokio::select! {
                    outcome = &mut wait => outcome?,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping after the current step");
                        token.cancel();
                        wait.await?
                    }
                };
                print_outcome(&outcome);
                if let RunOutcome::Executed { report, .. } = &outcome {
                    debug!("Run finished: {}", report);
                }
            }
            Runner::DryRun(generator) => {
                let plan = tokio::select! {
                    plan = generator.route_intent(utterance) => plan,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted while planning");
                        return Ok(());
                    }
                };
                match plan {
                    Some(plan) => print_plan(&plan),
                    None => ConsoleNarrator.say(NOT_UNDERSTOOD),
                }
            }
        }
        Ok(())
    }
}
