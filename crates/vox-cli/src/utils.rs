use anyhow::Result;
use vox_config::Config;

use crate::cli_args::Cli;

/// Crates whose logs are shown by default
const LOG_TARGETS: [&str; 7] = [
    "vox",
    "vox_cli",
    "vox_core",
    "vox_planner",
    "vox_providers",
    "vox_config",
    "vox_computer_control",
];

/// Filter directives: every vox crate at `info` (or `debug` when verbose),
/// followed by anything in `RUST_LOG`
pub fn log_directives(verbose: bool, rust_log: Option<&str>) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();

    if let Some(extra) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        directives.push(extra.to_string());
    }
    directives.join(",")
}

pub fn initialize_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::new(log_directives(verbose, rust_log.as_deref()));

    // stdout carries plans and narration
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

pub fn load_config_with_cli_overrides(cli: &Cli) -> Result<Config> {
    Config::load_with_overrides(
        cli.config.as_deref(),
        cli.provider.clone(),
        cli.model.clone(),
        cli.policy.clone(),
    )
}
