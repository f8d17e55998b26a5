//! CLI argument parsing for vox.

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[command(name = "vox")]
#[command(about = "Turn spoken or typed commands into desktop actions")]
#[command(version)]
pub struct Cli {
    /// Command to run (if omitted, starts an interactive prompt)
    pub utterance: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the configured provider (e.g., 'gemini.default' or 'openai.local')
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Override the model for the selected provider
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Routing policy document to use instead of the built-in one
    #[arg(long, value_name = "PATH")]
    pub policy: Option<String>,

    /// Print the plan as JSON instead of executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the active routing policy and its fingerprint, then exit
    #[arg(long)]
    pub show_policy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_shot_with_overrides() {
        let cli = Cli::try_parse_from([
            "vox",
            "--provider",
            "openai.local",
            "--model",
            "llama3",
            "--dry-run",
            "Open calculator",
        ])
        .unwrap();

        assert_eq!(cli.utterance.as_deref(), Some("Open calculator"));
        assert_eq!(cli.provider.as_deref(), Some("openai.local"));
        assert_eq!(cli.model.as_deref(), Some("llama3"));
        assert!(cli.dry_run);
        assert!(!cli.show_policy);
    }

    #[test]
    fn test_interactive_by_default() {
        let cli = Cli::try_parse_from(["vox", "-v"]).unwrap();
        assert!(cli.utterance.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["vox", "--autonomous"]).is_err());
    }
}
