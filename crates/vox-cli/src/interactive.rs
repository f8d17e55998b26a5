//! Interactive mode: read utterances from a prompt until exit.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error};

use crate::console::print_warning;
use crate::Runner;

const PROMPT: &str = "vox> ";

pub async fn run_interactive(runner: &Runner) -> Result<()> {
    println!("Type a command (e.g. \"Open calculator\"). 'exit' or Ctrl-D to quit.");

    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim().to_string();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(&input)?;

                if input == "exit" || input == "quit" {
                    break;
                }

                if let Err(e) = runner.handle(&input).await {
                    print_warning(&format!("{:#}", e));
                }
            }
            Err(ReadlineError::Interrupted) => {
                debug!("Ctrl-C at prompt");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                error!("Error reading input: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
