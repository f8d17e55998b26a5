use std::sync::{Arc, Mutex};
use vox_planner::Step;

/// Spoken when no plan could be produced
pub const NOT_UNDERSTOOD: &str = "I didn't understand.";

/// Speaks short status lines to the user (a speech engine, the console, ...)
pub trait Narrator: Send + Sync {
    fn say(&self, text: &str);
}

/// What to announce before running a step, if anything
pub fn step_announcement(step: &Step) -> Option<String> {
    match step {
        Step::OpenApp { app } => {
            let app = app.as_deref().map(str::trim).filter(|a| !a.is_empty());
            Some(format!("Opening {}", app.unwrap_or("app")))
        }
        Step::OpenUrl { .. } => Some("Opening link".to_string()),
        _ => None,
    }
}

/// Says nothing
pub struct NullNarrator;

impl Narrator for NullNarrator {
    fn say(&self, _text: &str) {}
}

/// Keeps every line; clones share one transcript
#[derive(Clone, Default)]
pub struct RecordingNarrator {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl Narrator for RecordingNarrator {
    fn say(&self, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
    }
}
