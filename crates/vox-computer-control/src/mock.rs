//! Recording controller for tests
//!
//! Records every host action instead of performing it, and can be told to
//! fail specific operations so callers can exercise their failure paths.

use crate::{ComputerController, Key};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// One recorded host action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    KeyDown(Key),
    KeyUp(Key),
    Clipboard(String),
    OpenUrl(String),
}

#[derive(Default)]
struct Failures {
    keys: HashSet<Key>,
    urls: bool,
    clipboard: bool,
}

/// A `ComputerController` that records actions. Clones share one log.
#[derive(Clone, Default)]
pub struct RecordingController {
    actions: Arc<Mutex<Vec<Action>>>,
    failures: Arc<Mutex<Failures>>,
    launcher: Option<Vec<Key>>,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: pressing `key` fails
    pub fn fail_key(self, key: Key) -> Self {
        self.failures.lock().unwrap().keys.insert(key);
        self
    }

    /// Builder: opening any URL fails
    pub fn fail_open_url(self) -> Self {
        self.failures.lock().unwrap().urls = true;
        self
    }

    /// Builder: clipboard writes fail
    pub fn fail_clipboard(self) -> Self {
        self.failures.lock().unwrap().clipboard = true;
        self
    }

    /// Builder: report `keys` as the launcher chord instead of the default
    pub fn with_launcher_chord(mut self, keys: Vec<Key>) -> Self {
        self.launcher = Some(keys);
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::OpenUrl(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.actions.lock().unwrap().clear();
    }

    fn record(&self, action: Action) {
        self.actions.lock().unwrap().push(action);
    }
}

impl ComputerController for RecordingController {
    fn name(&self) -> &str {
        "recording"
    }

    fn key_down(&self, key: Key) -> Result<()> {
        if self.failures.lock().unwrap().keys.contains(&key) {
            anyhow::bail!("simulated failure pressing '{}'", key);
        }
        self.record(Action::KeyDown(key));
        Ok(())
    }

    fn key_up(&self, key: Key) -> Result<()> {
        self.record(Action::KeyUp(key));
        Ok(())
    }

    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        if self.failures.lock().unwrap().clipboard {
            anyhow::bail!("simulated clipboard failure");
        }
        self.record(Action::Clipboard(text.to_string()));
        Ok(())
    }

    fn launcher_chord(&self) -> Vec<Key> {
        self.launcher.clone().unwrap_or_else(|| vec![Key::Meta])
    }

    fn open_url(&self, url: &str) -> Result<()> {
        if self.failures.lock().unwrap().urls {
            anyhow::bail!("simulated failure opening '{}'", url);
        }
        self.record(Action::OpenUrl(url.to_string()));
        Ok(())
    }
}
