//! Host desktop control: synthetic key events, clipboard writes and the
//! default URL handler, behind one [`ComputerController`] seam.

pub mod mock;
pub mod platform;
pub mod types;

pub use mock::{Action, RecordingController};
pub use types::{parse_keys, ControlError, Key};

use anyhow::{Context, Result};

pub trait ComputerController: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    fn key_down(&self, key: Key) -> Result<()>;

    fn key_up(&self, key: Key) -> Result<()>;

    /// Replace the clipboard contents with `text`
    fn set_clipboard_text(&self, text: &str) -> Result<()>;

    /// Hand a URL or OS URI (e.g. `ms-settings:bluetooth`) to the default handler
    fn open_url(&self, url: &str) -> Result<()> {
        open_with_default_handler(url)
    }

    /// Press and release a single key
    fn tap(&self, key: Key) -> Result<()> {
        self.key_down(key)?;
        self.key_up(key)
    }

    /// Press keys in order, then release them in reverse order.
    ///
    /// Keys already pressed are released even when a later key fails, so a
    /// failed chord never leaves a modifier stuck down.
    fn hotkey(&self, keys: &[Key]) -> Result<()> {
        let mut pressed = Vec::with_capacity(keys.len());
        let mut result = Ok(());
        for key in keys {
            if let Err(e) = self.key_down(*key) {
                result = Err(e);
                break;
            }
            pressed.push(*key);
        }
        for key in pressed.iter().rev() {
            let released = self.key_up(*key);
            if result.is_ok() {
                result = released;
            }
        }
        result
    }

    /// Type one character as key events
    fn type_char(&self, c: char) -> Result<()> {
        if c.is_ascii_uppercase() {
            self.hotkey(&[Key::Shift, Key::Char(c.to_ascii_lowercase())])
        } else {
            self.tap(Key::Char(c))
        }
    }

    /// Type text character by character as key events
    fn type_text(&self, text: &str) -> Result<()> {
        for c in text.chars() {
            self.type_char(c)
                .with_context(|| format!("Failed to type {:?}", c))?;
        }
        Ok(())
    }

    /// The chord that pastes the clipboard into the focused input
    fn paste_chord(&self) -> Vec<Key> {
        vec![Key::Control, Key::Char('v')]
    }

    /// The chord that opens the OS app launcher with its search focused
    fn launcher_chord(&self) -> Vec<Key> {
        vec![Key::Meta]
    }
}

/// Open a URL or URI with the OS default handler
pub fn open_with_default_handler(url: &str) -> Result<()> {
    open::that(url).with_context(|| format!("Failed to open '{}'", url))
}

// Platform-specific constructor
pub fn create_controller() -> Result<Box<dyn ComputerController>> {
    #[cfg(target_os = "macos")]
    return Ok(Box::new(platform::macos::MacOSController::new()?));

    #[cfg(target_os = "linux")]
    return Ok(Box::new(platform::linux::LinuxController::new()?));

    #[cfg(target_os = "windows")]
    return Ok(Box::new(platform::windows::WindowsController::new()?));

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    anyhow::bail!("Unsupported platform")
}
