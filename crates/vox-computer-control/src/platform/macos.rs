use crate::{types::ControlError, ComputerController, Key};
use anyhow::{Context, Result};
use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use std::sync::Mutex;

/// Keyboard control through Quartz event services
pub struct MacOSController {
    // Modifiers currently held; applied as flags to every posted event
    held: Mutex<CGEventFlags>,
}

impl MacOSController {
    pub fn new() -> Result<Self> {
        tracing::debug!("Initialized macOS controller");
        Ok(Self {
            held: Mutex::new(CGEventFlags::CGEventFlagNull),
        })
    }

    fn modifier_flag(key: Key) -> Option<CGEventFlags> {
        match key {
            Key::Meta => Some(CGEventFlags::CGEventFlagCommand),
            Key::Control => Some(CGEventFlags::CGEventFlagControl),
            Key::Alt => Some(CGEventFlags::CGEventFlagAlternate),
            Key::Shift => Some(CGEventFlags::CGEventFlagShift),
            _ => None,
        }
    }

    // See: https://eastmanreference.com/complete-list-of-applescript-key-codes
    fn keycode(key: Key) -> Result<CGKeyCode> {
        let code = match key {
            Key::Meta => 0x37,
            Key::Shift => 0x38,
            Key::Alt => 0x3A,
            Key::Control => 0x3B,
            Key::Enter => 0x24,
            Key::Tab => 0x30,
            Key::Space => 0x31,
            Key::Backspace => 0x33,
            Key::Escape => 0x35,
            Key::Delete => 0x75,
            Key::Home => 0x73,
            Key::PageUp => 0x74,
            Key::End => 0x77,
            Key::PageDown => 0x79,
            Key::Left => 0x7B,
            Key::Right => 0x7C,
            Key::Down => 0x7D,
            Key::Up => 0x7E,
            Key::F(n) => match n {
                1 => 0x7A,
                2 => 0x78,
                3 => 0x63,
                4 => 0x76,
                5 => 0x60,
                6 => 0x61,
                7 => 0x62,
                8 => 0x64,
                9 => 0x65,
                10 => 0x6D,
                11 => 0x67,
                12 => 0x6F,
                _ => return Err(ControlError::UnsupportedKey(key).into()),
            },
            Key::Char(c) => Self::char_keycode(c).ok_or(ControlError::UnsupportedKey(key))?,
            // No print-screen key on Apple keyboards
            Key::PrintScreen => return Err(ControlError::UnsupportedKey(key).into()),
        };
        Ok(code)
    }

    fn char_keycode(c: char) -> Option<CGKeyCode> {
        let code = match c.to_ascii_lowercase() {
            'a' => 0x00,
            's' => 0x01,
            'd' => 0x02,
            'f' => 0x03,
            'h' => 0x04,
            'g' => 0x05,
            'z' => 0x06,
            'x' => 0x07,
            'c' => 0x08,
            'v' => 0x09,
            'b' => 0x0B,
            'q' => 0x0C,
            'w' => 0x0D,
            'e' => 0x0E,
            'r' => 0x0F,
            'y' => 0x10,
            't' => 0x11,
            '1' => 0x12,
            '2' => 0x13,
            '3' => 0x14,
            '4' => 0x15,
            '6' => 0x16,
            '5' => 0x17,
            '=' => 0x18,
            '9' => 0x19,
            '7' => 0x1A,
            '-' => 0x1B,
            '8' => 0x1C,
            '0' => 0x1D,
            ']' => 0x1E,
            'o' => 0x1F,
            'u' => 0x20,
            '[' => 0x21,
            'i' => 0x22,
            'p' => 0x23,
            'l' => 0x25,
            'j' => 0x26,
            '\'' => 0x27,
            'k' => 0x28,
            ';' => 0x29,
            '\\' => 0x2A,
            ',' => 0x2B,
            '/' => 0x2C,
            'n' => 0x2D,
            'm' => 0x2E,
            '.' => 0x2F,
            ' ' => 0x31,
            '`' => 0x32,
            _ => return None,
        };
        Some(code)
    }

    fn source() -> Result<CGEventSource> {
        CGEventSource::new(CGEventSourceStateID::HIDSystemState)
            .ok()
            .context("Failed to create event source")
    }

    fn post(&self, code: CGKeyCode, down: bool) -> Result<()> {
        let flags = *self
            .held
            .lock()
            .map_err(|_| anyhow::anyhow!("modifier lock poisoned"))?;
        let event = CGEvent::new_keyboard_event(Self::source()?, code, down)
            .ok()
            .context("Failed to create keyboard event")?;
        event.set_flags(flags);
        event.post(CGEventTapLocation::HID);
        Ok(())
    }

    fn key_event(&self, key: Key, down: bool) -> Result<()> {
        let code = Self::keycode(key)?;
        if let Some(flag) = Self::modifier_flag(key) {
            let mut held = self
                .held
                .lock()
                .map_err(|_| anyhow::anyhow!("modifier lock poisoned"))?;
            if down {
                held.insert(flag);
            } else {
                held.remove(flag);
            }
        }
        self.post(code, down)
    }
}

impl ComputerController for MacOSController {
    fn name(&self) -> &str {
        "macos"
    }

    fn key_down(&self, key: Key) -> Result<()> {
        self.key_event(key, true)
    }

    fn key_up(&self, key: Key) -> Result<()> {
        self.key_event(key, false)
    }

    fn type_char(&self, c: char) -> Result<()> {
        // Unicode string events type any character regardless of layout
        let source = Self::source()?;
        for down in [true, false] {
            let event = CGEvent::new_keyboard_event(source.clone(), 0, down)
                .ok()
                .context("Failed to create keyboard event")?;
            event.set_string(&c.to_string());
            event.post(CGEventTapLocation::HID);
        }
        Ok(())
    }

    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Failed to open clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("Failed to write clipboard")
    }

    fn paste_chord(&self) -> Vec<Key> {
        vec![Key::Meta, Key::Char('v')]
    }

    // Spotlight
    fn launcher_chord(&self) -> Vec<Key> {
        vec![Key::Meta, Key::Space]
    }
}
