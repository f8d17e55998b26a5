use crate::{types::ControlError, ComputerController, Key};
use anyhow::{Context, Result};
use std::ffi::CString;
use std::ptr;
use std::sync::Mutex;
use x11::{xlib, xtest};

struct DisplayHandle(*mut xlib::Display);

// Every access goes through the controller's mutex
unsafe impl Send for DisplayHandle {}

/// Keyboard control through the XTest extension
pub struct LinuxController {
    display: Mutex<DisplayHandle>,
    // X11 clipboard contents live only as long as their owner
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

impl LinuxController {
    pub fn new() -> Result<Self> {
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            anyhow::bail!("Cannot open X display; is DISPLAY set?");
        }

        tracing::debug!("Initialized X11 controller");
        Ok(Self {
            display: Mutex::new(DisplayHandle(display)),
            clipboard: Mutex::new(None),
        })
    }

    fn keysym_name(key: Key) -> Option<String> {
        let name = match key {
            Key::Meta => "Super_L",
            Key::Control => "Control_L",
            Key::Alt => "Alt_L",
            Key::Shift => "Shift_L",
            Key::Enter => "Return",
            Key::Tab => "Tab",
            Key::Space => "space",
            Key::Escape => "Escape",
            Key::Backspace => "BackSpace",
            Key::Delete => "Delete",
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Home => "Home",
            Key::End => "End",
            Key::PageUp => "Prior",
            Key::PageDown => "Next",
            Key::PrintScreen => "Print",
            Key::F(n) => return Some(format!("F{}", n)),
            Key::Char(_) => return None,
        };
        Some(name.to_string())
    }

    fn keysym(key: Key) -> Result<xlib::KeySym> {
        if let Key::Char(c) = key {
            return Ok(Self::char_keysym(c));
        }

        let name = Self::keysym_name(key).ok_or(ControlError::UnsupportedKey(key))?;
        let name = CString::new(name)?;
        let sym = unsafe { xlib::XStringToKeysym(name.as_ptr()) };
        if sym == 0 {
            return Err(ControlError::UnsupportedKey(key).into());
        }
        Ok(sym)
    }

    /// Latin-1 keysyms equal their code point; everything else uses the Unicode range
    fn char_keysym(c: char) -> xlib::KeySym {
        let cp = c as u32;
        if cp < 0x100 {
            xlib::KeySym::from(cp)
        } else {
            xlib::KeySym::from(0x0100_0000 | cp)
        }
    }

    fn keycode(display: *mut xlib::Display, sym: xlib::KeySym) -> Option<xlib::KeyCode> {
        let code = unsafe { xlib::XKeysymToKeycode(display, sym) };
        (code != 0).then_some(code)
    }

    fn send(display: *mut xlib::Display, code: xlib::KeyCode, press: bool) -> Result<()> {
        let ok = unsafe {
            let ok = xtest::XTestFakeKeyEvent(display, u32::from(code), i32::from(press), 0);
            xlib::XFlush(display);
            ok
        };
        if ok == 0 {
            anyhow::bail!("XTest rejected key event for keycode {}", code);
        }
        Ok(())
    }

    fn key_event(&self, key: Key, press: bool) -> Result<()> {
        let sym = Self::keysym(key)?;
        let guard = self.display.lock().map_err(|_| anyhow::anyhow!("display lock poisoned"))?;
        let code = Self::keycode(guard.0, sym).ok_or(ControlError::UnsupportedKey(key))?;
        Self::send(guard.0, code, press)
    }
}

impl Drop for LinuxController {
    fn drop(&mut self) {
        if let Ok(guard) = self.display.lock() {
            unsafe {
                xlib::XCloseDisplay(guard.0);
            }
        }
    }
}

impl ComputerController for LinuxController {
    fn name(&self) -> &str {
        "x11"
    }

    fn key_down(&self, key: Key) -> Result<()> {
        self.key_event(key, true)
    }

    fn key_up(&self, key: Key) -> Result<()> {
        self.key_event(key, false)
    }

    fn type_char(&self, c: char) -> Result<()> {
        let sym = Self::char_keysym(c);
        let guard = self.display.lock().map_err(|_| anyhow::anyhow!("display lock poisoned"))?;
        let display = guard.0;
        let code = Self::keycode(display, sym).ok_or(ControlError::UnsupportedChar(c))?;

        // The unshifted level of the keycode tells whether shift is needed
        #[allow(deprecated)]
        let base = unsafe { xlib::XKeycodeToKeysym(display, code, 0) };
        let shift = base != sym;
        let shift_code = if shift {
            let name = CString::new("Shift_L")?;
            let shift_sym = unsafe { xlib::XStringToKeysym(name.as_ptr()) };
            Some(Self::keycode(display, shift_sym).ok_or(ControlError::UnsupportedKey(Key::Shift))?)
        } else {
            None
        };

        if let Some(sc) = shift_code {
            Self::send(display, sc, true)?;
        }
        let result = Self::send(display, code, true).and_then(|_| Self::send(display, code, false));
        if let Some(sc) = shift_code {
            Self::send(display, sc, false)?;
        }
        result
    }

    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        let mut slot = self
            .clipboard
            .lock()
            .map_err(|_| anyhow::anyhow!("clipboard lock poisoned"))?;
        if slot.is_none() {
            *slot = Some(arboard::Clipboard::new().context("Failed to open clipboard")?);
        }
        match slot.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_string())
                .context("Failed to write clipboard"),
            None => anyhow::bail!("clipboard unavailable"),
        }
    }
}
