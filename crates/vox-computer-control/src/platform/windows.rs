use crate::{types::ControlError, ComputerController, Key};
use anyhow::{Context, Result};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_BACK, VK_CONTROL, VK_DELETE, VK_DOWN,
    VK_END, VK_ESCAPE, VK_F1, VK_HOME, VK_LEFT, VK_LWIN, VK_MENU, VK_NEXT, VK_PRIOR, VK_RETURN,
    VK_RIGHT, VK_SHIFT, VK_SNAPSHOT, VK_SPACE, VK_TAB, VK_UP,
};

/// Keyboard control through `SendInput`
pub struct WindowsController;

impl WindowsController {
    pub fn new() -> Result<Self> {
        tracing::debug!("Initialized Windows controller");
        Ok(Self)
    }

    fn virtual_key(key: Key) -> Result<VIRTUAL_KEY> {
        let vk = match key {
            Key::Meta => VK_LWIN,
            Key::Control => VK_CONTROL,
            Key::Alt => VK_MENU,
            Key::Shift => VK_SHIFT,
            Key::Enter => VK_RETURN,
            Key::Tab => VK_TAB,
            Key::Space => VK_SPACE,
            Key::Escape => VK_ESCAPE,
            Key::Backspace => VK_BACK,
            Key::Delete => VK_DELETE,
            Key::Up => VK_UP,
            Key::Down => VK_DOWN,
            Key::Left => VK_LEFT,
            Key::Right => VK_RIGHT,
            Key::Home => VK_HOME,
            Key::End => VK_END,
            Key::PageUp => VK_PRIOR,
            Key::PageDown => VK_NEXT,
            Key::PrintScreen => VK_SNAPSHOT,
            Key::F(n) => VIRTUAL_KEY(VK_F1.0 + u16::from(n.saturating_sub(1))),
            Key::Char(c) => Self::layout_key(c)
                .ok_or(ControlError::UnsupportedChar(c))?
                .0,
        };
        Ok(vk)
    }

    /// Resolve a character to a key on the active layout: (virtual key, needs shift).
    /// `None` when the layout has no such key or it needs Ctrl/Alt (AltGr).
    fn layout_key(c: char) -> Option<(VIRTUAL_KEY, bool)> {
        let mut units = [0u16; 2];
        let encoded = c.encode_utf16(&mut units);
        if encoded.len() != 1 {
            return None;
        }
        decode_key_scan(unsafe { VkKeyScanW(encoded[0]) })
            .map(|(vk, shift)| (VIRTUAL_KEY(vk), shift))
    }

    fn is_extended(vk: VIRTUAL_KEY) -> bool {
        [
            VK_LWIN, VK_DELETE, VK_UP, VK_DOWN, VK_LEFT, VK_RIGHT, VK_HOME, VK_END, VK_PRIOR,
            VK_NEXT, VK_SNAPSHOT,
        ]
        .contains(&vk)
    }

    fn send(vk: VIRTUAL_KEY, up: bool) -> Result<()> {
        let mut flags = 0;
        if up {
            flags |= KEYEVENTF_KEYUP.0;
        }
        if Self::is_extended(vk) {
            flags |= KEYEVENTF_EXTENDEDKEY.0;
        }
        Self::send_input(vk, 0, flags)
    }

    /// Type a character as UTF-16 units, independent of the layout
    fn send_unicode(c: char) -> Result<()> {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units).iter() {
            Self::send_input(VIRTUAL_KEY(0), *unit, KEYEVENTF_UNICODE.0)?;
            Self::send_input(VIRTUAL_KEY(0), *unit, KEYEVENTF_UNICODE.0 | KEYEVENTF_KEYUP.0)?;
        }
        Ok(())
    }

    fn send_input(vk: VIRTUAL_KEY, scan: u16, flags: u32) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: scan,
                    dwFlags: KEYBD_EVENT_FLAGS(flags),
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            anyhow::bail!(
                "SendInput rejected key event (vk {:#04x}, scan {:#06x})",
                vk.0,
                scan
            );
        }
        Ok(())
    }
}

/// Split a `VkKeyScanW` result into (virtual key, needs shift). Characters
/// that need Ctrl or Alt, or have no key, yield `None`.
fn decode_key_scan(scan: i16) -> Option<(u16, bool)> {
    if scan == -1 {
        return None;
    }
    let vk = (scan as u16) & 0xFF;
    let modifiers = (scan as u16) >> 8;
    // 0x02 Ctrl, 0x04 Alt
    if modifiers & 0x06 != 0 {
        return None;
    }
    Some((vk, modifiers & 0x01 != 0))
}

impl ComputerController for WindowsController {
    fn name(&self) -> &str {
        "windows"
    }

    fn key_down(&self, key: Key) -> Result<()> {
        Self::send(Self::virtual_key(key)?, false)
    }

    fn key_up(&self, key: Key) -> Result<()> {
        Self::send(Self::virtual_key(key)?, true)
    }

    fn type_char(&self, c: char) -> Result<()> {
        let Some((vk, shift)) = Self::layout_key(c) else {
            return Self::send_unicode(c);
        };
        if shift {
            Self::send(VK_SHIFT, false)?;
        }
        let result = Self::send(vk, false).and_then(|_| Self::send(vk, true));
        if shift {
            Self::send(VK_SHIFT, true)?;
        }
        result
    }

    fn set_clipboard_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("Failed to open clipboard")?;
        clipboard
            .set_text(text.to_string())
            .context("Failed to write clipboard")
    }
}
