use std::fmt;
use std::str::FromStr;

/// A keyboard key as named in plan steps.
///
/// `Meta` is the system key: Windows key, Command on macOS, Super on X11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Meta,
    Control,
    Alt,
    Shift,
    Enter,
    Tab,
    Space,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    PrintScreen,
    /// Function keys F1..F12
    F(u8),
    /// Any single printable character
    Char(char),
}

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("key '{0}' is not available on this platform")]
    UnsupportedKey(Key),
    #[error("cannot type character {0:?} with the current keyboard layout")]
    UnsupportedChar(char),
}

impl FromStr for Key {
    type Err = ControlError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let lower = name.trim().to_lowercase();
        let key = match lower.as_str() {
            "win" | "winleft" | "winright" | "super" | "meta" | "cmd" | "command" => Key::Meta,
            "ctrl" | "control" | "ctrlleft" | "ctrlright" => Key::Control,
            "alt" | "option" | "altleft" | "altright" => Key::Alt,
            "shift" | "shiftleft" | "shiftright" => Key::Shift,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "space" | "spacebar" => Key::Space,
            "esc" | "escape" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            "printscreen" | "prtsc" | "prtscr" | "prntscrn" | "print" => Key::PrintScreen,
            other => {
                if let Some(n) = other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=12).contains(&n) {
                        return Ok(Key::F(n));
                    }
                }
                // " " is a valid single-character key name; it trims to empty above
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c.to_ascii_lowercase()),
                    _ => return Err(ControlError::UnknownKey(name.to_string())),
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Meta => write!(f, "win"),
            Key::Control => write!(f, "ctrl"),
            Key::Alt => write!(f, "alt"),
            Key::Shift => write!(f, "shift"),
            Key::Enter => write!(f, "enter"),
            Key::Tab => write!(f, "tab"),
            Key::Space => write!(f, "space"),
            Key::Escape => write!(f, "esc"),
            Key::Backspace => write!(f, "backspace"),
            Key::Delete => write!(f, "delete"),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
            Key::Home => write!(f, "home"),
            Key::End => write!(f, "end"),
            Key::PageUp => write!(f, "pageup"),
            Key::PageDown => write!(f, "pagedown"),
            Key::PrintScreen => write!(f, "printscreen"),
            Key::F(n) => write!(f, "f{}", n),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Parse a list of key names, failing on the first unknown one.
pub fn parse_keys<S: AsRef<str>>(names: &[S]) -> Result<Vec<Key>, ControlError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("win".parse::<Key>().unwrap(), Key::Meta);
        assert_eq!("Command".parse::<Key>().unwrap(), Key::Meta);
        assert_eq!("ctrl".parse::<Key>().unwrap(), Key::Control);
        assert_eq!("RETURN".parse::<Key>().unwrap(), Key::Enter);
        assert_eq!("prtsc".parse::<Key>().unwrap(), Key::PrintScreen);
        assert_eq!("printscreen".parse::<Key>().unwrap(), Key::PrintScreen);
        assert_eq!("pgdn".parse::<Key>().unwrap(), Key::PageDown);
    }

    #[test]
    fn test_function_keys() {
        assert_eq!("f1".parse::<Key>().unwrap(), Key::F(1));
        assert_eq!("F12".parse::<Key>().unwrap(), Key::F(12));
        assert!("f13".parse::<Key>().is_err());
        // A lone "f" is a character key
        assert_eq!("f".parse::<Key>().unwrap(), Key::Char('f'));
    }

    #[test]
    fn test_single_characters() {
        assert_eq!("v".parse::<Key>().unwrap(), Key::Char('v'));
        assert_eq!("V".parse::<Key>().unwrap(), Key::Char('v'));
        assert_eq!("/".parse::<Key>().unwrap(), Key::Char('/'));
        assert_eq!(" ".parse::<Key>().unwrap(), Key::Char(' '));
    }

    #[test]
    fn test_unknown_key() {
        let err = "hyper".parse::<Key>().unwrap_err();
        assert_eq!(err.to_string(), "unknown key name 'hyper'");
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn test_parse_keys_preserves_order() {
        let keys = parse_keys(&["ctrl", "shift", "esc"]).unwrap();
        assert_eq!(keys, vec![Key::Control, Key::Shift, Key::Escape]);
        assert!(parse_keys(&["ctrl", "bogus"]).is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for key in [Key::Meta, Key::PrintScreen, Key::F(5), Key::Char('x'), Key::PageUp] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), key);
        }
    }
}
