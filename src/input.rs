//! Raw input event model
//!
//! These are the events delivered by the OS hook adapters (and by the
//! deadline timer) into the session's single-consumer queue. The hook
//! adapters themselves are platform code outside this crate; everything a
//! classifier needs to know about a key is expressed here so the
//! classification logic stays OS-free.

use serde::{Deserialize, Serialize};

/// A raw hardware (or timer) event, in the order it arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    KeyDown(KeyInput),
    KeyUp(KeyInput),
    ButtonPress { x: i32, y: i32, button: MouseButton },
    ButtonRelease { x: i32, y: i32, button: MouseButton },
    /// Pointer motion. Observed but never logged on its own.
    PointerMove { x: i32, y: i32 },
    Wheel { dx: i32, dy: i32 },
    /// The idle deadline expired with no qualifying input.
    DeadlineElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A key as reported by the keyboard hook.
///
/// `Char` carries the character the OS resolved for the key, including
/// control codes (Ctrl+C arrives as `Char('\u{3}')`). Keys without a
/// character representation arrive as `Named`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    Char(char),
    Named(NamedKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Shift,
    Ctrl,
    Alt,
    Cmd,
    Space,
    Tab,
    Backspace,
    CapsLock,
    Enter,
    Esc,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    PrintScreen,
    F(u8),
}

impl NamedKey {
    /// Canonical key name used in logged actions and the hotkey table.
    /// Modifier families (left/right variants) are collapsed by the hook
    /// adapter before they reach this type, so each modifier has one name.
    pub fn name(&self) -> String {
        match self {
            NamedKey::Shift => "shift".into(),
            NamedKey::Ctrl => "ctrl".into(),
            NamedKey::Alt => "alt".into(),
            NamedKey::Cmd => "cmd".into(),
            NamedKey::Space => "space".into(),
            NamedKey::Tab => "tab".into(),
            NamedKey::Backspace => "backspace".into(),
            NamedKey::CapsLock => "caps_lock".into(),
            NamedKey::Enter => "enter".into(),
            NamedKey::Esc => "esc".into(),
            NamedKey::Delete => "delete".into(),
            NamedKey::Insert => "insert".into(),
            NamedKey::Home => "home".into(),
            NamedKey::End => "end".into(),
            NamedKey::PageUp => "page_up".into(),
            NamedKey::PageDown => "page_down".into(),
            NamedKey::Up => "up".into(),
            NamedKey::Down => "down".into(),
            NamedKey::Left => "left".into(),
            NamedKey::Right => "right".into(),
            NamedKey::PrintScreen => "print_screen".into(),
            NamedKey::F(n) => format!("f{n}"),
        }
    }
}

impl KeyInput {
    pub fn name(&self) -> String {
        match self {
            KeyInput::Char(c) => c.to_string(),
            KeyInput::Named(n) => n.name(),
        }
    }

    /// Whether this key can legitimately occur inside a typing run:
    /// printable characters plus space, backspace, shift and caps-lock.
    pub fn is_typeable(&self) -> bool {
        match self {
            KeyInput::Char(c) => (*c as u32) > 31,
            KeyInput::Named(n) => matches!(
                n,
                NamedKey::Shift | NamedKey::Space | NamedKey::CapsLock | NamedKey::Backspace
            ),
        }
    }

    /// If this key is a control character (Ctrl+letter collapsed by the OS
    /// into a code <= 31), return the letter it encodes: `\u{3}` -> `'C'`.
    pub fn ctrl_combination(&self) -> Option<char> {
        match self {
            KeyInput::Char(c) if (1..=31).contains(&(*c as u32)) => {
                Some((b'@' + *c as u8) as char)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_chars_are_typeable() {
        assert!(KeyInput::Char('a').is_typeable());
        assert!(KeyInput::Char('Z').is_typeable());
        assert!(KeyInput::Char('!').is_typeable());
    }

    #[test]
    fn control_codes_are_not_typeable() {
        assert!(!KeyInput::Char('\u{3}').is_typeable());
        assert!(!KeyInput::Char('\u{1a}').is_typeable());
    }

    #[test]
    fn typing_adjacent_named_keys_are_typeable() {
        assert!(KeyInput::Named(NamedKey::Shift).is_typeable());
        assert!(KeyInput::Named(NamedKey::Space).is_typeable());
        assert!(KeyInput::Named(NamedKey::Backspace).is_typeable());
        assert!(KeyInput::Named(NamedKey::CapsLock).is_typeable());
        assert!(!KeyInput::Named(NamedKey::Tab).is_typeable());
        assert!(!KeyInput::Named(NamedKey::Ctrl).is_typeable());
    }

    #[test]
    fn ctrl_combination_decodes_letter() {
        // Ctrl+C arrives as ETX (0x03)
        assert_eq!(KeyInput::Char('\u{3}').ctrl_combination(), Some('C'));
        // Ctrl+Z arrives as SUB (0x1a)
        assert_eq!(KeyInput::Char('\u{1a}').ctrl_combination(), Some('Z'));
        assert_eq!(KeyInput::Char('c').ctrl_combination(), None);
        assert_eq!(KeyInput::Named(NamedKey::Ctrl).ctrl_combination(), None);
    }

    #[test]
    fn key_names_match_hotkey_table_vocabulary() {
        assert_eq!(KeyInput::Named(NamedKey::Cmd).name(), "cmd");
        assert_eq!(KeyInput::Named(NamedKey::CapsLock).name(), "caps_lock");
        assert_eq!(KeyInput::Named(NamedKey::F(4)).name(), "f4");
        assert_eq!(KeyInput::Char('d').name(), "d");
    }
}
