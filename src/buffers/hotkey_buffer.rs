//! Hotkey buffer
//!
//! A sliding window of the (at most two) currently-held non-character key
//! names, in hold order. The keyboard classifier matches the window against
//! the configured table of known two-key combinations after each press;
//! key releases pop the most recent entry.

#[derive(Default)]
pub struct HotkeyBuffer {
    held: Vec<String>,
}

impl HotkeyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly pressed key, evicting the oldest when the window is
    /// already full.
    pub fn push(&mut self, key: String) {
        if self.held.len() == 2 {
            self.held.remove(0);
        }
        self.held.push(key);
    }

    /// Key released: drop the most recent entry.
    pub fn pop(&mut self) {
        self.held.pop();
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// The currently held pair, in hold order, if exactly two keys are held.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.held.as_slice() {
            [first, second] => Some((first, second)),
            _ => None,
        }
    }
}
