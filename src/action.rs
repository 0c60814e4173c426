//! Semantic action model
//!
//! One tagged variant per action kind, carrying only the fields that kind
//! needs. Actions are immutable once flushed from the session log's
//! lookahead queue; until then the newest one may still be rewritten
//! (click -> double-click, click -> press + drag, key-down -> hotkey).

use std::fmt;

/// A normalized, high-level description of user intent derived from raw
/// hardware events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click { x: i32, y: i32, element: String },
    RightClick { x: i32, y: i32, element: String },
    DoubleClick { x: i32, y: i32, element: String },
    /// Mouse-down that turned out to be the start of a drag.
    Press { x: i32, y: i32, element: String },
    Drag { x: i32, y: i32 },
    Scroll { dx: i32, dy: i32 },
    KeyDown { key: String },
    Hotkey { first: String, second: String },
    TypeText { text: String },
    Wait,
    Finish,
    Fail,
}

impl Action {
    /// The UI element the action targeted, if the action kind has one.
    /// An empty element name degrades to "Unknown"; actions without a
    /// target element (keys, scrolls, waits) have none.
    pub fn element(&self) -> Option<String> {
        match self {
            Action::Click { element, .. }
            | Action::RightClick { element, .. }
            | Action::DoubleClick { element, .. }
            | Action::Press { element, .. } => {
                if element.is_empty() {
                    Some("Unknown".to_string())
                } else {
                    Some(element.clone())
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    /// The persisted string form, stable across sessions: this is what ends
    /// up in the JSONL log's `action` field and the transcript.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click { x, y, .. } => write!(f, "click ({x}, {y})"),
            Action::RightClick { x, y, .. } => write!(f, "right click ({x}, {y})"),
            Action::DoubleClick { x, y, .. } => write!(f, "double click ({x}, {y})"),
            Action::Press { x, y, .. } => write!(f, "press ({x}, {y})"),
            Action::Drag { x, y } => write!(f, "drag to ({x}, {y})"),
            Action::Scroll { dx, dy } => write!(f, "scroll ({dx}, {dy})"),
            Action::KeyDown { key } => write!(f, "press key {key}"),
            Action::Hotkey { first, second } => write!(f, "hotkey ({first}, {second})"),
            Action::TypeText { text } => write!(f, "type text: {text}"),
            Action::Wait => write!(f, "wait"),
            Action::Finish => write!(f, "finish"),
            Action::Fail => write!(f, "fail"),
        }
    }
}
