//! Tracker configuration
//!
//! Operator-facing knobs: the idle-wait interval, the double-click window,
//! the screen capture interval, the lookahead-queue bound and the table of
//! recognized two-key hotkey combinations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one tracing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Root directory for the persisted log, transcript and screenshots.
    pub events_dir: PathBuf,
    /// Filename prefix for this session's artifacts (e.g. a task id).
    pub session_label: Option<String>,
    /// Idle gap after which a single `wait` action is logged.
    pub wait_interval: Duration,
    /// Two presses at the same coordinates within this window collapse into
    /// one double-click.
    pub double_click_window: Duration,
    /// How often the frame source refreshes the most-recent screenshot.
    pub capture_interval: Duration,
    /// Bound of the lookahead queue; only the newest queued action may
    /// still be rewritten.
    pub lookahead: usize,
    /// Worker threads writing screenshots to disk.
    pub screenshot_workers: usize,
    /// Caps-lock state at session start; toggled on every caps-lock press.
    pub caps_lock_on: bool,
    /// Recognized two-key combinations, in hold order.
    pub hotkeys: Vec<(String, String)>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            events_dir: PathBuf::from("events"),
            session_label: None,
            wait_interval: Duration::from_secs(6),
            double_click_window: Duration::from_millis(500),
            capture_interval: Duration::from_millis(100),
            lookahead: 1,
            screenshot_workers: 2,
            caps_lock_on: false,
            hotkeys: default_hotkeys(),
        }
    }
}

/// The default recognized two-key combinations.
pub fn default_hotkeys() -> Vec<(String, String)> {
    [
        ("alt", "tab"),     // switch between running program windows
        ("alt", "f4"),      // close current window or program
        ("cmd", "d"),       // show desktop
        ("cmd", "e"),       // open file explorer
        ("cmd", "l"),       // lock computer
        ("cmd", "r"),       // open run dialog
        ("cmd", "t"),       // cycle through taskbar programs
        ("cmd", "x"),       // open advanced user menu
        ("cmd", "space"),   // switch input method
        ("cmd", "i"),       // open settings
        ("cmd", "a"),       // open action center
        ("cmd", "s"),       // open search
        ("cmd", "u"),       // open accessibility settings
        ("cmd", "p"),       // open projection settings
        ("cmd", "v"),       // open clipboard history
        ("cmd", "tab"),     // open task view
        ("shift", "delete"), // permanently delete selected items
    ]
    .into_iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

impl TrackerConfig {
    /// Filename prefix for this session's artifacts.
    pub fn prefix(&self) -> &str {
        self.session_label.as_deref().unwrap_or("events")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_intervals() {
        let config = TrackerConfig::default();
        assert_eq!(config.wait_interval, Duration::from_secs(6));
        assert_eq!(config.double_click_window, Duration::from_millis(500));
        assert_eq!(config.capture_interval, Duration::from_millis(100));
        assert_eq!(config.lookahead, 1);
    }

    #[test]
    fn hotkey_table_contains_known_pairs() {
        let table = default_hotkeys();
        assert!(table.contains(&("alt".to_string(), "tab".to_string())));
        assert!(table.contains(&("shift".to_string(), "delete".to_string())));
        assert!(table.contains(&("cmd".to_string(), "d".to_string())));
    }

    #[test]
    fn prefix_falls_back_to_events() {
        let mut config = TrackerConfig::default();
        assert_eq!(config.prefix(), "events");
        config.session_label = Some("task42".into());
        assert_eq!(config.prefix(), "task42");
    }
}
