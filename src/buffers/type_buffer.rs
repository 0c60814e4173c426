//! Type buffer
//!
//! Converts bursts of character-class keystrokes into one `type text`
//! action. Below the merge threshold (two characters) each keystroke is
//! staged as an individual `press key` sub-event in a replay list; nothing
//! is durable yet, so the run can still be superseded. Once the accumulated
//! text reaches two characters the buffer promotes to merged mode, the
//! staged sub-events are absorbed, and the observation reserved at the first
//! character becomes the eventual `type text` event's screenshot.

use crate::action::Action;
use crate::recorder::{Observation, SessionLog, TrackerResult};

#[derive(Default)]
pub struct TypeBuffer {
    text: String,
    /// Whether the run has been promoted to one merged type-text action.
    merged: bool,
    /// Whether the last handled input could plausibly be typing; the
    /// deadline timer suppresses idle waits while this is set.
    last_was_typing: bool,
    /// Whether the last key pressed was the shift modifier.
    last_was_shift: bool,
    /// Observation reserved at the first character of the run.
    reserved: Option<Observation>,
    /// Not-yet-durable individual key-press sub-events.
    staged: Vec<(Observation, Action)>,
}

impl TypeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn last_was_typing(&self) -> bool {
        self.last_was_typing
    }

    pub fn set_typing(&mut self, typing: bool) {
        self.last_was_typing = typing;
    }

    pub fn last_was_shift(&self) -> bool {
        self.last_was_shift
    }

    pub fn set_shift(&mut self, shift: bool) {
        self.last_was_shift = shift;
    }

    /// Append a (case-corrected) character. Until the run is merged each
    /// character also stages its own `press key` sub-event.
    pub fn append(&mut self, ch: char, log: &SessionLog) {
        self.text.push(ch);
        if !self.merged {
            self.staged
                .push((log.observe(), Action::KeyDown { key: ch.to_string() }));
        }
    }

    /// Reserve the observation for the eventual merged type-text commit.
    /// Called when the first character of a run is appended.
    pub fn reserve(&mut self, log: &SessionLog) {
        self.reserved = Some(log.observe());
    }

    /// Promote to merged mode once the accumulated text is long enough.
    /// The staged sub-events are dropped; they will be absorbed into the
    /// eventual type-text action.
    pub fn promote(&mut self) {
        if self.text.chars().count() >= 2 && !self.merged {
            self.merged = true;
            self.staged.clear();
        }
    }

    /// Remove the last character, staging a backspace sub-event while the
    /// run is unmerged. A backspace on an empty buffer flushes and commits a
    /// standalone `press key backspace`.
    pub fn backspace(&mut self, log: &mut SessionLog) -> TrackerResult<()> {
        if !self.text.is_empty() {
            self.text.pop();
            if !self.merged {
                self.staged
                    .push((log.observe(), Action::KeyDown { key: "backspace".into() }));
            }
            Ok(())
        } else {
            self.flush(log)?;
            log.record(Action::KeyDown { key: "backspace".into() }, None)
        }
    }

    /// Commit whatever the run produced and clear all state.
    ///
    /// Merged with non-empty text: one `type text` action carrying the
    /// reserved observation. Unmerged: replay the staged sub-events in
    /// order.
    pub fn flush(&mut self, log: &mut SessionLog) -> TrackerResult<()> {
        if self.merged && !self.text.is_empty() {
            let action = Action::TypeText { text: std::mem::take(&mut self.text) };
            match self.reserved.take() {
                Some(observation) => log.record_reserved(observation, action, None)?,
                None => {
                    // Merged runs always start with a reserved first-character
                    // observation; fall back rather than lose the text.
                    tracing::warn!("merged typing run without reserved observation");
                    log.record(action, None)?;
                }
            }
        } else if !self.merged {
            for (observation, action) in self.staged.drain(..) {
                log.record_reserved(observation, action, None)?;
            }
        }

        self.text.clear();
        self.merged = false;
        self.last_was_typing = false;
        self.last_was_shift = false;
        self.reserved = None;
        self.staged.clear();
        Ok(())
    }
}
