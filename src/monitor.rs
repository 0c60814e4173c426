//! Keyboard and mouse classifiers
//!
//! `Monitor` is the single serialized consumer of the session's raw-event
//! queue. Every producer (keyboard hook thread, mouse hook thread, deadline
//! timer) feeds the same channel, so all buffer and lookahead-queue state is
//! mutated one event at a time, in arrival order, without further locking.
//!
//! The classifiers compress raw events into semantic actions: keystroke
//! bursts become one type-text, matched key pairs become hotkeys, a second
//! press in the double-click window rewrites the pending click, and a
//! displaced release rewrites a pending click into press + drag.

use crate::action::Action;
use crate::buffers::{HotkeyBuffer, ScrollBuffer, TypeBuffer};
use crate::config::TrackerConfig;
use crate::element::ElementProbe;
use crate::input::{KeyInput, MouseButton, NamedKey, RawEvent};
use crate::recorder::{Observation, SessionLog, TrackerResult};
use crate::timer::TimerControl;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Memory of the most recent mouse press, for double-click and drag
/// reclassification.
#[derive(Debug)]
struct LastClick {
    x: i32,
    y: i32,
    at: Option<Instant>,
    element_name: String,
}

impl LastClick {
    fn new() -> Self {
        Self { x: 0, y: 0, at: None, element_name: String::new() }
    }

    fn update(&mut self, x: i32, y: i32, element_name: String) {
        self.x = x;
        self.y = y;
        self.at = Some(Instant::now());
        self.element_name = element_name;
    }

    /// Second press at the same coordinates inside the double-click window?
    fn qualifies_double(&self, x: i32, y: i32, window: Duration) -> bool {
        self.x == x
            && self.y == y
            && self.at.map(|at| at.elapsed() < window).unwrap_or(false)
    }

    fn moved_from(&self, x: i32, y: i32) -> bool {
        self.x != x || self.y != y
    }
}

/// The serialized event consumer: owns the session log, all buffers and the
/// classification state.
pub struct Monitor {
    log: SessionLog,
    probe: Box<dyn ElementProbe>,
    timer: TimerControl,
    type_buffer: TypeBuffer,
    scroll_buffer: ScrollBuffer,
    hotkey_buffer: HotkeyBuffer,
    hotkeys: Vec<(String, String)>,
    double_click_window: Duration,
    caps_lock_on: bool,
    pressed: HashSet<KeyInput>,
    last_click: LastClick,
    reserved_drag: Option<Observation>,
}

impl Monitor {
    pub fn new(
        log: SessionLog,
        probe: Box<dyn ElementProbe>,
        timer: TimerControl,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            log,
            probe,
            timer,
            type_buffer: TypeBuffer::new(),
            scroll_buffer: ScrollBuffer::new(),
            hotkey_buffer: HotkeyBuffer::new(),
            hotkeys: config.hotkeys.clone(),
            double_click_window: config.double_click_window,
            caps_lock_on: config.caps_lock_on,
            pressed: HashSet::new(),
            last_click: LastClick::new(),
            reserved_drag: None,
        }
    }

    /// Process one raw event. Errors are session-fatal (log file I/O).
    pub fn handle(&mut self, event: RawEvent) -> TrackerResult<()> {
        match event {
            RawEvent::KeyDown(key) => self.on_key_down(key),
            RawEvent::KeyUp(key) => {
                self.on_key_up(key);
                Ok(())
            }
            RawEvent::ButtonPress { x, y, button } => self.on_button(x, y, button, true),
            RawEvent::ButtonRelease { x, y, button } => self.on_button(x, y, button, false),
            // Pointer motion is ambient input only; it is never logged.
            RawEvent::PointerMove { .. } => Ok(()),
            RawEvent::Wheel { dx, dy } => self.on_wheel(dx, dy),
            RawEvent::DeadlineElapsed => self.on_deadline(),
        }
    }

    /// Commit the terminal action (finish/fail), flushing in-flight buffered
    /// input first so the terminal action stays last.
    pub fn record_terminal(&mut self, action: Action) -> TrackerResult<()> {
        self.flush_buffers()?;
        self.log.record(action, None)
    }

    /// Explicit stop breaks continuity: flush whatever the buffers hold.
    pub fn finish_session(&mut self) -> TrackerResult<()> {
        self.flush_buffers()
    }

    pub fn into_log(self) -> SessionLog {
        self.log
    }

    fn flush_buffers(&mut self) -> TrackerResult<()> {
        self.type_buffer.flush(&mut self.log)?;
        self.scroll_buffer.flush(&mut self.log)
    }

    fn is_known_hotkey(&self, first: &str, second: &str) -> bool {
        self.hotkeys.iter().any(|(a, b)| a == first && b == second)
    }

    /// Physical keyboards report key codes that ignore caps-lock; flip the
    /// case of letters while it is on.
    fn correct_case(&self, ch: char) -> char {
        if !self.caps_lock_on || !ch.is_alphabetic() {
            return ch;
        }
        if ch.is_lowercase() {
            ch.to_uppercase().next().unwrap_or(ch)
        } else {
            ch.to_lowercase().next().unwrap_or(ch)
        }
    }

    fn on_key_down(&mut self, key: KeyInput) -> TrackerResult<()> {
        // OS auto-repeat delivers key-down again while held; drop repeats.
        if !self.pressed.insert(key) {
            return Ok(());
        }

        // Any key press ends an idle countdown and an ongoing scroll gesture.
        self.timer.reset();
        self.scroll_buffer.flush(&mut self.log)?;

        if key == KeyInput::Named(NamedKey::CapsLock) {
            self.caps_lock_on = !self.caps_lock_on;
        }

        let typeable = key.is_typeable();
        if typeable {
            self.type_buffer.set_typing(true);
            self.type_buffer.promote();
        } else {
            self.type_buffer.set_typing(false);
        }

        // Sample the previous key's swallowed-shift flag before this key can
        // set it. Only a shift absorbed by a non-empty typing run sets the
        // flag; a shift pressed outside a run commits its own key-down below
        // and must not resurface a second time.
        let pending_shift = self.type_buffer.last_was_shift();
        self.type_buffer.set_shift(false);

        self.hotkey_buffer.push(key.name());
        let matched_pair = self
            .hotkey_buffer
            .pair()
            .filter(|&(first, second)| self.is_known_hotkey(first, second))
            .map(|(first, second)| (first.to_string(), second.to_string()));

        if !typeable {
            // Keys that cannot appear in a typing run close the run out.
            self.type_buffer.flush(&mut self.log)?;
            if pending_shift {
                self.log.record(Action::KeyDown { key: "shift".into() }, None)?;
            }

            if let Some(second) = key.ctrl_combination() {
                let action = Action::Hotkey { first: "ctrl".into(), second: second.to_string() };
                let merge = matches!(
                    self.log.last_action(),
                    Some(Action::KeyDown { key }) if key == "ctrl"
                );
                if merge {
                    self.log.replace_last(action);
                } else {
                    self.log.record(action, None)?;
                }
            } else if matched_pair.is_none() {
                self.log.record(Action::KeyDown { key: key.name() }, None)?;
            }
        } else if matched_pair.is_none() {
            if self.type_buffer.is_empty() {
                match key {
                    // Only characters can start a typing run; the run's
                    // observation is reserved at its first character.
                    KeyInput::Char(c) => {
                        let c = self.correct_case(c);
                        self.type_buffer.append(c, &self.log);
                        self.type_buffer.reserve(&self.log);
                    }
                    KeyInput::Named(named) => {
                        self.log.record(Action::KeyDown { key: named.name() }, None)?;
                    }
                }
            } else {
                match key {
                    KeyInput::Named(NamedKey::Backspace) => {
                        self.type_buffer.backspace(&mut self.log)?;
                    }
                    KeyInput::Named(NamedKey::Space) => {
                        self.type_buffer.append(' ', &self.log);
                    }
                    KeyInput::Char(c) => {
                        let c = self.correct_case(c);
                        self.type_buffer.append(c, &self.log);
                    }
                    KeyInput::Named(NamedKey::Shift) => {
                        // Swallowed by the run; resurfaces only if a
                        // non-typeable key breaks the run before the next
                        // character.
                        self.type_buffer.set_shift(true);
                    }
                    // Caps-lock mid-run only adjusts state.
                    KeyInput::Named(_) => {}
                }
            }
        }

        if let Some((first, second)) = matched_pair {
            let action = Action::Hotkey { first: first.clone(), second };
            let merge = matches!(
                self.log.last_action(),
                Some(Action::KeyDown { key }) if *key == first
            );
            if merge {
                self.log.replace_last(action);
            } else {
                self.log.record(action, None)?;
            }
        }

        Ok(())
    }

    fn on_key_up(&mut self, key: KeyInput) {
        self.pressed.remove(&key);
        self.hotkey_buffer.pop();
    }

    fn on_button(
        &mut self,
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    ) -> TrackerResult<()> {
        self.timer.reset();
        self.type_buffer.set_typing(false);
        self.type_buffer.set_shift(false);
        self.scroll_buffer.flush(&mut self.log)?;

        if pressed {
            self.on_press(x, y, button)
        } else {
            self.on_release(x, y)
        }
    }

    fn on_press(&mut self, x: i32, y: i32, button: MouseButton) -> TrackerResult<()> {
        // Probe failure degrades to an unknown element, never aborts.
        let element = self.probe.element_at(x, y);
        let (name, rect) = match element {
            Some(info) => (info.name, info.rect),
            None => (String::new(), None),
        };

        self.type_buffer.flush(&mut self.log)?;
        // Reserve the observation now in case this press becomes a drag.
        self.reserved_drag = Some(self.log.observe());

        if self.last_click.qualifies_double(x, y, self.double_click_window) {
            // Rewrite only a still-pending plain click; anything else
            // (already a double-click, already flushed) stands.
            let pending = match self.log.last_action() {
                Some(Action::Click { element, .. }) => Some(element.clone()),
                _ => None,
            };
            if let Some(element) = pending {
                self.log.replace_last(Action::DoubleClick { x, y, element });
            }
        } else {
            match button {
                MouseButton::Left => {
                    self.log
                        .record(Action::Click { x, y, element: name.clone() }, rect)?;
                }
                MouseButton::Right => {
                    self.log
                        .record(Action::RightClick { x, y, element: name.clone() }, rect)?;
                }
                MouseButton::Middle => {
                    tracing::debug!("middle button press at ({x}, {y}) ignored");
                }
            }
        }

        self.last_click.update(x, y, name);
        Ok(())
    }

    fn on_release(&mut self, x: i32, y: i32) -> TrackerResult<()> {
        if !self.last_click.moved_from(x, y) {
            // Release where the press happened: the click committed at
            // press time stands.
            return Ok(());
        }

        if matches!(self.log.last_action(), Some(Action::Click { .. })) {
            let press = Action::Press {
                x: self.last_click.x,
                y: self.last_click.y,
                element: self.last_click.element_name.clone(),
            };
            self.log.replace_last(press);

            let drag = Action::Drag { x, y };
            match self.reserved_drag.take() {
                Some(observation) => self.log.record_reserved(observation, drag, None)?,
                None => self.log.record(drag, None)?,
            }
        } else {
            // Displaced release over anything but a pending plain click
            // (right-button drags, post-double-click releases) is an
            // underspecified interleaving; flag it instead of guessing.
            tracing::warn!("displaced release at ({x}, {y}) with no pending click; not reclassifying");
        }
        Ok(())
    }

    fn on_wheel(&mut self, dx: i32, dy: i32) -> TrackerResult<()> {
        // While a scroll gesture is live, elapsed time means nothing for
        // idle detection.
        self.timer.stop();
        self.type_buffer.set_typing(false);
        self.type_buffer.set_shift(false);
        self.type_buffer.flush(&mut self.log)?;

        if self.scroll_buffer.is_empty() {
            let observation = self.log.observe();
            self.scroll_buffer.start(dx, dy, observation);
        } else {
            self.scroll_buffer.add_delta(dx, dy);
        }
        Ok(())
    }

    fn on_deadline(&mut self) -> TrackerResult<()> {
        // Typing suppresses idle detection; either way the countdown re-arms.
        if !self.type_buffer.last_was_typing() {
            self.log.record(Action::Wait, None)?;
        }
        self.timer.reset();
        Ok(())
    }
}
