//! Scroll buffer
//!
//! Accumulates wheel deltas from one uninterrupted gesture into a single
//! `scroll` action. The observation is reserved when the gesture starts;
//! the flush that ends the gesture commits the accumulated totals against
//! it. An all-zero accumulation commits nothing.

use crate::action::Action;
use crate::recorder::{Observation, SessionLog, TrackerResult};

#[derive(Default)]
pub struct ScrollBuffer {
    dx: i32,
    dy: i32,
    reserved: Option<Observation>,
}

impl ScrollBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// No gesture in progress.
    pub fn is_empty(&self) -> bool {
        self.reserved.is_none()
    }

    /// Begin a gesture with its first delta and reserved observation.
    pub fn start(&mut self, dx: i32, dy: i32, observation: Observation) {
        self.dx = dx;
        self.dy = dy;
        self.reserved = Some(observation);
    }

    /// Accumulate a further delta from the same gesture.
    pub fn add_delta(&mut self, dx: i32, dy: i32) {
        self.dx += dx;
        self.dy += dy;
    }

    /// End the gesture: commit one scroll action if anything accumulated,
    /// then clear.
    pub fn flush(&mut self, log: &mut SessionLog) -> TrackerResult<()> {
        if let Some(observation) = self.reserved.take() {
            if self.dx != 0 || self.dy != 0 {
                log.record_reserved(
                    observation,
                    Action::Scroll { dx: self.dx, dy: self.dy },
                    None,
                )?;
            }
        }
        self.dx = 0;
        self.dy = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CapturedFrame, FrameCache};
    use crate::config::TrackerConfig;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_log(dir: &std::path::Path) -> SessionLog {
        let config = TrackerConfig {
            events_dir: dir.to_path_buf(),
            ..TrackerConfig::default()
        };
        let frames = Arc::new(FrameCache::new(CapturedFrame {
            data: vec![0u8; 16],
            width: 2,
            height: 2,
            bytes_per_row: 8,
        }));
        SessionLog::create(&config, frames).expect("create log")
    }

    fn flushed_actions(mut log: SessionLog) -> Vec<String> {
        log.flush_all().expect("flush");
        let finished = log.finish().expect("finish");
        finished
            .records()
            .expect("records")
            .iter()
            .map(|r| r.action.clone())
            .collect()
    }

    #[test]
    fn deltas_sum_into_one_scroll() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());
        let mut buffer = ScrollBuffer::new();

        let observation = log.observe();
        buffer.start(0, -1, observation);
        buffer.add_delta(0, -2);
        buffer.add_delta(1, -1);
        buffer.flush(&mut log).expect("flush");

        assert_eq!(flushed_actions(log), vec!["scroll (1, -4)"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_sum_gesture_commits_nothing() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());
        let mut buffer = ScrollBuffer::new();

        let observation = log.observe();
        buffer.start(0, 3, observation);
        buffer.add_delta(0, -3);
        buffer.flush(&mut log).expect("flush");

        assert!(flushed_actions(log).is_empty());
    }

    #[test]
    fn flush_without_gesture_is_noop() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());
        let mut buffer = ScrollBuffer::new();

        buffer.flush(&mut log).expect("flush");
        assert!(flushed_actions(log).is_empty());
    }
}
