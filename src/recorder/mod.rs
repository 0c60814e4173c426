//! Session log
//!
//! The durable sink for committed actions. Actions enter a short lookahead
//! queue first, so the most recently committed one can still be rewritten
//! (click -> double-click, click -> press, key-down -> hotkey) before it is
//! flushed. Flushing hands the screenshot to an asynchronous worker pool and
//! then appends the action's record to the JSONL log synchronously, so the
//! persisted log's order always matches commit order even though image bytes
//! land on disk slightly later.

pub mod transcript;
pub mod writer;

use crate::action::Action;
use crate::capture::{CapturedFrame, FrameCache};
use crate::config::TrackerConfig;
use crate::element::Rect;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use writer::ScreenshotWriter;

/// Errors that can occur while tracing a session.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("capture error: {0}")]
    Capture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session worker terminated abnormally")]
    WorkerPanicked,

    #[error("session already stopped")]
    AlreadyStopped,
}

/// Result type for tracing operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Timestamp format used inside event records and the transcript.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
/// Timestamp format used in artifact filenames.
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One line of the persisted JSONL log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: String,
    pub action: String,
    pub screenshot: String,
    pub element: Option<String>,
    pub rect: Option<Rect>,
}

/// A timestamp + screenshot pair reserved at the moment something happened,
/// to be committed later once the action's final shape is known (the first
/// keystroke of a typing run, the start of a scroll gesture, a mouse press
/// that may become a drag).
#[derive(Debug, Clone)]
pub struct Observation {
    pub timestamp: DateTime<Local>,
    pub frame: Arc<CapturedFrame>,
}

#[derive(Debug)]
struct QueuedEvent {
    timestamp: DateTime<Local>,
    frame: Arc<CapturedFrame>,
    action: Action,
    rect: Option<Rect>,
}

/// Optional metadata rendered at the top of the transcript.
#[derive(Debug, Clone, Default)]
pub struct SessionMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// The per-session durable sink.
pub struct SessionLog {
    queue: VecDeque<QueuedEvent>,
    lookahead: usize,
    frames: Arc<FrameCache>,
    events_dir: PathBuf,
    log_path: PathBuf,
    transcript_path: PathBuf,
    log_file: std::fs::File,
    writer: ScreenshotWriter,
    saved: u64,
    screenshots: Vec<PathBuf>,
}

impl SessionLog {
    /// Create the events directory layout and open the log file.
    /// Failure here (or on any later append) is session-fatal.
    pub fn create(config: &TrackerConfig, frames: Arc<FrameCache>) -> TrackerResult<Self> {
        let events_dir = config.events_dir.clone();
        let screenshot_dir = events_dir.join("screenshot");
        std::fs::create_dir_all(&screenshot_dir)?;

        let stamp = Local::now().format(FILE_STAMP_FORMAT);
        let base = format!("{}_{stamp}", config.prefix());
        let log_path = events_dir.join(format!("{base}.jsonl"));
        let transcript_path = events_dir.join(format!("{base}.md"));

        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing::info!("session log created at {}", log_path.display());

        Ok(Self {
            queue: VecDeque::new(),
            lookahead: config.lookahead,
            frames,
            events_dir,
            log_path,
            transcript_path,
            log_file,
            writer: ScreenshotWriter::spawn(config.screenshot_workers),
            saved: 0,
            screenshots: Vec::new(),
        })
    }

    /// Snapshot the current wall clock and most recent frame.
    pub fn observe(&self) -> Observation {
        Observation {
            timestamp: Local::now(),
            frame: self.frames.latest(),
        }
    }

    /// Commit an action observed right now.
    pub fn record(&mut self, action: Action, rect: Option<Rect>) -> TrackerResult<()> {
        let observation = self.observe();
        self.record_reserved(observation, action, rect)
    }

    /// Commit an action against a previously reserved observation.
    pub fn record_reserved(
        &mut self,
        observation: Observation,
        action: Action,
        rect: Option<Rect>,
    ) -> TrackerResult<()> {
        self.queue.push_back(QueuedEvent {
            timestamp: observation.timestamp,
            frame: observation.frame,
            action,
            rect,
        });
        while self.queue.len() > self.lookahead {
            self.flush_front()?;
        }
        Ok(())
    }

    /// The newest committed action still eligible for rewriting.
    pub fn last_action(&self) -> Option<&Action> {
        self.queue.back().map(|event| &event.action)
    }

    /// Rewrite the newest queued action in place. Logged no-op when the
    /// queue is empty (everything already flushed is immutable).
    pub fn replace_last(&mut self, action: Action) {
        match self.queue.back_mut() {
            Some(event) => event.action = action,
            None => tracing::warn!("no queued action to rewrite; keeping log as-is"),
        }
    }

    /// Drain the whole lookahead queue in commit order.
    pub fn flush_all(&mut self) -> TrackerResult<()> {
        while !self.queue.is_empty() {
            self.flush_front()?;
        }
        Ok(())
    }

    fn flush_front(&mut self) -> TrackerResult<()> {
        let Some(event) = self.queue.pop_front() else {
            return Ok(());
        };

        self.saved += 1;
        let compact = event
            .timestamp
            .format(TIMESTAMP_FORMAT)
            .to_string()
            .replace([':', '-'], "");
        let relative = format!("screenshot/{compact}_{}.png", self.saved);
        let absolute = self.events_dir.join(&relative);

        // Screenshot bytes land asynchronously; the metadata append below is
        // synchronous, which keeps the log's action order equal to commit
        // order.
        self.writer.submit(absolute.clone(), event.frame);
        self.screenshots.push(absolute);

        let record = EventRecord {
            timestamp: event.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            action: event.action.to_string(),
            screenshot: relative,
            element: event.action.element(),
            rect: event.rect,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        self.log_file.write_all(line.as_bytes())?;
        self.log_file.flush()?;
        Ok(())
    }

    /// Flush everything, wait for pending screenshot writes and seal the
    /// session into a [`FinishedLog`].
    pub fn finish(mut self) -> TrackerResult<FinishedLog> {
        self.flush_all()?;
        self.writer.close();
        tracing::info!(
            "session log finished: {} events, {}",
            self.saved,
            self.log_path.display()
        );
        Ok(FinishedLog {
            events_dir: self.events_dir,
            log_path: self.log_path,
            transcript_path: self.transcript_path,
            screenshots: self.screenshots,
        })
    }
}

/// A sealed session: everything is on disk. From here the log can be turned
/// into a transcript or discarded wholesale.
#[derive(Debug)]
pub struct FinishedLog {
    events_dir: PathBuf,
    log_path: PathBuf,
    transcript_path: PathBuf,
    screenshots: Vec<PathBuf>,
}

impl FinishedLog {
    pub fn events_dir(&self) -> &Path {
        &self.events_dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn transcript_path(&self) -> &Path {
        &self.transcript_path
    }

    /// Read the persisted records back, in order.
    pub fn records(&self) -> TrackerResult<Vec<EventRecord>> {
        let contents = std::fs::read_to_string(&self.log_path)?;
        let mut records = Vec::new();
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            records.push(serde_json::from_str(line)?);
        }
        Ok(records)
    }

    /// Render the human-readable transcript from the persisted log.
    pub fn generate_transcript(&self, meta: &SessionMeta) -> TrackerResult<PathBuf> {
        let records = self.records()?;
        transcript::write_transcript(&self.transcript_path, &records, meta)?;
        Ok(self.transcript_path.clone())
    }

    /// Delete every artifact this session produced: log, transcript (if
    /// generated) and all screenshots. Deliberate rollback, not an error
    /// path.
    pub fn discard(self) -> TrackerResult<()> {
        remove_if_exists(&self.log_path)?;
        remove_if_exists(&self.transcript_path)?;
        for screenshot in &self.screenshots {
            remove_if_exists(screenshot)?;
        }
        tracing::info!("session artifacts discarded");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_frame() -> CapturedFrame {
        CapturedFrame {
            data: vec![0u8; 4 * 4 * 4],
            width: 4,
            height: 4,
            bytes_per_row: 16,
        }
    }

    fn test_log(dir: &Path) -> SessionLog {
        let config = TrackerConfig {
            events_dir: dir.to_path_buf(),
            ..TrackerConfig::default()
        };
        let frames = Arc::new(FrameCache::new(test_frame()));
        SessionLog::create(&config, frames).expect("create session log")
    }

    #[test]
    fn queue_holds_newest_action_until_next_commit() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());

        log.record(Action::Wait, None).expect("record");
        assert_eq!(log.last_action(), Some(&Action::Wait));

        // Nothing flushed yet with the default bound of 1.
        let contents = std::fs::read_to_string(&log.log_path).expect("read log");
        assert!(contents.is_empty());

        log.record(Action::Finish, None).expect("record");
        let contents = std::fs::read_to_string(&log.log_path).expect("read log");
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"wait\""));
    }

    #[test]
    fn replace_last_rewrites_only_queued_entry() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());

        log.record(Action::Click { x: 1, y: 2, element: "a".into() }, None)
            .expect("record");
        log.replace_last(Action::DoubleClick { x: 1, y: 2, element: "a".into() });

        let finished = log.finish().expect("finish");
        let records = finished.records().expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "double click (1, 2)");
    }

    #[test]
    fn replace_last_on_empty_queue_is_noop() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());
        log.replace_last(Action::Wait);
        let finished = log.finish().expect("finish");
        assert!(finished.records().expect("records").is_empty());
    }

    #[test]
    fn flush_preserves_commit_order_and_writes_screenshots() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());

        log.record(Action::KeyDown { key: "a".into() }, None).expect("record");
        log.record(Action::KeyDown { key: "b".into() }, None).expect("record");
        log.record(Action::Wait, None).expect("record");

        let finished = log.finish().expect("finish");
        let records = finished.records().expect("records");
        let actions: Vec<_> = records.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, vec!["press key a", "press key b", "wait"]);

        for record in &records {
            let path = dir.path().join(&record.screenshot);
            assert!(path.exists(), "screenshot {} should exist", path.display());
        }
    }

    #[test]
    fn rect_and_element_round_trip() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());

        let rect = Rect { left: 10, top: 20, right: 110, bottom: 60 };
        log.record(
            Action::Click { x: 50, y: 40, element: "OK button".into() },
            Some(rect),
        )
        .expect("record");
        log.record(Action::KeyDown { key: "enter".into() }, None).expect("record");

        let finished = log.finish().expect("finish");
        let records = finished.records().expect("records");
        assert_eq!(records[0].element.as_deref(), Some("OK button"));
        assert_eq!(records[0].rect, Some(rect));
        assert_eq!(records[1].element, None);
        assert_eq!(records[1].rect, None);
    }

    #[test]
    fn discard_removes_every_artifact() {
        let dir = tempdir().expect("tempdir");
        let mut log = test_log(dir.path());

        log.record(Action::Click { x: 0, y: 0, element: String::new() }, None)
            .expect("record");
        log.record(Action::Fail, None).expect("record");

        let finished = log.finish().expect("finish");
        let log_path = finished.log_path().to_path_buf();
        let transcript = finished
            .generate_transcript(&SessionMeta::default())
            .expect("transcript");
        let screenshots: Vec<_> = std::fs::read_dir(dir.path().join("screenshot"))
            .expect("read screenshot dir")
            .collect();
        assert!(!screenshots.is_empty());

        finished.discard().expect("discard");

        assert!(!log_path.exists());
        assert!(!transcript.exists());
        let remaining: Vec<_> = std::fs::read_dir(dir.path().join("screenshot"))
            .expect("read screenshot dir")
            .collect();
        assert!(remaining.is_empty(), "screenshots should be deleted");
    }
}
