//! Session lifecycle
//!
//! `Session` wires the moving parts together: the background frame capture
//! loop, the deadline timer, and the actor thread that owns the [`Monitor`]
//! and with it every piece of classification state. Producers (the host's
//! input hooks) get a cheap cloneable [`EventSender`]; everything they send
//! funnels through one channel and is consumed strictly in arrival order.
//!
//! A session ends one of three ways: `finish` and `fail` append their
//! terminal action after flushing in-flight buffers, `stop` just flushes.
//! All three tear down the timer first so no idle wait can slip in behind
//! the terminal action, then join the actor and seal the log.

use crate::action::Action;
use crate::capture::{FrameSource, RecentFrame};
use crate::config::TrackerConfig;
use crate::element::ElementProbe;
use crate::input::RawEvent;
use crate::monitor::Monitor;
use crate::recorder::{FinishedLog, SessionLog, TrackerError, TrackerResult};
use crate::timer::DeadlineTimer;
use crossbeam_channel::{unbounded, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

enum SessionMessage {
    Input(RawEvent),
    Terminal(Action),
    Shutdown,
}

/// Handle given to input-hook threads for feeding raw events.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<SessionMessage>,
}

impl EventSender {
    /// Queue a raw event for classification. Events sent after the session
    /// has shut down are dropped; producers race teardown by nature.
    pub fn send(&self, event: RawEvent) {
        if self.tx.send(SessionMessage::Input(event)).is_err() {
            tracing::debug!("event after session shutdown dropped");
        }
    }
}

/// A live tracing session.
pub struct Session {
    id: Uuid,
    tx: Sender<SessionMessage>,
    actor: Option<JoinHandle<TrackerResult<SessionLog>>>,
    timer: Option<DeadlineTimer>,
    frames: Option<RecentFrame>,
}

impl Session {
    /// Start tracing: capture the first frame (fatal if the source cannot
    /// deliver one), create the session log, arm the idle countdown and
    /// spawn the consumer.
    pub fn start(
        config: TrackerConfig,
        source: Arc<dyn FrameSource>,
        probe: Box<dyn ElementProbe>,
    ) -> TrackerResult<Self> {
        let frames = RecentFrame::start(source, config.capture_interval)?;
        let log = SessionLog::create(&config, frames.cache())?;

        let (tx, rx) = unbounded();

        // The timer is a producer like any other: expiry becomes an event on
        // the same queue, so wait detection is serialized with everything
        // else.
        let timer_tx = tx.clone();
        let timer = DeadlineTimer::spawn(config.wait_interval, move || {
            let _ = timer_tx.send(SessionMessage::Input(RawEvent::DeadlineElapsed));
        });

        let mut monitor = Monitor::new(log, probe, timer.control(), &config);
        let actor = std::thread::spawn(move || -> TrackerResult<SessionLog> {
            for message in rx {
                match message {
                    SessionMessage::Input(event) => monitor.handle(event)?,
                    SessionMessage::Terminal(action) => monitor.record_terminal(action)?,
                    SessionMessage::Shutdown => break,
                }
            }
            // Stop breaks typing/scroll continuity; flush what the buffers
            // hold before sealing.
            monitor.finish_session()?;
            Ok(monitor.into_log())
        });

        timer.control().reset();
        let id = Uuid::new_v4();
        tracing::info!("tracing session {id} started");

        Ok(Self {
            id,
            tx,
            actor: Some(actor),
            timer: Some(timer),
            frames: Some(frames),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Cloneable handle for the input-hook threads.
    pub fn sender(&self) -> EventSender {
        EventSender { tx: self.tx.clone() }
    }

    /// End the session recording a terminal `finish` action.
    pub fn finish(self) -> TrackerResult<FinishedLog> {
        self.end(Some(Action::Finish))
    }

    /// End the session recording a terminal `fail` action.
    pub fn fail(self) -> TrackerResult<FinishedLog> {
        self.end(Some(Action::Fail))
    }

    /// End the session without a terminal action.
    pub fn stop(self) -> TrackerResult<FinishedLog> {
        self.end(None)
    }

    fn end(mut self, terminal: Option<Action>) -> TrackerResult<FinishedLog> {
        let Some(actor) = self.actor.take() else {
            return Err(TrackerError::AlreadyStopped);
        };

        // Timer first: once it is gone no deadline event can trail the
        // terminal action.
        if let Some(timer) = self.timer.take() {
            timer.shutdown();
        }

        if let Some(action) = terminal {
            let _ = self.tx.send(SessionMessage::Terminal(action));
        }
        let _ = self.tx.send(SessionMessage::Shutdown);

        let log = match actor.join() {
            Ok(Ok(log)) => log,
            Ok(Err(e)) => {
                tracing::error!("session worker failed: {e}");
                return Err(e);
            }
            Err(_) => {
                tracing::error!("session worker panicked");
                return Err(TrackerError::WorkerPanicked);
            }
        };

        if let Some(frames) = self.frames.take() {
            frames.stop();
        }

        tracing::info!("tracing session {} ended", self.id);
        log.finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // A session dropped without finish/fail/stop still unwinds cleanly;
        // the log's own teardown flushes whatever was committed.
        self.timer.take();
        let _ = self.tx.send(SessionMessage::Shutdown);
        if let Some(actor) = self.actor.take() {
            let _ = actor.join();
        }
    }
}
