//! screentrace - desktop input tracing, made replayable.
//!
//! This crate turns raw keyboard and mouse hardware events into a compact,
//! time-ordered log of semantic actions (click, drag, type-text, hotkey,
//! idle-wait, ...), each paired with a screenshot taken near the moment of
//! the action. OS input hooking and the surrounding control UI live outside
//! this crate; they feed [`input::RawEvent`]s through [`session::Session`].

pub mod action;
pub mod buffers;
pub mod capture;
pub mod config;
pub mod element;
pub mod input;
pub mod monitor;
pub mod recorder;
pub mod session;
pub mod timer;

pub use action::Action;
pub use capture::{CapturedFrame, FrameSource, RecentFrame};
pub use config::TrackerConfig;
pub use element::{ElementInfo, ElementProbe, Rect};
pub use input::{KeyInput, MouseButton, NamedKey, RawEvent};
pub use recorder::{FinishedLog, SessionLog, SessionMeta, TrackerError, TrackerResult};
pub use session::{EventSender, Session};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for binaries and examples embedding the tracer.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screentrace=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
