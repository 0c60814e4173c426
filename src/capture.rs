//! Frame source
//!
//! Screen capture is expensive, so it never happens on the event path.
//! A dedicated thread re-captures the screen at a fixed interval and parks
//! the result in a locked slot; anything assembling an event grabs the most
//! recent frame without waiting for an in-progress capture. Readers observe
//! a frame no staler than one capture interval.

use crate::recorder::{TrackerError, TrackerResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame data from a capture source (BGRA format).
#[derive(Debug)]
pub struct CapturedFrame {
    /// Raw pixel data (BGRA format)
    pub data: Vec<u8>,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Bytes per row (may include padding)
    pub bytes_per_row: u32,
}

/// Trait for screen capture backends.
///
/// The platform implementation lives outside this crate; tests use a
/// synthetic source.
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> TrackerResult<CapturedFrame>;
}

/// The most recent frame, shared between the capture thread (writer) and
/// anything assembling an event (readers).
pub struct FrameCache {
    slot: Mutex<Arc<CapturedFrame>>,
}

impl FrameCache {
    pub fn new(initial: CapturedFrame) -> Self {
        Self {
            slot: Mutex::new(Arc::new(initial)),
        }
    }

    pub fn store(&self, frame: CapturedFrame) {
        *self.slot.lock() = Arc::new(frame);
    }

    /// The most recently stored frame. Never blocks on a capture.
    pub fn latest(&self) -> Arc<CapturedFrame> {
        self.slot.lock().clone()
    }
}

/// Timer-driven capture loop keeping a [`FrameCache`] fresh.
pub struct RecentFrame {
    cache: Arc<FrameCache>,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl RecentFrame {
    /// Capture one frame synchronously, then keep re-capturing on a
    /// background thread every `interval`.
    ///
    /// Failure of the very first capture is fatal (there is no frame to fall
    /// back to); afterwards a failed tick only logs a warning and the
    /// previous frame stays valid.
    pub fn start(source: Arc<dyn FrameSource>, interval: Duration) -> TrackerResult<Self> {
        let first = source.capture()?;
        let cache = Arc::new(FrameCache::new(first));

        let running = Arc::new(AtomicBool::new(true));
        let thread_cache = cache.clone();
        let thread_running = running.clone();

        let thread = std::thread::spawn(move || {
            tracing::info!("frame capture loop started (interval={:?})", interval);

            while thread_running.load(Ordering::Relaxed) {
                let tick_start = Instant::now();

                match source.capture() {
                    Ok(frame) => thread_cache.store(frame),
                    Err(e) => {
                        tracing::warn!("capture tick failed, reusing previous frame: {e}");
                    }
                }

                let elapsed = tick_start.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }

            tracing::info!("frame capture loop stopped");
        });

        Ok(Self {
            cache,
            running,
            thread: Some(thread),
        })
    }

    pub fn cache(&self) -> Arc<FrameCache> {
        self.cache.clone()
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RecentFrame {
    fn drop(&mut self) {
        self.shutdown();
    }
}
