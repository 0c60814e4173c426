//! Asynchronous screenshot persistence
//!
//! Flushing an event must never stall the event path on image encoding, so
//! frames are handed to a small pool of worker threads over a bounded
//! channel. A failed image write degrades to a warning; the JSONL record for
//! the event has already been appended by the caller.

use crate::capture::CapturedFrame;
use crossbeam_channel::{bounded, Sender};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Pending writes the queue will hold before `submit` applies backpressure.
const QUEUE_DEPTH: usize = 32;

struct WriteJob {
    path: PathBuf,
    frame: Arc<CapturedFrame>,
}

/// Bounded worker pool turning raw BGRA frames into PNG files.
pub struct ScreenshotWriter {
    tx: Option<Sender<WriteJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl ScreenshotWriter {
    pub fn spawn(workers: usize) -> Self {
        let (tx, rx) = bounded::<WriteJob>(QUEUE_DEPTH);
        let workers = (0..workers.max(1))
            .map(|i| {
                let rx = rx.clone();
                std::thread::spawn(move || {
                    for job in rx {
                        if let Err(e) = write_png(&job.path, &job.frame) {
                            tracing::warn!(
                                "screenshot write failed for {}: {e}",
                                job.path.display()
                            );
                        }
                    }
                    tracing::debug!("screenshot worker {i} stopped");
                })
            })
            .collect();

        Self { tx: Some(tx), workers }
    }

    /// Queue a frame for persistence. Blocks only if the queue is full.
    pub fn submit(&self, path: PathBuf, frame: Arc<CapturedFrame>) {
        if let Some(tx) = &self.tx {
            if tx.send(WriteJob { path, frame }).is_err() {
                tracing::warn!("screenshot writer already closed; frame dropped");
            }
        }
    }

    /// Drain the queue and join the workers. Idempotent.
    pub fn close(&mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for ScreenshotWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Encode a BGRA frame as PNG.
fn write_png(path: &Path, frame: &CapturedFrame) -> Result<(), String> {
    let width = frame.width;
    let height = frame.height;
    let stride = frame.bytes_per_row as usize;

    let needed = stride.saturating_mul(height as usize);
    if frame.data.len() < needed {
        return Err(format!(
            "frame buffer too small: {} bytes for {}x{} stride {}",
            frame.data.len(),
            width,
            height,
            stride
        ));
    }

    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        let row = y as usize * stride;
        for x in 0..width {
            let i = row + x as usize * 4;
            let (b, g, r) = (frame.data[i], frame.data[i + 1], frame.data[i + 2]);
            img.put_pixel(x, y, Rgba([r, g, b, 255]));
        }
    }

    img.save(path).map_err(|e| e.to_string())
}
