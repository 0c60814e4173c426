//! Deadline timer
//!
//! A restartable, cancellable single-shot deadline running on its own
//! thread. When the countdown expires the timer invokes its callback (the
//! session wires this to a `DeadlineElapsed` event on the serialized queue)
//! and disarms; the consumer re-arms it when it handles the event.
//!
//! `reset` cancels any pending deadline and restarts the countdown; `stop`
//! cancels without restarting (used during scroll gestures, where an
//! elapsed-time "wait" would be meaningless). A generation counter makes
//! wakeups from superseded deadlines harmless.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct TimerState {
    deadline: Option<Instant>,
    generation: u64,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// Cheap handle used by the event consumer to re-arm or cancel the timer.
#[derive(Clone)]
pub struct TimerControl {
    shared: Arc<TimerShared>,
    interval: Duration,
}

impl TimerControl {
    /// Cancel any pending deadline and restart the countdown.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.deadline = Some(Instant::now() + self.interval);
        self.shared.cond.notify_one();
    }

    /// Cancel without restarting.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        state.generation += 1;
        state.deadline = None;
        self.shared.cond.notify_one();
    }
}

/// Owning side of the timer; shuts the thread down on drop.
pub struct DeadlineTimer {
    shared: Arc<TimerShared>,
    interval: Duration,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl DeadlineTimer {
    /// Spawn the timer thread, initially disarmed. `on_elapsed` runs on the
    /// timer thread each time an armed deadline expires.
    pub fn spawn<F>(interval: Duration, on_elapsed: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                deadline: None,
                generation: 0,
                shutdown: false,
            }),
            cond: Condvar::new(),
        });

        let thread_shared = shared.clone();
        let thread = std::thread::spawn(move || {
            let mut state = thread_shared.state.lock();
            loop {
                if state.shutdown {
                    break;
                }
                match state.deadline {
                    None => {
                        thread_shared.cond.wait(&mut state);
                    }
                    Some(deadline) => {
                        let generation = state.generation;
                        let result = thread_shared.cond.wait_until(&mut state, deadline);
                        if state.shutdown {
                            break;
                        }
                        // Only fire if this exact deadline ran out; a reset
                        // or stop in the meantime bumps the generation.
                        if result.timed_out() && state.generation == generation {
                            state.deadline = None;
                            MutexGuard::unlocked(&mut state, || on_elapsed());
                        }
                    }
                }
            }
            tracing::debug!("deadline timer thread stopped");
        });

        Self {
            shared,
            interval,
            thread: Some(thread),
        }
    }

    pub fn control(&self) -> TimerControl {
        TimerControl {
            shared: self.shared.clone(),
            interval: self.interval,
        }
    }

    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.cond.notify_one();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_timer(interval: Duration) -> (DeadlineTimer, Arc<AtomicU32>) {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_in_cb = fired.clone();
        let timer = DeadlineTimer::spawn(interval, move || {
            fired_in_cb.fetch_add(1, Ordering::SeqCst);
        });
        (timer, fired)
    }

    #[test]
    fn fires_once_after_interval() {
        let (timer, fired) = counting_timer(Duration::from_millis(20));
        timer.control().reset();

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 1, "single-shot: no re-arm without reset");
    }

    #[test]
    fn reset_postpones_expiry() {
        let (timer, fired) = counting_timer(Duration::from_millis(50));
        let control = timer.control();
        control.reset();

        // Keep resetting before the deadline can run out.
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(20));
            control.reset();
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_cancels_without_firing() {
        let (timer, fired) = counting_timer(Duration::from_millis(30));
        let control = timer.control();
        control.reset();
        control.stop();

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disarmed_timer_never_fires() {
        let (_timer, fired) = counting_timer(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
