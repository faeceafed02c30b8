// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-shot idle timer on a background thread.
//!
//! [`IdleTimer::rearm`] pushes the deadline out by the configured timeout.
//! When the deadline passes without another rearm, the callback runs once on
//! the timer thread and the timer disarms itself until the next rearm.
//!
//! The callback runs without the timer lock held, so it may call back into
//! [`IdleTimer::rearm`] or [`IdleTimer::cancel`].

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

#[derive(Debug)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<TimerState>,
    cv: Condvar,
}

/// Background single-shot timer.
pub struct IdleTimer {
    timeout: Duration,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for IdleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTimer")
            .field("timeout", &self.timeout)
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

impl IdleTimer {
    /// Spawns the timer thread. The timer starts disarmed.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the thread.
    pub fn new(timeout: Duration, on_fire: impl Fn() + Send + 'static) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                deadline: None,
                shutdown: false,
            }),
            cv: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("overlay-idle".to_string())
            .spawn(move || timer_loop(&worker_shared, &on_fire))?;
        Ok(Self {
            timeout,
            shared,
            worker: Some(worker),
        })
    }

    /// Configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Restarts the countdown.
    pub fn rearm(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = Some(Instant::now() + self.timeout);
        self.shared.cv.notify_one();
    }

    /// Disarms the timer.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = None;
        self.shared.cv.notify_one();
    }

    /// Returns `true` while a countdown is running.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.cv.notify_one();
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("idle timer thread panicked");
        }
    }
}

fn timer_loop(shared: &Shared, on_fire: &dyn Fn()) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.deadline {
            None => shared.cv.wait(&mut state),
            Some(deadline) if Instant::now() >= deadline => {
                state.deadline = None;
                MutexGuard::unlocked(&mut state, on_fire);
            }
            Some(deadline) => {
                _ = shared.cv.wait_until(&mut state, deadline);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn wait_for(count: &AtomicUsize, expected: usize) -> bool {
        let give_up = Instant::now() + Duration::from_secs(5);
        while Instant::now() < give_up {
            if count.load(Ordering::Acquire) >= expected {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn fires_once_per_rearm() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let timer = IdleTimer::new(Duration::from_millis(10), move || {
            c.fetch_add(1, Ordering::AcqRel);
        })
        .expect("spawn timer thread");
        assert!(!timer.is_armed());

        timer.rearm();
        assert!(wait_for(&count, 1), "timer never fired");
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::Acquire), 1, "single shot");
        assert!(!timer.is_armed());

        timer.rearm();
        assert!(wait_for(&count, 2), "rearmed timer never fired");
    }

    #[test]
    fn cancel_prevents_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let timer = IdleTimer::new(Duration::from_millis(50), move || {
            c.fetch_add(1, Ordering::AcqRel);
        })
        .expect("spawn timer thread");
        timer.rearm();
        timer.cancel();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(count.load(Ordering::Acquire), 0);
    }

    #[test]
    fn drop_joins_idle_thread() {
        let timer = IdleTimer::new(Duration::from_secs(60), || {}).expect("spawn timer thread");
        timer.rearm();
        drop(timer);
    }
}
