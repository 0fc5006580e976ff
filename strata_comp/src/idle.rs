// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Idle fallback: power down the pipes when nothing is animating.
//!
//! Every draw that streamed overlay layers re-arms a one-shot countdown on a
//! background thread. If the countdown expires with no further draw, the
//! timer raises the [`IdleFlag`] and asks the display server for a redraw;
//! the next prepare consumes the flag and routes the whole frame to the
//! framebuffer, letting the overlay pipes idle.
//!
//! The flag hand-off is intentionally racy but safe: the worst case is one
//! extra or one deferred fallback frame.
//!
//! State machine: `{armed → (draw) re-armed}` |
//! `{armed → (timeout) flagged → (prepare consumes) idle}`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Single-slot fallback signal between the timer thread and the engine.
///
/// Raised by the timer, consumed (exactly once per raise) by the next
/// prepare.
#[derive(Debug, Default)]
pub struct IdleFlag(AtomicBool);

impl IdleFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raises the flag.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lowers the flag, returning whether it was raised.
    pub fn consume(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peeks without consuming.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    /// Nothing pending; waiting for the next arm.
    Idle,
    /// Counting down to the deadline.
    Armed(Instant),
    /// Shutting down.
    Stop,
}

struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// One-shot inactivity timer driving the idle fallback.
///
/// The worker thread is joined on drop.
pub struct IdleTimer {
    shared: Arc<Shared>,
    timeout: Duration,
    worker: Option<thread::JoinHandle<()>>,
}

impl std::fmt::Debug for IdleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTimer")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl IdleTimer {
    /// Spawns the timer thread.
    ///
    /// On each expiry the timer raises `flag` and then calls `invalidate`
    /// to request a redraw from the display server.
    #[must_use]
    pub fn spawn(
        timeout: Duration,
        flag: Arc<IdleFlag>,
        invalidate: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState::Idle),
            wake: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("strata-idle".into())
            .spawn(move || run(&worker_shared, &flag, &*invalidate))
            .expect("failed to spawn idle timer thread");

        Self {
            shared,
            timeout,
            worker: Some(worker),
        }
    }

    /// (Re-)arms the countdown. Called by every draw that used pipes.
    pub fn mark_for_sleep(&self) {
        let mut state = self.shared.state.lock().expect("idle timer mutex poisoned");
        if *state != TimerState::Stop {
            *state = TimerState::Armed(Instant::now() + self.timeout);
            self.shared.wake.notify_one();
        }
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("idle timer mutex poisoned");
            *state = TimerState::Stop;
            self.shared.wake.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(shared: &Shared, flag: &IdleFlag, invalidate: &(dyn Fn() + Send + Sync)) {
    let mut state = shared.state.lock().expect("idle timer mutex poisoned");
    loop {
        match *state {
            TimerState::Stop => return,
            TimerState::Idle => {
                state = shared.wake.wait(state).expect("idle timer mutex poisoned");
            }
            TimerState::Armed(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    *state = TimerState::Idle;
                    drop(state);
                    flag.raise();
                    invalidate();
                    state = shared.state.lock().expect("idle timer mutex poisoned");
                } else {
                    let (guard, _) = shared
                        .wake
                        .wait_timeout(state, deadline - now)
                        .expect("idle timer mutex poisoned");
                    state = guard;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn flag_is_consumed_exactly_once() {
        let flag = IdleFlag::new();
        assert!(!flag.consume());
        flag.raise();
        assert!(flag.is_raised());
        assert!(flag.consume());
        assert!(!flag.consume());
        assert!(!flag.is_raised());
    }

    #[test]
    fn timer_fires_after_timeout_and_requests_redraw() {
        let flag = Arc::new(IdleFlag::new());
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_cb = Arc::clone(&fired);
        let timer = IdleTimer::spawn(
            Duration::from_millis(20),
            Arc::clone(&flag),
            Arc::new(move || {
                fired_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );

        timer.mark_for_sleep();
        thread::sleep(Duration::from_millis(300));
        assert!(flag.is_raised(), "flag should be raised after the timeout");
        assert_eq!(fired.load(Ordering::SeqCst), 1, "one-shot: fires once per arm");
    }

    #[test]
    fn unarmed_timer_never_fires() {
        let flag = Arc::new(IdleFlag::new());
        let _timer = IdleTimer::spawn(
            Duration::from_millis(10),
            Arc::clone(&flag),
            Arc::new(|| {}),
        );
        thread::sleep(Duration::from_millis(100));
        assert!(!flag.is_raised());
    }

    #[test]
    fn rearming_restarts_the_countdown() {
        let flag = Arc::new(IdleFlag::new());
        let timer = IdleTimer::spawn(
            Duration::from_millis(200),
            Arc::clone(&flag),
            Arc::new(|| {}),
        );

        timer.mark_for_sleep();
        thread::sleep(Duration::from_millis(50));
        assert!(!flag.is_raised(), "deadline not reached yet");
        timer.mark_for_sleep();
        thread::sleep(Duration::from_millis(50));
        assert!(!flag.is_raised(), "re-arm pushed the deadline out");
    }

    #[test]
    fn drop_joins_cleanly_while_armed() {
        let flag = Arc::new(IdleFlag::new());
        let timer = IdleTimer::spawn(
            Duration::from_secs(60),
            Arc::clone(&flag),
            Arc::new(|| {}),
        );
        timer.mark_for_sleep();
        drop(timer);
        assert!(!flag.is_raised());
    }
}
