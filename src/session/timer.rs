// src/session/timer.rs

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::quiz;
use crate::session::SubmitTrigger;
use crate::session::submit::SessionHandle;

/// Seconds on the clock for a quiz, or `None` when the limit is the
/// unlimited sentinel (or zero) and no timer must exist.
pub fn effective_limit_seconds(time_limit_minutes: i64) -> Option<u64> {
    if quiz::is_unlimited(time_limit_minutes) {
        None
    } else {
        Some(time_limit_minutes as u64 * 60)
    }
}

/// One countdown per session, ticking once per second. On reaching zero it
/// invokes the session's submit path exactly once and stops; it never
/// retries. Dropping or [`stop`]ping the timer cancels the task so a stray
/// tick cannot fire into a torn-down session.
///
/// [`stop`]: QuizTimer::stop
#[derive(Debug)]
pub struct QuizTimer {
    remaining: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl QuizTimer {
    /// Returns `None` for unlimited quizzes: no timer is created and
    /// auto-submit on expiry cannot occur.
    pub fn start(time_limit_minutes: i64, session: SessionHandle) -> Option<QuizTimer> {
        let total = effective_limit_seconds(time_limit_minutes)?;
        let (tx, rx) = watch::channel(total);

        let handle = tokio::spawn(async move {
            let mut remaining = total;
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                let _ = tx.send(remaining);
            }

            // Time expired: signal the assembler once. If the submission
            // fails the participant retries; this task is done either way.
            let _ = session.submit(SubmitTrigger::TimeExpiry).await;
        });

        Some(QuizTimer {
            remaining: rx,
            handle,
        })
    }

    /// Seconds left on the clock.
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    /// A receiver that observes every tick, for display loops.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Cancels the countdown. Idempotent.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
