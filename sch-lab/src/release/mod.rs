/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic release source.
//!
//! A periodic timer whose expiry callback posts once to a counting
//! semaphore.  It runs in the timer service's execution context, fully
//! decoupled from command dispatch; the semaphore is the only state it
//! touches.
//!
//! # Status: no consumer
//! Nothing in the dispatch loop waits on the semaphore yet.  The count
//! simply accumulates up to the semaphore's maximum.  A cyclic dispatch loop
//! that takes one count per tick and walks the schedule table by
//! `packet_rate` is the intended consumer.

pub mod semaphore;
pub mod timer;

pub use semaphore::{CountingSemaphore, GiveOutcome};
pub use timer::{ManualTimerService, TimerCallback, TimerError, TimerId, TimerService, TokioTimerService};

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

/// Name under which the release timer is registered.
pub const RELEASE_TIMER_NAME: &str = "SCH_LAB_TIMER";

/// Name of the release semaphore.
pub const RELEASE_SEM_NAME: &str = "SCH_LAB_TIMING_SEM";

/// Timer expiry handler: exactly one non-blocking post.
///
/// Must stay free of locks, allocation and logging.
pub fn on_timer_expiry(_timer: TimerId, semaphore: &CountingSemaphore) {
    let _ = semaphore.give();
}

/// Owns the release semaphore and, once armed, the timer driving it.
#[derive(Debug)]
pub struct PeriodicReleaseSource {
    semaphore: Arc<CountingSemaphore>,
    timer: Option<TimerId>,
    period: Option<Duration>,
}

impl PeriodicReleaseSource {
    /// New source with an empty semaphore bounded at `max`.
    pub fn new(max: u32) -> Self {
        Self {
            semaphore: Arc::new(CountingSemaphore::new(RELEASE_SEM_NAME, 0, max)),
            timer: None,
            period: None,
        }
    }

    /// Register the periodic timer with `service`.
    ///
    /// Re-arming replaces nothing: an already armed source keeps its timer
    /// and returns its id.
    pub fn arm(
        &mut self,
        service: &dyn TimerService,
        period: Duration,
    ) -> Result<TimerId, TimerError> {
        if let Some(id) = self.timer {
            return Ok(id);
        }

        let sem = Arc::clone(&self.semaphore);
        let id = service.add_periodic(
            RELEASE_TIMER_NAME,
            period,
            Box::new(move |timer| on_timer_expiry(timer, &sem)),
        )?;

        self.timer = Some(id);
        self.period = Some(period);
        info!(
            timer = %id,
            period_ms = period.as_millis() as u64,
            semaphore = self.semaphore.name(),
            max = self.semaphore.max(),
            "periodic release armed"
        );
        Ok(id)
    }

    /// Remove the timer from `service`.  A source that was never armed is
    /// left untouched.
    pub fn disarm(&mut self, service: &dyn TimerService) -> Result<(), TimerError> {
        if let Some(id) = self.timer.take() {
            self.period = None;
            service.delete(id)?;
        }
        Ok(())
    }

    pub fn semaphore(&self) -> &Arc<CountingSemaphore> {
        &self.semaphore
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_expiries_without_consumer_raise_count_by_three() {
        let svc = ManualTimerService::new();
        let mut src = PeriodicReleaseSource::new(64);
        let id = src.arm(&svc, Duration::from_millis(10)).unwrap();

        for _ in 0..3 {
            svc.fire(id).unwrap();
        }
        assert_eq!(src.semaphore().count(), 3);
    }

    #[test]
    fn expiries_saturate_at_semaphore_max() {
        let svc = ManualTimerService::new();
        let mut src = PeriodicReleaseSource::new(2);
        let id = src.arm(&svc, Duration::from_millis(10)).unwrap();

        for _ in 0..5 {
            svc.fire(id).unwrap();
        }
        assert_eq!(src.semaphore().count(), 2);
    }

    #[test]
    fn on_timer_expiry_posts_exactly_once() {
        let sem = CountingSemaphore::new("S", 0, 10);
        on_timer_expiry(TimerId(0), &sem);
        assert_eq!(sem.count(), 1);
    }

    #[test]
    fn arm_is_idempotent_and_disarm_removes_timer() {
        let svc = ManualTimerService::new();
        let mut src = PeriodicReleaseSource::new(8);
        let a = src.arm(&svc, Duration::from_millis(10)).unwrap();
        let b = src.arm(&svc, Duration::from_millis(20)).unwrap();
        assert_eq!(a, b);
        assert_eq!(svc.ids().len(), 1);
        assert_eq!(src.period(), Some(Duration::from_millis(10)));

        src.disarm(&svc).unwrap();
        assert!(src.timer().is_none());
        assert!(svc.ids().is_empty());
        src.disarm(&svc).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_driven_release_posts_per_tick() {
        let svc = TokioTimerService::current().unwrap();
        let mut src = PeriodicReleaseSource::new(64);
        src.arm(&svc, Duration::from_millis(50)).unwrap();

        tokio::time::sleep(Duration::from_millis(175)).await;
        assert_eq!(src.semaphore().count(), 3);
    }
}
