/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Timed execution of workers.
//!
//! [`busy_wait`] is the single "block for at least D" primitive.  It samples
//! the monotonic clock in a tight loop instead of sleeping, so occupancy is
//! never shortened by scheduler sleep granularity.  The price is a fully
//! busy core for the whole duration.
//!
//! [`TimedExecutor`] brackets a worker invocation with two clock samples and
//! reports the measured elapsed time.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::worker::{TaskId, Worker};

/// Spin until at least `duration` has elapsed on the monotonic clock.
///
/// Returns the elapsed time actually observed (always `>= duration`).
pub fn busy_wait(duration: Duration) -> Duration {
    let start = Instant::now();
    loop {
        let elapsed = start.elapsed();
        if elapsed >= duration {
            return elapsed;
        }
        std::hint::spin_loop();
    }
}

/// Result of one worker invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub task: TaskId,
    pub nominal: Duration,
    pub elapsed: Duration,
}

impl Completion {
    /// Time spent beyond the nominal duration.
    pub fn overrun(&self) -> Duration {
        self.elapsed.saturating_sub(self.nominal)
    }
}

/// Runs workers and measures them.  Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedExecutor;

impl TimedExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Invoke `worker` and wait for it to finish.
    ///
    /// Cannot fail and cannot be cancelled once started.
    pub fn execute<W: Worker + ?Sized>(&self, worker: &W) -> Completion {
        let start = Instant::now();
        worker.run();
        let elapsed = start.elapsed();

        let completion = Completion {
            task: worker.task_id(),
            nominal: worker.nominal_duration(),
            elapsed,
        };
        debug!(
            task = %completion.task,
            nominal_ms = completion.nominal.as_millis() as u64,
            elapsed_us = completion.elapsed.as_micros() as u64,
            "worker finished"
        );
        completion
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{DummyTask, WorkerCatalog};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Upper slack allowed for scheduler jitter on a loaded CI machine.
    const JITTER: Duration = Duration::from_millis(250);

    #[test]
    fn busy_wait_never_returns_early() {
        for ms in [0u64, 1, 5, 20] {
            let d = Duration::from_millis(ms);
            let outer = Instant::now();
            let observed = busy_wait(d);
            assert!(observed >= d);
            assert!(outer.elapsed() >= d);
        }
    }

    #[test]
    fn busy_wait_zero_returns_immediately() {
        let observed = busy_wait(Duration::ZERO);
        assert!(observed < JITTER);
    }

    #[test]
    fn every_catalog_worker_occupies_at_least_its_nominal_duration() {
        let exec = TimedExecutor::new();
        let catalog = WorkerCatalog::new();
        for worker in catalog.iter() {
            let outer = Instant::now();
            let c = exec.execute(worker);
            let external = outer.elapsed();

            assert_eq!(c.task, worker.task_id());
            assert!(c.elapsed >= c.nominal, "{} returned early", c.task);
            assert!(external >= c.nominal);
            assert!(external < c.nominal + JITTER, "{} took {:?}", c.task, external);
        }
    }

    struct CountingWorker {
        runs: AtomicU32,
    }

    impl Worker for CountingWorker {
        fn task_id(&self) -> TaskId {
            TaskId::Task1
        }
        fn nominal_duration(&self) -> Duration {
            Duration::from_millis(2)
        }
        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            busy_wait(self.nominal_duration());
        }
    }

    #[test]
    fn execute_invokes_worker_exactly_once() {
        let w = CountingWorker {
            runs: AtomicU32::new(0),
        };
        let c = TimedExecutor::new().execute(&w);
        assert_eq!(w.runs.load(Ordering::SeqCst), 1);
        assert!(c.elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn overrun_is_elapsed_minus_nominal() {
        let c = Completion {
            task: TaskId::Task2,
            nominal: Duration::from_millis(75),
            elapsed: Duration::from_millis(77),
        };
        assert_eq!(c.overrun(), Duration::from_millis(2));
    }

    #[test]
    fn dyn_worker_is_accepted() {
        let w: Box<dyn Worker> = Box::new(DummyTask::new(TaskId::Task1));
        let c = TimedExecutor::new().execute(w.as_ref());
        assert!(c.elapsed >= Duration::from_millis(50));
    }
}
