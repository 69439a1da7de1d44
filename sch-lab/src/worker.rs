/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Catalog of the demo worker routines.
//!
//! Five workers exist, one per task selector.  Each one has a nominal
//! minimum duration and its only observable effect is keeping the calling
//! thread busy for at least that long:
//!
//! | Selector | Worker | Nominal |
//! |---|---|---|
//! | 1 | `Task1` |  50 ms |
//! | 2 | `Task2` |  75 ms |
//! | 3 | `Task3` | 125 ms |
//! | 4 | `Task4` | 100 ms |
//! | 5 | `Task5` | 150 ms |

use std::fmt;
use std::time::Duration;

use crate::executor::busy_wait;

// ── Task identifier ───────────────────────────────────────────────────────────

/// Typed task selector.
///
/// The raw selector byte only becomes a `TaskId` through
/// [`TaskId::try_from`], so every value of this type names a worker that
/// exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Task1,
    Task2,
    Task3,
    Task4,
    Task5,
}

impl TaskId {
    /// Every task in selector order.
    pub const ALL: [TaskId; 5] = [
        TaskId::Task1,
        TaskId::Task2,
        TaskId::Task3,
        TaskId::Task4,
        TaskId::Task5,
    ];

    /// Selector byte carried in the command payload.
    pub fn selector(self) -> u8 {
        match self {
            TaskId::Task1 => 1,
            TaskId::Task2 => 2,
            TaskId::Task3 => 3,
            TaskId::Task4 => 4,
            TaskId::Task5 => 5,
        }
    }

    /// Minimum time the worker keeps the processor busy.
    pub fn nominal_duration(self) -> Duration {
        let ms = match self {
            TaskId::Task1 => 50,
            TaskId::Task2 => 75,
            TaskId::Task3 => 125,
            TaskId::Task4 => 100,
            TaskId::Task5 => 150,
        };
        Duration::from_millis(ms)
    }
}

/// Returned when a selector byte does not name one of the five workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSelector(pub u8);

impl TryFrom<u8> for TaskId {
    type Error = UnknownSelector;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(TaskId::Task1),
            2 => Ok(TaskId::Task2),
            3 => Ok(TaskId::Task3),
            4 => Ok(TaskId::Task4),
            5 => Ok(TaskId::Task5),
            other => Err(UnknownSelector(other)),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task{}", self.selector())
    }
}

// ── Worker trait ──────────────────────────────────────────────────────────────

/// A unit of emulated work.
///
/// `run` must not return before [`nominal_duration`](Worker::nominal_duration)
/// has elapsed.  Workers hold no mutable state and cannot fail.
pub trait Worker: Send + Sync {
    fn task_id(&self) -> TaskId;

    fn nominal_duration(&self) -> Duration;

    fn run(&self);
}

/// CPU-bound dummy worker: spins for its nominal duration.
#[derive(Debug, Clone, Copy)]
pub struct DummyTask {
    id: TaskId,
}

impl DummyTask {
    pub const fn new(id: TaskId) -> Self {
        Self { id }
    }
}

impl Worker for DummyTask {
    fn task_id(&self) -> TaskId {
        self.id
    }

    fn nominal_duration(&self) -> Duration {
        self.id.nominal_duration()
    }

    fn run(&self) {
        busy_wait(self.nominal_duration());
    }
}

// ── WorkerCatalog ─────────────────────────────────────────────────────────────

/// Fixed set of the five dummy workers, indexed by [`TaskId`].
#[derive(Debug, Clone)]
pub struct WorkerCatalog {
    workers: [DummyTask; 5],
}

impl WorkerCatalog {
    pub fn new() -> Self {
        Self {
            workers: TaskId::ALL.map(DummyTask::new),
        }
    }

    /// Worker bound to `id`.  Infallible: every `TaskId` has an entry.
    pub fn get(&self, id: TaskId) -> &DummyTask {
        &self.workers[usize::from(id.selector() - 1)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DummyTask> {
        self.workers.iter()
    }
}

impl Default for WorkerCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
