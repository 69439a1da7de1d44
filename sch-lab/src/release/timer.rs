/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic timer services.
//!
//! [`TimerService`] is the registration seam: a periodic timer is added
//! with a callback and identified afterwards by its [`TimerId`].  Two
//! implementations exist:
//!
//! * [`TokioTimerService`] – one `tokio::time::interval` task per timer.
//! * [`ManualTimerService`] – callbacks fire only when [`ManualTimerService::fire`]
//!   is called; used for single-stepping and tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Opaque handle of a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u32);

impl TimerId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Callback run on every expiry.  Receives the id of the timer that fired.
pub type TimerCallback = Box<dyn Fn(TimerId) + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer period must be non-zero")]
    InvalidPeriod,

    #[error("{0} is not registered")]
    UnknownTimer(TimerId),

    #[error("timer service unavailable: {0}")]
    Unavailable(String),
}

impl TimerError {
    /// Numeric status reported in log lines.
    pub fn status_code(&self) -> u32 {
        match self {
            TimerError::InvalidPeriod => 0xC100_0001,
            TimerError::UnknownTimer(_) => 0xC100_0002,
            TimerError::Unavailable(_) => 0xC100_0003,
        }
    }
}

pub trait TimerService {
    /// Register a periodic timer.  The first expiry happens one `period`
    /// after registration.
    fn add_periodic(
        &self,
        name: &str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<TimerId, TimerError>;

    /// Stop and forget a timer.
    fn delete(&self, id: TimerId) -> Result<(), TimerError>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // Timer bookkeeping stays consistent even if a holder panicked.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── TokioTimerService ─────────────────────────────────────────────────────────

/// Timers backed by tasks on a tokio runtime.
#[derive(Debug)]
pub struct TokioTimerService {
    handle: Handle,
    next_id: AtomicU32,
    timers: Mutex<BTreeMap<TimerId, JoinHandle<()>>>,
}

impl TokioTimerService {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            next_id: AtomicU32::new(1),
            timers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Service bound to the runtime of the calling context.
    ///
    /// # Errors
    /// [`TimerError::Unavailable`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| TimerError::Unavailable(e.to_string()))
    }

    pub fn active(&self) -> usize {
        lock(&self.timers).len()
    }
}

impl TimerService for TokioTimerService {
    fn add_periodic(
        &self,
        name: &str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<TimerId, TimerError> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod);
        }
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let task = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback(id);
            }
        });
        lock(&self.timers).insert(id, task);

        info!(timer = %id, name, period_ms = period.as_millis() as u64, "periodic timer added");
        Ok(id)
    }

    fn delete(&self, id: TimerId) -> Result<(), TimerError> {
        let task = lock(&self.timers)
            .remove(&id)
            .ok_or(TimerError::UnknownTimer(id))?;
        task.abort();
        debug!(timer = %id, "periodic timer deleted");
        Ok(())
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for (_, task) in lock(&self.timers).iter() {
            task.abort();
        }
    }
}

// ── ManualTimerService ────────────────────────────────────────────────────────

struct ManualTimer {
    name: String,
    period: Duration,
    callback: TimerCallback,
}

/// Timers that only expire on request.
#[derive(Default)]
pub struct ManualTimerService {
    next_id: AtomicU32,
    timers: Mutex<BTreeMap<TimerId, ManualTimer>>,
}

impl fmt::Debug for ManualTimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timers = lock(&self.timers);
        f.debug_map()
            .entries(timers.iter().map(|(id, t)| (id, (&t.name, t.period))))
            .finish()
    }
}

impl ManualTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the callback of `id` once.
    pub fn fire(&self, id: TimerId) -> Result<(), TimerError> {
        let timers = lock(&self.timers);
        let timer = timers.get(&id).ok_or(TimerError::UnknownTimer(id))?;
        (timer.callback)(id);
        Ok(())
    }

    /// Run every registered callback once, in registration order.
    pub fn fire_all(&self) {
        let timers = lock(&self.timers);
        for (id, timer) in timers.iter() {
            (timer.callback)(*id);
        }
    }

    /// Registered timer ids.
    pub fn ids(&self) -> Vec<TimerId> {
        lock(&self.timers).keys().copied().collect()
    }

    pub fn period_of(&self, id: TimerId) -> Option<Duration> {
        lock(&self.timers).get(&id).map(|t| t.period)
    }
}

impl TimerService for ManualTimerService {
    fn add_periodic(
        &self,
        name: &str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<TimerId, TimerError> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod);
        }
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.timers).insert(
            id,
            ManualTimer {
                name: name.to_string(),
                period,
                callback,
            },
        );
        Ok(id)
    }

    fn delete(&self, id: TimerId) -> Result<(), TimerError> {
        lock(&self.timers)
            .remove(&id)
            .map(|_| ())
            .ok_or(TimerError::UnknownTimer(id))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
