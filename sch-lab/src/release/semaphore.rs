/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Lock-free counting semaphore.
//!
//! `give` is a single compare-and-swap loop: no lock, no allocation, no
//! I/O, so it is safe to call from a timer callback.  The count never
//! exceeds `max`; a give at the bound is reported as
//! [`GiveOutcome::Saturated`] and otherwise ignored.

use std::sync::atomic::{AtomicU32, Ordering};

/// Result of [`CountingSemaphore::give`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveOutcome {
    /// Count incremented to the contained value.
    Posted(u32),
    /// Count already at its maximum.
    Saturated,
}

#[derive(Debug)]
pub struct CountingSemaphore {
    name: String,
    count: AtomicU32,
    max: u32,
}

impl CountingSemaphore {
    pub fn new(name: impl Into<String>, initial: u32, max: u32) -> Self {
        Self {
            name: name.into(),
            count: AtomicU32::new(initial.min(max)),
            max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Post once without blocking.
    pub fn give(&self) -> GiveOutcome {
        let result = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                (c < self.max).then(|| c + 1)
            });
        match result {
            Ok(prev) => GiveOutcome::Posted(prev + 1),
            Err(_) => GiveOutcome::Saturated,
        }
    }

    /// Consume one count if available.
    pub fn try_take(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1))
            .is_ok()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
