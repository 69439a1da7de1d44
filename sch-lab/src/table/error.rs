/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Errors raised by [`ScheduleTable`](super::ScheduleTable) access and
//! population.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Slot index outside `[0, capacity)`.  Never clamped.
    #[error("schedule slot {index} is out of range (table holds {capacity} slots)")]
    UnknownSlot { index: usize, capacity: usize },

    /// A configured slot appears more than once.
    #[error("schedule slot {index} is configured more than once")]
    DuplicateSlot { index: usize },

    /// A configured payload does not fit the slot's argument buffer.
    #[error("slot {index} payload has {words} words but capacity is {capacity}")]
    PayloadTooLong {
        index: usize,
        words: usize,
        capacity: usize,
    },
}

impl TableError {
    /// Numeric status reported in log lines.
    pub fn status_code(&self) -> u32 {
        match self {
            TableError::UnknownSlot { .. } => 0xC000_0101,
            TableError::DuplicateSlot { .. } => 0xC000_0102,
            TableError::PayloadTooLong { .. } => 0xC000_0103,
        }
    }
}
