/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-capacity schedule / state table.
//!
//! One [`ScheduleEntry`] per slot, indexed directly by task selector (slot
//! `n` belongs to selector `n`).  Every index is bounds-checked before use;
//! an out-of-range index is [`TableError::UnknownSlot`].
//!
//! # Mutability
//! * `packet_rate` is written once by [`ScheduleTable::from_config`] and has
//!   no setter.
//! * `command_header` / payload are overwritten on every dispatch through
//!   [`ScheduleTable::record_command`].
//! * `invocation_counter` only moves forward through
//!   [`ScheduleTable::record_invocation`] (wrapping at `u32::MAX`).

pub mod error;

pub use error::TableError;

use tracing::{debug, warn};

use crate::config::SlotConfig;
use crate::message::CommandHeader;
use crate::worker::TaskId;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Number of slots in the table.
pub const MAX_SCHEDULE_ENTRIES: usize = 32;

/// Capacity of each slot's argument buffer, in 16-bit words.
pub const MAX_ARGS_PER_ENTRY: usize = 32;

// Every task selector must address a real slot.
const _: () = assert!(MAX_SCHEDULE_ENTRIES > 5);

/// Slot index used for `task`.
pub fn slot_of(task: TaskId) -> usize {
    usize::from(task.selector())
}

// ── ScheduleEntry ─────────────────────────────────────────────────────────────

/// Per-slot state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    command_header: CommandHeader,
    payload_buffer: [u16; MAX_ARGS_PER_ENTRY],
    payload_length: usize,
    packet_rate: u32,
    invocation_counter: u32,
}

impl Default for ScheduleEntry {
    fn default() -> Self {
        Self {
            command_header: CommandHeader::default(),
            payload_buffer: [0; MAX_ARGS_PER_ENTRY],
            payload_length: 0,
            packet_rate: 0,
            invocation_counter: 0,
        }
    }
}

impl ScheduleEntry {
    pub fn command_header(&self) -> &CommandHeader {
        &self.command_header
    }

    /// Valid words of the argument buffer.
    pub fn payload(&self) -> &[u16] {
        &self.payload_buffer[..self.payload_length]
    }

    pub fn payload_length(&self) -> usize {
        self.payload_length
    }

    /// Nominal periodic rate, in timer ticks.  Zero means "not periodic".
    pub fn packet_rate(&self) -> u32 {
        self.packet_rate
    }

    pub fn invocation_counter(&self) -> u32 {
        self.invocation_counter
    }

    /// Copy `words` into the argument buffer, keeping at most
    /// [`MAX_ARGS_PER_ENTRY`].  Returns the number of words dropped.
    fn store_payload(&mut self, words: impl IntoIterator<Item = u16>) -> usize {
        let mut stored = 0usize;
        let mut dropped = 0usize;
        for w in words {
            if stored < MAX_ARGS_PER_ENTRY {
                self.payload_buffer[stored] = w;
                stored += 1;
            } else {
                dropped += 1;
            }
        }
        self.payload_buffer[stored..].fill(0);
        self.payload_length = stored;
        dropped
    }
}

// ── ScheduleTable ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ScheduleTable {
    entries: [ScheduleEntry; MAX_SCHEDULE_ENTRIES],
}

impl Default for ScheduleTable {
    fn default() -> Self {
        Self {
            entries: std::array::from_fn(|_| ScheduleEntry::default()),
        }
    }
}

impl ScheduleTable {
    /// Zero-initialised table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table and populate the configured slots.
    ///
    /// # Errors
    /// * [`TableError::UnknownSlot`] – a slot index is out of range.
    /// * [`TableError::DuplicateSlot`] – a slot index appears twice.
    /// * [`TableError::PayloadTooLong`] – a preset payload exceeds
    ///   [`MAX_ARGS_PER_ENTRY`].
    pub fn from_config(slots: &[SlotConfig]) -> Result<Self, TableError> {
        let mut table = Self::new();
        let mut seen = [false; MAX_SCHEDULE_ENTRIES];

        for cfg in slots {
            let capacity = table.capacity();
            let entry = table.get_slot(cfg.slot)?;

            if std::mem::replace(&mut seen[cfg.slot], true) {
                return Err(TableError::DuplicateSlot { index: cfg.slot });
            }
            if cfg.payload.len() > MAX_ARGS_PER_ENTRY {
                return Err(TableError::PayloadTooLong {
                    index: cfg.slot,
                    words: cfg.payload.len(),
                    capacity: MAX_ARGS_PER_ENTRY,
                });
            }

            entry.packet_rate = cfg.packet_rate;
            entry.store_payload(cfg.payload.iter().copied());

            debug!(
                slot = cfg.slot,
                packet_rate = cfg.packet_rate,
                payload_words = cfg.payload.len(),
                capacity,
                "schedule slot populated"
            );
        }

        Ok(table)
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    fn check(&self, index: usize) -> Result<(), TableError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(TableError::UnknownSlot {
                index,
                capacity: self.entries.len(),
            })
        }
    }

    /// Mutable access to one slot.
    pub fn get_slot(&mut self, index: usize) -> Result<&mut ScheduleEntry, TableError> {
        self.check(index)?;
        Ok(&mut self.entries[index])
    }

    /// Shared access to one slot.
    pub fn slot(&self, index: usize) -> Result<&ScheduleEntry, TableError> {
        self.check(index)?;
        Ok(&self.entries[index])
    }

    /// Bump the invocation counter of `index` and return its new value.
    pub fn record_invocation(&mut self, index: usize) -> Result<u32, TableError> {
        let entry = self.get_slot(index)?;
        entry.invocation_counter = entry.invocation_counter.wrapping_add(1);
        Ok(entry.invocation_counter)
    }

    /// Store the header and decoded argument words of the command that
    /// triggered slot `index`.
    pub fn record_command(
        &mut self,
        index: usize,
        header: CommandHeader,
        words: impl IntoIterator<Item = u16>,
    ) -> Result<(), TableError> {
        let entry = self.get_slot(index)?;
        entry.command_header = header;
        let dropped = entry.store_payload(words);
        if dropped > 0 {
            warn!(
                slot = index,
                dropped,
                capacity = MAX_ARGS_PER_ENTRY,
                "SCH_LAB: command payload truncated to slot capacity"
            );
        }
        Ok(())
    }

    /// Invocation counter of `index`.
    pub fn counter(&self, index: usize) -> Result<u32, TableError> {
        Ok(self.slot(index)?.invocation_counter)
    }

    /// Snapshot of every slot's invocation counter.
    pub fn counters(&self) -> [u32; MAX_SCHEDULE_ENTRIES] {
        std::array::from_fn(|i| self.entries[i].invocation_counter)
    }

    /// `(index, entry)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ScheduleEntry)> {
        self.entries.iter().enumerate()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
