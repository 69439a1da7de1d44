/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Command dispatcher.
//!
//! Turns one raw command into one worker run:
//!
//! ```text
//! raw ──► log msg id ──► length check ──► selector byte ──► TaskId
//!                                                             │
//!              table.record_invocation ◄── executor.execute ◄─┘
//! ```
//!
//! A successful dispatch mutates exactly one table slot, the one whose
//! index equals the selector.  A rejected message leaves the table as it
//! was.

pub mod error;

pub use error::DispatchError;

use tracing::{info, warn};

use crate::executor::{Completion, TimedExecutor};
use crate::message::{self, CommandHeader, MessageId, HEADER_LEN, MIN_COMMAND_LEN};
use crate::table::{slot_of, ScheduleTable};
use crate::worker::{TaskId, WorkerCatalog};

/// What a successful dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub msg_id: MessageId,
    pub task: TaskId,
    /// Invocation counter of the task's slot after this run.
    pub counter: u32,
    pub completion: Completion,
}

#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    catalog: WorkerCatalog,
    executor: TimedExecutor,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &WorkerCatalog {
        &self.catalog
    }

    /// Decode `raw`, run the selected worker and record the run in `table`.
    ///
    /// Blocks for at least the selected worker's nominal duration.
    ///
    /// # Errors
    /// * [`DispatchError::MessageTooShort`] – fewer than header + 1 bytes.
    /// * [`DispatchError::UnknownTaskId`] – selector outside 1..=5.
    /// * [`DispatchError::Table`] – the task's slot does not exist.
    pub fn dispatch(
        &self,
        table: &mut ScheduleTable,
        raw: &[u8],
    ) -> Result<DispatchOutcome, DispatchError> {
        let header = CommandHeader::parse(raw);
        match &header {
            Some(h) => info!(msg_id = %h.msg_id(), len = raw.len(), "SCH_LAB: Received MsgId: {}", h.msg_id()),
            None => info!(len = raw.len(), "SCH_LAB: Received message without a complete header"),
        }

        let header = match header {
            Some(h) if raw.len() >= MIN_COMMAND_LEN => h,
            _ => {
                let err = DispatchError::MessageTooShort {
                    len: raw.len(),
                    required: MIN_COMMAND_LEN,
                };
                warn!(
                    status = err.status_code(),
                    "SCH_LAB: Rejected short message: {err}, RC = 0x{:08X}",
                    err.status_code()
                );
                return Err(err);
            }
        };

        let selector = raw[HEADER_LEN];
        let task = match TaskId::try_from(selector) {
            Ok(task) => task,
            Err(_) => {
                let err = DispatchError::UnknownTaskId(selector);
                warn!(
                    status = err.status_code(),
                    msg_id = %header.msg_id(),
                    "SCH_LAB: Unknown task ID from payload: {selector}"
                );
                return Err(err);
            }
        };

        let slot = slot_of(task);
        if let Err(e) = table.slot(slot) {
            let err = DispatchError::from(e);
            warn!(
                status = err.status_code(),
                "SCH_LAB: {err}, RC = 0x{:08X}",
                err.status_code()
            );
            return Err(err);
        }
        table.record_command(slot, header, message::payload_words(message::payload(raw)))?;

        let completion = self.executor.execute(self.catalog.get(task));
        let counter = table.record_invocation(slot)?;

        info!(
            task = %task,
            slot,
            counter,
            elapsed_ms = completion.elapsed.as_millis() as u64,
            "SCH_LAB: Completed {task}"
        );

        Ok(DispatchOutcome {
            msg_id: header.msg_id(),
            task,
            counter,
            completion,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
