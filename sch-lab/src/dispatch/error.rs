/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Dispatch failures.
//!
//! Both variants are recoverable: the run loop logs them and moves on to the
//! next message.  Neither one touches the schedule table.

use thiserror::Error;

use crate::table::TableError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The message ends before the task selector byte.
    #[error("message of {len} bytes is shorter than the {required}-byte minimum")]
    MessageTooShort { len: usize, required: usize },

    /// The selector byte does not name a worker.
    #[error("unknown task id {0}")]
    UnknownTaskId(u8),

    /// The selected task has no slot in the table.
    #[error(transparent)]
    Table(#[from] TableError),
}

impl DispatchError {
    /// Numeric status reported in log lines.
    pub fn status_code(&self) -> u32 {
        match self {
            DispatchError::MessageTooShort { .. } => 0xC200_0001,
            DispatchError::UnknownTaskId(_) => 0xC200_0002,
            DispatchError::Table(e) => e.status_code(),
        }
    }
}
