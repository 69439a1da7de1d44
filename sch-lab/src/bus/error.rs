/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use thiserror::Error;

use crate::message::MessageId;

/// Failures reported by the in-process software bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("pipe depth {depth} outside 1..={max}")]
    InvalidPipeDepth { depth: usize, max: usize },

    #[error("pipe '{name}' already exists")]
    DuplicatePipe { name: String },

    #[error("maximum number of pipes ({max}) reached")]
    MaxPipes { max: usize },

    #[error("message id {0} is not a valid subscription target")]
    InvalidMsgId(MessageId),

    #[error("no pipe with id {0}")]
    UnknownPipe(usize),

    #[error("message of {len} bytes has no routable header")]
    Malformed { len: usize },

    #[error("pipe '{pipe}' is full, message {msg_id} dropped")]
    PipeOverflow { pipe: String, msg_id: MessageId },

    /// Polling receive found the pipe empty.
    #[error("no message waiting on the pipe")]
    NoMessage,

    /// Every publisher is gone; nothing can arrive any more.
    #[error("pipe closed")]
    PipeClosed,
}

impl BusError {
    /// Numeric status reported in log lines.
    pub fn status_code(&self) -> u32 {
        match self {
            BusError::InvalidPipeDepth { .. } => 0xCA00_0003,
            BusError::InvalidMsgId(_) => 0xCA00_0003,
            BusError::UnknownPipe(_) => 0xCA00_0003,
            BusError::MaxPipes { .. } => 0xCA00_0004,
            BusError::DuplicatePipe { .. } => 0xCA00_0005,
            BusError::PipeClosed => 0xCA00_0006,
            BusError::Malformed { .. } => 0xCA00_0007,
            BusError::PipeOverflow { .. } => 0xCA00_0009,
            BusError::NoMessage => 0xCA00_000E,
        }
    }
}
