/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Minimal in-process software bus.
//!
//! Stands in for the host messaging substrate: named bounded pipes,
//! subscriptions keyed by [`MessageId`], and publish-time routing on the id
//! found in the message header.
//!
//! ```text
//! publish(raw) ──► routes[msg_id] ──► pipe tx ──(bounded)──► CommandPipe::receive
//! ```
//!
//! Pipes are `tokio::sync::mpsc` channels, so the receiving side can block
//! from a plain thread while publishers live on the async runtime.  Publish
//! never blocks: a full pipe drops the message and reports an overflow.

pub mod error;

pub use error::BusError;

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::message::{CommandHeader, MessageId};

// ── Limits ────────────────────────────────────────────────────────────────────

pub const MAX_PIPE_DEPTH: usize = 256;

pub const MAX_PIPES: usize = 64;

// ── Handles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PipeId(usize);

impl PipeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How long [`CommandPipe::receive`] waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pend {
    /// Block until a message arrives or the pipe closes.
    #[default]
    Forever,
    /// Return immediately with [`BusError::NoMessage`] when empty.
    Poll,
}

/// Receiving end of one pipe.
#[derive(Debug)]
pub struct CommandPipe {
    id: PipeId,
    name: String,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl CommandPipe {
    pub fn id(&self) -> PipeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take the next message.
    ///
    /// With [`Pend::Forever`] this must not be called from inside an async
    /// context; the dispatch loop runs on its own thread.
    pub fn receive(&mut self, pend: Pend) -> Result<Vec<u8>, BusError> {
        match pend {
            Pend::Forever => self.rx.blocking_recv().ok_or(BusError::PipeClosed),
            Pend::Poll => self.rx.try_recv().map_err(|e| match e {
                mpsc::error::TryRecvError::Empty => BusError::NoMessage,
                mpsc::error::TryRecvError::Disconnected => BusError::PipeClosed,
            }),
        }
    }
}

// ── SoftwareBus ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct PipeEntry {
    name: String,
    tx: mpsc::Sender<Vec<u8>>,
}

/// Publish / subscribe router.
///
/// Dropping the bus drops every sender, which closes all pipes.
#[derive(Debug, Default)]
pub struct SoftwareBus {
    pipes: Vec<PipeEntry>,
    routes: BTreeMap<MessageId, Vec<PipeId>>,
}

impl SoftwareBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipe holding at most `depth` messages.
    pub fn create_pipe(&mut self, name: &str, depth: usize) -> Result<CommandPipe, BusError> {
        if depth == 0 || depth > MAX_PIPE_DEPTH {
            return Err(BusError::InvalidPipeDepth {
                depth,
                max: MAX_PIPE_DEPTH,
            });
        }
        if self.pipes.iter().any(|p| p.name == name) {
            return Err(BusError::DuplicatePipe {
                name: name.to_string(),
            });
        }
        if self.pipes.len() >= MAX_PIPES {
            return Err(BusError::MaxPipes { max: MAX_PIPES });
        }

        let (tx, rx) = mpsc::channel(depth);
        let id = PipeId(self.pipes.len());
        self.pipes.push(PipeEntry {
            name: name.to_string(),
            tx,
        });
        debug!(pipe = name, id = id.0, depth, "pipe created");

        Ok(CommandPipe {
            id,
            name: name.to_string(),
            rx,
        })
    }

    /// Route messages carrying `msg_id` to `pipe`.
    ///
    /// Subscribing the same pair twice is accepted and logged.
    pub fn subscribe(&mut self, msg_id: MessageId, pipe: PipeId) -> Result<(), BusError> {
        if !msg_id.is_valid() {
            return Err(BusError::InvalidMsgId(msg_id));
        }
        let Some(entry) = self.pipes.get(pipe.0) else {
            return Err(BusError::UnknownPipe(pipe.0));
        };

        let dests = self.routes.entry(msg_id).or_default();
        if dests.contains(&pipe) {
            warn!(msg_id = %msg_id, pipe = %entry.name, "duplicate subscription ignored");
            return Ok(());
        }
        dests.push(pipe);
        debug!(msg_id = %msg_id, pipe = %entry.name, "subscribed");
        Ok(())
    }

    /// Message ids currently routed to `pipe`.
    pub fn subscriptions_of(&self, pipe: PipeId) -> Vec<MessageId> {
        self.routes
            .iter()
            .filter(|(_, dests)| dests.contains(&pipe))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Deliver `raw` to every pipe subscribed to its message id.
    ///
    /// Returns the number of pipes that accepted the message.  A message
    /// nobody subscribed to is delivered to zero pipes, which is not an
    /// error.
    ///
    /// # Errors
    /// * [`BusError::Malformed`] – shorter than a command header.
    /// * [`BusError::PipeOverflow`] – every destination pipe was full.
    pub fn publish(&self, raw: Vec<u8>) -> Result<usize, BusError> {
        let header = CommandHeader::parse(&raw).ok_or(BusError::Malformed { len: raw.len() })?;
        let msg_id = header.msg_id();

        let Some(dests) = self.routes.get(&msg_id) else {
            debug!(msg_id = %msg_id, "no subscribers");
            return Ok(0);
        };

        let mut delivered = 0usize;
        let mut overflow = None;
        for pipe in dests {
            let entry = &self.pipes[pipe.0];
            match entry.tx.try_send(raw.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(msg_id = %msg_id, pipe = %entry.name, "pipe overflow, message dropped");
                    overflow = Some(entry.name.clone());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(msg_id = %msg_id, pipe = %entry.name, "pipe receiver gone");
                }
            }
        }

        match overflow {
            Some(pipe) if delivered == 0 => Err(BusError::PipeOverflow { pipe, msg_id }),
            _ => Ok(delivered),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
