/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Command message layout.
//!
//! ```text
//!  0      2      4      6    7    8    9 ...
//! ┌──────┬──────┬──────┬────┬────┬────┬───────────┐
//! │msg id│ seq  │length│ fc │ cks│sel │ arguments │
//! └──────┴──────┴──────┴────┴────┴────┴───────────┘
//!  └──────── 8-byte command header ──┘└─ payload ─┘
//! ```
//!
//! All multi-byte header fields are big-endian.  `length` follows the
//! packet convention of "total length minus 7".  The dispatcher treats the
//! header as opaque apart from the message id, which it logs.  The first
//! payload byte is the task selector.

use std::fmt;

/// Width of the command header in bytes.
pub const HEADER_LEN: usize = 8;

/// Smallest message the dispatcher can act on: header plus selector byte.
pub const MIN_COMMAND_LEN: usize = HEADER_LEN + 1;

// ── MessageId ─────────────────────────────────────────────────────────────────

/// 16-bit message identifier used for bus subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u16);

impl MessageId {
    /// Reserved value that never names a real message stream.
    pub const INVALID: MessageId = MessageId(0);

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

// ── CommandHeader ─────────────────────────────────────────────────────────────

/// Copy of the fixed-width header at the front of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandHeader([u8; HEADER_LEN]);

impl CommandHeader {
    /// Header of `raw`, or `None` when fewer than [`HEADER_LEN`] bytes exist.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let bytes: [u8; HEADER_LEN] = raw.get(..HEADER_LEN)?.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn msg_id(&self) -> MessageId {
        MessageId(u16::from_be_bytes([self.0[0], self.0[1]]))
    }

    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    pub fn function_code(&self) -> u8 {
        self.0[6] & 0x7F
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

/// Bytes following the header.  Empty for messages of header length or less.
pub fn payload(raw: &[u8]) -> &[u8] {
    raw.get(HEADER_LEN..).unwrap_or(&[])
}

/// Decode a payload into big-endian 16-bit words.
///
/// An odd trailing byte becomes the high byte of a final word whose low
/// byte is zero.
pub fn payload_words(payload: &[u8]) -> impl Iterator<Item = u16> + '_ {
    payload.chunks(2).map(|c| match *c {
        [hi, lo] => u16::from_be_bytes([hi, lo]),
        [hi] => u16::from_be_bytes([hi, 0]),
        _ => 0,
    })
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Assemble a complete command message.  Used by the publishing side and by
/// tests; the dispatcher itself only reads.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    msg_id: MessageId,
    sequence: u16,
    function_code: u8,
    payload: Vec<u8>,
}

impl CommandBuilder {
    pub fn new(msg_id: MessageId) -> Self {
        Self {
            msg_id,
            sequence: 0,
            function_code: 0,
            payload: Vec::new(),
        }
    }

    pub fn sequence(mut self, seq: u16) -> Self {
        self.sequence = seq & 0x3FFF;
        self
    }

    pub fn function_code(mut self, fc: u8) -> Self {
        self.function_code = fc & 0x7F;
        self
    }

    /// Task selector followed by optional argument bytes.
    pub fn selector(mut self, selector: u8, args: &[u8]) -> Self {
        self.payload.clear();
        self.payload.push(selector);
        self.payload.extend_from_slice(args);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let total = HEADER_LEN + self.payload.len();
        let length_field = u16::try_from(total.saturating_sub(7)).unwrap_or(u16::MAX);

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&self.msg_id.0.to_be_bytes());
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.extend_from_slice(&length_field.to_be_bytes());
        out.push(self.function_code);
        out.push(0);
        out.extend_from_slice(&self.payload);

        let checksum = out.iter().fold(0xFFu8, |acc, b| acc ^ b);
        out[7] = checksum;
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
