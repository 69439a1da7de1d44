/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! SCH Lab – command-driven dispatcher for timed demo tasks
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── worker      – the five dummy tasks and their nominal durations
//! ├── executor    – busy-wait execution with a monotonic clock
//! ├── message     – command header view, payload words, builder
//! ├── table/      – fixed-capacity schedule table
//! ├── dispatch/   – selector byte → worker run → table update
//! ├── release/    – periodic timer + counting semaphore
//! ├── bus/        – in-process pipes and subscriptions
//! ├── frame/      – major frame (LCM of packet rates)
//! ├── config/     – YAML application configuration
//! └── app         – application context and run loop
//! ```

pub mod app;
pub mod bus;
pub mod config;
pub mod dispatch;
pub mod executor;
pub mod frame;
pub mod message;
pub mod release;
pub mod table;
pub mod worker;
