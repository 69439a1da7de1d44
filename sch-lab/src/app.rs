/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Application context and run loop.
//!
//! [`SchLabApp`] owns everything the dispatcher needs for the lifetime of
//! the process: the schedule table, the command pipe and the periodic
//! release source.  It is built once by [`SchLabApp::init`] and then driven
//! by [`SchLabApp::run`] on a single thread:
//!
//! ```text
//! loop while RunControl == AppRun
//!   receive (blocks) ─┬─ Ok(raw)      → dispatch → "Completed cycle N"
//!                     ├─ Err(closed)  → AppExit
//!                     └─ Err(other)   → log, next iteration
//! ```
//!
//! Error asymmetry: any initialization failure is fatal (`AppError`, loop
//! never entered) while receive and dispatch failures are logged and the
//! loop keeps going.

use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::bus::{BusError, CommandPipe, Pend, PipeId, SoftwareBus};
use crate::config::AppConfig;
use crate::dispatch::{CommandDispatcher, DispatchError, DispatchOutcome};
use crate::frame::{self, FrameInfo, DEFAULT_MAJOR_FRAME_LIMIT};
use crate::message::MessageId;
use crate::release::{PeriodicReleaseSource, TimerError, TimerService};
use crate::table::{ScheduleTable, TableError};
use crate::worker::TaskId;

// ── Run status ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunStatus {
    AppRun = 1,
    AppExit = 2,
    AppError = 3,
}

impl RunStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => RunStatus::AppRun,
            2 => RunStatus::AppExit,
            _ => RunStatus::AppError,
        }
    }
}

/// Shared run status.  The host side may request an exit from any thread;
/// the run loop checks it once per iteration.
#[derive(Debug)]
pub struct RunControl {
    status: AtomicU8,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(RunStatus::AppRun as u8),
        }
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// `true` while the loop should keep iterating.
    pub fn run_loop(&self) -> bool {
        self.status() == RunStatus::AppRun
    }

    /// Ask the loop to stop.  An error status is never downgraded.
    pub fn request_exit(&self) {
        let _ = self.status.compare_exchange(
            RunStatus::AppRun as u8,
            RunStatus::AppExit as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn set(&self, status: RunStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}

// ── Initialization errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid schedule table: {0}")]
    Table(#[from] TableError),

    #[error("error creating command pipe: {0}")]
    CreatePipe(#[source] BusError),

    #[error("error subscribing to command {msg_id}: {source}")]
    Subscribe {
        msg_id: MessageId,
        #[source]
        source: BusError,
    },

    #[error("error creating periodic release timer: {0}")]
    Timer(#[from] TimerError),
}

impl InitError {
    /// Numeric status reported in log lines.
    pub fn status_code(&self) -> u32 {
        match self {
            InitError::Table(e) => e.status_code(),
            InitError::CreatePipe(e) => e.status_code(),
            InitError::Subscribe { source, .. } => source.status_code(),
            InitError::Timer(e) => e.status_code(),
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Counters kept by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// Messages received (dispatched or rejected).
    pub cycles: u32,
    pub dispatched: u32,
    pub rejected: u32,
    pub receive_errors: u32,
}

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Dispatched(DispatchOutcome),
    Rejected(DispatchError),
    ReceiveFailed(BusError),
    /// The pipe can never deliver again.
    Closed,
}

// ── SchLabApp ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SchLabApp {
    table: ScheduleTable,
    dispatcher: CommandDispatcher,
    release: PeriodicReleaseSource,
    pipe: CommandPipe,
    pend: Pend,
    frame: Option<FrameInfo>,
    stats: RunStats,
}

/// Version banner printed once initialization succeeds.
pub fn version_string() -> String {
    format!("SCH Lab v{}", env!("CARGO_PKG_VERSION"))
}

impl SchLabApp {
    /// Build the application context.
    ///
    /// Steps run in order and the first failure aborts the whole
    /// initialization; nothing is retried:
    /// 1. populate the schedule table
    /// 2. create the command pipe
    /// 3. subscribe every configured message id
    /// 4. create the release semaphore and arm its timer (if a period is set)
    ///
    /// Each failure is logged with its numeric status before returning.
    pub fn init(
        config: &AppConfig,
        bus: &mut SoftwareBus,
        timers: &dyn TimerService,
    ) -> Result<Self, InitError> {
        let table = ScheduleTable::from_config(&config.schedule).map_err(|e| {
            error!(status = e.status_code(), "SCH_LAB: Error populating schedule table, RC = 0x{:08X}: {e}", e.status_code());
            InitError::Table(e)
        })?;

        let pipe = bus
            .create_pipe(&config.pipe.name, config.pipe.depth)
            .map_err(|e| {
                error!(status = e.status_code(), "SCH_LAB: Error creating command pipe, RC = 0x{:08X}", e.status_code());
                InitError::CreatePipe(e)
            })?;

        for msg_id in config.subscription_ids() {
            bus.subscribe(msg_id, pipe.id()).map_err(|e| {
                error!(
                    status = e.status_code(),
                    "SCH_LAB: Error subscribing to command {msg_id}, RC = 0x{:08X}",
                    e.status_code()
                );
                InitError::Subscribe { msg_id, source: e }
            })?;
        }

        let mut release = PeriodicReleaseSource::new(config.timer.semaphore_max);
        if let Some(period) = config.timer.period() {
            release.arm(timers, period).map_err(|e| {
                error!(status = e.status_code(), "SCH_LAB: Error creating timer, RC = 0x{:08X}", e.status_code());
                InitError::Timer(e)
            })?;
        }

        let frame = match frame::major_frame(&table, DEFAULT_MAJOR_FRAME_LIMIT) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("SCH_LAB: No major frame for schedule table: {e}");
                None
            }
        };

        info!(
            pipe = pipe.name(),
            subscriptions = config.subscriptions.len(),
            "SCH Lab Initialized to receive commands for {} dummy tasks. {}",
            TaskId::ALL.len(),
            version_string()
        );

        Ok(Self {
            table,
            dispatcher: CommandDispatcher::new(),
            release,
            pipe,
            pend: Pend::Forever,
            frame,
            stats: RunStats::default(),
        })
    }

    /// [`init`](Self::init), flagging `control` with `AppError` on failure so
    /// the run loop is never entered.
    pub fn boot(
        config: &AppConfig,
        bus: &mut SoftwareBus,
        timers: &dyn TimerService,
        control: &RunControl,
    ) -> Option<Self> {
        match Self::init(config, bus, timers) {
            Ok(app) => Some(app),
            Err(e) => {
                error!(status = e.status_code(), "SCH_LAB: Error Initializing RC = 0x{:08X}: {e}", e.status_code());
                control.set(RunStatus::AppError);
                None
            }
        }
    }

    /// Receive mode used by the loop.  Defaults to [`Pend::Forever`].
    pub fn set_pend(&mut self, pend: Pend) {
        self.pend = pend;
    }

    /// Receive and fully process one message.
    pub fn step(&mut self) -> Step {
        match self.pipe.receive(self.pend) {
            Ok(raw) => {
                let result = self.dispatcher.dispatch(&mut self.table, &raw);
                self.stats.cycles = self.stats.cycles.wrapping_add(1);
                info!("SCH_LAB: Completed cycle {}", self.stats.cycles);
                match result {
                    Ok(outcome) => {
                        self.stats.dispatched = self.stats.dispatched.wrapping_add(1);
                        Step::Dispatched(outcome)
                    }
                    Err(e) => {
                        self.stats.rejected = self.stats.rejected.wrapping_add(1);
                        Step::Rejected(e)
                    }
                }
            }
            Err(BusError::PipeClosed) => {
                error!(
                    status = BusError::PipeClosed.status_code(),
                    "SCH_LAB: Command pipe closed, RC = 0x{:08X}",
                    BusError::PipeClosed.status_code()
                );
                Step::Closed
            }
            Err(e) => {
                self.stats.receive_errors = self.stats.receive_errors.wrapping_add(1);
                error!(status = e.status_code(), "SCH_LAB: Error receiving packet: 0x{:08X}", e.status_code());
                Step::ReceiveFailed(e)
            }
        }
    }

    /// Run until `control` leaves `AppRun` or the pipe closes.
    pub fn run(&mut self, control: &RunControl) -> RunStatus {
        while control.run_loop() {
            if self.step() == Step::Closed {
                control.request_exit();
            }
        }
        let status = control.status();
        info!(
            ?status,
            cycles = self.stats.cycles,
            dispatched = self.stats.dispatched,
            rejected = self.stats.rejected,
            receive_errors = self.stats.receive_errors,
            "SCH_LAB: run loop finished"
        );
        status
    }

    /// Stop the release timer.
    pub fn shutdown(&mut self, timers: &dyn TimerService) -> Result<(), TimerError> {
        self.release.disarm(timers)
    }

    pub fn table(&self) -> &ScheduleTable {
        &self.table
    }

    pub fn release(&self) -> &PeriodicReleaseSource {
        &self.release
    }

    pub fn frame(&self) -> Option<&FrameInfo> {
        self.frame.as_ref()
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn pipe_name(&self) -> &str {
        self.pipe.name()
    }

    pub fn pipe_id(&self) -> PipeId {
        self.pipe.id()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;
    use crate::message::CommandBuilder;
    use crate::release::{ManualTimerService, TimerCallback, TimerId};
    use crate::table::MAX_SCHEDULE_ENTRIES;
    use std::time::Duration;

    fn cmd(msg_id: u16, selector: u8) -> Vec<u8> {
        CommandBuilder::new(MessageId(msg_id))
            .selector(selector, &[])
            .build()
    }

    fn quiet_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.timer.period_ms = 0;
        cfg
    }

    struct BrokenTimers;

    impl TimerService for BrokenTimers {
        fn add_periodic(&self, _: &str, _: Duration, _: TimerCallback) -> Result<TimerId, TimerError> {
            Err(TimerError::Unavailable("no timer hardware".into()))
        }
        fn delete(&self, id: TimerId) -> Result<(), TimerError> {
            Err(TimerError::UnknownTimer(id))
        }
    }

    // ── init ──────────────────────────────────────────────────────────────────

    #[test]
    fn init_subscribes_every_configured_id() {
        let mut bus = SoftwareBus::new();
        let timers = ManualTimerService::new();
        let app = SchLabApp::init(&AppConfig::default(), &mut bus, &timers).unwrap();

        let ids = bus.subscriptions_of(app.pipe_id());
        assert_eq!(ids.len(), 5);
        assert_eq!(app.pipe_name(), "SCH_LAB_CMD_PIPE");
        assert_eq!(app.table().slot(3).unwrap().packet_rate(), 4);
        assert_eq!(app.frame().map(|f| f.major_frame_ticks), Some(4));
        assert_eq!(timers.ids().len(), 1);
        assert!(app.release().timer().is_some());
    }

    #[test]
    fn init_fails_on_bad_pipe_depth() {
        let mut cfg = quiet_config();
        cfg.pipe.depth = 0;
        let err = SchLabApp::init(&cfg, &mut SoftwareBus::new(), &ManualTimerService::new()).unwrap_err();
        assert!(matches!(err, InitError::CreatePipe(BusError::InvalidPipeDepth { .. })));
        assert_eq!(err.status_code(), 0xCA00_0003);
    }

    #[test]
    fn init_stops_at_first_bad_subscription() {
        let mut cfg = quiet_config();
        cfg.subscriptions = vec![0x1801, 0x0000, 0x1803];
        let mut bus = SoftwareBus::new();
        let err = SchLabApp::init(&cfg, &mut bus, &ManualTimerService::new()).unwrap_err();
        assert!(matches!(
            err,
            InitError::Subscribe {
                msg_id: MessageId(0),
                ..
            }
        ));
        // 0x1803 was never reached.
        assert_eq!(bus.publish(cmd(0x1803, 3)).unwrap(), 0);
    }

    #[test]
    fn init_fails_on_bad_table() {
        let mut cfg = quiet_config();
        cfg.schedule = vec![SlotConfig {
            slot: MAX_SCHEDULE_ENTRIES,
            packet_rate: 1,
            payload: vec![],
        }];
        let err = SchLabApp::init(&cfg, &mut SoftwareBus::new(), &ManualTimerService::new()).unwrap_err();
        assert!(matches!(err, InitError::Table(TableError::UnknownSlot { .. })));
    }

    #[test]
    fn init_fails_when_timer_cannot_be_created() {
        let cfg = AppConfig::default();
        let err = SchLabApp::init(&cfg, &mut SoftwareBus::new(), &BrokenTimers).unwrap_err();
        assert!(matches!(err, InitError::Timer(TimerError::Unavailable(_))));
    }

    #[test]
    fn boot_failure_sets_app_error_and_loop_never_runs() {
        let mut cfg = quiet_config();
        cfg.pipe.depth = 0;
        let control = RunControl::new();
        let app = SchLabApp::boot(&cfg, &mut SoftwareBus::new(), &ManualTimerService::new(), &control);
        assert!(app.is_none());
        assert_eq!(control.status(), RunStatus::AppError);
        assert!(!control.run_loop());
    }

    // ── run loop ──────────────────────────────────────────────────────────────

    #[test]
    fn run_processes_queue_then_exits_on_close() {
        let mut bus = SoftwareBus::new();
        let timers = ManualTimerService::new();
        let control = RunControl::new();
        let mut app = SchLabApp::boot(&quiet_config(), &mut bus, &timers, &control).unwrap();

        bus.publish(cmd(0x1803, 3)).unwrap();
        bus.publish(cmd(0x1801, 9)).unwrap();
        bus.publish(cmd(0x1802, 1)).unwrap();
        bus.publish(cmd(0x1802, 1)).unwrap();
        drop(bus);

        assert_eq!(app.run(&control), RunStatus::AppExit);

        let counters = app.table().counters();
        assert_eq!(counters[1], 2);
        assert_eq!(counters[3], 1);
        assert_eq!(counters.iter().sum::<u32>(), 3);
        assert_eq!(
            app.stats(),
            RunStats {
                cycles: 4,
                dispatched: 3,
                rejected: 1,
                receive_errors: 0
            }
        );
    }

    #[test]
    fn receive_errors_do_not_stop_the_loop() {
        let mut bus = SoftwareBus::new();
        let control = RunControl::new();
        let mut app = SchLabApp::boot(&quiet_config(), &mut bus, &ManualTimerService::new(), &control).unwrap();
        app.set_pend(Pend::Poll);

        assert_eq!(app.step(), Step::ReceiveFailed(BusError::NoMessage));
        assert_eq!(app.step(), Step::ReceiveFailed(BusError::NoMessage));

        bus.publish(cmd(0x1801, 1)).unwrap();
        assert!(matches!(app.step(), Step::Dispatched(o) if o.task == TaskId::Task1));
        assert_eq!(app.stats().receive_errors, 2);
        assert_eq!(app.stats().cycles, 1);
    }

    #[test]
    fn short_message_is_rejected_and_loop_continues() {
        let mut bus = SoftwareBus::new();
        let control = RunControl::new();
        let mut app = SchLabApp::boot(&quiet_config(), &mut bus, &ManualTimerService::new(), &control).unwrap();
        app.set_pend(Pend::Poll);

        // Header only: routable but missing the selector byte.
        let mut raw = cmd(0x1801, 1);
        raw.truncate(8);
        bus.publish(raw).unwrap();
        bus.publish(cmd(0x1805, 5)).unwrap();

        assert!(matches!(
            app.step(),
            Step::Rejected(DispatchError::MessageTooShort { len: 8, required: 9 })
        ));
        assert!(matches!(app.step(), Step::Dispatched(o) if o.counter == 1));
        assert_eq!(app.table().counter(5).unwrap(), 1);
    }

    #[test]
    fn exit_request_stops_loop_before_receiving() {
        let mut bus = SoftwareBus::new();
        let control = RunControl::new();
        let mut app = SchLabApp::boot(&quiet_config(), &mut bus, &ManualTimerService::new(), &control).unwrap();
        bus.publish(cmd(0x1801, 1)).unwrap();

        control.request_exit();
        assert_eq!(app.run(&control), RunStatus::AppExit);
        assert_eq!(app.stats().cycles, 0);
    }

    #[test]
    fn request_exit_does_not_mask_error() {
        let control = RunControl::new();
        control.set(RunStatus::AppError);
        control.request_exit();
        assert_eq!(control.status(), RunStatus::AppError);
    }

    // ── release source alongside dispatch ─────────────────────────────────────

    #[test]
    fn timer_fires_do_not_disturb_dispatch() {
        let mut bus = SoftwareBus::new();
        let timers = ManualTimerService::new();
        let control = RunControl::new();
        let mut app = SchLabApp::boot(&AppConfig::default(), &mut bus, &timers, &control).unwrap();
        app.set_pend(Pend::Poll);

        timers.fire_all();
        timers.fire_all();
        timers.fire_all();
        assert_eq!(app.release().semaphore().count(), 3);

        bus.publish(cmd(0x1802, 2)).unwrap();
        assert!(matches!(app.step(), Step::Dispatched(o) if o.task == TaskId::Task2));
        assert_eq!(app.table().counter(2).unwrap(), 1);
        assert_eq!(app.release().semaphore().count(), 3);

        app.shutdown(&timers).unwrap();
        assert!(timers.ids().is_empty());
    }
}
