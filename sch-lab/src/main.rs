/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use tracing::{error, info, warn};

use sch_lab::app::{RunControl, RunStatus, SchLabApp};
use sch_lab::bus::SoftwareBus;
use sch_lab::config::AppConfig;
use sch_lab::message::{CommandBuilder, MessageId};
use sch_lab::release::TokioTimerService;

// ── CLI argument definition ───────────────────────────────────────────────────

/// SCH Lab command dispatcher.
///
/// Example:
///   sch-lab --config sch-lab/conf/sch_lab.yaml --inject 1,3,9 --once
#[derive(Debug, Parser)]
#[command(
    name = "sch-lab",
    about = "SCH Lab – command-driven dispatcher for timed demo tasks",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML application configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Task selectors to publish at startup, comma separated (e.g. 1,3,9).
    #[arg(short = 'i', long = "inject", value_delimiter = ',')]
    inject: Vec<u8>,

    /// Exit once the injected commands have been processed instead of
    /// waiting for Ctrl-C.
    #[arg(long = "once", default_value_t = false)]
    once: bool,

    /// Override the release timer period (0 disables the timer).
    #[arg(short = 't', long = "timer-period-ms")]
    timer_period_ms: Option<u64>,
}

/// Message id used to carry `selector`: the matching subscription when one
/// exists, otherwise the first one.
fn carrier_for(config: &AppConfig, selector: u8) -> Option<MessageId> {
    let subs = &config.subscriptions;
    let idx = usize::from(selector).checked_sub(1).filter(|&i| i < subs.len());
    idx.map(|i| subs[i])
        .or_else(|| subs.first().copied())
        .map(MessageId)
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config = ?cli.config,
        inject = ?cli.inject,
        once = cli.once,
        timer_period_ms = ?cli.timer_period_ms,
        "SCH Lab starting up..."
    );

    // ── Load configuration ────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => match AppConfig::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to load configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using built-in defaults");
            AppConfig::default()
        }
    };
    if let Some(ms) = cli.timer_period_ms {
        config.timer.period_ms = ms;
    }

    // ── Host services ─────────────────────────────────────────────────────────
    let timers = match TokioTimerService::current() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to start timer service: {e}");
            process::exit(1);
        }
    };
    let mut bus = SoftwareBus::new();
    let control = Arc::new(RunControl::new());

    let Some(mut app) = SchLabApp::boot(&config, &mut bus, &timers, &control) else {
        process::exit(1);
    };

    // ── Dispatch loop ─────────────────────────────────────────────────────────
    let loop_control = Arc::clone(&control);
    let dispatch = match thread::Builder::new()
        .name("sch_lab".into())
        .spawn(move || {
            let status = app.run(&loop_control);
            (app, status)
        }) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to spawn dispatch thread: {e}");
            process::exit(1);
        }
    };

    for (seq, &selector) in cli.inject.iter().enumerate() {
        let Some(msg_id) = carrier_for(&config, selector) else {
            warn!(selector, "no subscribed message id to carry command");
            continue;
        };
        let raw = CommandBuilder::new(msg_id)
            .sequence(seq as u16)
            .selector(selector, &[])
            .build();
        match bus.publish(raw) {
            Ok(n) => info!(%msg_id, selector, pipes = n, "command injected"),
            Err(e) => warn!(%msg_id, selector, "command not injected: {e}"),
        }
    }

    if !cli.once {
        info!("Running, press Ctrl-C to stop");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
        }
        control.request_exit();
    }
    // Closing the bus closes the pipe; the loop drains what is queued and ends.
    drop(bus);

    let joined = tokio::task::spawn_blocking(move || dispatch.join()).await;
    let (mut app, status) = match joined {
        Ok(Ok(result)) => result,
        _ => {
            error!("Dispatch thread terminated abnormally");
            process::exit(1);
        }
    };

    if let Err(e) = app.shutdown(&timers) {
        warn!("Failed to stop release timer: {e}");
    }

    let stats = app.stats();
    info!(
        ?status,
        cycles = stats.cycles,
        dispatched = stats.dispatched,
        rejected = stats.rejected,
        released = app.release().semaphore().count(),
        "SCH Lab stopped"
    );
    for (slot, entry) in app.table().iter().filter(|(_, e)| e.invocation_counter() > 0) {
        info!(slot, count = entry.invocation_counter(), "  slot invocations");
    }

    if status == RunStatus::AppError {
        process::exit(1);
    }
}
