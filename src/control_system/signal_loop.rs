use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::control_system::traffic_light_controller::{
    OperatorOutcome, TickOutcome, TrafficLightController,
};
use crate::detection::DetectionAdapter;
use crate::monitoring::console::render_snapshot;
use crate::monitoring::{publish_all, StateSink};
use crate::timing_engine::NormalizationWarning;

/// Requests coming from the operator side.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorCommand {
    EnableManual,
    DisableManual,
    Submit {
        green_times: Vec<String>,
        active_lanes: Vec<usize>,
    },
    ShowState,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub tick_period: Duration,
    /// Stop after this many timer ticks; run until shutdown when `None`.
    pub max_ticks: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub recomputed: u64,
    pub skipped: u64,
    pub suspended: u64,
    pub commands: u64,
}

/// Drives the controller from a single task: timer ticks and operator commands are
/// handled one at a time, so only one decision is ever in flight. Pending commands are
/// served before a due tick. Returns when the command channel closes, on `Shutdown`, or
/// after `max_ticks`.
pub async fn run_signal_loop<A: DetectionAdapter + ?Sized>(
    controller: &mut TrafficLightController,
    adapter: &mut A,
    sinks: &mut [Box<dyn StateSink>],
    mut commands: mpsc::Receiver<OperatorCommand>,
    options: LoopOptions,
) -> LoopSummary {
    let mut summary = LoopSummary::default();
    let mut ticker = interval(options.tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!(
        "Signal loop started: {} lanes, tick every {:?}",
        controller.timing().lane_count,
        options.tick_period
    );
    publish_all(sinks, &controller.snapshot());

    loop {
        tokio::select! {
            biased;
            command = commands.recv() => {
                let command = match command {
                    None | Some(OperatorCommand::Shutdown) => break,
                    Some(command) => command,
                };
                summary.commands += 1;
                if handle_command(controller, adapter, command) {
                    publish_all(sinks, &controller.snapshot());
                }
            }
            _ = ticker.tick() => {
                summary.ticks += 1;
                match controller.tick(adapter) {
                    TickOutcome::Recomputed { .. } => {
                        summary.recomputed += 1;
                        publish_all(sinks, &controller.snapshot());
                    }
                    TickOutcome::Suspended => summary.suspended += 1,
                    TickOutcome::Retained(_) => summary.skipped += 1,
                }
                if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
                    break;
                }
            }
        }
    }

    log::info!(
        "Signal loop stopped after {} ticks ({} recomputed, {} skipped, {} suspended)",
        summary.ticks,
        summary.recomputed,
        summary.skipped,
        summary.suspended
    );
    summary
}

// Returns true when the controller state changed.
fn handle_command<A: DetectionAdapter + ?Sized>(
    controller: &mut TrafficLightController,
    adapter: &mut A,
    command: OperatorCommand,
) -> bool {
    let outcome = match command {
        OperatorCommand::EnableManual => controller.enable_manual(),
        OperatorCommand::DisableManual => controller.disable_manual(adapter),
        OperatorCommand::Submit {
            green_times,
            active_lanes,
        } => match controller.submit_manual(&green_times, &active_lanes) {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("Submission rejected: {}. Previous values remain in effect.", e);
                return false;
            }
        },
        OperatorCommand::ShowState => {
            println!("{}", render_snapshot(&controller.snapshot()));
            return false;
        }
        OperatorCommand::Shutdown => return false,
    };

    match outcome {
        OperatorOutcome::Switched(mode) => {
            println!("{}", mode);
            true
        }
        OperatorOutcome::Applied(report) => {
            for warning in &report.warnings {
                match warning {
                    NormalizationWarning::ParseFallback { lane, raw } => println!(
                        "Warning: lane {} value {:?} is not a number, using {}s",
                        lane + 1,
                        raw,
                        controller.timing().fallback_green
                    ),
                    NormalizationWarning::Clamped {
                        lane,
                        requested,
                        applied,
                    } => println!(
                        "Warning: lane {} green time {}s clamped to {}s",
                        lane + 1,
                        requested,
                        applied
                    ),
                }
            }
            if report.is_clean() {
                println!("Manual settings applied.");
            } else {
                println!(
                    "Manual settings applied with {} adjustment(s).",
                    report.warnings.len()
                );
            }
            true
        }
        OperatorOutcome::Ignored => {
            println!("Command ignored in {:?} mode.", controller.mode());
            false
        }
    }
}
