// src/shared_data.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::timing_engine::CongestionLevel;

/// Who decides the signal timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Recomputed from live counts every tick.
    Automatic,
    /// Operator values stay in force until the override is disabled.
    Manual,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Automatic => write!(f, "AI Mode Active"),
            Mode::Manual => write!(f, "Manual Mode Active"),
        }
    }
}

/// Read-only view of the controller handed to presentation consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub timestamp: u64,
    pub cycle: u64,
    pub mode: Mode,
    pub counts: Vec<f64>,
    pub green_times: Vec<f64>,
    pub active_lanes: Vec<usize>,
    pub congestion: CongestionLevel,
    /// Per-lane mean over the rolling count history.
    pub average_counts: Vec<f64>,
}

/// Seconds since the Unix epoch; zero if the clock is set before 1970.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
