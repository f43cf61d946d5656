use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;
use crate::global_variables::{
    ACTIVE_LANES, CONGESTION_HIGH, CONGESTION_SEVERE, DETECTOR_MAX, FALLBACK_GREEN, HISTORY_LEN,
    LANE_COUNT, MAX_COUNT, MAX_GREEN, MIN_GREEN, QUEUE_SIGNAL_STATE, TICK_PERIOD_MS,
};

/// Parameters of the decision core. All fields are optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    pub min_green: f64,
    pub max_green: f64,
    /// Count at which a lane earns the full `max_green`.
    pub max_count: f64,
    /// Substituted for manual green-time fields that fail to parse.
    pub fallback_green: f64,
    /// Number of lanes (N).
    pub lane_count: usize,
    /// Cardinality of the active set (k).
    pub active_lanes: usize,
    pub emergency_preemption: bool,
    pub congestion_high: f64,
    pub congestion_severe: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_green: MIN_GREEN,
            max_green: MAX_GREEN,
            max_count: MAX_COUNT,
            fallback_green: FALLBACK_GREEN,
            lane_count: LANE_COUNT,
            active_lanes: ACTIVE_LANES,
            emergency_preemption: true,
            congestion_high: CONGESTION_HIGH,
            congestion_severe: CONGESTION_SEVERE,
        }
    }
}

impl TimingConfig {
    /// Rejects parameter sets that cannot describe a working intersection.
    pub fn validate(&self) -> Result<(), ControllerError> {
        let invalid = |msg: String| Err(ControllerError::InvalidConfiguration(msg));

        if self.lane_count < 2 {
            return invalid(format!("lane count must be at least 2, got {}", self.lane_count));
        }
        if self.active_lanes == 0 || self.active_lanes > self.lane_count {
            return invalid(format!(
                "active lane count must be in 1..={}, got {}",
                self.lane_count, self.active_lanes
            ));
        }
        if !self.min_green.is_finite() || !self.max_green.is_finite() || self.min_green < 0.0 {
            return invalid(format!(
                "green bounds must be finite and non-negative, got [{}, {}]",
                self.min_green, self.max_green
            ));
        }
        if self.min_green > self.max_green {
            return invalid(format!(
                "min green {} exceeds max green {}",
                self.min_green, self.max_green
            ));
        }
        if !self.max_count.is_finite() || self.max_count <= 0.0 {
            return invalid(format!("max count must be positive, got {}", self.max_count));
        }
        if !self.fallback_green.is_finite() {
            return invalid(format!("fallback green must be finite, got {}", self.fallback_green));
        }
        if self.congestion_high > self.congestion_severe {
            return invalid(format!(
                "congestion thresholds out of order: high {} > severe {}",
                self.congestion_high, self.congestion_severe
            ));
        }
        Ok(())
    }
}

/// Where per-lane counts come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetectorConfig {
    /// Synthetic counts drawn uniformly from `[0, max)`.
    #[serde(rename_all = "camelCase")]
    Random {
        #[serde(default = "default_detector_max")]
        max: u32,
        #[serde(default)]
        emergency_probability: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Frames replayed from a CSV recording, one row per tick.
    #[serde(rename_all = "camelCase")]
    Replay {
        path: String,
        #[serde(default)]
        looped: bool,
    },
}

fn default_detector_max() -> u32 {
    DETECTOR_MAX
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Random {
            max: DETECTOR_MAX,
            emergency_probability: 0.0,
            seed: None,
        }
    }
}

/// Everything the host can override without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    pub timing: TimingConfig,
    pub tick_period_ms: u64,
    pub history_len: usize,
    pub detector: DetectorConfig,
    /// Print a state table to stdout after every change.
    pub console: bool,
    /// Append every published snapshot to this CSV file.
    pub state_log_path: Option<String>,
    /// Publish snapshots to RabbitMQ when set.
    pub amqp_url: Option<String>,
    pub amqp_queue: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            tick_period_ms: TICK_PERIOD_MS,
            history_len: HISTORY_LEN,
            detector: DetectorConfig::default(),
            console: true,
            state_log_path: None,
            amqp_url: None,
            amqp_queue: QUEUE_SIGNAL_STATE.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Loads the configuration from `path`, or returns defaults when no path is given.
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ControllerError> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)?;
                log::info!("Loaded controller configuration from {}", path.display());
                Self::from_json_str(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ControllerError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn validate(&self) -> Result<(), ControllerError> {
        self.timing.validate()?;
        if self.tick_period_ms == 0 {
            return Err(ControllerError::InvalidConfiguration(
                "tick period must be non-zero".to_string(),
            ));
        }
        if self.history_len == 0 {
            return Err(ControllerError::InvalidConfiguration(
                "history length must be non-zero".to_string(),
            ));
        }
        if let DetectorConfig::Random {
            max,
            emergency_probability,
            ..
        } = &self.detector
        {
            if *max == 0 {
                return Err(ControllerError::InvalidConfiguration(
                    "random detector max must be non-zero".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(emergency_probability) {
                return Err(ControllerError::InvalidConfiguration(format!(
                    "emergency probability must be within [0, 1], got {}",
                    emergency_probability
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = ControllerConfig::default();
        assert_eq!(config.timing.min_green, 5.0);
        assert_eq!(config.timing.max_green, 180.0);
        assert_eq!(config.timing.max_count, 100.0);
        assert_eq!(config.timing.active_lanes, 2);
        assert_eq!(config.timing.lane_count, 4);
        assert_eq!(config.tick_period(), Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = ControllerConfig::from_json_str(
            r#"{ "timing": { "laneCount": 6, "maxGreen": 120 }, "tickPeriodMs": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.timing.lane_count, 6);
        assert_eq!(config.timing.max_green, 120.0);
        assert_eq!(config.timing.min_green, 5.0);
        assert_eq!(config.tick_period_ms, 250);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn replay_detector_is_selected_by_kind() {
        let config = ControllerConfig::from_json_str(
            r#"{ "detector": { "kind": "replay", "path": "counts.csv", "looped": true } }"#,
        )
        .unwrap();
        assert_eq!(
            config.detector,
            DetectorConfig::Replay {
                path: "counts.csv".to_string(),
                looped: true
            }
        );
    }

    #[test]
    fn more_active_lanes_than_lanes_is_rejected() {
        let mut config = ControllerConfig::default();
        config.timing.active_lanes = 5;
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn single_lane_intersection_is_rejected() {
        let mut config = ControllerConfig::default();
        config.timing.lane_count = 1;
        config.timing.active_lanes = 1;
        assert!(matches!(
            config.validate(),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn inverted_green_bounds_are_rejected() {
        let mut config = ControllerConfig::default();
        config.timing.min_green = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tick_period_is_rejected() {
        let mut config = ControllerConfig::default();
        config.tick_period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_config_file_is_an_io_error() {
        let result = ControllerConfig::load(Some(Path::new("/nonexistent/signal.json")));
        assert!(matches!(result, Err(ControllerError::Io(_))));
    }
}
