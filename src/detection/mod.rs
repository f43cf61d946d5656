pub mod random_detector;
pub mod replay_detector;

pub use random_detector::RandomDetector;
pub use replay_detector::ReplayDetector;

use serde::{Deserialize, Serialize};

use crate::config::{ControllerConfig, DetectorConfig};
use crate::error::ControllerError;

/// One tick's worth of detector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    /// Vehicles observed per lane, ordered by lane index.
    pub counts: Vec<f64>,
    /// Emergency vehicles observed per lane. Empty when the detector does not report them.
    pub emergency: Vec<u32>,
}

impl DetectionFrame {
    pub fn new(counts: Vec<f64>) -> Self {
        Self {
            counts,
            emergency: Vec::new(),
        }
    }

    pub fn with_emergency(counts: Vec<f64>, emergency: Vec<u32>) -> Self {
        Self { counts, emergency }
    }

    /// Rejects partial or garbage frames so the controller never computes from them.
    pub fn validate(&self, lane_count: usize) -> Result<(), ControllerError> {
        if self.counts.len() != lane_count {
            return Err(ControllerError::AdapterUnavailable(format!(
                "expected {} lane counts, got {}",
                lane_count,
                self.counts.len()
            )));
        }
        if let Some(lane) = self.counts.iter().position(|count| !count.is_finite()) {
            return Err(ControllerError::AdapterUnavailable(format!(
                "lane {} reported a non-finite count",
                lane
            )));
        }
        if !self.emergency.is_empty() && self.emergency.len() != lane_count {
            return Err(ControllerError::AdapterUnavailable(format!(
                "expected {} emergency counts, got {}",
                lane_count,
                self.emergency.len()
            )));
        }
        Ok(())
    }
}

/// Source of per-lane vehicle counts. A live detector, a synthetic generator and a
/// recording all look the same to the controller.
pub trait DetectionAdapter {
    /// Produces the counts for the current tick. Must not block on I/O; a live
    /// detector buffers in the background and returns the latest completed vector.
    fn read_counts(&mut self) -> Result<DetectionFrame, ControllerError>;
}

impl<T: DetectionAdapter + ?Sized> DetectionAdapter for Box<T> {
    fn read_counts(&mut self) -> Result<DetectionFrame, ControllerError> {
        (**self).read_counts()
    }
}

/// Builds the adapter selected in the configuration.
pub fn build_detector(
    config: &ControllerConfig,
) -> Result<Box<dyn DetectionAdapter + Send>, ControllerError> {
    let lane_count = config.timing.lane_count;
    match &config.detector {
        DetectorConfig::Random {
            max,
            emergency_probability,
            seed,
        } => {
            let detector = match seed {
                Some(seed) => RandomDetector::seeded(lane_count, *max, *seed),
                None => RandomDetector::new(lane_count, *max),
            };
            Ok(Box::new(
                detector.with_emergency_probability(*emergency_probability),
            ))
        }
        DetectorConfig::Replay { path, looped } => {
            let detector = ReplayDetector::from_path(path, lane_count, *looped)?;
            Ok(Box::new(detector))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_with_wrong_lane_count_is_unavailable() {
        let frame = DetectionFrame::new(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            frame.validate(4),
            Err(ControllerError::AdapterUnavailable(_))
        ));
    }

    #[test]
    fn frame_with_nan_is_unavailable() {
        let frame = DetectionFrame::new(vec![1.0, f64::NAN, 3.0, 4.0]);
        assert!(frame.validate(4).is_err());
    }

    #[test]
    fn emergency_counts_must_cover_every_lane() {
        let frame = DetectionFrame::with_emergency(vec![1.0, 2.0, 3.0, 4.0], vec![1]);
        assert!(frame.validate(4).is_err());
        let frame = DetectionFrame::with_emergency(vec![1.0, 2.0, 3.0, 4.0], vec![0, 1, 0, 0]);
        assert!(frame.validate(4).is_ok());
    }

    #[test]
    fn default_config_builds_random_detector() {
        let config = ControllerConfig::default();
        let mut detector = build_detector(&config).unwrap();
        let frame = detector.read_counts().unwrap();
        assert!(frame.validate(config.timing.lane_count).is_ok());
    }
}
