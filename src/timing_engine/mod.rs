pub mod congestion;
pub mod emergency;
pub mod green_time;
pub mod lane_selection;
pub mod manual_override;

pub use congestion::{classify_congestion, CongestionLevel};
pub use emergency::EmergencyRotation;
pub use green_time::{compute_green_times, green_time_for};
pub use lane_selection::{select_active_lanes, ActiveSet};
pub use manual_override::{
    apply_manual_override, ManualOverride, NormalizationReport, NormalizationWarning,
};

use crate::config::TimingConfig;
use crate::detection::DetectionFrame;
use crate::error::ControllerError;

/// Result of one automatic decision step.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub green_times: Vec<f64>,
    pub active_set: ActiveSet,
    /// Lane forced to the front of the active set by an emergency vehicle, if any.
    pub preempted: Option<usize>,
}

/// The decision core: counts in, green times and active lanes out.
///
/// Apart from the emergency rotation cursor it holds no state, and the green-time and
/// lane-selection steps are pure functions of their input.
#[derive(Debug, Clone)]
pub struct SignalTimingEngine {
    timing: TimingConfig,
    emergency: EmergencyRotation,
}

impl SignalTimingEngine {
    pub fn new(timing: TimingConfig) -> Result<Self, ControllerError> {
        timing.validate()?;
        Ok(Self {
            timing,
            emergency: EmergencyRotation::new(),
        })
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn compute_green_times(&self, counts: &[f64]) -> Vec<f64> {
        compute_green_times(counts, &self.timing)
    }

    pub fn select_active_lanes(&self, counts: &[f64]) -> Result<ActiveSet, ControllerError> {
        select_active_lanes(counts, self.timing.active_lanes)
    }

    pub fn apply_manual_override<S: AsRef<str>>(
        &self,
        raw_green_times: &[S],
        raw_active_lanes: &[usize],
    ) -> Result<ManualOverride, ControllerError> {
        apply_manual_override(raw_green_times, raw_active_lanes, &self.timing)
    }

    /// Automatic allocation for one validated frame, including emergency preemption.
    pub fn allocate(&mut self, frame: &DetectionFrame) -> Result<Allocation, ControllerError> {
        let mut green_times = self.compute_green_times(&frame.counts);
        let mut active_set = self.select_active_lanes(&frame.counts)?;

        let preempted = if self.timing.emergency_preemption {
            self.emergency
                .next_lane(&frame.emergency)
                .filter(|&lane| lane < green_times.len())
        } else {
            None
        };
        if let Some(lane) = preempted {
            green_times[lane] = self.timing.max_green;
            active_set.prioritize(lane);
        }

        Ok(Allocation {
            green_times,
            active_set,
            preempted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SignalTimingEngine {
        SignalTimingEngine::new(TimingConfig::default()).unwrap()
    }

    #[test]
    fn allocation_without_emergency_follows_counts() {
        let mut engine = engine();
        let allocation = engine
            .allocate(&DetectionFrame::new(vec![50.0, 0.0, 20.0, 10.0]))
            .unwrap();
        assert_eq!(allocation.active_set.lanes(), &[0, 2]);
        assert!((allocation.green_times[0] - 92.5).abs() < 1e-9);
        assert_eq!(allocation.preempted, None);
    }

    #[test]
    fn emergency_lane_gets_max_green_and_priority() {
        let mut engine = engine();
        let frame = DetectionFrame::with_emergency(vec![30.0, 25.0, 2.0, 1.0], vec![0, 0, 0, 1]);
        let allocation = engine.allocate(&frame).unwrap();
        assert_eq!(allocation.preempted, Some(3));
        assert_eq!(allocation.green_times[3], 180.0);
        assert_eq!(allocation.active_set.lanes(), &[3, 0]);
    }

    #[test]
    fn preemption_can_be_disabled() {
        let timing = TimingConfig {
            emergency_preemption: false,
            ..TimingConfig::default()
        };
        let mut engine = SignalTimingEngine::new(timing).unwrap();
        let frame = DetectionFrame::with_emergency(vec![30.0, 25.0, 2.0, 1.0], vec![0, 0, 0, 1]);
        let allocation = engine.allocate(&frame).unwrap();
        assert_eq!(allocation.preempted, None);
        assert_eq!(allocation.active_set.lanes(), &[0, 1]);
    }

    #[test]
    fn engine_refuses_invalid_timing() {
        let timing = TimingConfig {
            active_lanes: 6,
            ..TimingConfig::default()
        };
        assert!(matches!(
            SignalTimingEngine::new(timing),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }
}
