use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detection::{DetectionAdapter, DetectionFrame};
use crate::error::ControllerError;

/// Stand-in for a camera pipeline: every lane gets a uniform integer count in `[0, max)`.
pub struct RandomDetector {
    rng: StdRng,
    lane_count: usize,
    max: u32,
    emergency_probability: f64,
}

impl RandomDetector {
    pub fn new(lane_count: usize, max: u32) -> Self {
        Self::with_rng(StdRng::from_os_rng(), lane_count, max)
    }

    /// Reproducible sequence, used by benches and tests.
    pub fn seeded(lane_count: usize, max: u32, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), lane_count, max)
    }

    fn with_rng(rng: StdRng, lane_count: usize, max: u32) -> Self {
        Self {
            rng,
            lane_count,
            max: max.max(1),
            emergency_probability: 0.0,
        }
    }

    /// Chance per lane and tick of reporting one emergency vehicle.
    pub fn with_emergency_probability(mut self, probability: f64) -> Self {
        self.emergency_probability = probability.clamp(0.0, 1.0);
        self
    }
}

impl DetectionAdapter for RandomDetector {
    fn read_counts(&mut self) -> Result<DetectionFrame, ControllerError> {
        let counts = (0..self.lane_count)
            .map(|_| self.rng.random_range(0..self.max) as f64)
            .collect();
        if self.emergency_probability > 0.0 {
            let emergency = (0..self.lane_count)
                .map(|_| u32::from(self.rng.random_bool(self.emergency_probability)))
                .collect();
            return Ok(DetectionFrame::with_emergency(counts, emergency));
        }
        Ok(DetectionFrame::new(counts))
    }
}
