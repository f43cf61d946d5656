use std::collections::VecDeque;

/// Rolling window of the most recent automatic count vectors.
#[derive(Debug, Clone)]
pub struct CountHistory {
    capacity: usize,
    lane_count: usize,
    samples: VecDeque<Vec<f64>>,
}

impl CountHistory {
    /// Create a new CountHistory with a given capacity (e.g., 50 frames).
    pub fn new(capacity: usize, lane_count: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lane_count,
            samples: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn record(&mut self, counts: &[f64]) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(counts.to_vec());
    }

    pub fn average_for(&self, lane: usize) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .filter_map(|counts| counts.get(lane))
            .sum();
        sum / self.samples.len() as f64
    }

    pub fn averages(&self) -> Vec<f64> {
        (0..self.lane_count).map(|lane| self.average_for(lane)).collect()
    }
}
