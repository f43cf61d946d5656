use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongestionLevel {
    Normal,
    High,
    Severe,
}

/// Classifies the intersection by the total number of vehicles waiting across all lanes.
pub fn classify_congestion(counts: &[f64], timing: &TimingConfig) -> CongestionLevel {
    let total: f64 = counts.iter().map(|count| count.max(0.0)).sum();
    if total > timing.congestion_severe {
        CongestionLevel::Severe
    } else if total > timing.congestion_high {
        CongestionLevel::High
    } else {
        CongestionLevel::Normal
    }
}
