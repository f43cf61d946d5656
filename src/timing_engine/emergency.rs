/// Round-robin over lanes reporting emergency vehicles, so that two lanes with
/// ambulances waiting are served on alternating ticks instead of one starving.
#[derive(Debug, Default, Clone)]
pub struct EmergencyRotation {
    cycle: usize,
}

impl EmergencyRotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lane to preempt this tick, or `None` when no lane reports an emergency.
    /// The rotation only advances on ticks that pick a lane.
    pub fn next_lane(&mut self, emergency_counts: &[u32]) -> Option<usize> {
        let lanes: Vec<usize> = emergency_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(lane, _)| lane)
            .collect();
        if lanes.is_empty() {
            return None;
        }
        let lane = lanes[self.cycle % lanes.len()];
        self.cycle = self.cycle.wrapping_add(1);
        Some(lane)
    }
}
