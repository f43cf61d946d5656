use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// The lanes currently granted green, highest priority first.
///
/// Always holds exactly `k` distinct lane indices; every constructor enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSet(Vec<usize>);

impl ActiveSet {
    /// Validates an operator-chosen selection against `k` and the lane count.
    pub fn new(lanes: Vec<usize>, k: usize, lane_count: usize) -> Result<Self, ControllerError> {
        if lanes.len() != k {
            return Err(ControllerError::InvalidSelection(format!(
                "exactly {} active lanes required, got {}",
                k,
                lanes.len()
            )));
        }
        if let Some(&lane) = lanes.iter().find(|&&lane| lane >= lane_count) {
            return Err(ControllerError::InvalidSelection(format!(
                "lane {} does not exist (intersection has {} lanes)",
                lane, lane_count
            )));
        }
        let mut seen = HashSet::new();
        if let Some(&lane) = lanes.iter().find(|&&lane| !seen.insert(lane)) {
            return Err(ControllerError::InvalidSelection(format!(
                "lane {} selected more than once",
                lane
            )));
        }
        Ok(Self(lanes))
    }

    /// Lanes `0..k`, the selection a freshly started controller begins with.
    pub fn first_lanes(k: usize) -> Self {
        Self((0..k).collect())
    }

    pub fn lanes(&self) -> &[usize] {
        &self.0
    }

    // Moves `lane` to the front, displacing the lowest-ranked lane if it was not selected.
    pub(crate) fn prioritize(&mut self, lane: usize) {
        match self.0.iter().position(|&l| l == lane) {
            Some(pos) => {
                self.0.remove(pos);
            }
            None => {
                self.0.pop();
            }
        }
        self.0.insert(0, lane);
    }
}

/// Picks the `k` busiest lanes. Equal counts keep ascending lane order.
pub fn select_active_lanes(counts: &[f64], k: usize) -> Result<ActiveSet, ControllerError> {
    if k == 0 || k > counts.len() {
        return Err(ControllerError::InvalidConfiguration(format!(
            "cannot select {} active lanes out of {}",
            k,
            counts.len()
        )));
    }

    let mut ranked: Vec<usize> = (0..counts.len()).collect();
    // sort_by is stable, which gives the first-seen-wins tie break.
    ranked.sort_by(|&a, &b| {
        counts[b]
            .partial_cmp(&counts[a])
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(k);
    Ok(ActiveSet(ranked))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolve_to_lowest_indices() {
        let active = select_active_lanes(&[10.0, 10.0, 10.0, 10.0], 2).unwrap();
        assert_eq!(active.lanes(), &[0, 1]);
    }

    #[test]
    fn busiest_lanes_win() {
        let active = select_active_lanes(&[5.0, 30.0, 12.0, 31.0], 2).unwrap();
        assert_eq!(active.lanes(), &[3, 1]);
    }

    #[test]
    fn partial_tie_keeps_earlier_lane() {
        let active = select_active_lanes(&[3.0, 8.0, 20.0, 8.0], 2).unwrap();
        assert_eq!(active.lanes(), &[2, 1]);
    }

    #[test]
    fn selection_has_exactly_k_distinct_lanes() {
        let counts = [4.0, 19.0, 0.0, 7.0, 19.0, 33.0];
        for k in 1..=counts.len() {
            let active = select_active_lanes(&counts, k).unwrap();
            assert_eq!(active.lanes().len(), k);
            let distinct: HashSet<_> = active.lanes().iter().collect();
            assert_eq!(distinct.len(), k);
            assert!(active.lanes().iter().all(|&lane| lane < counts.len()));
        }
    }

    #[test]
    fn k_larger_than_lane_count_is_a_configuration_error() {
        assert!(matches!(
            select_active_lanes(&[1.0, 2.0], 3),
            Err(ControllerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn operator_selection_must_have_k_entries() {
        assert!(matches!(
            ActiveSet::new(vec![1], 2, 4),
            Err(ControllerError::InvalidSelection(_))
        ));
    }

    #[test]
    fn operator_selection_rejects_duplicates_and_unknown_lanes() {
        assert!(ActiveSet::new(vec![2, 2], 2, 4).is_err());
        assert!(ActiveSet::new(vec![0, 4], 2, 4).is_err());
        assert_eq!(ActiveSet::new(vec![3, 0], 2, 4).unwrap().lanes(), &[3, 0]);
    }

    #[test]
    fn prioritize_keeps_cardinality() {
        let mut active = ActiveSet::first_lanes(2);
        active.prioritize(3);
        assert_eq!(active.lanes(), &[3, 0]);
        active.prioritize(0);
        assert_eq!(active.lanes(), &[0, 3]);
    }
}
