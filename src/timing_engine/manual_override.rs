use serde::{Deserialize, Serialize};

use crate::config::TimingConfig;
use crate::error::ControllerError;
use crate::timing_engine::lane_selection::ActiveSet;

/// Something the operator typed that was accepted only after adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NormalizationWarning {
    /// The field was not a number; the fallback green time was used instead.
    ParseFallback { lane: usize, raw: String },
    /// The value fell outside the green-time bounds.
    Clamped { lane: usize, requested: f64, applied: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub warnings: Vec<NormalizationWarning>,
}

impl NormalizationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Lanes whose field failed to parse.
    pub fn fallback_lanes(&self) -> Vec<usize> {
        self.warnings
            .iter()
            .filter_map(|warning| match warning {
                NormalizationWarning::ParseFallback { lane, .. } => Some(*lane),
                _ => None,
            })
            .collect()
    }

    pub fn clamped_lanes(&self) -> Vec<usize> {
        self.warnings
            .iter()
            .filter_map(|warning| match warning {
                NormalizationWarning::Clamped { lane, .. } => Some(*lane),
                _ => None,
            })
            .collect()
    }
}

/// A fully validated operator override, ready to replace the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualOverride {
    pub green_times: Vec<f64>,
    pub active_set: ActiveSet,
    pub report: NormalizationReport,
}

/// Validates an operator submission.
///
/// Unparseable green-time fields fall back to `fallback_green` and every value is clamped
/// into the green bounds; both adjustments are listed in the report. A selection that is
/// not exactly `active_lanes` distinct, existing lanes rejects the whole submission.
pub fn apply_manual_override<S: AsRef<str>>(
    raw_green_times: &[S],
    raw_active_lanes: &[usize],
    timing: &TimingConfig,
) -> Result<ManualOverride, ControllerError> {
    if raw_green_times.len() != timing.lane_count {
        return Err(ControllerError::LaneCountMismatch {
            expected: timing.lane_count,
            actual: raw_green_times.len(),
        });
    }
    let active_set = ActiveSet::new(
        raw_active_lanes.to_vec(),
        timing.active_lanes,
        timing.lane_count,
    )?;

    let mut report = NormalizationReport::default();
    let green_times = raw_green_times
        .iter()
        .enumerate()
        .map(|(lane, raw)| {
            let raw = raw.as_ref();
            let requested = match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    report.warnings.push(NormalizationWarning::ParseFallback {
                        lane,
                        raw: raw.to_string(),
                    });
                    timing.fallback_green
                }
            };
            let applied = requested.clamp(timing.min_green, timing.max_green);
            if applied != requested {
                report.warnings.push(NormalizationWarning::Clamped {
                    lane,
                    requested,
                    applied,
                });
            }
            applied
        })
        .collect();

    Ok(ManualOverride {
        green_times,
        active_set,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_and_clamps_each_field() {
        let result =
            apply_manual_override(&["abc", "40", "200", "-10"], &[0, 2], &TimingConfig::default())
                .unwrap();
        assert_eq!(result.green_times, vec![30.0, 40.0, 180.0, 5.0]);
        assert_eq!(result.report.fallback_lanes(), vec![0]);
        assert_eq!(result.report.clamped_lanes(), vec![2, 3]);
        assert_eq!(result.active_set.lanes(), &[0, 2]);
    }

    #[test]
    fn clean_submission_has_empty_report() {
        let result = apply_manual_override(
            &[" 12.5", "60", "5", "180 "],
            &[3, 1],
            &TimingConfig::default(),
        )
        .unwrap();
        assert_eq!(result.green_times, vec![12.5, 60.0, 5.0, 180.0]);
        assert!(result.report.is_clean());
    }

    #[test]
    fn non_finite_values_use_fallback() {
        let result =
            apply_manual_override(&["NaN", "inf", "", "7"], &[0, 1], &TimingConfig::default())
                .unwrap();
        assert_eq!(result.green_times, vec![30.0, 30.0, 30.0, 7.0]);
        assert_eq!(result.report.fallback_lanes(), vec![0, 1, 2]);
    }

    #[test]
    fn fallback_outside_bounds_is_clamped_too() {
        let timing = TimingConfig {
            max_green: 20.0,
            ..TimingConfig::default()
        };
        let result = apply_manual_override(&["x", "10", "10", "10"], &[0, 1], &timing).unwrap();
        assert_eq!(result.green_times[0], 20.0);
        assert_eq!(result.report.fallback_lanes(), vec![0]);
        assert_eq!(result.report.clamped_lanes(), vec![0]);
    }

    #[test]
    fn wrong_number_of_active_lanes_is_rejected() {
        let result =
            apply_manual_override(&["30", "30", "30", "30"], &[1], &TimingConfig::default());
        assert!(matches!(result, Err(ControllerError::InvalidSelection(_))));
    }

    #[test]
    fn wrong_number_of_green_times_is_rejected() {
        let result = apply_manual_override(&["30", "30"], &[0, 1], &TimingConfig::default());
        assert!(matches!(
            result,
            Err(ControllerError::LaneCountMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }
}
