use std::error::Error;
use std::fmt::Write;

use crate::monitoring::StateSink;
use crate::shared_data::{ControllerSnapshot, Mode};

/// Formats a snapshot as the operator's status table.
pub fn render_snapshot(snapshot: &ControllerSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "--- Cycle {} | {} | Congestion: {:?} ---",
        snapshot.cycle, snapshot.mode, snapshot.congestion
    );
    for (lane, (count, green)) in snapshot
        .counts
        .iter()
        .zip(&snapshot.green_times)
        .enumerate()
    {
        let status = if snapshot.active_lanes.contains(&lane) {
            "ACTIVE"
        } else {
            ""
        };
        let average = snapshot.average_counts.get(lane).copied().unwrap_or(0.0);
        let _ = writeln!(
            out,
            "Lane {}: {:>5.0} cars (avg {:>5.1}) | Green Time: {:>5.1}s {}",
            lane + 1,
            count,
            average,
            green,
            status
        );
    }
    out
}

/// Prints one line to stdout whenever the mode changes. It shares the terminal with the
/// operator prompt, so the full table is only printed on request.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    last_mode: Option<Mode>,
}

impl ConsoleSink {
    fn status_line(&mut self, snapshot: &ControllerSnapshot) -> Option<String> {
        if self.last_mode == Some(snapshot.mode) {
            return None;
        }
        self.last_mode = Some(snapshot.mode);
        Some(format!(
            "[{}] cycle {} | congestion {:?}",
            snapshot.mode, snapshot.cycle, snapshot.congestion
        ))
    }
}

impl StateSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn publish(&mut self, snapshot: &ControllerSnapshot) -> Result<(), Box<dyn Error>> {
        if let Some(line) = self.status_line(snapshot) {
            println!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing_engine::CongestionLevel;

    fn snapshot(cycle: u64, mode: Mode) -> ControllerSnapshot {
        ControllerSnapshot {
            timestamp: 0,
            cycle,
            mode,
            counts: vec![12.0, 3.0],
            green_times: vec![26.0, 10.25],
            active_lanes: vec![0],
            congestion: CongestionLevel::Normal,
            average_counts: vec![10.0, 4.0],
        }
    }

    #[test]
    fn console_sink_reports_only_mode_changes() {
        let mut sink = ConsoleSink::default();
        let first = sink.status_line(&snapshot(0, Mode::Automatic)).unwrap();
        assert!(first.contains("AI Mode Active") && first.contains("cycle 0"));
        assert_eq!(sink.status_line(&snapshot(1, Mode::Automatic)), None);
        assert_eq!(sink.status_line(&snapshot(2, Mode::Automatic)), None);
        assert!(sink
            .status_line(&snapshot(3, Mode::Manual))
            .unwrap()
            .contains("Manual Mode Active"));
        assert!(sink.status_line(&snapshot(4, Mode::Automatic)).is_some());
    }

    #[test]
    fn marks_active_lanes() {
        let snapshot = snapshot(7, Mode::Automatic);
        let text = render_snapshot(&snapshot);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Cycle 7"));
        assert!(lines[0].contains("AI Mode Active"));
        assert!(lines[1].starts_with("Lane 1:") && lines[1].ends_with("ACTIVE"));
        assert!(lines[2].contains("Green Time:  10.2s") || lines[2].contains("Green Time:  10.3s"));
        assert!(!lines[2].contains("ACTIVE"));
    }
}
