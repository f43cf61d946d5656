use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{stdin, stdout, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::control_system::OperatorCommand;
use crate::error::ControllerError;
use crate::monitoring::StateSink;
use crate::shared_data::{ControllerSnapshot, Mode};

/// One row of the cycle log. Per-lane values are `;`-separated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub timestamp: u64,
    pub cycle: u64,
    pub mode: String,
    pub counts: String,
    pub green_times: String,
    pub active_lanes: String,
    pub congestion: String,
}

impl From<&ControllerSnapshot> for StateRecord {
    fn from(snapshot: &ControllerSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            cycle: snapshot.cycle,
            mode: format!("{:?}", snapshot.mode),
            counts: join_values(&snapshot.counts),
            green_times: join_values(&snapshot.green_times),
            active_lanes: snapshot
                .active_lanes
                .iter()
                .map(|lane| (lane + 1).to_string())
                .collect::<Vec<_>>()
                .join(";"),
            congestion: format!("{:?}", snapshot.congestion),
        }
    }
}

fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Generic helper to log a record to a CSV file.
fn log_to_csv<T: Serialize>(filename: &Path, record: &T) -> Result<(), Box<dyn Error>> {
    let file_exists = filename.exists();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(filename)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Appends every snapshot to a CSV file.
pub struct CsvStateLog {
    path: PathBuf,
}

impl CsvStateLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StateSink for CsvStateLog {
    fn name(&self) -> &str {
        "csv"
    }

    fn publish(&mut self, snapshot: &ControllerSnapshot) -> Result<(), Box<dyn Error>> {
        log_to_csv(&self.path, &StateRecord::from(snapshot))
    }
}

/// Summary of a cycle log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    pub records: usize,
    pub automatic: usize,
    pub manual: usize,
    pub severe: usize,
    /// Mean green time per lane over all records.
    pub mean_green_times: Vec<f64>,
}

/// Reads the cycle log back and aggregates it.
pub fn generate_report(filename: &Path) -> Result<CycleReport, Box<dyn Error>> {
    let file = File::open(filename)?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut report = CycleReport::default();
    let mut green_sums: Vec<f64> = Vec::new();

    for result in rdr.deserialize() {
        let record: StateRecord = result?;
        report.records += 1;
        if record.mode == format!("{:?}", Mode::Manual) {
            report.manual += 1;
        } else {
            report.automatic += 1;
        }
        if record.congestion == "Severe" {
            report.severe += 1;
        }
        for (lane, value) in record.green_times.split(';').enumerate() {
            let green: f64 = value.parse()?;
            if green_sums.len() <= lane {
                green_sums.resize(lane + 1, 0.0);
            }
            green_sums[lane] += green;
        }
    }

    if report.records > 0 {
        report.mean_green_times = green_sums
            .iter()
            .map(|sum| sum / report.records as f64)
            .collect();
    }
    Ok(report)
}

pub fn print_report(filename: &Path) -> Result<(), Box<dyn Error>> {
    println!("Generating Report...");
    let report = generate_report(filename)?;
    println!("Report Summary:");
    println!("Logged cycles: {}", report.records);
    println!("Automatic: {} | Manual: {}", report.automatic, report.manual);
    println!("Severe congestion: {} cycles", report.severe);
    for (lane, green) in report.mean_green_times.iter().enumerate() {
        println!("Lane {} mean green time: {:.1}s", lane + 1, green);
    }
    Ok(())
}

/// Parses operator lane numbers (1-based, comma or space separated) into lane indices.
/// Any token that is not a positive integer rejects the whole selection.
pub fn parse_lane_selection(input: &str) -> Result<Vec<usize>, ControllerError> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<usize>() {
            Ok(lane) if lane >= 1 => Ok(lane - 1),
            _ => Err(ControllerError::InvalidSelection(format!(
                "'{}' is not a lane number",
                token
            ))),
        })
        .collect()
}

fn read_line() -> Option<String> {
    let mut input = String::new();
    match stdin().read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim_end_matches(['\r', '\n']).to_string()),
    }
}

fn prompt(text: &str) -> Option<String> {
    print!("{}", text);
    let _ = stdout().flush();
    read_line()
}

/// Provides a simple CLI for operator overrides. Blocking: run it on its own thread.
/// Returns when the operator exits, stdin closes, or the controller stops listening.
pub fn run_cli(
    commands: mpsc::Sender<OperatorCommand>,
    lane_count: usize,
    state_log_path: Option<PathBuf>,
) {
    loop {
        println!("\nTraffic Signal Operator CLI");
        println!("1. Enable Manual Override");
        println!("2. Disable Manual Override");
        println!("3. Submit Manual Timings");
        println!("4. Show Current State");
        println!("5. Generate Report");
        println!("6. Exit");
        let Some(input) = prompt("Enter your choice: ") else {
            break;
        };
        let choice = input.trim().parse::<u32>().unwrap_or(0);
        let command = match choice {
            1 => OperatorCommand::EnableManual,
            2 => OperatorCommand::DisableManual,
            3 => {
                let mut green_times = Vec::with_capacity(lane_count);
                for lane in 1..=lane_count {
                    let Some(value) = prompt(&format!("Lane {} green time (seconds): ", lane))
                    else {
                        return;
                    };
                    green_times.push(value);
                }
                let Some(selection) = prompt("Active lanes (e.g. 1,3): ") else {
                    return;
                };
                match parse_lane_selection(&selection) {
                    Ok(active_lanes) => OperatorCommand::Submit {
                        green_times,
                        active_lanes,
                    },
                    Err(e) => {
                        println!("Manual settings rejected: {}", e);
                        continue;
                    }
                }
            }
            4 => OperatorCommand::ShowState,
            5 => {
                match &state_log_path {
                    Some(path) => {
                        if let Err(e) = print_report(path) {
                            eprintln!("Error generating report: {}", e);
                        }
                    }
                    None => println!("No state log configured."),
                }
                continue;
            }
            6 => {
                println!("Exiting CLI.");
                let _ = commands.blocking_send(OperatorCommand::Shutdown);
                break;
            }
            _ => {
                println!("Invalid choice. Try again.");
                continue;
            }
        };
        if commands.blocking_send(command).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing_engine::CongestionLevel;
    use std::env;
    use std::fs;

    fn snapshot(cycle: u64, mode: Mode, green_times: Vec<f64>) -> ControllerSnapshot {
        ControllerSnapshot {
            timestamp: 1_700_000_000 + cycle,
            cycle,
            mode,
            counts: vec![10.0, 20.0],
            green_times,
            active_lanes: vec![1, 0],
            congestion: CongestionLevel::Normal,
            average_counts: vec![10.0, 20.0],
        }
    }

    #[test]
    fn record_flattens_lane_values() {
        let record = StateRecord::from(&snapshot(4, Mode::Automatic, vec![22.5, 40.0]));
        assert_eq!(record.mode, "Automatic");
        assert_eq!(record.counts, "10;20");
        assert_eq!(record.green_times, "22.5;40");
        assert_eq!(record.active_lanes, "2;1");
    }

    #[test]
    fn log_round_trip_produces_report() {
        let path = env::temp_dir().join(format!("signal_state_{}.csv", std::process::id()));
        let _ = fs::remove_file(&path);
        let mut sink = CsvStateLog::new(&path);
        sink.publish(&snapshot(1, Mode::Automatic, vec![10.0, 20.0])).unwrap();
        sink.publish(&snapshot(2, Mode::Manual, vec![30.0, 40.0])).unwrap();

        let report = generate_report(&path).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.automatic, 1);
        assert_eq!(report.manual, 1);
        assert_eq!(report.mean_green_times, vec![20.0, 30.0]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn report_on_missing_log_is_an_error() {
        assert!(generate_report(Path::new("/nonexistent/signal_state.csv")).is_err());
    }

    #[test]
    fn lane_selection_is_one_based() {
        assert_eq!(parse_lane_selection("1,3").unwrap(), vec![0, 2]);
        assert_eq!(parse_lane_selection(" 2  4 ").unwrap(), vec![1, 3]);
        assert!(parse_lane_selection("").unwrap().is_empty());
    }

    #[test]
    fn lane_selection_rejects_bad_tokens() {
        for input in ["1,3,x", "0,1,3", "1 3 9x", "-1,2"] {
            assert!(
                matches!(
                    parse_lane_selection(input),
                    Err(ControllerError::InvalidSelection(_))
                ),
                "{} should be rejected",
                input
            );
        }
    }
}
