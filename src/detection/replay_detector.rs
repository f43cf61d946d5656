use std::io;
use std::path::Path;

use crate::detection::{DetectionAdapter, DetectionFrame};
use crate::error::ControllerError;

/// Replays recorded detector output, one frame per tick.
///
/// Each CSV row holds N counts, optionally followed by N emergency-vehicle counts. Rows
/// that do not parse are kept as gaps: the tick that reaches one sees the adapter as
/// unavailable, exactly like a detector dropout.
pub struct ReplayDetector {
    frames: Vec<Option<DetectionFrame>>,
    cursor: usize,
    looped: bool,
}

impl ReplayDetector {
    pub fn new(frames: Vec<Option<DetectionFrame>>, looped: bool) -> Self {
        Self {
            frames,
            cursor: 0,
            looped,
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        lane_count: usize,
        looped: bool,
    ) -> Result<Self, ControllerError> {
        let reader = reader_builder().from_path(path.as_ref())?;
        let detector = Self::from_csv(reader, lane_count, looped)?;
        log::info!(
            "Loaded {} recorded frames from {}",
            detector.frames.len(),
            path.as_ref().display()
        );
        Ok(detector)
    }

    pub fn from_reader<R: io::Read>(
        reader: R,
        lane_count: usize,
        looped: bool,
    ) -> Result<Self, ControllerError> {
        Self::from_csv(reader_builder().from_reader(reader), lane_count, looped)
    }

    fn from_csv<R: io::Read>(
        mut reader: csv::Reader<R>,
        lane_count: usize,
        looped: bool,
    ) -> Result<Self, ControllerError> {
        let mut frames = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let frame = parse_row(&record, lane_count);
            if frame.is_none() {
                log::warn!("Recording row {} is malformed; replaying it as a gap", row + 1);
            }
            frames.push(frame);
        }
        Ok(Self::new(frames, looped))
    }

    /// Frames left before the recording ends (or wraps, when looped).
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn parse_row(record: &csv::StringRecord, lane_count: usize) -> Option<DetectionFrame> {
    if record.len() != lane_count && record.len() != lane_count * 2 {
        return None;
    }
    let counts = record
        .iter()
        .take(lane_count)
        .map(|field| field.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let emergency = record
        .iter()
        .skip(lane_count)
        .map(|field| field.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some(DetectionFrame::with_emergency(counts, emergency))
}

impl DetectionAdapter for ReplayDetector {
    fn read_counts(&mut self) -> Result<DetectionFrame, ControllerError> {
        if self.cursor >= self.frames.len() {
            if !self.looped || self.frames.is_empty() {
                return Err(ControllerError::AdapterUnavailable(
                    "recording exhausted".to_string(),
                ));
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        frame.ok_or_else(|| {
            ControllerError::AdapterUnavailable(format!("recorded frame {} is a gap", self.cursor))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = "\
# lane1,lane2,lane3,lane4
12,30,4,8
1,2,three,4
5,5,5,5,0,1,0,0
";

    #[test]
    fn replays_rows_in_order_and_reports_gaps() {
        let mut detector = ReplayDetector::from_reader(RECORDING.as_bytes(), 4, false).unwrap();
        assert_eq!(detector.remaining(), 3);

        let first = detector.read_counts().unwrap();
        assert_eq!(first.counts, vec![12.0, 30.0, 4.0, 8.0]);
        assert!(first.emergency.is_empty());

        assert!(matches!(
            detector.read_counts(),
            Err(ControllerError::AdapterUnavailable(_))
        ));

        let third = detector.read_counts().unwrap();
        assert_eq!(third.emergency, vec![0, 1, 0, 0]);

        assert!(matches!(
            detector.read_counts(),
            Err(ControllerError::AdapterUnavailable(_))
        ));
    }

    #[test]
    fn looped_recording_wraps_around() {
        let mut detector = ReplayDetector::from_reader("1,2\n3,4\n".as_bytes(), 2, true).unwrap();
        let seen: Vec<f64> = (0..4)
            .map(|_| detector.read_counts().unwrap().counts[0])
            .collect();
        assert_eq!(seen, vec![1.0, 3.0, 1.0, 3.0]);
    }

    #[test]
    fn rows_of_the_wrong_width_are_gaps() {
        let mut detector = ReplayDetector::from_reader("1,2,3\n".as_bytes(), 2, false).unwrap();
        assert!(detector.read_counts().is_err());
    }

    #[test]
    fn empty_looped_recording_is_unavailable() {
        let mut detector = ReplayDetector::new(Vec::new(), true);
        assert!(detector.read_counts().is_err());
    }
}
