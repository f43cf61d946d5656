use crate::config::{ControllerConfig, TimingConfig};
use crate::control_system::count_history::CountHistory;
use crate::detection::DetectionAdapter;
use crate::error::ControllerError;
use crate::shared_data::{current_timestamp, ControllerSnapshot, Mode};
use crate::timing_engine::{classify_congestion, ActiveSet, NormalizationReport, SignalTimingEngine};

/// The decision the rest of the system reads between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub mode: Mode,
    pub counts: Vec<f64>,
    pub green_times: Vec<f64>,
    pub active_set: ActiveSet,
    /// Number of decisions applied since start.
    pub cycle: u64,
    pub updated_at: u64,
}

impl ControllerState {
    /// Zeroed counts, minimum green everywhere and lanes `0..k` active.
    pub fn initial(timing: &TimingConfig) -> Self {
        Self {
            mode: Mode::Automatic,
            counts: vec![0.0; timing.lane_count],
            green_times: vec![timing.min_green; timing.lane_count],
            active_set: ActiveSet::first_lanes(timing.active_lanes),
            cycle: 0,
            updated_at: current_timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Fresh allocation applied; carries the lane preempted by an emergency vehicle, if any.
    Recomputed { preempted: Option<usize> },
    /// Manual mode: automatic recomputation is suspended.
    Suspended,
    /// The detector failed; the previous state stays in force until the next tick.
    Retained(ControllerError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorOutcome {
    Switched(Mode),
    Applied(NormalizationReport),
    /// The action does not apply in the current mode.
    Ignored,
}

/// Owns the controller state and the automatic/manual state machine.
pub struct TrafficLightController {
    engine: SignalTimingEngine,
    state: ControllerState,
    history: CountHistory,
}

impl TrafficLightController {
    /// Refuses to start on a configuration that cannot describe a working intersection.
    pub fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        Self::with_timing(config.timing.clone(), config.history_len)
    }

    pub fn with_timing(timing: TimingConfig, history_len: usize) -> Result<Self, ControllerError> {
        let engine = SignalTimingEngine::new(timing)?;
        let state = ControllerState::initial(engine.timing());
        let history = CountHistory::new(history_len, engine.timing().lane_count);
        Ok(Self {
            engine,
            state,
            history,
        })
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn timing(&self) -> &TimingConfig {
        self.engine.timing()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            timestamp: self.state.updated_at,
            cycle: self.state.cycle,
            mode: self.state.mode,
            counts: self.state.counts.clone(),
            green_times: self.state.green_times.clone(),
            active_lanes: self.state.active_set.lanes().to_vec(),
            congestion: classify_congestion(&self.state.counts, self.engine.timing()),
            average_counts: self.history.averages(),
        }
    }

    /// One timer tick. Recomputes only in automatic mode.
    pub fn tick<A: DetectionAdapter + ?Sized>(&mut self, adapter: &mut A) -> TickOutcome {
        if self.state.mode == Mode::Manual {
            return TickOutcome::Suspended;
        }
        match self.recompute(adapter) {
            Ok(preempted) => TickOutcome::Recomputed { preempted },
            Err(e) => {
                log::warn!("Tick skipped, keeping cycle {}: {}", self.state.cycle, e);
                TickOutcome::Retained(e)
            }
        }
    }

    /// Operator enables the override. The current values stay frozen until a submission.
    pub fn enable_manual(&mut self) -> OperatorOutcome {
        if self.state.mode == Mode::Manual {
            return OperatorOutcome::Ignored;
        }
        self.state.mode = Mode::Manual;
        log::info!("Manual override enabled at cycle {}", self.state.cycle);
        OperatorOutcome::Switched(Mode::Manual)
    }

    /// Operator disables the override. Recomputes immediately so manual values are not
    /// shown as if they were live. If the detector fails, the allocation is rebuilt from the
    /// last observed counts and the detector is retried on the next tick.
    pub fn disable_manual<A: DetectionAdapter + ?Sized>(
        &mut self,
        adapter: &mut A,
    ) -> OperatorOutcome {
        if self.state.mode == Mode::Automatic {
            return OperatorOutcome::Ignored;
        }
        self.state.mode = Mode::Automatic;
        log::info!("Manual override disabled, resuming automatic control");
        if let Err(e) = self.recompute(adapter) {
            log::warn!(
                "Could not recompute after leaving manual mode: {}; using last observed counts",
                e
            );
            self.allocate_from_last_counts();
        }
        OperatorOutcome::Switched(Mode::Automatic)
    }

    /// Applies an operator submission. Only valid in manual mode; a rejected submission
    /// leaves both the mode and the previous values untouched.
    pub fn submit_manual<S: AsRef<str>>(
        &mut self,
        raw_green_times: &[S],
        raw_active_lanes: &[usize],
    ) -> Result<OperatorOutcome, ControllerError> {
        if self.state.mode != Mode::Manual {
            log::debug!("Manual submission ignored in automatic mode");
            return Ok(OperatorOutcome::Ignored);
        }
        let accepted = self
            .engine
            .apply_manual_override(raw_green_times, raw_active_lanes)
            .map_err(|e| {
                log::warn!("Manual submission rejected: {}", e);
                e
            })?;

        for lane in accepted.report.fallback_lanes() {
            log::warn!(
                "Lane {} green time did not parse; using {}s",
                lane + 1,
                self.engine.timing().fallback_green
            );
        }
        let clamped = accepted.report.clamped_lanes();
        if !clamped.is_empty() {
            log::info!(
                "Clamped to [{}, {}]s on lanes {:?}",
                self.engine.timing().min_green,
                self.engine.timing().max_green,
                clamped.iter().map(|lane| lane + 1).collect::<Vec<_>>()
            );
        }
        self.state.green_times = accepted.green_times;
        self.state.active_set = accepted.active_set;
        self.mark_updated();
        log::info!(
            "Manual timings applied: {:?}, active lanes {:?}",
            self.state.green_times,
            self.state.active_set.lanes()
        );
        Ok(OperatorOutcome::Applied(accepted.report))
    }

    fn recompute<A: DetectionAdapter + ?Sized>(
        &mut self,
        adapter: &mut A,
    ) -> Result<Option<usize>, ControllerError> {
        let frame = adapter.read_counts()?;
        frame.validate(self.engine.timing().lane_count)?;
        let allocation = self.engine.allocate(&frame)?;

        if let Some(lane) = allocation.preempted {
            log::info!("Emergency vehicle on lane {}: granting priority", lane + 1);
        }
        self.history.record(&frame.counts);
        self.state.counts = frame.counts;
        self.state.green_times = allocation.green_times;
        self.state.active_set = allocation.active_set;
        self.mark_updated();
        log::debug!(
            "Cycle {}: counts {:?} -> green {:?}, active {:?}",
            self.state.cycle,
            self.state.counts,
            self.state.green_times,
            self.state.active_set.lanes()
        );
        Ok(allocation.preempted)
    }

    // Automatic decision on the counts already in the state, replacing operator values.
    fn allocate_from_last_counts(&mut self) {
        let k = self.engine.timing().active_lanes;
        self.state.green_times = self.engine.compute_green_times(&self.state.counts);
        self.state.active_set = self
            .engine
            .select_active_lanes(&self.state.counts)
            .unwrap_or_else(|_| ActiveSet::first_lanes(k));
        self.mark_updated();
    }

    fn mark_updated(&mut self) {
        self.state.cycle += 1;
        self.state.updated_at = current_timestamp();
    }
}
