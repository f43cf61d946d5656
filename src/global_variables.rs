// Timing bounds (seconds)
pub const MIN_GREEN: f64 = 5.0;
pub const MAX_GREEN: f64 = 180.0;
pub const FALLBACK_GREEN: f64 = 30.0;

// Count normalisation
pub const MAX_COUNT: f64 = 100.0;

// Intersection layout
pub const LANE_COUNT: usize = 4;
pub const ACTIVE_LANES: usize = 2;

// Tick loop
pub const TICK_PERIOD_MS: u64 = 1000;

// Synthetic detector: counts drawn from [0, DETECTOR_MAX)
pub const DETECTOR_MAX: u32 = 40;

// Rolling window of automatic count vectors
pub const HISTORY_LEN: usize = 50;

// Congestion thresholds on the total vehicle count
pub const CONGESTION_HIGH: f64 = 50.0;
pub const CONGESTION_SEVERE: f64 = 80.0;

// Queue Routing Keys
pub const QUEUE_SIGNAL_STATE: &str = "signal_state";

// Snapshots buffered for the AMQP worker before new ones are dropped
pub const PUBLISH_BUFFER: usize = 64;

// Environment variable naming the JSON configuration file
pub const CONFIG_ENV_VAR: &str = "SIGNAL_CONFIG";
