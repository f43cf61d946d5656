pub mod config;
pub mod control_system;
pub mod detection;
pub mod error;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;
pub mod timing_engine;

pub use config::{ControllerConfig, TimingConfig};
pub use control_system::{OperatorCommand, TrafficLightController};
pub use error::ControllerError;
