pub mod count_history;
pub mod signal_loop;
pub mod traffic_light_controller;

pub use count_history::CountHistory;
pub use signal_loop::{run_signal_loop, LoopOptions, LoopSummary, OperatorCommand};
pub use traffic_light_controller::{
    ControllerState, OperatorOutcome, TickOutcome, TrafficLightController,
};
