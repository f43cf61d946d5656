use adaptive_signal_control::config::ControllerConfig;
use adaptive_signal_control::control_system::{
    run_signal_loop, LoopOptions, OperatorCommand, TrafficLightController,
};
use adaptive_signal_control::detection::build_detector;
use adaptive_signal_control::global_variables::CONFIG_ENV_VAR;
use adaptive_signal_control::monitoring::build_sinks;
use adaptive_signal_control::monitoring::traffic_monitoring_system::run_cli;
use std::env;
use std::path::PathBuf;
use std::process;
use std::thread;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    let config = match ControllerConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Refusing to start: {}", e);
            process::exit(1);
        }
    };

    let mut controller = match TrafficLightController::new(&config) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Refusing to start: {}", e);
            process::exit(1);
        }
    };
    let mut detector = match build_detector(&config) {
        Ok(detector) => detector,
        Err(e) => {
            eprintln!("Detector error: {}", e);
            process::exit(1);
        }
    };
    let mut sinks = build_sinks(&config);

    let (tx, rx) = mpsc::channel(16);

    // Operator CLI reads stdin on its own thread so the tick loop never blocks on it.
    let cli_tx = tx.clone();
    let lane_count = config.timing.lane_count;
    let state_log_path = config.state_log_path.clone().map(PathBuf::from);
    thread::spawn(move || run_cli(cli_tx, lane_count, state_log_path));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(OperatorCommand::Shutdown).await;
        }
    });

    println!("Starting traffic signal controller...");
    let summary = run_signal_loop(
        &mut controller,
        &mut detector,
        &mut sinks,
        rx,
        LoopOptions {
            tick_period: config.tick_period(),
            max_ticks: None,
        },
    )
    .await;
    println!(
        "Controller stopped after {} ticks ({} skipped).",
        summary.ticks, summary.skipped
    );
}
