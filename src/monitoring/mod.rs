pub mod console;
pub mod publisher;
pub mod traffic_monitoring_system;

use std::error::Error;

use crate::config::ControllerConfig;
use crate::shared_data::ControllerSnapshot;

/// A downstream consumer of controller snapshots (display, log, message queue).
pub trait StateSink {
    fn name(&self) -> &str;
    fn publish(&mut self, snapshot: &ControllerSnapshot) -> Result<(), Box<dyn Error>>;
}

/// Hands the snapshot to every sink. A failing sink is logged and skipped; it never
/// affects the controller or the other sinks.
pub fn publish_all(sinks: &mut [Box<dyn StateSink>], snapshot: &ControllerSnapshot) {
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.publish(snapshot) {
            log::error!("Sink '{}' failed on cycle {}: {}", sink.name(), snapshot.cycle, e);
        }
    }
}

/// Sinks enabled by the configuration. The AMQP sink starts a background worker, so this
/// must run inside the tokio runtime; an unreachable broker only stops that worker.
pub fn build_sinks(config: &ControllerConfig) -> Vec<Box<dyn StateSink>> {
    let mut sinks: Vec<Box<dyn StateSink>> = Vec::new();
    if config.console {
        sinks.push(Box::new(console::ConsoleSink::default()));
    }
    if let Some(path) = &config.state_log_path {
        sinks.push(Box::new(traffic_monitoring_system::CsvStateLog::new(path)));
    }
    if let Some(url) = &config.amqp_url {
        sinks.push(Box::new(publisher::AmqpPublisher::spawn(url, &config.amqp_queue)));
    }
    sinks
}
