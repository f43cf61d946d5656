use amiquip::{Connection, Exchange, Publish, QueueDeclareOptions, Result as AmiquipResult};
use std::error::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::global_variables::PUBLISH_BUFFER;
use crate::monitoring::StateSink;
use crate::shared_data::ControllerSnapshot;

/// Publishes every snapshot as JSON to a RabbitMQ queue for remote dashboards.
///
/// amiquip is blocking, so the broker connection lives on a `spawn_blocking` worker and
/// the sink only hands snapshots over a bounded channel. A slow or dead broker drops
/// snapshots instead of stalling the tick loop.
pub struct AmqpPublisher {
    snapshots: mpsc::Sender<ControllerSnapshot>,
}

impl AmqpPublisher {
    /// Starts the publishing worker. Must be called from within a tokio runtime.
    pub fn spawn(url: &str, queue: &str) -> Self {
        let (tx, rx) = mpsc::channel(PUBLISH_BUFFER);
        let url = url.to_string();
        let queue = queue.to_string();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = run_publish_worker(&url, &queue, rx) {
                log::error!("[Publisher] Stopped publishing to {}: {}", url, e);
            }
        });
        Self::from_sender(tx)
    }

    pub fn from_sender(snapshots: mpsc::Sender<ControllerSnapshot>) -> Self {
        Self { snapshots }
    }
}

/// JSON body sent for one snapshot.
pub fn snapshot_payload(snapshot: &ControllerSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}

/// Blocking worker: connects, then forwards snapshots until the sending side is dropped.
pub fn run_publish_worker(
    url: &str,
    queue: &str,
    mut snapshots: mpsc::Receiver<ControllerSnapshot>,
) -> AmiquipResult<()> {
    let mut connection = Connection::insecure_open(url)?;
    let channel = connection.open_channel(None)?;
    channel.queue_declare(queue, QueueDeclareOptions::default())?;
    let exchange = Exchange::direct(&channel);
    log::info!("[Publisher] Publishing controller state to '{}'", queue);

    while let Some(snapshot) = snapshots.blocking_recv() {
        match snapshot_payload(&snapshot) {
            Ok(payload) => exchange.publish(Publish::new(payload.as_bytes(), queue))?,
            Err(e) => log::error!("[Publisher] Could not encode cycle {}: {}", snapshot.cycle, e),
        }
    }
    connection.close()
}

impl StateSink for AmqpPublisher {
    fn name(&self) -> &str {
        "amqp"
    }

    fn publish(&mut self, snapshot: &ControllerSnapshot) -> Result<(), Box<dyn Error>> {
        match self.snapshots.try_send(snapshot.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err("publish queue full, snapshot dropped".into()),
            Err(TrySendError::Closed(_)) => Err("publish worker is not running".into()),
        }
    }
}
