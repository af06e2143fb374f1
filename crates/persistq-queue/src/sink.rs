//! Event sink implementations.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use persistq_config::QueueConfig;
use persistq_protocols::{EventSink, QueueEvent};

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: &QueueEvent) {}
}

/// Sink that writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &QueueEvent) {
        match event {
            QueueEvent::JobDidFail(job) | QueueEvent::JobDidFailCritical(job) => {
                warn!(event = event.name(), job_id = %job.id, task = %job.task, attempts = job.attempts, "Queue event");
            }
            _ => match event.job() {
                Some(job) => {
                    info!(event = event.name(), job_id = %job.id, task = %job.task, attempts = job.attempts, "Queue event");
                }
                None => info!(event = event.name(), "Queue event"),
            },
        }
    }
}

/// Sink that fans events out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<QueueEvent>,
}

impl BroadcastEventSink {
    /// Create a sink buffering up to `capacity` events per lagging subscriber.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create a sink sized by `event_buffer`.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(config.event_buffer)
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: &QueueEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("No subscribers for {}", event.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistq_protocols::{Job, JobId};

    fn job(id: i64) -> Job {
        Job {
            id: JobId(id),
            task: "t".to_string(),
            data: serde_json::json!({"id": id}),
            attempts: 0,
            stamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_in_order() {
        let sink = BroadcastEventSink::new(8);
        let mut rx = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 1);

        sink.publish(&QueueEvent::QueueDidStart);
        sink.publish(&QueueEvent::JobDidSucceed(job(1)));
        sink.publish(&QueueEvent::QueueDidDrain);

        assert_eq!(rx.recv().await.unwrap(), QueueEvent::QueueDidStart);
        let succeeded = rx.recv().await.unwrap();
        assert_eq!(succeeded.name(), "job.did_succeed");
        assert_eq!(succeeded.job().map(|j| j.id), Some(JobId(1)));
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::QueueDidDrain);
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let config = QueueConfig {
            event_buffer: 0,
            ..Default::default()
        };
        let sink = BroadcastEventSink::from_config(&config);
        sink.publish(&QueueEvent::QueueDidStop);

        let mut rx = sink.subscribe();
        sink.publish(&QueueEvent::QueueDidStart);
        assert_eq!(rx.recv().await.unwrap(), QueueEvent::QueueDidStart);
    }

    #[test]
    fn test_noop_and_tracing_sinks_accept_all_events() {
        let events = [
            QueueEvent::QueueDidStart,
            QueueEvent::JobDidFail(job(2)),
            QueueEvent::JobDidCancel(job(3)),
        ];
        for event in &events {
            NoopEventSink.publish(event);
            TracingEventSink.publish(event);
        }
    }
}
