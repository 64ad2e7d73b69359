//! Streaming trigger consumer.
//!
//! Externally produced messages name players to (re-)scrape, independent of
//! the polling scheduler. The transport hides behind `TriggerQueue`; what
//! matters is the acknowledgement contract: a message is acked only after
//! its pipeline run completes (success or recorded failure), never on
//! partial processing, so a crash mid-pipeline redelivers instead of
//! silently losing the trigger.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::ingest::{IngestService, PlayerOutcome};

/// Trigger transport failure.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger transport error: {0}")]
    Transport(String),
}

/// One in-flight trigger message. Consumed by `ack` or `reject`.
#[async_trait]
pub trait Trigger: Send {
    /// Raw message payload.
    fn payload(&self) -> &[u8];

    /// Acknowledge: processing finished, do not redeliver.
    async fn ack(self: Box<Self>) -> Result<(), TriggerError>;

    /// Reject without requeue (undecodable payload).
    async fn reject(self: Box<Self>) -> Result<(), TriggerError>;
}

/// A source of trigger messages.
#[async_trait]
pub trait TriggerQueue: Send {
    /// Next trigger, or `None` once the queue is closed.
    async fn recv(&mut self) -> Result<Option<Box<dyn Trigger>>, TriggerError>;
}

/// Extract the player name from a trigger payload.
///
/// Accepts a bare UTF-8 name, a JSON string, or a JSON object with a
/// `name` field.
pub fn parse_trigger_payload(payload: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(name) = value.get("name").and_then(|v| v.as_str()) {
            return Some(name.to_string());
        }
        if let Some(name) = value.as_str() {
            return Some(name.to_string());
        }
        return None;
    }

    Some(text.to_string())
}

/// Tally for one consumer session (until the queue closes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub scraped: usize,
    pub flagged: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Consumes trigger messages and runs each through the ingest pipeline.
pub struct StreamingConsumer {
    ingest: IngestService,
}

impl StreamingConsumer {
    pub fn new(ingest: IngestService) -> Self {
        Self { ingest }
    }

    /// Consume until the queue closes. Returns the session tally.
    pub async fn run<Q: TriggerQueue>(&self, queue: &mut Q) -> Result<ConsumerReport, TriggerError> {
        let mut report = ConsumerReport::default();

        while let Some(trigger) = queue.recv().await? {
            let name = match parse_trigger_payload(trigger.payload()) {
                Some(name) => name,
                None => {
                    warn!("undecodable trigger payload, rejecting");
                    report.rejected += 1;
                    trigger.reject().await?;
                    continue;
                }
            };

            // Run the pipeline to completion before touching the ack. A
            // per-player failure is a recorded outcome, so it acks too;
            // the polling scheduler retries the player in a later cycle.
            match self.ingest.process_player(&name).await {
                Ok(PlayerOutcome::Scraped) => {
                    info!(player = %name, "trigger processed");
                    report.scraped += 1;
                }
                Ok(PlayerOutcome::Flagged) => {
                    info!(player = %name, "trigger processed, possible ban");
                    report.flagged += 1;
                }
                Err(e) => {
                    warn!(player = %name, error = %e, "trigger pipeline failed");
                    report.failed += 1;
                }
            }
            trigger.ack().await?;
        }

        Ok(report)
    }
}

/// Ack outcome emitted by the channel-backed queue, for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerAck {
    Acked(String),
    Rejected(String),
}

/// In-process trigger queue over tokio channels.
///
/// Used by the stdin consumer path and by tests; ack events are observable
/// on a side channel.
pub struct ChannelTriggerQueue {
    rx: mpsc::UnboundedReceiver<String>,
    ack_tx: mpsc::UnboundedSender<TriggerAck>,
}

impl ChannelTriggerQueue {
    /// Returns (payload sender, ack observer, queue).
    pub fn new() -> (
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<TriggerAck>,
        Self,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        (tx, ack_rx, Self { rx, ack_tx })
    }
}

#[async_trait]
impl TriggerQueue for ChannelTriggerQueue {
    async fn recv(&mut self) -> Result<Option<Box<dyn Trigger>>, TriggerError> {
        match self.rx.recv().await {
            Some(payload) => Ok(Some(Box::new(ChannelTrigger {
                payload: payload.into_bytes(),
                ack_tx: self.ack_tx.clone(),
            }))),
            None => Ok(None),
        }
    }
}

struct ChannelTrigger {
    payload: Vec<u8>,
    ack_tx: mpsc::UnboundedSender<TriggerAck>,
}

#[async_trait]
impl Trigger for ChannelTrigger {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(self: Box<Self>) -> Result<(), TriggerError> {
        let payload = String::from_utf8_lossy(&self.payload).into_owned();
        let _ = self.ack_tx.send(TriggerAck::Acked(payload));
        Ok(())
    }

    async fn reject(self: Box<Self>) -> Result<(), TriggerError> {
        let payload = String::from_utf8_lossy(&self.payload).into_owned();
        let _ = self.ack_tx.send(TriggerAck::Rejected(payload));
        Ok(())
    }
}

/// AMQP-backed trigger queue (RabbitMQ via lapin), with manual acks.
#[cfg(feature = "amqp")]
pub struct AmqpTriggerQueue {
    consumer: lapin::Consumer,
    // Dropped with the queue; keeps the connection open while consuming.
    _connection: lapin::Connection,
}

#[cfg(feature = "amqp")]
impl AmqpTriggerQueue {
    /// Connect and start consuming from `queue`.
    pub async fn connect(url: &str, queue: &str) -> Result<Self, TriggerError> {
        use lapin::options::{BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
        use lapin::types::FieldTable;

        let connection = lapin::Connection::connect(url, lapin::ConnectionProperties::default())
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        // One unacked message at a time; the pipeline is the slow part.
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        let consumer = channel
            .basic_consume(
                queue,
                "hiscored",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))?;

        Ok(Self {
            consumer,
            _connection: connection,
        })
    }
}

#[cfg(feature = "amqp")]
#[async_trait]
impl TriggerQueue for AmqpTriggerQueue {
    async fn recv(&mut self) -> Result<Option<Box<dyn Trigger>>, TriggerError> {
        use futures::StreamExt;

        match self.consumer.next().await {
            Some(Ok(delivery)) => Ok(Some(Box::new(AmqpTrigger { delivery }))),
            Some(Err(e)) => Err(TriggerError::Transport(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(feature = "amqp")]
struct AmqpTrigger {
    delivery: lapin::message::Delivery,
}

#[cfg(feature = "amqp")]
#[async_trait]
impl Trigger for AmqpTrigger {
    fn payload(&self) -> &[u8] {
        &self.delivery.data
    }

    async fn ack(self: Box<Self>) -> Result<(), TriggerError> {
        self.delivery
            .ack(lapin::options::BasicAckOptions::default())
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))
    }

    async fn reject(self: Box<Self>) -> Result<(), TriggerError> {
        self.delivery
            .nack(lapin::options::BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
            .map_err(|e| TriggerError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_payload_bare_name() {
        assert_eq!(
            parse_trigger_payload(b"  durial321 \n"),
            Some("durial321".to_string())
        );
    }

    #[test]
    fn test_parse_trigger_payload_json_object() {
        assert_eq!(
            parse_trigger_payload(br#"{"name": "king condor"}"#),
            Some("king condor".to_string())
        );
    }

    #[test]
    fn test_parse_trigger_payload_json_string() {
        assert_eq!(
            parse_trigger_payload(br#""zezima""#),
            Some("zezima".to_string())
        );
    }

    #[test]
    fn test_parse_trigger_payload_rejects_garbage() {
        assert_eq!(parse_trigger_payload(b""), None);
        assert_eq!(parse_trigger_payload(b"   "), None);
        assert_eq!(parse_trigger_payload(br#"{"player": 7}"#), None);
        assert_eq!(parse_trigger_payload(&[0xff, 0xfe]), None);
    }
}
