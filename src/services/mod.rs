//! Ingestion services: per-player pipeline, cycle scheduler, trigger consumer.

mod consumer;
mod ingest;
mod scheduler;

pub use consumer::{
    parse_trigger_payload, ChannelTriggerQueue, ConsumerReport, StreamingConsumer, Trigger,
    TriggerAck, TriggerError, TriggerQueue,
};
#[cfg(feature = "amqp")]
pub use consumer::AmqpTriggerQueue;
pub use ingest::{BatchReport, IngestError, IngestService, PlayerOutcome};
pub use scheduler::{CycleState, IngestionScheduler, SchedulerConfig};
