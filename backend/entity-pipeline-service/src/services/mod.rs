pub mod kafka_events;
pub mod pipeline;

pub use kafka_events::{EntityEventProducer, EventPublisher, KafkaEventProducerConfig};
pub use pipeline::{EntityPipeline, PipelineOptions, PipelineReport, PipelineState};
