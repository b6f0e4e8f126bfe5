//! Post Events Consumer
//!
//! Boundary adapter standing in for the invoking scheduler: consumes
//! post-created events, loads the post with its author's linking preference
//! and runs the entity pipeline. The offset is committed only after the run
//! settles, so retryable failures are redelivered and re-run from the start
//! (the pipeline is idempotent under re-runs).

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Headers, Message};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;
use crate::repository::PgEntityStore;
use crate::services::pipeline::{EntityPipeline, PipelineState};

/// Configuration for the post events Kafka consumer
#[derive(Debug, Clone)]
pub struct PostEventsConsumerConfig {
    pub brokers: String,
    pub group_id: String,
    pub post_events_topic: String,
}

/// Event payload for content.post.created
#[derive(Debug, Deserialize)]
struct PostCreatedEvent {
    post_id: String,
    #[allow(dead_code)]
    user_id: Option<String>,
}

/// Consumes post-created events and runs the entity pipeline per post
pub struct PostEventsConsumer {
    store: PgEntityStore,
    pipeline: Arc<EntityPipeline>,
    config: PostEventsConsumerConfig,
}

impl PostEventsConsumer {
    pub fn new(
        store: PgEntityStore,
        pipeline: Arc<EntityPipeline>,
        config: PostEventsConsumerConfig,
    ) -> Self {
        Self {
            store,
            pipeline,
            config,
        }
    }

    /// Run the consumer loop
    pub async fn run(self) {
        if let Err(err) = self.run_inner().await {
            error!("Post events consumer terminated with error: {err}");
        }
    }

    async fn run_inner(self) -> Result<(), KafkaError> {
        info!(
            "Starting post events consumer (topic: {}, group: {})",
            self.config.post_events_topic, self.config.group_id
        );

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.config.brokers)
            .set("group.id", &self.config.group_id)
            // Offsets are committed manually after a successful run so a
            // retryable pipeline failure leads to redelivery.
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "latest")
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "45000")
            .set("max.poll.interval.ms", "300000")
            .create()?;

        consumer.subscribe(&[&self.config.post_events_topic])?;

        loop {
            match consumer.recv().await {
                Ok(record) => {
                    let Some(payload) = record.payload() else {
                        debug!(
                            "Received Kafka message with empty payload (topic: {})",
                            record.topic()
                        );
                        self.commit(&consumer, &record);
                        continue;
                    };

                    let event_type = header_value(&record, "event_type");
                    if event_type != Some("content.post.created") {
                        debug!("Ignoring event type: {:?}", event_type);
                        self.commit(&consumer, &record);
                        continue;
                    }

                    match self.handle_post_created(payload).await {
                        Ok(()) => self.commit(&consumer, &record),
                        Err(err) if err.is_retryable() => {
                            metrics::record_run("error");
                            warn!(
                                error = %err,
                                "Pipeline failed, leaving offset uncommitted for redelivery"
                            );
                        }
                        Err(err) => {
                            metrics::record_run("error");
                            warn!(error = %err, "Pipeline failed permanently, skipping record");
                            self.commit(&consumer, &record);
                        }
                    }
                }
                Err(err) => {
                    error!("Kafka error: {}", err);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// Handle one post created event by running the entity pipeline
    async fn handle_post_created(&self, data: &[u8]) -> PipelineResult<()> {
        let event: PostCreatedEvent = serde_json::from_slice(data)?;
        let post_id = Uuid::parse_str(&event.post_id)
            .map_err(|e| PipelineError::Extraction(format!("invalid post id: {e}")))?;

        let Some(post) = self.store.get_post_for_linking(post_id).await? else {
            debug!(post_id = %post_id, "Post no longer exists, skipping");
            return Ok(());
        };

        let report = self.pipeline.process(&post).await?;

        match report.state {
            PipelineState::Gated => metrics::record_run("gated"),
            _ => metrics::record_run("completed"),
        }
        metrics::record_entities("hashtag_association", report.hashtags_linked as u64);
        metrics::record_entities("mention", report.mentions_created as u64);
        metrics::record_notifications(report.notifications_published as u64);
        if report.delivery_requested {
            metrics::record_delivery_signal();
        }

        Ok(())
    }

    fn commit(&self, consumer: &StreamConsumer, record: &BorrowedMessage<'_>) {
        if let Err(commit_err) = consumer.commit_message(record, CommitMode::Async) {
            warn!("Failed to commit Kafka offset: {}", commit_err);
        }
    }
}

fn header_value<'a>(message: &'a BorrowedMessage<'a>, key: &str) -> Option<&'a str> {
    message.headers().and_then(|headers| {
        headers
            .iter()
            .find(|h| h.key == key)
            .and_then(|h| h.value)
            .and_then(|v| std::str::from_utf8(v).ok())
    })
}
