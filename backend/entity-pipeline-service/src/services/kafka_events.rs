//! Kafka event producer for the entity pipeline
//!
//! Publishes mention notifications for the downstream notification consumer
//! and the federation delivery signal for the delivery workers.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted after persistence.
///
/// The pipeline calls `publish_mention_created` at most once per freshly
/// created mention row; publish failures are tolerated by the caller.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_mention_created(
        &self,
        post_id: Uuid,
        mentioned_profile_id: Uuid,
    ) -> Result<()>;

    async fn publish_delivery_requested(&self, post_id: Uuid) -> Result<()>;
}

/// Notification event format expected by the notification consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionNotification {
    pub id: String,
    pub post_id: Uuid,
    pub mentioned_profile_id: Uuid,
    pub event_type: String,
    pub timestamp: i64,
}

/// Delivery signal consumed by the federation delivery workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequested {
    pub post_id: Uuid,
    pub timestamp: i64,
}

/// Configuration for the Kafka event producer
#[derive(Debug, Clone)]
pub struct KafkaEventProducerConfig {
    pub brokers: String,
    /// Topic for mention notification events
    pub mention_topic: String,
    /// Topic for federation delivery signals
    pub delivery_topic: String,
}

/// Kafka event producer for entity pipeline outputs
#[derive(Clone)]
pub struct EntityEventProducer {
    producer: FutureProducer,
    mention_topic: String,
    delivery_topic: String,
}

impl EntityEventProducer {
    /// Create a new Kafka event producer
    pub fn new(config: &KafkaEventProducerConfig) -> Result<Self> {
        let producer = rdkafka::config::ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", "entity-pipeline-service")
            // Idempotency and reliability settings
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retries", "3")
            .set("linger.ms", "5")
            .create::<FutureProducer>()?;

        info!(
            brokers = %config.brokers,
            mention_topic = %config.mention_topic,
            delivery_topic = %config.delivery_topic,
            "Entity pipeline Kafka producer initialized"
        );

        Ok(Self {
            producer,
            mention_topic: config.mention_topic.clone(),
            delivery_topic: config.delivery_topic.clone(),
        })
    }
}

#[async_trait]
impl EventPublisher for EntityEventProducer {
    async fn publish_mention_created(
        &self,
        post_id: Uuid,
        mentioned_profile_id: Uuid,
    ) -> Result<()> {
        let event = MentionNotification {
            id: Uuid::new_v4().to_string(),
            post_id,
            mentioned_profile_id,
            event_type: "Mention".to_string(),
            timestamp: Utc::now().timestamp(),
        };

        let payload = serde_json::to_string(&event)?;
        let partition_key = mentioned_profile_id.to_string();

        let record = FutureRecord::to(&self.mention_topic)
            .key(&partition_key)
            .payload(&payload);

        match self.producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => {
                info!(
                    post_id = %post_id,
                    mentioned_profile_id = %mentioned_profile_id,
                    topic = %self.mention_topic,
                    "Published mention notification to Kafka"
                );
                Ok(())
            }
            Err((err, _)) => {
                warn!(
                    error = ?err,
                    post_id = %post_id,
                    mentioned_profile_id = %mentioned_profile_id,
                    "Failed to publish mention notification to Kafka"
                );
                Err(anyhow::anyhow!("Failed to publish notification: {}", err))
            }
        }
    }

    async fn publish_delivery_requested(&self, post_id: Uuid) -> Result<()> {
        let event = DeliveryRequested {
            post_id,
            timestamp: Utc::now().timestamp(),
        };

        let payload = serde_json::to_string(&event)?;
        let partition_key = post_id.to_string();

        let record = FutureRecord::to(&self.delivery_topic)
            .key(&partition_key)
            .payload(&payload);

        match self.producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => {
                info!(
                    post_id = %post_id,
                    topic = %self.delivery_topic,
                    "Published delivery signal to Kafka"
                );
                Ok(())
            }
            Err((err, _)) => {
                warn!(
                    error = ?err,
                    post_id = %post_id,
                    "Failed to publish delivery signal to Kafka"
                );
                Err(anyhow::anyhow!("Failed to publish delivery signal: {}", err))
            }
        }
    }
}
