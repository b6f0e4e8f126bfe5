use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::info;

use entity_pipeline_service::config::Config;
use entity_pipeline_service::consumers::{PostEventsConsumer, PostEventsConsumerConfig};
use entity_pipeline_service::repository::PgEntityStore;
use entity_pipeline_service::services::pipeline::{EntityPipeline, PipelineOptions};
use entity_pipeline_service::services::{EntityEventProducer, KafkaEventProducerConfig};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting entity-pipeline-service");

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    info!(
        "Configuration loaded: env={}, topic={}",
        config.app.env, config.kafka.post_events_topic
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pg_pool)
        .await
        .context("Failed to verify database connection")?;
    info!("Database pool created and verified");

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let producer = EntityEventProducer::new(&KafkaEventProducerConfig {
        brokers: config.kafka.brokers.clone(),
        mention_topic: config.kafka.mention_topic.clone(),
        delivery_topic: config.kafka.delivery_topic.clone(),
    })
    .context("Failed to initialize Kafka producer")?;

    let store = PgEntityStore::new(pg_pool.clone());
    let pipeline = Arc::new(EntityPipeline::new(
        Arc::new(store.clone()),
        Arc::new(producer),
        PipelineOptions {
            autolink: config.pipeline.autolink_options(),
            federation_enabled: config.pipeline.federation_enabled,
            max_caption_length: config.pipeline.max_caption_length,
        },
    ));

    let consumer = PostEventsConsumer::new(
        store,
        pipeline,
        PostEventsConsumerConfig {
            brokers: config.kafka.brokers.clone(),
            group_id: config.kafka.group_id.clone(),
            post_events_topic: config.kafka.post_events_topic.clone(),
        },
    );

    let mut join_set = JoinSet::new();
    join_set.spawn(async move {
        consumer.run().await;
    });
    info!("Post events consumer started");

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
        Some(result) = join_set.join_next() => {
            if let Err(e) = result {
                tracing::error!("Consumer task panicked: {:#}", e);
                return Err(anyhow::anyhow!("Consumer task panicked: {}", e));
            }
        }
    }

    info!("entity-pipeline-service shutting down");
    Ok(())
}
