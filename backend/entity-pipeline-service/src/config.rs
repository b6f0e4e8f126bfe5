/// Configuration management for the entity pipeline worker.
///
/// All settings load from environment variables with development defaults;
/// the pipeline itself never reads ambient state — feature flags reach it
/// as explicit constructor parameters.
use serde::{Deserialize, Serialize};
use text_entities::AutolinkOptions;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Kafka configuration
    pub kafka: KafkaConfig,
    /// Pipeline behavior settings
    pub pipeline: PipelineSettings,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Kafka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Kafka brokers
    pub brokers: String,
    /// Consumer group id for the post events consumer
    pub group_id: String,
    /// Topic carrying post-created events (pipeline input)
    pub post_events_topic: String,
    /// Topic for mention notification events
    pub mention_topic: String,
    /// Topic for federation delivery signals
    pub delivery_topic: String,
}

/// Pipeline behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// System-wide federation flag; when false no delivery signal is emitted
    pub federation_enabled: bool,
    /// Path prefix for hashtag browse pages
    pub tag_path_base: String,
    /// Path prefix for profile pages
    pub mention_path_base: String,
    /// Display-text length limit for rendered URLs
    pub url_display_limit: usize,
    /// Upper bound on caption size accepted by the lexer, in bytes
    pub max_caption_length: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let topic_prefix =
            std::env::var("KAFKA_TOPIC_PREFIX").unwrap_or_else(|_| "glimpse".to_string());

        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/glimpse".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            kafka: KafkaConfig {
                brokers: std::env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                group_id: std::env::var("KAFKA_ENTITY_GROUP_ID")
                    .unwrap_or_else(|_| format!("{}-entity-pipeline", topic_prefix)),
                post_events_topic: std::env::var("KAFKA_POST_EVENTS_TOPIC")
                    .unwrap_or_else(|_| format!("{}.content.events", topic_prefix)),
                mention_topic: std::env::var("KAFKA_MENTION_TOPIC")
                    .unwrap_or_else(|_| "MentionCreated".to_string()),
                delivery_topic: std::env::var("KAFKA_DELIVERY_TOPIC")
                    .unwrap_or_else(|_| "PostDeliveryRequested".to_string()),
            },
            pipeline: PipelineSettings {
                federation_enabled: std::env::var("FEDERATION_ENABLED")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                tag_path_base: std::env::var("AUTOLINK_TAG_PATH_BASE")
                    .unwrap_or_else(|_| "/tags/".to_string()),
                mention_path_base: std::env::var("AUTOLINK_MENTION_PATH_BASE")
                    .unwrap_or_else(|_| "/@".to_string()),
                url_display_limit: std::env::var("AUTOLINK_URL_DISPLAY_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                max_caption_length: std::env::var("PIPELINE_MAX_CAPTION_LENGTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(65_536),
            },
        })
    }
}

impl PipelineSettings {
    /// Rendering options derived from these settings.
    pub fn autolink_options(&self) -> AutolinkOptions {
        AutolinkOptions {
            tag_path_base: self.tag_path_base.clone(),
            mention_path_base: self.mention_path_base.clone(),
            url_display_limit: self.url_display_limit,
        }
    }
}
