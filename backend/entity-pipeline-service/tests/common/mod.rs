//! In-memory fakes for pipeline behavior tests
//!
//! `InMemoryStore` mirrors the idempotency semantics of the Postgres store
//! so idempotence and at-most-once notification behavior can be tested in
//! isolation.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use entity_pipeline_service::error::{StoreError, StoreResult};
use entity_pipeline_service::models::{Hashtag, Mention, Post, Profile};
use entity_pipeline_service::repository::EntityStore;
use entity_pipeline_service::services::kafka_events::EventPublisher;

/// In-memory entity store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// post_id -> (rendered caption, serialized entities)
    pub rendered: Arc<Mutex<HashMap<Uuid, (String, Value)>>>,
    pub hashtags: Arc<Mutex<Vec<Hashtag>>>,
    /// (post_id, hashtag_id, author_id)
    pub post_hashtags: Arc<Mutex<HashSet<(Uuid, Uuid, Uuid)>>>,
    /// lowercased username -> profile
    pub profiles: Arc<Mutex<HashMap<String, Profile>>>,
    /// (post_id, profile_id)
    pub mentions: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
    /// Simulate a full storage outage
    pub fail_all: Arc<AtomicBool>,
    /// Simulate an outage hitting only the hashtag sub-unit
    pub fail_hashtags: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, username: &str, id: Uuid) -> Self {
        self.profiles.lock().unwrap().insert(
            username.to_lowercase(),
            Profile {
                id,
                username: username.to_string(),
                no_autolink: false,
            },
        );
        self
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_hashtags(&self, fail: bool) {
        self.fail_hashtags.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn update_rendered_caption(
        &self,
        post_id: Uuid,
        rendered: &str,
        entities: &Value,
    ) -> StoreResult<()> {
        self.check_available()?;
        self.rendered
            .lock()
            .unwrap()
            .insert(post_id, (rendered.to_string(), entities.clone()));
        Ok(())
    }

    async fn find_or_create_hashtag(&self, name: &str, slug: &str) -> StoreResult<Hashtag> {
        self.check_available()?;
        if self.fail_hashtags.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "simulated hashtag outage".to_string(),
            ));
        }
        let mut hashtags = self.hashtags.lock().unwrap();
        if let Some(existing) = hashtags.iter().find(|h| h.slug == slug) {
            return Ok(existing.clone());
        }
        let hashtag = Hashtag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: chrono::Utc::now(),
        };
        hashtags.push(hashtag.clone());
        Ok(hashtag)
    }

    async fn find_or_create_post_hashtag(
        &self,
        post_id: Uuid,
        hashtag_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<bool> {
        self.check_available()?;
        let created = self
            .post_hashtags
            .lock()
            .unwrap()
            .insert((post_id, hashtag_id, author_id));
        Ok(created)
    }

    async fn find_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        self.check_available()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(&username.to_lowercase())
            .cloned())
    }

    async fn create_mention_if_absent(
        &self,
        post_id: Uuid,
        profile_id: Uuid,
    ) -> StoreResult<Option<Mention>> {
        self.check_available()?;
        let created = self.mentions.lock().unwrap().insert((post_id, profile_id));
        Ok(created.then(|| Mention {
            id: Uuid::new_v4(),
            post_id,
            profile_id,
            created_at: chrono::Utc::now(),
        }))
    }
}

/// Records published events instead of talking to Kafka
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    /// (post_id, mentioned_profile_id)
    pub mention_events: Arc<Mutex<Vec<(Uuid, Uuid)>>>,
    pub delivery_events: Arc<Mutex<Vec<Uuid>>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_mention_created(
        &self,
        post_id: Uuid,
        mentioned_profile_id: Uuid,
    ) -> Result<()> {
        self.mention_events
            .lock()
            .unwrap()
            .push((post_id, mentioned_profile_id));
        Ok(())
    }

    async fn publish_delivery_requested(&self, post_id: Uuid) -> Result<()> {
        self.delivery_events.lock().unwrap().push(post_id);
        Ok(())
    }
}

/// A post with the given caption, autolink enabled.
pub fn post(caption: &str) -> Post {
    Post {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        caption: caption.to_string(),
        rendered_caption: None,
        entities: None,
        no_autolink: false,
    }
}
