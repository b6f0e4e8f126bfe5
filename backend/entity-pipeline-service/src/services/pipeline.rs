//! Entity pipeline: gate, extract, render, persist, notify, deliver.
//!
//! One invocation per post, no shared in-process state. Safe to re-run:
//! persistence is idempotent and notifications fire only on freshly created
//! mention rows, so a duplicate retry converges on the same rows and emits
//! nothing twice.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use text_entities::{autolink, extract, nl2br, slugify, ExtractedEntities};

use crate::error::{PipelineError, PipelineResult};
use crate::models::Post;
use crate::repository::EntityStore;
use crate::services::kafka_events::EventPublisher;

pub use text_entities::AutolinkOptions;

/// States of one pipeline invocation, in order. `Gated` is terminal on its
/// own; every other run walks forward to `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Gated,
    Extracted,
    Rendered,
    Persisted,
    Delivered,
}

/// Outcome of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub state: PipelineState,
    /// Unique hashtag associations ensured for the post.
    pub hashtags_linked: usize,
    /// Mention rows freshly created by this run.
    pub mentions_created: usize,
    /// Mention handles that resolved to no profile.
    pub mentions_skipped: usize,
    /// Notification events actually published.
    pub notifications_published: usize,
    /// Whether the federation delivery signal went out.
    pub delivery_requested: bool,
}

impl PipelineReport {
    fn new(state: PipelineState) -> Self {
        Self {
            state,
            hashtags_linked: 0,
            mentions_created: 0,
            mentions_skipped: 0,
            notifications_published: 0,
            delivery_requested: false,
        }
    }
}

/// Pipeline tuning, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub autolink: AutolinkOptions,
    /// System-wide federation flag.
    pub federation_enabled: bool,
    /// Upper bound on accepted caption size, in bytes.
    pub max_caption_length: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            autolink: AutolinkOptions::default(),
            federation_enabled: false,
            max_caption_length: 65_536,
        }
    }
}

/// Orchestrates the entity pipeline over the store and publisher seams.
pub struct EntityPipeline {
    store: Arc<dyn EntityStore>,
    publisher: Arc<dyn EventPublisher>,
    options: PipelineOptions,
}

impl EntityPipeline {
    pub fn new(
        store: Arc<dyn EntityStore>,
        publisher: Arc<dyn EventPublisher>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            publisher,
            options,
        }
    }

    /// Run the full pipeline for one post.
    ///
    /// Only storage unavailability aborts the run; unresolvable mentions and
    /// event publish failures are tolerated per unit. Errors are retryable
    /// by re-running the whole pipeline from the start.
    pub async fn process(&self, post: &Post) -> PipelineResult<PipelineReport> {
        if post.no_autolink {
            debug!(post_id = %post.id, "autolink disabled for author, skipping");
            return Ok(PipelineReport::new(PipelineState::Gated));
        }

        if post.caption.len() > self.options.max_caption_length {
            return Err(PipelineError::Extraction(format!(
                "caption of {} bytes exceeds bound of {}",
                post.caption.len(),
                self.options.max_caption_length
            )));
        }

        let entities = extract(&post.caption);
        let mut report = PipelineReport::new(PipelineState::Extracted);

        let rendered = nl2br(&autolink(&post.caption, &self.options.autolink));
        report.state = PipelineState::Rendered;

        let serialized = serde_json::to_value(&entities)?;
        self.store
            .update_rendered_caption(post.id, &rendered, &serialized)
            .await?;

        report.hashtags_linked = self.store_hashtags(post, &entities).await?;

        let (created_profiles, skipped) = self.store_mentions(post, &entities).await?;
        report.mentions_created = created_profiles.len();
        report.mentions_skipped = skipped;
        report.state = PipelineState::Persisted;

        for profile_id in created_profiles {
            match self
                .publisher
                .publish_mention_created(post.id, profile_id)
                .await
            {
                Ok(()) => report.notifications_published += 1,
                Err(err) => warn!(
                    post_id = %post.id,
                    profile_id = %profile_id,
                    error = %err,
                    "Failed to publish mention notification"
                ),
            }
        }

        if self.options.federation_enabled {
            match self.publisher.publish_delivery_requested(post.id).await {
                Ok(()) => report.delivery_requested = true,
                Err(err) => warn!(
                    post_id = %post.id,
                    error = %err,
                    "Failed to publish delivery signal"
                ),
            }
        }
        report.state = PipelineState::Delivered;

        info!(
            post_id = %post.id,
            hashtags = report.hashtags_linked,
            mentions = report.mentions_created,
            skipped = report.mentions_skipped,
            "Entity pipeline completed"
        );

        Ok(report)
    }

    /// Idempotently ensure one hashtag row and one association per unique
    /// (case-folded) tag. Each pair is individually atomic; a failure here
    /// does not undo the caption update.
    async fn store_hashtags(
        &self,
        post: &Post,
        entities: &ExtractedEntities,
    ) -> PipelineResult<usize> {
        let unique = dedup_hashtags(&entities.hashtags);
        for (name, slug) in &unique {
            let hashtag = self.store.find_or_create_hashtag(name, slug).await?;
            self.store
                .find_or_create_post_hashtag(post.id, hashtag.id, post.author_id)
                .await?;
        }
        Ok(unique.len())
    }

    /// Resolve and persist unique mentions. Returns the profile ids of
    /// freshly created mention rows plus the count of handles that did not
    /// resolve (skipped, never an error).
    async fn store_mentions(
        &self,
        post: &Post,
        entities: &ExtractedEntities,
    ) -> PipelineResult<(Vec<Uuid>, usize)> {
        let mut created = Vec::new();
        let mut skipped = 0;

        for handle in dedup_mentions(&entities.mentions) {
            let Some(profile) = self.store.find_profile_by_username(&handle).await? else {
                debug!(post_id = %post.id, handle = %handle, "Mentioned profile not found, skipping");
                skipped += 1;
                continue;
            };

            if self
                .store
                .create_mention_if_absent(post.id, profile.id)
                .await?
                .is_some()
            {
                created.push(profile.id);
            }
        }

        Ok((created, skipped))
    }
}

/// Deduplicate raw hashtags by case-folded slug, preserving first
/// occurrence order and display case.
fn dedup_hashtags(raw: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for name in raw {
        let slug = slugify(name);
        if seen.insert(slug.clone()) {
            unique.push((name.clone(), slug));
        }
    }
    unique
}

/// Deduplicate raw mention handles case-insensitively, lowercased for
/// resolution.
fn dedup_mentions(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for handle in raw {
        let lowered = handle.to_lowercase();
        if seen.insert(lowered.clone()) {
            unique.push(lowered);
        }
    }
    unique
}
