use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Hashtag, Mention, Profile};

/// Persistence seam for the entity pipeline.
///
/// Every write must be idempotent: two concurrent invocations for the same
/// post converge on the same rows, with row-level uniqueness constraints as
/// the concurrency-control mechanism. A uniqueness conflict is recovered by
/// the implementation (insert, on conflict fetch existing), never surfaced.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Write the rendered caption and serialized entities onto the post in
    /// a single atomic update.
    async fn update_rendered_caption(
        &self,
        post_id: Uuid,
        rendered: &str,
        entities: &Value,
    ) -> StoreResult<()>;

    /// Find or create the hashtag for (name, slug). Keyed on the slug, so
    /// differently-cased occurrences share one record.
    async fn find_or_create_hashtag(&self, name: &str, slug: &str) -> StoreResult<Hashtag>;

    /// Ensure the (post, hashtag, author) association exists.
    /// Returns whether a new row was created.
    async fn find_or_create_post_hashtag(
        &self,
        post_id: Uuid,
        hashtag_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<bool>;

    /// Resolve a mention handle to a profile; unknown handles yield `None`.
    async fn find_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>>;

    /// Create the mention row if absent. Returns the row only on fresh
    /// creation — the one and only trigger for a mention notification.
    async fn create_mention_if_absent(
        &self,
        post_id: Uuid,
        profile_id: Uuid,
    ) -> StoreResult<Option<Mention>>;
}
