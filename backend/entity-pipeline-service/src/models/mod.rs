use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post as seen by the entity pipeline.
///
/// `no_autolink` is the author's linking preference, joined in from the
/// profile at fetch time and read-only here. The pipeline mutates exactly
/// two columns: `rendered_caption` and `entities`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub caption: String,
    pub rendered_caption: Option<String>,
    pub entities: Option<serde_json::Value>,
    pub no_autolink: bool,
}

/// Canonical hashtag record. `slug` is the case-folded unique key; `name`
/// preserves the display case of the first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hashtag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Mention row linking a post to the mentioned profile. Unique per
/// (post, profile); fresh creation triggers exactly one notification.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mention {
    pub id: Uuid,
    pub post_id: Uuid,
    pub profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Profile, owned by the identity service and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub no_autolink: bool,
}
