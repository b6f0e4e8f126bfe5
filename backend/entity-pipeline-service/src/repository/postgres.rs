//! Postgres-backed entity store.
//!
//! Find-or-create uses `INSERT .. ON CONFLICT DO NOTHING` plus a fallback
//! lookup, so a concurrent duplicate invocation loses the insert race and
//! reads the winner's row instead of surfacing the conflict.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{Hashtag, Mention, Post, Profile};
use crate::repository::EntityStore;

/// Repository for entity pipeline persistence
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a post together with its author's linking preference.
    /// Returns `None` when the post no longer exists.
    pub async fn get_post_for_linking(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.caption, p.rendered_caption, p.entities, pr.no_autolink
            FROM posts p
            JOIN profiles pr ON pr.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }
}

#[async_trait::async_trait]
impl EntityStore for PgEntityStore {
    async fn update_rendered_caption(
        &self,
        post_id: Uuid,
        rendered: &str,
        entities: &Value,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET rendered_caption = $2, entities = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(rendered)
        .bind(entities)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_or_create_hashtag(&self, name: &str, slug: &str) -> StoreResult<Hashtag> {
        let inserted = sqlx::query_as::<_, Hashtag>(
            r#"
            INSERT INTO hashtags (name, slug)
            VALUES ($1, $2)
            ON CONFLICT (slug) DO NOTHING
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(hashtag) = inserted {
            return Ok(hashtag);
        }

        // Lost the insert race or the tag already existed; read the winner.
        let existing = sqlx::query_as::<_, Hashtag>(
            "SELECT id, name, slug, created_at FROM hashtags WHERE slug = $1",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(existing)
    }

    async fn find_or_create_post_hashtag(
        &self,
        post_id: Uuid,
        hashtag_id: Uuid,
        author_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_hashtags (post_id, hashtag_id, author_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, hashtag_id, author_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(hashtag_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_profile_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, no_autolink
            FROM profiles
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn create_mention_if_absent(
        &self,
        post_id: Uuid,
        profile_id: Uuid,
    ) -> StoreResult<Option<Mention>> {
        let mention = sqlx::query_as::<_, Mention>(
            r#"
            INSERT INTO mentions (post_id, profile_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, profile_id) DO NOTHING
            RETURNING id, post_id, profile_id, created_at
            "#,
        )
        .bind(post_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mention)
    }
}
