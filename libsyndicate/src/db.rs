//! Database operations for Syndicate
//!
//! Posts, their per-platform status rows and platform credentials live in a
//! single SQLite file. Every publish-state write goes through
//! [`Database::update_platform_statuses`], which touches only the rows of the
//! platforms it is given.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::collections::BTreeMap;
use std::path::Path;

use crate::credentials::Credential;
use crate::error::{DbError, Result, SyndicateError};
use crate::types::{Platform, PlatformStatus, Post, PostStatus};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        tracing::debug!("Opened database at {}", expanded_path);
        Ok(Self { pool })
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    /// Insert a post together with one status row per platform
    pub async fn create_post(&self, post: &Post) -> Result<()> {
        let tags = serde_json::to_string(&post.tags)
            .map_err(|e| DbError::Corrupt(format!("tags not serializable: {}", e)))?;

        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, tags, cover_image, canonical_url, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(tags)
        .bind(&post.cover_image)
        .bind(&post.canonical_url)
        .bind(post.status.as_str())
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        for platform in Platform::ALL {
            let status = post.status_on(platform);
            upsert_status_row(&mut tx, &post.id, platform, &status).await?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    /// Get a post by ID, with every platform present in its status map
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, tags, cover_image, canonical_url, status, created_at, updated_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_rows = sqlx::query(
            r#"
            SELECT platform, published, external_id, url, published_at
            FROM platform_status WHERE post_id = ?
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let mut platform_status = BTreeMap::new();
        for status_row in &status_rows {
            let name: String = status_row.get("platform");
            match name.parse::<Platform>() {
                Ok(platform) => {
                    platform_status.insert(platform, status_from_row(status_row));
                }
                Err(_) => tracing::warn!("Ignoring status row for unknown platform '{}'", name),
            }
        }

        let mut post = post_from_row(&row, platform_status)?;
        post.ensure_all_platforms();
        Ok(Some(post))
    }

    /// Delete a post and its status rows. Returns false if no such post existed.
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM platform_status WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(result.rows_affected() > 0)
    }

    /// Write the given platforms' status rows, and optionally the coarse
    /// status, in one transaction
    ///
    /// Rows of platforms not listed are left alone, so concurrent writers for
    /// different platforms do not overwrite each other.
    ///
    /// # Errors
    ///
    /// Returns `SyndicateError::NotFound` (and writes nothing) if the post no
    /// longer exists.
    pub async fn update_platform_statuses(
        &self,
        post_id: &str,
        updates: &[(Platform, PlatformStatus)],
        post_status: Option<PostStatus>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;
        let now = chrono::Utc::now().timestamp();

        let touched = match post_status {
            Some(status) => sqlx::query("UPDATE posts SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now)
                .bind(post_id)
                .execute(&mut *tx)
                .await,
            None => sqlx::query("UPDATE posts SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(post_id)
                .execute(&mut *tx)
                .await,
        }
        .map_err(DbError::SqlxError)?;

        if touched.rows_affected() == 0 {
            tx.rollback().await.map_err(DbError::SqlxError)?;
            return Err(SyndicateError::NotFound(format!("Post not found: {}", post_id)));
        }

        for (platform, status) in updates {
            upsert_status_row(&mut tx, post_id, *platform, status).await?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Get the credential row for a platform
    pub async fn get_credential(&self, platform: Platform) -> Result<Option<Credential>> {
        let row = sqlx::query(
            r#"
            SELECT platform, api_key_secret, site_url, is_active, platform_config, created_at, updated_at
            FROM credentials WHERE platform = ?
            "#,
        )
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(credential_from_row).transpose()
    }

    /// List credentials, optionally only the active ones
    pub async fn list_credentials(&self, active_only: bool) -> Result<Vec<Credential>> {
        let query = if active_only {
            r#"
            SELECT platform, api_key_secret, site_url, is_active, platform_config, created_at, updated_at
            FROM credentials WHERE is_active = 1 ORDER BY platform
            "#
        } else {
            r#"
            SELECT platform, api_key_secret, site_url, is_active, platform_config, created_at, updated_at
            FROM credentials ORDER BY platform
            "#
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        rows.iter().map(credential_from_row).collect()
    }

    /// Insert or replace the credential for its platform, keeping `created_at`
    pub async fn upsert_credential(&self, credential: &Credential) -> Result<()> {
        let platform_config = credential
            .platform_config
            .as_ref()
            .map(|value| value.to_string());

        sqlx::query(
            r#"
            INSERT INTO credentials (platform, api_key_secret, site_url, is_active, platform_config, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(platform) DO UPDATE SET
                api_key_secret = excluded.api_key_secret,
                site_url = excluded.site_url,
                is_active = excluded.is_active,
                platform_config = excluded.platform_config,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(credential.platform.as_str())
        .bind(&credential.api_key_secret)
        .bind(&credential.site_url)
        .bind(credential.is_active)
        .bind(platform_config)
        .bind(credential.created_at)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Delete a platform's credential. Returns false if none was stored.
    pub async fn delete_credential(&self, platform: Platform) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE platform = ?")
            .bind(platform.as_str())
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Toggle whether a credential takes part in publish-to-all
    pub async fn set_credential_active(&self, platform: Platform, active: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE credentials SET is_active = ?, updated_at = ? WHERE platform = ?")
                .bind(active)
                .bind(chrono::Utc::now().timestamp())
                .bind(platform.as_str())
                .execute(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }
}

async fn upsert_status_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post_id: &str,
    platform: Platform,
    status: &PlatformStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO platform_status (post_id, platform, published, external_id, url, published_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(post_id, platform) DO UPDATE SET
            published = excluded.published,
            external_id = excluded.external_id,
            url = excluded.url,
            published_at = excluded.published_at
        "#,
    )
    .bind(post_id)
    .bind(platform.as_str())
    .bind(status.published)
    .bind(&status.external_id)
    .bind(&status.url)
    .bind(status.published_at)
    .execute(&mut **tx)
    .await
    .map_err(DbError::SqlxError)?;

    Ok(())
}

fn post_from_row(row: &SqliteRow, platform_status: BTreeMap<Platform, PlatformStatus>) -> Result<Post> {
    let id: String = row.get("id");
    let tags: String = row.get("tags");
    let tags: Vec<String> = serde_json::from_str(&tags)
        .map_err(|e| DbError::Corrupt(format!("post {} has invalid tags: {}", id, e)))?;
    let status: String = row.get("status");
    let status = status
        .parse::<PostStatus>()
        .map_err(|_| DbError::Corrupt(format!("post {} has unknown status '{}'", id, status)))?;

    Ok(Post {
        id,
        title: row.get("title"),
        content: row.get("content"),
        tags,
        cover_image: row.get("cover_image"),
        canonical_url: row.get("canonical_url"),
        status,
        platform_status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn status_from_row(row: &SqliteRow) -> PlatformStatus {
    PlatformStatus {
        published: row.get("published"),
        external_id: row.get("external_id"),
        url: row.get("url"),
        published_at: row.get("published_at"),
    }
}

fn credential_from_row(row: &SqliteRow) -> Result<Credential> {
    let name: String = row.get("platform");
    let platform = name
        .parse::<Platform>()
        .map_err(|_| DbError::Corrupt(format!("credential for unknown platform '{}'", name)))?;

    let platform_config: Option<String> = row.get("platform_config");
    let platform_config = platform_config
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| DbError::Corrupt(format!("{} credential config: {}", platform, e)))?;

    Ok(Credential {
        platform,
        api_key_secret: row.get("api_key_secret"),
        site_url: row.get("site_url"),
        is_active: row.get("is_active"),
        platform_config,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
