//! Post management
//!
//! Create, read and delete stored posts. Publication state is owned by the
//! publishing service; this service never changes it.

use crate::db::Database;
use crate::error::{Result, SyndicateError};
use crate::types::{NewPost, Post};

#[derive(Clone)]
pub struct PostService {
    db: Database,
}

impl PostService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate `input` and store it as a draft
    pub async fn create(&self, input: NewPost) -> Result<Post> {
        input.validate()?;
        let post = input.into_post();
        self.db.create_post(&post).await?;
        tracing::info!("Created draft {}", post.id);
        Ok(post)
    }

    pub async fn get(&self, post_id: &str) -> Result<Post> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicateError::NotFound(format!("Post not found: {}", post_id)))
    }

    /// Delete a post locally
    ///
    /// Copies already published to platforms are not touched.
    pub async fn delete(&self, post_id: &str) -> Result<()> {
        if !self.db.delete_post(post_id).await? {
            return Err(SyndicateError::NotFound(format!("Post not found: {}", post_id)));
        }
        tracing::info!("Deleted post {}", post_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, PostStatus};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, PostService) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("posts.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (temp_dir, PostService::new(db))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_temp_dir, posts) = setup().await;

        let mut input = NewPost::new("Hi", "World");
        input.tags = vec!["rust".to_string(), "async".to_string()];
        let created = posts.create(input).await.unwrap();

        let fetched = posts.get(&created.id).await.unwrap();
        assert_eq!(fetched.title, "Hi");
        assert_eq!(fetched.tags, vec!["rust", "async"]);
        assert_eq!(fetched.status, PostStatus::Draft);
        for platform in Platform::ALL {
            assert!(!fetched.status_on(platform).published);
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let (_temp_dir, posts) = setup().await;
        let result = posts.create(NewPost::new("  ", "World")).await;
        assert!(matches!(result, Err(SyndicateError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, posts) = setup().await;
        let created = posts.create(NewPost::new("Hi", "World")).await.unwrap();

        posts.delete(&created.id).await.unwrap();
        assert!(matches!(posts.get(&created.id).await, Err(SyndicateError::NotFound(_))));
        assert!(matches!(posts.delete(&created.id).await, Err(SyndicateError::NotFound(_))));
    }
}
