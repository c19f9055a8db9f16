//! Publishing service
//!
//! Publishes stored posts to one platform or to every platform with an active
//! credential, and clears a platform's recorded state on unpublish.
//!
//! Adapter failures are never retried. A single-platform publish propagates
//! the adapter's error unchanged and leaves the post untouched. A publish to
//! all platforms settles every adapter before merging, folds individual
//! failures into the response, and only fails as a whole for structural
//! problems (missing post, no active credentials, storage errors).

use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use super::events::{Event, EventBus};
use crate::credentials::{Credential, CredentialStore};
use crate::db::Database;
use crate::error::{PlatformError, Result, SyndicateError};
use crate::platforms::PublisherRegistry;
use crate::types::{Platform, PlatformStatus, Post, PostStatus};

#[derive(Clone)]
pub struct PublishingService {
    db: Database,
    credentials: CredentialStore,
    publishers: PublisherRegistry,
    event_bus: EventBus,
    timeout: Duration,
}

/// Result of publishing to a single platform
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub post_id: String,
    pub platform: Platform,
    pub status: PostStatus,
    pub platform_status: BTreeMap<Platform, PlatformStatus>,
}

/// One platform that failed during a publish to all platforms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishFailure {
    /// Display name, e.g. "DEV.to"
    pub platform: String,
    pub error: String,
}

/// Aggregate result of a publish to all active platforms
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAllResponse {
    pub post_id: String,
    pub status: PostStatus,
    /// Display names of the platforms that succeeded, in platform order
    pub successes: Vec<String>,
    /// `None` when every platform succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<PublishFailure>>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnpublishResponse {
    pub post_id: String,
    pub platform: Platform,
    pub platform_status: BTreeMap<Platform, PlatformStatus>,
}

impl PublishingService {
    pub fn new(
        db: Database,
        credentials: CredentialStore,
        publishers: PublisherRegistry,
        event_bus: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            credentials,
            publishers,
            event_bus,
            timeout,
        }
    }

    /// Publish a post to one platform
    ///
    /// On success the platform's status entry is replaced and the post is
    /// marked published in one write. On failure nothing is written.
    ///
    /// # Errors
    ///
    /// - `SyndicateError::NotFound` if the post does not exist
    /// - `SyndicateError::Validation` if the platform has no active credential
    /// - any error the platform's publisher returns, unchanged
    pub async fn publish_one(&self, post_id: &str, platform: Platform) -> Result<PublishResponse> {
        let post = self.load_post(post_id).await?;
        let credential = self.active_credential(platform).await?;

        self.event_bus.emit(Event::PublishStarted {
            post_id: post.id.clone(),
            platforms: vec![platform],
        });

        let (_, outcome) = self.publish_to(&post, &credential).await;
        let fragment = match outcome {
            Ok(fragment) => fragment,
            Err(e) => {
                self.emit_completed(&post.id, vec![], vec![platform]);
                return Err(e);
            }
        };

        self.db
            .update_platform_statuses(&post.id, &[(platform, fragment)], Some(PostStatus::Published))
            .await?;
        self.emit_completed(&post.id, vec![platform], vec![]);

        let updated = self.load_post(&post.id).await?;
        Ok(PublishResponse {
            post_id: updated.id,
            platform,
            status: updated.status,
            platform_status: updated.platform_status,
        })
    }

    /// Publish a post to every platform with an active credential
    ///
    /// Adapters run concurrently and all of them settle before anything is
    /// written. Only the succeeded platforms' entries are written, and the
    /// post is marked published if at least one platform succeeded.
    ///
    /// # Errors
    ///
    /// - `SyndicateError::NotFound` if the post does not exist
    /// - `SyndicateError::Validation` if no credential is active
    /// - storage errors while loading or saving the post
    ///
    /// Individual platform failures are reported in
    /// [`PublishAllResponse::errors`], never returned as `Err`.
    pub async fn publish_all(&self, post_id: &str) -> Result<PublishAllResponse> {
        let post = self.load_post(post_id).await?;

        let credentials = self.credentials.list_active().await?;
        if credentials.is_empty() {
            return Err(SyndicateError::Validation(
                "No active platforms configured".to_string(),
            ));
        }

        let platforms: Vec<Platform> = credentials.iter().map(|c| c.platform).collect();
        info!("Publishing post {} to {} platform(s)", post.id, platforms.len());
        self.event_bus.emit(Event::PublishStarted {
            post_id: post.id.clone(),
            platforms,
        });

        let outcomes = join_all(
            credentials
                .iter()
                .map(|credential| self.publish_to(&post, credential)),
        )
        .await;

        let mut succeeded: Vec<(Platform, PlatformStatus)> = Vec::new();
        let mut failed: Vec<(Platform, SyndicateError)> = Vec::new();
        for (platform, outcome) in outcomes {
            match outcome {
                Ok(fragment) => succeeded.push((platform, fragment)),
                Err(e) => failed.push((platform, e)),
            }
        }
        succeeded.sort_by_key(|(platform, _)| *platform);
        failed.sort_by_key(|(platform, _)| *platform);

        if !succeeded.is_empty() {
            self.db
                .update_platform_statuses(&post.id, &succeeded, Some(PostStatus::Published))
                .await?;
        }

        self.emit_completed(
            &post.id,
            succeeded.iter().map(|(p, _)| *p).collect(),
            failed.iter().map(|(p, _)| *p).collect(),
        );

        let status = if succeeded.is_empty() {
            post.status
        } else {
            PostStatus::Published
        };
        let successes: Vec<String> = succeeded
            .iter()
            .map(|(p, _)| p.display_name().to_string())
            .collect();
        let errors: Vec<PublishFailure> = failed
            .into_iter()
            .map(|(p, e)| PublishFailure {
                platform: p.display_name().to_string(),
                error: e.to_string(),
            })
            .collect();

        Ok(PublishAllResponse {
            post_id: post.id,
            status,
            success: !successes.is_empty(),
            successes,
            errors: if errors.is_empty() { None } else { Some(errors) },
        })
    }

    /// Clear the recorded state of `platform_name` on a post
    ///
    /// The platform itself is never contacted, so content already published
    /// there stays live. Other platforms' entries and the post status are
    /// left as they are. Unpublishing twice is the same as once.
    ///
    /// # Errors
    ///
    /// - `SyndicateError::NotFound` if the post does not exist
    /// - `SyndicateError::Validation` if `platform_name` is not a known platform
    pub async fn unpublish(&self, post_id: &str, platform_name: &str) -> Result<UnpublishResponse> {
        let post = self.load_post(post_id).await?;
        let platform: Platform = platform_name.parse()?;

        self.db
            .update_platform_statuses(&post.id, &[(platform, PlatformStatus::default())], None)
            .await?;
        info!("Cleared {} status on post {}", platform, post.id);

        let updated = self.load_post(&post.id).await?;
        Ok(UnpublishResponse {
            post_id: updated.id,
            platform,
            platform_status: updated.platform_status,
        })
    }

    async fn load_post(&self, post_id: &str) -> Result<Post> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicateError::NotFound(format!("Post not found: {}", post_id)))
    }

    async fn active_credential(&self, platform: Platform) -> Result<Credential> {
        match self.credentials.get_by_platform(platform).await? {
            Some(credential) if credential.is_active => Ok(credential),
            _ => Err(SyndicateError::Validation(format!(
                "{0} API credentials not found. Please configure your {0} API key in settings.",
                platform.display_name()
            ))),
        }
    }

    /// Run one adapter under the time limit and report its outcome
    async fn publish_to(
        &self,
        post: &Post,
        credential: &Credential,
    ) -> (Platform, Result<PlatformStatus>) {
        let platform = credential.platform;
        let publisher = self.publishers.get(platform);

        let outcome = match timeout(self.timeout, publisher.publish(post, credential)).await {
            Ok(result) => result,
            Err(_) => Err(PlatformError::Unavailable {
                platform,
                status: None,
                message: format!("timed out after {}s", self.timeout.as_secs_f64()),
            }
            .into()),
        };

        match &outcome {
            Ok(fragment) => {
                info!("Published post {} to {}", post.id, platform);
                self.event_bus.emit(Event::PlatformSucceeded {
                    post_id: post.id.clone(),
                    platform,
                    external_id: fragment.external_id.clone(),
                    url: fragment.url.clone(),
                });
            }
            Err(e) => {
                warn!("Failed to publish post {} to {}: {}", post.id, platform, e);
                self.event_bus.emit(Event::PlatformFailed {
                    post_id: post.id.clone(),
                    platform,
                    error: e.to_string(),
                });
            }
        }

        (platform, outcome)
    }

    fn emit_completed(&self, post_id: &str, succeeded: Vec<Platform>, failed: Vec<Platform>) {
        self.event_bus.emit(Event::PublishCompleted {
            post_id: post_id.to_string(),
            succeeded,
            failed,
        });
    }
}
