//! Mock publisher for testing
//!
//! A configurable [`Publisher`] that can succeed, reject the credential, fail
//! as unavailable, or stall, without any network access. Integration tests use
//! it to exercise the publishing service's fan-out and persistence logic.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::credentials::Credential;
use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;
use crate::types::{Platform, PlatformStatus, Post};

/// What a mock publish call does
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Succeed with a generated external id and URL
    Succeed,
    /// Fail with `PlatformError::InvalidCredential`
    RejectCredential(String),
    /// Fail with `PlatformError::Unavailable` and this HTTP status
    Unavailable(u16),
}

#[derive(Debug, Clone)]
pub struct MockPublisher {
    platform: Platform,
    behavior: MockBehavior,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    published_posts: Arc<Mutex<Vec<String>>>,
}

impl MockPublisher {
    pub fn new(platform: Platform, behavior: MockBehavior) -> Self {
        Self {
            platform,
            behavior,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            published_posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A publisher that always succeeds
    pub fn success(platform: Platform) -> Self {
        Self::new(platform, MockBehavior::Succeed)
    }

    /// A publisher whose platform rejects the API key
    pub fn invalid_credential(platform: Platform) -> Self {
        Self::new(
            platform,
            MockBehavior::RejectCredential("HTTP 401: invalid api key".to_string()),
        )
    }

    /// A publisher whose platform answers with `status`
    pub fn unavailable(platform: Platform, status: u16) -> Self {
        Self::new(platform, MockBehavior::Unavailable(status))
    }

    /// Wait `delay` before completing each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of times `publish` was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of posts that were published successfully
    pub fn published_posts(&self) -> Vec<String> {
        self.published_posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(&self, post: &Post, _credential: &Credential) -> Result<PlatformStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match &self.behavior {
            MockBehavior::Succeed => {
                if let Ok(mut posts) = self.published_posts.lock() {
                    posts.push(post.id.clone());
                }
                let external_id = format!("{}-{}", self.platform.as_str(), post.id);
                let url = format!("https://{}.example.com/{}", self.platform.as_str(), external_id);
                Ok(PlatformStatus::published_now(external_id, Some(url)))
            }
            MockBehavior::RejectCredential(message) => Err(PlatformError::InvalidCredential {
                platform: self.platform,
                message: message.clone(),
            }
            .into()),
            MockBehavior::Unavailable(status) => Err(PlatformError::Unavailable {
                platform: self.platform,
                status: Some(*status),
                message: "mock platform unavailable".to_string(),
            }
            .into()),
        }
    }
}
