//! Platform publishers
//!
//! Each supported blogging platform has a [`Publisher`] that turns a post and
//! a stored credential into exactly the request that platform's API expects,
//! and maps the reply onto a [`PlatformStatus`] fragment. Publishers never
//! touch the database and never retry; the publishing service owns both.
//!
//! The platform set is closed, so dispatch goes through [`PublisherRegistry`],
//! which holds one publisher per [`Platform`] variant.
//!
//! # Examples
//!
//! ```no_run
//! use libsyndicate::config::PlatformsConfig;
//! use libsyndicate::platforms::PublisherRegistry;
//! use libsyndicate::{Codec, Platform};
//!
//! # fn example() -> libsyndicate::Result<()> {
//! let registry = PublisherRegistry::http(&PlatformsConfig::default(), Codec::from_env()?)?;
//! assert_eq!(registry.get(Platform::DevTo).platform(), Platform::DevTo);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use std::time::Duration;

use crate::config::PlatformsConfig;
use crate::credentials::Credential;
use crate::crypto::Codec;
use crate::error::{PlatformError, Result, SyndicateError};
use crate::types::{Platform, PlatformStatus, Post};

pub mod devto;
pub mod medium;
pub mod wordpress;

// Available outside tests so integration tests can drive the publishing service
pub mod mock;

use devto::DevToPublisher;
use medium::MediumPublisher;
use wordpress::WordPressPublisher;

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// Uniform contract every platform adapter implements
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The platform this publisher talks to
    fn platform(&self) -> Platform;

    /// Publish `post` using `credential` and describe the result
    ///
    /// # Errors
    ///
    /// - `PlatformError::InvalidCredential` if the platform rejects the key
    /// - `PlatformError::Unavailable` for transport failures, non-success
    ///   responses and unparseable replies
    /// - `SyndicateError::Validation` if the credential lacks a required field
    /// - `CryptoError::Decryption` if the stored key cannot be decrypted
    async fn publish(&self, post: &Post, credential: &Credential) -> Result<PlatformStatus>;
}

/// One publisher per platform
#[derive(Clone)]
pub struct PublisherRegistry {
    medium: Arc<dyn Publisher>,
    devto: Arc<dyn Publisher>,
    wordpress: Arc<dyn Publisher>,
}

impl PublisherRegistry {
    /// Publishers that call the real platform APIs
    pub fn http(config: &PlatformsConfig, codec: Codec) -> Result<Self> {
        let client = http_client()?;
        Ok(Self {
            medium: Arc::new(MediumPublisher::new(
                client.clone(),
                codec.clone(),
                &config.medium_api_base,
            )),
            devto: Arc::new(DevToPublisher::new(
                client.clone(),
                codec.clone(),
                &config.devto_api_base,
            )),
            wordpress: Arc::new(WordPressPublisher::new(client, codec)),
        })
    }

    /// Assemble a registry from explicit publishers
    pub fn from_parts(
        medium: Arc<dyn Publisher>,
        devto: Arc<dyn Publisher>,
        wordpress: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            medium,
            devto,
            wordpress,
        }
    }

    /// Replace the publisher for one platform
    pub fn with(mut self, publisher: Arc<dyn Publisher>) -> Self {
        match publisher.platform() {
            Platform::Medium => self.medium = publisher,
            Platform::DevTo => self.devto = publisher,
            Platform::WordPress => self.wordpress = publisher,
        }
        self
    }

    pub fn get(&self, platform: Platform) -> Arc<dyn Publisher> {
        match platform {
            Platform::Medium => Arc::clone(&self.medium),
            Platform::DevTo => Arc::clone(&self.devto),
            Platform::WordPress => Arc::clone(&self.wordpress),
        }
    }
}

/// Upper bound on establishing a connection to a platform
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for all publishers
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("syndicate/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| {
            SyndicateError::Config(crate::error::ConfigError::MissingField(format!(
                "HTTP client could not be built: {}",
                e
            )))
        })
}

/// Send a request and decode a JSON success body, mapping failures onto
/// [`PlatformError`]
pub(crate) async fn send_json<T: DeserializeOwned>(
    platform: Platform,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| PlatformError::Unavailable {
        platform,
        status: e.status().map(|s| s.as_u16()),
        message: transport_message(&e),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| PlatformError::Unavailable {
        platform,
        status: Some(status.as_u16()),
        message: format!("failed to read response body: {}", e),
    })?;

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        tracing::debug!("{} rejected credentials with {}", platform, status);
        return Err(PlatformError::InvalidCredential {
            platform,
            message: format!("HTTP {}: {}", status.as_u16(), truncate(&body)),
        }
        .into());
    }

    if !status.is_success() {
        return Err(PlatformError::Unavailable {
            platform,
            status: Some(status.as_u16()),
            message: truncate(&body),
        }
        .into());
    }

    serde_json::from_str(&body).map_err(|e| {
        PlatformError::Unavailable {
            platform,
            status: Some(status.as_u16()),
            message: format!("unexpected response: {}", e),
        }
        .into()
    })
}

fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("could not connect: {}", error)
    } else {
        error.to_string()
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "(empty response body)".to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Accept ids sent either as JSON strings or numbers
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
