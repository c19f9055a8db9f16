//! WordPress REST API publisher
//!
//! Unlike the hosted platforms there is no fixed API base: every credential
//! carries the site URL it belongs to.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credentials::Credential;
use crate::crypto::Codec;
use crate::error::{Result, SyndicateError};
use crate::platforms::{send_json, string_or_number, Publisher};
use crate::types::{Platform, PlatformStatus, Post};

pub struct WordPressPublisher {
    client: reqwest::Client,
    codec: Codec,
}

#[derive(Serialize)]
struct CreatePost<'a> {
    title: &'a str,
    content: &'a str,
    status: &'static str,
    tags: &'a [String],
}

#[derive(Deserialize)]
struct CreatedPost {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    link: Option<String>,
}

impl WordPressPublisher {
    pub fn new(client: reqwest::Client, codec: Codec) -> Self {
        Self { client, codec }
    }
}

fn posts_endpoint(site_url: &str) -> String {
    format!("{}/wp-json/wp/v2/posts", site_url.trim_end_matches('/'))
}

#[async_trait]
impl Publisher for WordPressPublisher {
    fn platform(&self) -> Platform {
        Platform::WordPress
    }

    async fn publish(&self, post: &Post, credential: &Credential) -> Result<PlatformStatus> {
        let site_url = credential
            .site_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                SyndicateError::Validation(
                    "WordPress site URL is not configured. Please add it in settings.".to_string(),
                )
            })?;

        let token = self.codec.decrypt(&credential.api_key_secret)?;

        let body = CreatePost {
            title: &post.title,
            content: &post.content,
            status: "publish",
            tags: &post.tags,
        };

        let request = self
            .client
            .post(posts_endpoint(site_url))
            .bearer_auth(token.expose_secret())
            .json(&body);

        let created: CreatedPost = send_json(Platform::WordPress, request).await?;
        tracing::info!(
            "Published post {} to WordPress site {} as {}",
            post.id,
            site_url,
            created.id
        );

        Ok(PlatformStatus::published_now(created.id, created.link))
    }
}
