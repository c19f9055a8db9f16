//! DEV.to (Forem) publisher

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credentials::Credential;
use crate::crypto::Codec;
use crate::error::Result;
use crate::platforms::{send_json, string_or_number, Publisher};
use crate::types::{Platform, PlatformStatus, Post};

pub struct DevToPublisher {
    client: reqwest::Client,
    codec: Codec,
    api_base: String,
}

#[derive(Serialize)]
struct ArticleRequest<'a> {
    article: Article<'a>,
}

#[derive(Serialize)]
struct Article<'a> {
    title: &'a str,
    body_markdown: &'a str,
    published: bool,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    main_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<&'a str>,
}

#[derive(Deserialize)]
struct ArticleResponse {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    url: Option<String>,
}

impl DevToPublisher {
    pub fn new(client: reqwest::Client, codec: Codec, api_base: &str) -> Self {
        Self {
            client,
            codec,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Publisher for DevToPublisher {
    fn platform(&self) -> Platform {
        Platform::DevTo
    }

    async fn publish(&self, post: &Post, credential: &Credential) -> Result<PlatformStatus> {
        let api_key = self.codec.decrypt(&credential.api_key_secret)?;

        let body = ArticleRequest {
            article: Article {
                title: &post.title,
                body_markdown: &post.content,
                published: true,
                tags: &post.tags,
                main_image: post.cover_image.as_deref(),
                canonical_url: post.canonical_url.as_deref(),
            },
        };

        let request = self
            .client
            .post(format!("{}/articles", self.api_base))
            .header("api-key", api_key.expose_secret())
            .header(reqwest::header::ACCEPT, "application/vnd.forem.api-v1+json")
            .json(&body);

        let created: ArticleResponse = send_json(Platform::DevTo, request).await?;
        tracing::info!("Published post {} to DEV.to as {}", post.id, created.id);

        Ok(PlatformStatus::published_now(created.id, created.url))
    }
}
