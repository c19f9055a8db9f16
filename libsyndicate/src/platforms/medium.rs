//! Medium publisher
//!
//! Medium scopes its publish endpoint under the author's user id, which this
//! system does not know ahead of time, so every publish is two calls:
//! `GET /me` to resolve the id, then `POST /users/{id}/posts`.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credentials::Credential;
use crate::crypto::Codec;
use crate::error::Result;
use crate::platforms::{send_json, string_or_number, Publisher};
use crate::types::{Platform, PlatformStatus, Post};

pub struct MediumPublisher {
    client: reqwest::Client,
    codec: Codec,
    api_base: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct MediumUser {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
}

#[derive(Deserialize)]
struct MediumPost {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePost<'a> {
    title: &'a str,
    content_format: &'static str,
    content: &'a str,
    publish_status: &'static str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_url: Option<&'a str>,
}

impl MediumPublisher {
    pub fn new(client: reqwest::Client, codec: Codec, api_base: &str) -> Self {
        Self {
            client,
            codec,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn resolve_user_id(&self, token: &str) -> Result<String> {
        let request = self
            .client
            .get(format!("{}/me", self.api_base))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json");

        let me: Envelope<MediumUser> = send_json(Platform::Medium, request).await?;
        tracing::debug!("Resolved Medium user id {}", me.data.id);
        Ok(me.data.id)
    }
}

#[async_trait]
impl Publisher for MediumPublisher {
    fn platform(&self) -> Platform {
        Platform::Medium
    }

    async fn publish(&self, post: &Post, credential: &Credential) -> Result<PlatformStatus> {
        let token = self.codec.decrypt(&credential.api_key_secret)?;
        let user_id = self.resolve_user_id(token.expose_secret()).await?;

        let body = CreatePost {
            title: &post.title,
            content_format: "markdown",
            content: &post.content,
            publish_status: "public",
            tags: &post.tags,
            canonical_url: post.canonical_url.as_deref(),
        };

        let request = self
            .client
            .post(format!("{}/users/{}/posts", self.api_base, user_id))
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);

        let created: Envelope<MediumPost> = send_json(Platform::Medium, request).await?;
        tracing::info!("Published post {} to Medium as {}", post.id, created.data.id);

        Ok(PlatformStatus::published_now(created.data.id, created.data.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlatformError, SyndicateError};
    use crate::platforms::test_support;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn bearer(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn fake_medium(captured: Arc<Mutex<Option<(String, Value)>>>) -> String {
        let router = Router::new()
            .route(
                "/me",
                get(|headers: HeaderMap| async move {
                    if bearer(&headers) != "Bearer medium-token" {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"errors": [{"message": "Token was invalid."}]})));
                    }
                    (StatusCode::OK, Json(json!({"data": {"id": "u123", "username": "alice"}})))
                }),
            )
            .route(
                "/users/{id}/posts",
                post(move |Path(id): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                    let captured = captured.clone();
                    async move {
                        assert_eq!(bearer(&headers), "Bearer medium-token");
                        *captured.lock().unwrap() = Some((id, body));
                        (
                            StatusCode::CREATED,
                            Json(json!({"data": {"id": "p789", "url": "https://medium.com/@alice/hi-p789"}})),
                        )
                    }
                }),
            );
        test_support::serve(router).await
    }

    #[tokio::test]
    async fn test_publish_resolves_user_then_posts_markdown() {
        let captured = Arc::new(Mutex::new(None));
        let base = fake_medium(captured.clone()).await;
        let publisher = MediumPublisher::new(reqwest::Client::new(), test_support::codec(), &base);

        let post = test_support::post();
        let credential = test_support::credential(Platform::Medium, "medium-token", None);
        let status = publisher.publish(&post, &credential).await.unwrap();

        assert!(status.published);
        assert_eq!(status.external_id.as_deref(), Some("p789"));
        assert_eq!(status.url.as_deref(), Some("https://medium.com/@alice/hi-p789"));
        assert!(status.published_at.is_some());

        let (user_id, body) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(user_id, "u123");
        assert_eq!(body["title"], "Hi");
        assert_eq!(body["content"], "World");
        assert_eq!(body["contentFormat"], "markdown");
        assert_eq!(body["publishStatus"], "public");
        assert_eq!(body["tags"], json!(["rust"]));
        assert_eq!(body["canonicalUrl"], "https://me.example.com/hi");
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalid_credential() {
        let base = fake_medium(Arc::new(Mutex::new(None))).await;
        let publisher = MediumPublisher::new(reqwest::Client::new(), test_support::codec(), &base);

        let credential = test_support::credential(Platform::Medium, "wrong-token", None);
        let result = publisher.publish(&test_support::post(), &credential).await;

        match result {
            Err(SyndicateError::Platform(PlatformError::InvalidCredential { platform, message })) => {
                assert_eq!(platform, Platform::Medium);
                assert!(message.contains("401"));
            }
            other => panic!("Expected invalid credential error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let publisher = MediumPublisher::new(
            reqwest::Client::new(),
            test_support::codec(),
            "http://127.0.0.1:9",
        );
        let credential = test_support::credential(Platform::Medium, "medium-token", None);
        let result = publisher.publish(&test_support::post(), &credential).await;

        assert!(matches!(
            result,
            Err(SyndicateError::Platform(PlatformError::Unavailable { platform: Platform::Medium, status: None, .. }))
        ));
    }
}
