//! End-to-end publishing through the real HTTP publishers
//!
//! A single in-process axum server plays Medium, DEV.to and a WordPress site.
//! The service is configured to point at it, so these tests cover request
//! shapes, auth headers, response parsing and status persistence together.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use libsyndicate::config::{DatabaseConfig, PlatformsConfig};
use libsyndicate::{Codec, Config, CredentialUpsert, NewPost, Platform, PostStatus, SyndicateService};
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Clone, Default)]
struct FakePlatforms {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl FakePlatforms {
    fn record(&self, route: &str, body: Value) {
        self.requests.lock().unwrap().push((route.to_string(), body));
    }

    fn body_for(&self, route: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r == route)
            .map(|(_, body)| body.clone())
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn medium_me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if header(&headers, "authorization") != "Bearer medium-token" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"errors": []})));
    }
    (StatusCode::OK, Json(json!({"data": {"id": "1f2e3d"}})))
}

async fn medium_post(
    State(fake): State<FakePlatforms>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.record("medium", body);
    (
        StatusCode::CREATED,
        Json(json!({"data": {"id": "abc987", "url": format!("https://medium.com/@{}/hi-abc987", user_id)}})),
    )
}

async fn devto_article(
    State(fake): State<FakePlatforms>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if header(&headers, "api-key") != "devto-key" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})));
    }
    fake.record("devto", body);
    (
        StatusCode::CREATED,
        Json(json!({"id": 424242, "url": "https://dev.to/me/hi-4k2"})),
    )
}

async fn wordpress_post(
    State(fake): State<FakePlatforms>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if header(&headers, "authorization") != "Bearer wp-token" {
        return (StatusCode::FORBIDDEN, Json(json!({"code": "rest_forbidden"})));
    }
    fake.record("wordpress", body);
    (
        StatusCode::CREATED,
        Json(json!({"id": 77, "link": "https://blog.example.com/hi/"})),
    )
}

async fn spawn_fake(fake: FakePlatforms) -> String {
    let router = Router::new()
        .route("/medium/me", get(medium_me))
        .route("/medium/users/{id}/posts", post(medium_post))
        .route("/devto/articles", post(devto_article))
        .route("/wp/wp-json/wp/v2/posts", post(wordpress_post))
        .with_state(fake);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn setup(base: &str) -> (SyndicateService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("wire.db").to_string_lossy().to_string(),
        },
        platforms: PlatformsConfig {
            medium_api_base: format!("{}/medium", base),
            devto_api_base: format!("{}/devto", base),
        },
        ..Config::default()
    };
    let service = SyndicateService::from_config(&config, Codec::new("wire-test-key").unwrap())
        .await
        .unwrap();
    (service, temp_dir)
}

async fn set_key(service: &SyndicateService, platform: Platform, key: &str, site: Option<String>) {
    service
        .credentials()
        .upsert(
            platform,
            CredentialUpsert {
                api_key: key.to_string(),
                site_url: site,
                platform_config: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_publish_all_through_every_adapter() {
    let fake = FakePlatforms::default();
    let base = spawn_fake(fake.clone()).await;
    let (service, _temp_dir) = setup(&base).await;

    set_key(&service, Platform::Medium, "medium-token", None).await;
    set_key(&service, Platform::DevTo, "devto-key", None).await;
    set_key(&service, Platform::WordPress, "wp-token", Some(format!("{}/wp/", base))).await;

    let mut input = NewPost::new("Hi", "World");
    input.tags = vec!["rust".to_string()];
    let post = service.posts().create(input).await.unwrap();

    let response = service.publishing().publish_all(&post.id).await.unwrap();
    assert!(response.success);
    assert_eq!(response.successes, vec!["Medium", "DEV.to", "WordPress"]);
    assert!(response.errors.is_none());

    let stored = service.posts().get(&post.id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Published);

    let medium = stored.status_on(Platform::Medium);
    assert_eq!(medium.external_id.as_deref(), Some("abc987"));
    assert_eq!(medium.url.as_deref(), Some("https://medium.com/@1f2e3d/hi-abc987"));

    let devto = stored.status_on(Platform::DevTo);
    assert_eq!(devto.external_id.as_deref(), Some("424242"));

    let wordpress = stored.status_on(Platform::WordPress);
    assert_eq!(wordpress.external_id.as_deref(), Some("77"));
    assert_eq!(wordpress.url.as_deref(), Some("https://blog.example.com/hi/"));

    assert_eq!(fake.body_for("medium").unwrap()["contentFormat"], "markdown");
    assert_eq!(fake.body_for("devto").unwrap()["article"]["body_markdown"], "World");
    assert_eq!(fake.body_for("wordpress").unwrap()["status"], "publish");
}

#[tokio::test]
async fn test_rejected_key_is_reported_per_platform() {
    let fake = FakePlatforms::default();
    let base = spawn_fake(fake.clone()).await;
    let (service, _temp_dir) = setup(&base).await;

    set_key(&service, Platform::Medium, "medium-token", None).await;
    set_key(&service, Platform::DevTo, "revoked-key", None).await;

    let post = service
        .posts()
        .create(NewPost::new("Hi", "World"))
        .await
        .unwrap();

    let response = service.publishing().publish_all(&post.id).await.unwrap();
    assert_eq!(response.successes, vec!["Medium"]);

    let errors = response.errors.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].platform, "DEV.to");
    assert!(errors[0].error.contains("Please re-enter your DEV.to API key"));
    assert!(fake.body_for("devto").is_none());
}

#[tokio::test]
async fn test_single_publish_with_invalid_key_returns_typed_error() {
    let base = spawn_fake(FakePlatforms::default()).await;
    let (service, _temp_dir) = setup(&base).await;
    set_key(&service, Platform::WordPress, "wrong", Some(format!("{}/wp", base))).await;

    let post = service
        .posts()
        .create(NewPost::new("Hi", "World"))
        .await
        .unwrap();

    let err = service
        .publishing()
        .publish_one(&post.id, Platform::WordPress)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(err.http_status(), 400);

    let stored = service.posts().get(&post.id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Draft);
    assert!(!stored.status_on(Platform::WordPress).published);
}
