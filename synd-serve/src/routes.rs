//! Request handlers
//!
//! Thin translations between JSON bodies and the library's services. Every
//! success body has the shape `{success, message?, data}`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use libsyndicate::{CredentialUpsert, Platform};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::AppState;

type ApiResult = Result<(StatusCode, Json<Value>), AppError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub post_id: String,
}

fn parse_platform(name: &str) -> Result<Platform, AppError> {
    Ok(name.parse::<Platform>()?)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn publish_all(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let response = state.service.publishing().publish_all(&request.post_id).await?;

    let (status, message) = if response.success {
        let message = match &response.errors {
            Some(errors) => format!(
                "Published to {} platform(s), {} failed",
                response.successes.len(),
                errors.len()
            ),
            None => format!("Published to {}", response.successes.join(", ")),
        };
        (StatusCode::OK, message)
    } else {
        (
            StatusCode::BAD_GATEWAY,
            "Publishing failed on every platform".to_string(),
        )
    };

    let mut data = json!({
        "postId": response.post_id,
        "status": response.status,
        "successes": response.successes,
    });
    if let Some(errors) = &response.errors {
        data["errors"] = json!(errors);
    }

    Ok((
        status,
        Json(json!({ "success": response.success, "message": message, "data": data })),
    ))
}

pub async fn publish_one(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult {
    let platform = parse_platform(&platform)?;
    let Json(request) = payload?;
    let response = state
        .service
        .publishing()
        .publish_one(&request.post_id, platform)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("Published to {}", platform),
            "data": {
                "postId": response.post_id,
                "status": response.status,
                "platformStatus": response.platform_status,
            }
        })),
    ))
}

pub async fn unpublish(
    State(state): State<Arc<AppState>>,
    Path((platform, post_id)): Path<(String, String)>,
) -> ApiResult {
    let response = state.service.publishing().unpublish(&post_id, &platform).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("Unpublished from {}", response.platform),
            "data": {
                "postId": response.post_id,
                "platformStatus": response.platform_status,
            }
        })),
    ))
}

pub async fn list_credentials(State(state): State<Arc<AppState>>) -> ApiResult {
    let credentials = state.service.credentials().list().await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "success": true, "data": credentials })),
    ))
}

pub async fn upsert_credential(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    payload: Result<Json<CredentialUpsert>, JsonRejection>,
) -> ApiResult {
    let platform = parse_platform(&platform)?;
    let Json(input) = payload?;
    let summary = state.service.credentials().upsert(platform, input).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("{} credentials saved", platform),
            "data": summary,
        })),
    ))
}

pub async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> ApiResult {
    let platform = parse_platform(&platform)?;
    state.service.credentials().delete(platform).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!("{} credentials deleted", platform),
        })),
    ))
}
