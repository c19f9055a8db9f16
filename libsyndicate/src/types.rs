//! Core types for Syndicate

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SyndicateError;

/// The external blogging platforms a post can be syndicated to
///
/// The set is closed: adding a platform means adding a variant and a
/// publisher for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Medium,
    DevTo,
    WordPress,
}

impl Platform {
    /// Every known platform, in a stable order
    pub const ALL: [Platform; 3] = [Platform::Medium, Platform::DevTo, Platform::WordPress];

    /// Lowercase identifier used in storage, URLs and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Medium => "medium",
            Platform::DevTo => "devto",
            Platform::WordPress => "wordpress",
        }
    }

    /// Human-readable name used in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Medium => "Medium",
            Platform::DevTo => "DEV.to",
            Platform::WordPress => "WordPress",
        }
    }

    /// Whether credentials for this platform must carry a site URL
    pub fn requires_site_url(&self) -> bool {
        matches!(self, Platform::WordPress)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Platform {
    type Err = SyndicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medium" => Ok(Platform::Medium),
            "devto" | "dev.to" | "dev-to" => Ok(Platform::DevTo),
            "wordpress" | "wp" => Ok(Platform::WordPress),
            _ => Err(SyndicateError::Validation(format!(
                "Unsupported platform: {}. Supported platforms: medium, devto, wordpress",
                s
            ))),
        }
    }
}

/// Coarse publication flag of a post, independent of per-platform state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = SyndicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(SyndicateError::Validation(format!(
                "Unknown post status: {}",
                other
            ))),
        }
    }
}

/// Publication state of a post on one platform
///
/// This is also the fragment a publisher returns after a successful publish.
/// The default value is the cleared, never-published state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    pub published: bool,
    pub external_id: Option<String>,
    pub url: Option<String>,
    /// Unix timestamp of the successful publish
    pub published_at: Option<i64>,
}

impl PlatformStatus {
    /// Fragment describing a publish that just succeeded
    pub fn published_now(external_id: String, url: Option<String>) -> Self {
        Self {
            published: true,
            external_id: Some(external_id),
            url,
            published_at: Some(chrono::Utc::now().timestamp()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    /// Markdown body
    pub content: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub canonical_url: Option<String>,
    pub status: PostStatus,
    pub platform_status: BTreeMap<Platform, PlatformStatus>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Post {
    /// Status of the post on `platform`, cleared if nothing is recorded
    pub fn status_on(&self, platform: Platform) -> PlatformStatus {
        self.platform_status
            .get(&platform)
            .cloned()
            .unwrap_or_default()
    }

    /// Fill in a cleared entry for every platform missing from the map
    pub fn ensure_all_platforms(&mut self) {
        for platform in Platform::ALL {
            self.platform_status.entry(platform).or_default();
        }
    }
}

/// Input for creating a draft post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub canonical_url: Option<String>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Check required fields before the post is stored
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(SyndicateError::Validation("Title cannot be empty".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(SyndicateError::Validation("Content cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Build the draft post this input describes
    pub fn into_post(self) -> Post {
        let now = chrono::Utc::now().timestamp();
        let mut post = Post {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            content: self.content,
            tags: self.tags,
            cover_image: self.cover_image,
            canonical_url: self.canonical_url,
            status: PostStatus::Draft,
            platform_status: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        };
        post.ensure_all_platforms();
        post
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!("medium".parse::<Platform>().unwrap(), Platform::Medium);
        assert_eq!("DevTo".parse::<Platform>().unwrap(), Platform::DevTo);
        assert_eq!("dev.to".parse::<Platform>().unwrap(), Platform::DevTo);
        assert_eq!("WordPress".parse::<Platform>().unwrap(), Platform::WordPress);
        assert_eq!("wp".parse::<Platform>().unwrap(), Platform::WordPress);
    }

    #[test]
    fn test_platform_from_str_unknown() {
        let result = "hashnode".parse::<Platform>();
        match result {
            Err(SyndicateError::Validation(msg)) => {
                assert!(msg.contains("Unsupported platform: hashnode"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::DevTo.as_str(), "devto");
        assert_eq!(Platform::DevTo.to_string(), "DEV.to");
        assert_eq!(Platform::WordPress.display_name(), "WordPress");
        assert!(Platform::WordPress.requires_site_url());
        assert!(!Platform::Medium.requires_site_url());
    }

    #[test]
    fn test_platform_serializes_as_wire_name() {
        let json = serde_json::to_string(&Platform::DevTo).unwrap();
        assert_eq!(json, "\"devto\"");
        let parsed: Platform = serde_json::from_str("\"wordpress\"").unwrap();
        assert_eq!(parsed, Platform::WordPress);
    }

    #[test]
    fn test_new_post_has_entry_for_every_platform() {
        let post = NewPost::new("Hi", "World").into_post();

        assert!(uuid::Uuid::parse_str(&post.id).is_ok());
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.platform_status.len(), Platform::ALL.len());
        for platform in Platform::ALL {
            assert_eq!(post.status_on(platform), PlatformStatus::default());
        }
    }

    #[test]
    fn test_new_post_validation() {
        assert!(NewPost::new("Hi", "World").validate().is_ok());
        assert!(NewPost::new("  ", "World").validate().is_err());
        assert!(NewPost::new("Hi", "").validate().is_err());
    }

    #[test]
    fn test_published_now_fragment() {
        let status = PlatformStatus::published_now("42".to_string(), Some("https://x".to_string()));
        assert!(status.published);
        assert_eq!(status.external_id.as_deref(), Some("42"));
        assert!(status.published_at.is_some());
    }

    #[test]
    fn test_post_json_is_camel_case() {
        let post = NewPost::new("Hi", "World").into_post();
        let json = serde_json::to_value(&post).unwrap();

        assert!(json.get("platformStatus").is_some());
        assert_eq!(json["platformStatus"]["devto"]["published"], false);
        assert!(json["platformStatus"]["medium"].get("externalId").is_some());
        assert_eq!(json["status"], "draft");
    }

    #[test]
    fn test_post_status_round_trip_str() {
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Archived] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("posted".parse::<PostStatus>().is_err());
    }
}
