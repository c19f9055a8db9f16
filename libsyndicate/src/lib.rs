//! Syndicate - write once, publish to every blog
//!
//! This library provides the core of a blog-syndication manager: encrypted
//! storage of third-party API keys, adapters for the Medium, DEV.to and
//! WordPress publishing APIs, and an orchestrator that fans a post out to
//! those platforms while tracking per-platform publication state.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod error;
pub mod logging;
pub mod platforms;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialStore, CredentialSummary, CredentialUpsert};
pub use crypto::Codec;
pub use db::Database;
pub use error::{Result, SyndicateError};
pub use service::SyndicateService;
pub use types::{NewPost, Platform, PlatformStatus, Post, PostStatus};
