//! Platform credential storage
//!
//! One credential record exists per platform. API keys are encrypted with the
//! [`Codec`] before they reach the database, and nothing this module returns
//! to callers outside the crate carries the key in any form: writes and
//! listings hand back a [`CredentialSummary`], and the only plaintext path is
//! [`CredentialStore::decrypt_api_key`], used by the publishers right before
//! an outbound call.
//!
//! # Example
//!
//! ```no_run
//! use libsyndicate::credentials::{CredentialStore, CredentialUpsert};
//! use libsyndicate::{Codec, Database, Platform};
//!
//! # async fn example() -> libsyndicate::Result<()> {
//! let db = Database::new("~/.local/share/syndicate/syndicate.db").await?;
//! let store = CredentialStore::new(db, Codec::from_env()?);
//!
//! let summary = store
//!     .upsert(Platform::WordPress, CredentialUpsert {
//!         api_key: "application-password".to_string(),
//!         site_url: Some("https://blog.example.com".to_string()),
//!         platform_config: None,
//!     })
//!     .await?;
//! assert!(summary.is_active);
//! # Ok(())
//! # }
//! ```

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::crypto::Codec;
use crate::db::Database;
use crate::error::{Result, SyndicateError};
use crate::types::Platform;

/// A stored platform credential
///
/// `api_key_secret` holds ciphertext and is deliberately not serializable.
#[derive(Clone)]
pub struct Credential {
    pub platform: Platform,
    pub(crate) api_key_secret: String,
    pub site_url: Option<String>,
    pub is_active: bool,
    pub platform_config: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("platform", &self.platform)
            .field("api_key_secret", &"[REDACTED]")
            .field("site_url", &self.site_url)
            .field("is_active", &self.is_active)
            .field("platform_config", &self.platform_config)
            .finish()
    }
}

impl Credential {
    /// Public view without the secret
    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            platform: self.platform,
            site_url: self.site_url.clone(),
            is_active: self.is_active,
            platform_config: self.platform_config.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Credential as shown to users and API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub platform: Platform,
    pub site_url: Option<String>,
    pub is_active: bool,
    pub platform_config: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating or replacing a platform credential
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpsert {
    pub api_key: String,
    pub site_url: Option<String>,
    pub platform_config: Option<serde_json::Value>,
}

impl std::fmt::Debug for CredentialUpsert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialUpsert")
            .field("api_key", &"[REDACTED]")
            .field("site_url", &self.site_url)
            .field("platform_config", &self.platform_config)
            .finish()
    }
}

/// Keyed credential store injected into the publishing service
#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
    codec: Codec,
}

impl CredentialStore {
    pub fn new(db: Database, codec: Codec) -> Self {
        Self { db, codec }
    }

    /// Stored record for a platform, secret still encrypted
    pub async fn get_by_platform(&self, platform: Platform) -> Result<Option<Credential>> {
        self.db.get_credential(platform).await
    }

    /// Create or replace the credential for `platform`
    ///
    /// The record is marked active. Validation happens before anything is
    /// written.
    ///
    /// # Errors
    ///
    /// - `SyndicateError::Validation` if the API key is blank, or if the
    ///   platform is WordPress and `site_url` is missing or not an http(s) URL
    /// - `CryptoError::Encryption` if the key cannot be encrypted
    pub async fn upsert(
        &self,
        platform: Platform,
        input: CredentialUpsert,
    ) -> Result<CredentialSummary> {
        let api_key = input.api_key.trim();
        if api_key.is_empty() {
            return Err(SyndicateError::Validation(format!(
                "{} API key cannot be empty",
                platform
            )));
        }

        let site_url = normalize_site_url(platform, input.site_url)?;

        if let Some(config) = &input.platform_config {
            if !config.is_object() {
                return Err(SyndicateError::Validation(
                    "platformConfig must be a JSON object".to_string(),
                ));
            }
        }

        let api_key_secret = self.codec.encrypt(api_key)?;
        let now = chrono::Utc::now().timestamp();
        let credential = Credential {
            platform,
            api_key_secret,
            site_url,
            is_active: true,
            platform_config: input.platform_config,
            created_at: now,
            updated_at: now,
        };

        self.db.upsert_credential(&credential).await?;
        tracing::info!("Stored {} credentials", platform);

        // Re-read so created_at reflects the original insert on updates
        let stored = self
            .db
            .get_credential(platform)
            .await?
            .unwrap_or(credential);
        Ok(stored.summary())
    }

    /// Delete the credential for `platform`
    pub async fn delete(&self, platform: Platform) -> Result<()> {
        if !self.db.delete_credential(platform).await? {
            return Err(SyndicateError::NotFound(format!(
                "No {} credentials are stored",
                platform
            )));
        }
        tracing::info!("Deleted {} credentials", platform);
        Ok(())
    }

    /// Credentials that take part in publish-to-all
    pub async fn list_active(&self) -> Result<Vec<Credential>> {
        self.db.list_credentials(true).await
    }

    /// Every stored credential, without secrets
    pub async fn list(&self) -> Result<Vec<CredentialSummary>> {
        let credentials = self.db.list_credentials(false).await?;
        Ok(credentials.iter().map(Credential::summary).collect())
    }

    /// Enable or disable a credential without touching its key
    pub async fn set_active(&self, platform: Platform, active: bool) -> Result<()> {
        if !self.db.set_credential_active(platform, active).await? {
            return Err(SyndicateError::NotFound(format!(
                "No {} credentials are stored",
                platform
            )));
        }
        Ok(())
    }

    /// Decrypt a credential's API key for an outbound call
    pub fn decrypt_api_key(&self, credential: &Credential) -> Result<SecretString> {
        self.codec.decrypt(&credential.api_key_secret)
    }
}

fn normalize_site_url(platform: Platform, site_url: Option<String>) -> Result<Option<String>> {
    let site_url = site_url
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty());

    if !platform.requires_site_url() {
        return Ok(site_url);
    }

    match site_url {
        None => Err(SyndicateError::Validation(
            "WordPress requires a site URL (e.g. https://blog.example.com)".to_string(),
        )),
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(SyndicateError::Validation(format!(
                "WordPress site URL must start with http:// or https://, got '{}'",
                url
            )))
        }
        Some(url) => Ok(Some(url)),
    }
}
