//! Symmetric encryption of platform API keys at rest
//!
//! A single process-wide [`Codec`] encrypts API keys before they are written
//! to the credential table and decrypts them right before an outbound publish
//! call. Ciphertexts are opaque strings: `base64(nonce || ciphertext || tag)`
//! using AES-256-GCM with a fresh 96-bit nonce per encryption.
//!
//! # Example
//!
//! ```
//! use libsyndicate::crypto::Codec;
//! use secrecy::ExposeSecret;
//!
//! # fn example() -> libsyndicate::Result<()> {
//! let codec = Codec::new("correct horse battery staple")?;
//! let stored = codec.encrypt("dev-to-api-key")?;
//! assert_eq!(codec.decrypt(&stored)?.expose_secret(), "dev-to-api-key");
//! # Ok(())
//! # }
//! ```

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Environment variable holding the encryption secret
pub const ENCRYPTION_KEY_ENV: &str = "SYNDICATE_ENCRYPTION_KEY";

/// Encrypts and decrypts API keys with one symmetric key
#[derive(Clone)]
pub struct Codec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl Codec {
    /// Create a codec from the configured secret
    ///
    /// The secret is zero-padded or truncated to 32 bytes, so the same secret
    /// always yields the same key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKey` if the secret is empty.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey.into());
        }

        let mut key_bytes = [0u8; KEY_LEN];
        let len = secret.len().min(KEY_LEN);
        key_bytes[..len].copy_from_slice(&secret.as_bytes()[..len]);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        key_bytes.zeroize();

        Ok(Self { cipher })
    }

    /// Create a codec from `SYNDICATE_ENCRYPTION_KEY`
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(ENCRYPTION_KEY_ENV).map_err(|_| {
            crate::error::ConfigError::MissingField(format!(
                "encryption key (set {})",
                ENCRYPTION_KEY_ENV
            ))
        })?;
        Self::new(&secret)
    }

    /// Encrypt a plaintext API key into an opaque string
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    /// Decrypt an opaque string produced by [`Codec::encrypt`]
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` if the input is not valid base64, is
    /// too short to hold a nonce, was encrypted under another key, or does not
    /// decrypt to UTF-8.
    pub fn decrypt(&self, ciphertext: &str) -> Result<SecretString> {
        let blob = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CryptoError::Decryption(format!("not valid base64: {}", e)))?;

        if blob.len() <= NONCE_LEN {
            return Err(CryptoError::Decryption(
                "ciphertext too short to contain a nonce".to_string(),
            )
            .into());
        }

        let (nonce_bytes, body) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| {
                CryptoError::Decryption("authentication tag mismatch (wrong key?)".to_string())
            })?;

        match String::from_utf8(plaintext) {
            Ok(text) => Ok(SecretString::from(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(CryptoError::Decryption("plaintext is not UTF-8".to_string()).into())
            }
        }
    }
}
