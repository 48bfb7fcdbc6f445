//! User signature construction for the `ValidateSignature` endpoint.
//!
//! A signature proves knowledge of a user's password at a point in time
//! without sending the password in cleartext:
//!
//! 1. key = lowercase hex of `MD5(api_key)`; its 32 ASCII bytes are the
//!    AES-256 key.
//! 2. A fresh random 16-byte IV per signature.
//! 3. plaintext = `username + "+" + password + "+" + timestamp`, where the
//!    timestamp is ISO-8601 UTC with millisecond precision.
//! 4. ciphertext = AES-256-CBC with PKCS#7 padding.
//! 5. signature = standard base64 of `IV || ciphertext`.
//!
//! # Example
//!
//! ```rust,ignore
//! use agylia_sdk::auth::SignatureBuilder;
//! use agylia_sdk::UserCredentials;
//!
//! let builder = SignatureBuilder::new("your-api-key");
//! let signature = builder.sign(&UserCredentials::new("testuser", "testpassword"))?;
//! ```

use std::fmt;

use aes::Aes256;
use base64::Engine;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use rand::{rngs::OsRng, CryptoRng, RngCore};

use crate::core::{AgyliaError, Result};
use crate::types::{to_iso_millis, ApiCredentials, UserCredentials};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// IV length prepended to every signature.
pub const IV_LEN: usize = 16;

/// AES block size.
pub const BLOCK_LEN: usize = 16;

/// Separator between plaintext fields.
pub const FIELD_DELIMITER: char = '+';

/// Derive the signature key from an API key: hex-encoded MD5 digest.
#[must_use]
pub fn derive_key(api_key: &str) -> String {
    hex::encode(Md5::digest(api_key.as_bytes()))
}

/// Build the signature plaintext for a user at `timestamp`.
#[must_use]
pub fn signature_plaintext(username: &str, password: &str, timestamp: &str) -> String {
    format!("{username}{FIELD_DELIMITER}{password}{FIELD_DELIMITER}{timestamp}")
}

/// Encrypt `plaintext` and return `IV || ciphertext`.
///
/// # Errors
///
/// Returns an auth error if the key is not 32 bytes long.
pub fn encrypt_payload(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|e| AgyliaError::crypto(format!("Invalid signature key: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut payload = Vec::with_capacity(IV_LEN + ciphertext.len());
    payload.extend_from_slice(iv);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

/// Build a signature with a fresh IV and the current time.
///
/// # Errors
///
/// Returns an auth error if encryption fails.
pub fn build_signature(api_key: &str, username: &str, password: &str) -> Result<String> {
    SignatureBuilder::new(api_key).sign(&UserCredentials::new(username, password))
}

/// Signs user credentials with a key derived from an API key.
#[derive(Clone)]
pub struct SignatureBuilder {
    key: String,
}

impl fmt::Debug for SignatureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureBuilder")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SignatureBuilder {
    /// Create a builder for the given API key.
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            key: derive_key(api_key),
        }
    }

    /// Create a builder from API credentials.
    #[must_use]
    pub fn from_credentials(credentials: &ApiCredentials) -> Self {
        Self::new(&credentials.api_key)
    }

    /// Sign `user` with a fresh OS-random IV at the current time.
    ///
    /// Two calls never produce the same signature.
    ///
    /// # Errors
    ///
    /// Returns an auth error if encryption fails.
    pub fn sign(&self, user: &UserCredentials) -> Result<String> {
        self.sign_with_rng(user, Utc::now(), &mut OsRng)
    }

    /// Sign `user` at a fixed timestamp with a fresh OS-random IV.
    ///
    /// # Errors
    ///
    /// Returns an auth error if encryption fails.
    pub fn sign_at(&self, user: &UserCredentials, timestamp: DateTime<Utc>) -> Result<String> {
        self.sign_with_rng(user, timestamp, &mut OsRng)
    }

    /// Sign `user` drawing the IV from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an auth error if encryption fails.
    pub fn sign_with_rng<R>(
        &self,
        user: &UserCredentials,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<String>
    where
        R: RngCore + CryptoRng,
    {
        let mut iv = [0u8; IV_LEN];
        rng.try_fill_bytes(&mut iv)
            .map_err(|e| AgyliaError::crypto(format!("Failed to generate IV: {e}")))?;
        self.sign_with_iv(user, timestamp, &iv)
    }

    /// Sign `user` with an explicit IV. The output depends only on the arguments.
    ///
    /// # Errors
    ///
    /// Returns an auth error if encryption fails.
    pub fn sign_with_iv(
        &self,
        user: &UserCredentials,
        timestamp: DateTime<Utc>,
        iv: &[u8; IV_LEN],
    ) -> Result<String> {
        let timestamp = to_iso_millis(&timestamp);
        let plaintext = signature_plaintext(&user.username, &user.password, &timestamp);
        let payload = encrypt_payload(self.key.as_bytes(), iv, plaintext.as_bytes())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(payload))
    }

    /// Recover the plaintext of a signature made with this builder's key.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the signature is not valid base64, is too
    /// short, or does not decrypt under this key.
    pub fn decrypt(&self, signature: &str) -> Result<String> {
        let payload = base64::engine::general_purpose::STANDARD
            .decode(signature)
            .map_err(|e| AgyliaError::crypto(format!("Invalid base64 signature: {e}")))?;

        if payload.len() < IV_LEN + BLOCK_LEN || (payload.len() - IV_LEN) % BLOCK_LEN != 0 {
            return Err(AgyliaError::crypto(format!(
                "Signature payload has invalid length {}",
                payload.len()
            )));
        }

        let (iv, ciphertext) = payload.split_at(IV_LEN);
        let cipher = Aes256CbcDec::new_from_slices(self.key.as_bytes(), iv)
            .map_err(|e| AgyliaError::crypto(format!("Invalid signature key: {e}")))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| AgyliaError::crypto(format!("Signature decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| AgyliaError::crypto(format!("Signature plaintext is not UTF-8: {e}")))
    }
}
