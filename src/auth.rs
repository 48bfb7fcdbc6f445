//! Authentication utilities for the Agylia portal API.
//!
//! Requests are authenticated with HTTP Basic auth (API username + API key),
//! handled by the client. This module provides the user signature consumed
//! by the `ValidateSignature` endpoint.
//!
//! | Credential | Method | Use Case |
//! |------------|--------|----------|
//! | API account | HTTP Basic | Every request |
//! | User signature | AES-256-CBC over MD5-derived key | Validate a user's password |

mod signature;

pub use signature::{
    build_signature, derive_key, encrypt_payload, signature_plaintext, SignatureBuilder,
    BLOCK_LEN, FIELD_DELIMITER, IV_LEN,
};
