//! # Agylia SDK
//!
//! A Rust SDK for the [Agylia](https://www.agylia.com) learning portal API.
//!
//! ## Features
//!
//! - **User Activity** - Cursor-paginated activity retrieval for a date range
//! - **Signature Validation** - Build and validate user credential signatures
//! - **Pagination** - Sequential cursor pager with a `Stream` adapter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agylia_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = PortalClient::with_defaults(ApiCredentials::new("admin", "api-key"))?;
//!     let range = DateRange::new("2017-01-01T00:00:00.000Z", "2020-01-01T00:00:00.000Z")?;
//!     let pages = client.get_all_users_activity(range).await?;
//!     println!("Fetched {} pages", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`] - Error handling and endpoint configuration
//! - [`types`] - Credentials, date ranges and activity pages
//! - [`auth`] - Signature construction
//! - [`pagination`] - Cursor pager
//! - [`client`] - REST API client

#![cfg_attr(docsrs, feature(doc_cfg))]

// Core infrastructure
pub mod core;

// Type definitions
pub mod types;

// Authentication
#[cfg(feature = "auth")]
#[cfg_attr(docsrs, doc(cfg(feature = "auth")))]
pub mod auth;

// Pagination
#[cfg(feature = "pagination")]
#[cfg_attr(docsrs, doc(cfg(feature = "pagination")))]
pub mod pagination;

// API clients
#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;

// Prelude for convenient imports
pub mod prelude;

// ============================================================================
// Core Re-exports (always available)
// ============================================================================

pub use crate::core::{
    AgyliaError, AuthErrorKind, Endpoints, Error, Result, AGYLIA_API_BASE,
    USERS_ACTIVITY_PATH, VALIDATE_SIGNATURE_PATH,
};

// ============================================================================
// Type Re-exports (always available)
// ============================================================================

pub use crate::types::{ActivityPage, ApiCredentials, DateRange, SignatureValidation, UserCredentials};

// ============================================================================
// Auth Re-exports
// ============================================================================

#[cfg(feature = "auth")]
pub use auth::{build_signature, derive_key, SignatureBuilder};

// ============================================================================
// Pagination Re-exports
// ============================================================================

#[cfg(feature = "pagination")]
pub use pagination::{ActivityFetcher, ActivityPager, PagerState};

// ============================================================================
// Client Re-exports
// ============================================================================

#[cfg(feature = "client")]
pub use client::{PortalClient, PortalConfig};
