//! Commonly used types for quick imports.
//!
//! # Example
//!
//! ```rust,ignore
//! use agylia_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = PortalClient::with_defaults(ApiCredentials::from_env()?)?;
//!     let outcome = client.validate_user(&UserCredentials::from_env()?).await?;
//!     println!("{} - {}", outcome.status, outcome.body);
//!     Ok(())
//! }
//! ```

// Core
pub use crate::core::{AgyliaError, Endpoints, Error, Result};

// Common types
pub use crate::types::{
    ActivityPage, ApiCredentials, DateRange, SignatureValidation, UserCredentials,
};

// Auth (if enabled)
#[cfg(feature = "auth")]
pub use crate::auth::SignatureBuilder;

// Pagination (if enabled)
#[cfg(feature = "pagination")]
pub use crate::pagination::{ActivityFetcher, ActivityPager};

// Clients (if enabled)
#[cfg(feature = "client")]
pub use crate::client::{PortalClient, PortalConfig};
