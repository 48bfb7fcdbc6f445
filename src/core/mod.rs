//! Core infrastructure: error handling and endpoint configuration.

mod endpoints;
mod error;

pub use endpoints::{
    api_base_url, Endpoints, AGYLIA_API_BASE, API_URL_ENV, USERS_ACTIVITY_PATH,
    VALIDATE_SIGNATURE_PATH,
};
pub use error::{AgyliaError, AuthErrorKind, Error, Result};
