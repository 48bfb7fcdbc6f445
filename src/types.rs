//! Common types shared by the signature builder, the pager and the client.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{AgyliaError, Result};

/// Format a timestamp as ISO-8601 with millisecond precision and a `Z`
/// suffix, e.g. `2017-01-01T00:00:00.000Z`.
#[must_use]
pub fn to_iso_millis(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Credentials
// ============================================================================

/// API account used for HTTP Basic authentication against the portal.
///
/// The API key doubles as the secret from which signature keys are derived.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// API username (Basic auth user)
    pub username: String,
    /// API key (Basic auth password)
    pub api_key: String,
}

impl ApiCredentials {
    /// Create new API credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    /// Load from environment variables
    ///
    /// Expected env vars:
    /// - `AGYLIA_API_USERNAME`
    /// - `AGYLIA_API_KEY`
    pub fn from_env() -> std::result::Result<Self, std::env::VarError> {
        Ok(Self {
            username: std::env::var("AGYLIA_API_USERNAME")?,
            api_key: std::env::var("AGYLIA_API_KEY")?,
        })
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// End-user credentials embedded in a signature.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    /// Portal username of the user being validated
    pub username: String,
    /// The user's password; only ever sent encrypted
    pub password: String,
}

impl UserCredentials {
    /// Create new user credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load from environment variables
    ///
    /// Expected env vars:
    /// - `AGYLIA_USER_USERNAME`
    /// - `AGYLIA_USER_PASSWORD`
    pub fn from_env() -> std::result::Result<Self, std::env::VarError> {
        Ok(Self {
            username: std::env::var("AGYLIA_USER_USERNAME")?,
            password: std::env::var("AGYLIA_USER_PASSWORD")?,
        })
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Date range
// ============================================================================

/// Inclusive activity query window.
///
/// Bounds are kept as the exact strings sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from_date: String,
    to_date: String,
}

impl DateRange {
    /// Create a range from ISO-8601 strings.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either bound is empty, or if both bounds
    /// parse as RFC 3339 and `from_date` is later than `to_date`.
    pub fn new(from_date: impl Into<String>, to_date: impl Into<String>) -> Result<Self> {
        let from_date = from_date.into();
        let to_date = to_date.into();

        if from_date.trim().is_empty() {
            return Err(AgyliaError::validation("from_date is empty", "from_date"));
        }
        if to_date.trim().is_empty() {
            return Err(AgyliaError::validation("to_date is empty", "to_date"));
        }

        if let (Ok(from), Ok(to)) = (
            DateTime::parse_from_rfc3339(&from_date),
            DateTime::parse_from_rfc3339(&to_date),
        ) {
            if from > to {
                return Err(AgyliaError::validation(
                    format!("from_date {from_date} is after to_date {to_date}"),
                    "from_date",
                ));
            }
        }

        Ok(Self { from_date, to_date })
    }

    /// Create a range from UTC timestamps.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `from` is later than `to`.
    pub fn from_datetimes(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        Self::new(to_iso_millis(&from), to_iso_millis(&to))
    }

    #[must_use]
    pub fn from_date(&self) -> &str {
        &self.from_date
    }

    #[must_use]
    pub fn to_date(&self) -> &str {
        &self.to_date
    }
}

// ============================================================================
// Activity pages
// ============================================================================

/// One page of the activity feed.
///
/// Activity records are opaque and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPage {
    /// Activity records in server order
    pub activities: Vec<serde_json::Value>,
    /// Continuation token; `None` when this is the last page
    #[serde(default, deserialize_with = "non_empty_cursor")]
    pub next_cursor: Option<String>,
}

impl ActivityPage {
    /// Create a page. An empty cursor is normalised to `None`.
    #[must_use]
    pub fn new(activities: Vec<serde_json::Value>, next_cursor: Option<String>) -> Self {
        Self {
            activities,
            next_cursor: next_cursor.filter(|cursor| !cursor.is_empty()),
        }
    }

    /// Number of activity records on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Cursor to forward on the next request, if more pages exist.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_cursor().is_some()
    }
}

/// Treat a missing, null or empty cursor as "no more pages".
fn non_empty_cursor<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let cursor = Option::<String>::deserialize(deserializer)?;
    Ok(cursor.filter(|c| !c.is_empty()))
}

// ============================================================================
// Signature validation
// ============================================================================

/// Outcome reported by the signature validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureValidation {
    /// HTTP status code
    pub status: u16,
    /// Raw response text
    pub body: String,
}

impl SignatureValidation {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
