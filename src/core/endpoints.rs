//! Portal API endpoints.
//!
//! The base URL can be overridden with the `AGYLIA_API_URL` environment
//! variable, which is read whenever a default configuration is built.

/// Production portal API base URL.
pub const AGYLIA_API_BASE: &str = "https://api.portal-agylia.com";

/// Environment variable overriding [`AGYLIA_API_BASE`].
pub const API_URL_ENV: &str = "AGYLIA_API_URL";

/// Cursor-paginated user activity query.
pub const USERS_ACTIVITY_PATH: &str = "/GetUsersActivity";

/// Signature validation.
pub const VALIDATE_SIGNATURE_PATH: &str = "/ValidateSignature";

/// Resolve the API base URL, honouring the env var override.
#[must_use]
pub fn api_base_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| AGYLIA_API_BASE.to_string())
}

/// Endpoint URL builder for a given base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(api_base_url())
    }
}

impl Endpoints {
    /// Create endpoints rooted at `base_url`. A trailing slash is ignored.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the activity endpoint.
    #[must_use]
    pub fn users_activity(&self) -> String {
        format!("{}{}", self.base_url, USERS_ACTIVITY_PATH)
    }

    /// Full URL of the signature validation endpoint.
    #[must_use]
    pub fn validate_signature(&self) -> String {
        format!("{}{}", self.base_url, VALIDATE_SIGNATURE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let endpoints = Endpoints::new("https://portal.example.com//");
        assert_eq!(endpoints.base_url(), "https://portal.example.com");
        assert_eq!(
            endpoints.users_activity(),
            "https://portal.example.com/GetUsersActivity"
        );
        assert_eq!(
            endpoints.validate_signature(),
            "https://portal.example.com/ValidateSignature"
        );
    }
}
