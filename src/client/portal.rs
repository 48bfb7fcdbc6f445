//! Agylia portal REST API client
//!
//! ## Features
//!
//! - **User Activity**: cursor-paginated activity retrieval for a date range
//! - **Signature Validation**: validate a user signature server-side
//!
//! ## Example
//!
//! ```rust,ignore
//! use agylia_sdk::prelude::*;
//!
//! let client = PortalClient::new(PortalConfig::default(), ApiCredentials::from_env()?)?;
//! let range = DateRange::new("2017-01-01T00:00:00.000Z", "2020-01-01T00:00:00.000Z")?;
//!
//! let mut pager = client.activity_pager(range);
//! while let Some(page) = pager.next_page().await? {
//!     println!("{} activities", page.len());
//! }
//! ```

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter as GovRateLimiter};
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::auth::SignatureBuilder;
use crate::core::{AgyliaError, AuthErrorKind, Endpoints, Result};
use crate::pagination::{ActivityFetcher, ActivityPager};
use crate::types::{ActivityPage, ApiCredentials, DateRange, SignatureValidation, UserCredentials};

type RateLimiter = GovRateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Upper bound on any single retry sleep, including server `Retry-After` hints.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delay before retrying `err`, clamped to [`MAX_RETRY_DELAY`].
fn retry_backoff(err: &AgyliaError) -> Duration {
    err.retry_delay()
        .unwrap_or(Duration::from_millis(100))
        .min(MAX_RETRY_DELAY)
}

/// Portal API configuration
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_per_second: u32,
    /// User agent string
    pub user_agent: String,
    /// Extra attempts for retryable failures (0 = fail on first error)
    pub max_retries: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            // Honours AGYLIA_API_URL
            base_url: crate::core::api_base_url(),
            timeout: Duration::from_secs(30),
            rate_limit_per_second: 5,
            user_agent: concat!("agylia-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
            max_retries: 0,
        }
    }
}

impl PortalConfig {
    /// Create a new configuration builder with defaults.
    #[must_use]
    pub fn builder() -> Self {
        Self::default()
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set rate limit (requests per second)
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit_per_second = rate_limit;
        self
    }

    /// Set user agent string
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the number of retries for retryable failures
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Request envelope: every portal endpoint takes `{"params": {...}}`.
#[derive(Debug, Serialize)]
struct Params<T> {
    params: T,
}

/// GetUsersActivity parameters
#[derive(Debug, Serialize)]
struct ActivityQuery<'a> {
    from_date: &'a str,
    to_date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

/// ValidateSignature parameters
#[derive(Debug, Serialize)]
struct SignatureQuery<'a> {
    signature: &'a str,
}

/// Portal API client
#[derive(Clone)]
pub struct PortalClient {
    config: PortalConfig,
    endpoints: Endpoints,
    client: Client,
    credentials: ApiCredentials,
    rate_limiter: Arc<RateLimiter>,
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    /// Create a new portal client
    ///
    /// # Errors
    ///
    /// Returns a config error if the base URL is invalid, the credentials
    /// are empty, or the HTTP client cannot be built.
    pub fn new(config: PortalConfig, credentials: ApiCredentials) -> Result<Self> {
        url::Url::parse(&config.base_url)?;

        if credentials.username.is_empty() || credentials.api_key.is_empty() {
            return Err(AgyliaError::auth(
                "API username and key are required",
                AuthErrorKind::MissingCredentials,
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| AgyliaError::config(format!("Failed to create HTTP client: {e}")))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_second).unwrap_or(NonZeroU32::MIN),
        );
        let rate_limiter = Arc::new(GovRateLimiter::direct(quota));

        Ok(Self {
            endpoints: Endpoints::new(config.base_url.clone()),
            config,
            client,
            credentials,
            rate_limiter,
        })
    }

    /// Create client with default configuration
    ///
    /// # Errors
    ///
    /// See [`PortalClient::new`].
    pub fn with_defaults(credentials: ApiCredentials) -> Result<Self> {
        Self::new(PortalConfig::default(), credentials)
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// API username used for Basic auth
    #[must_use]
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Signature builder keyed by this client's API key
    #[must_use]
    pub fn signature_builder(&self) -> SignatureBuilder {
        SignatureBuilder::from_credentials(&self.credentials)
    }

    /// Pager over all activity in `range`, starting from the first page
    #[must_use]
    pub fn activity_pager(&self, range: DateRange) -> ActivityPager<&Self> {
        ActivityPager::new(self, range)
    }

    /// Wait for rate limiter
    async fn wait_for_rate_limit(&self) {
        self.rate_limiter.until_ready().await;
    }

    fn authed_post(&self, url: &str) -> RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.api_key))
    }

    /// Map a non-success response to an error.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => AgyliaError::rate_limit(body, retry_after),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgyliaError::auth(
                format!("Portal rejected API credentials ({status}): {body}"),
                AuthErrorKind::InvalidCredentials,
            ),
            _ => AgyliaError::api(status.as_u16(), body),
        })
    }

    /// Convert a reqwest failure, reporting timeouts with the configured duration.
    fn transport_error(&self, err: reqwest::Error, endpoint: &str) -> AgyliaError {
        if err.is_timeout() {
            AgyliaError::timeout(self.config.timeout, endpoint)
        } else {
            err.into()
        }
    }

    /// Send a request, retrying retryable failures up to `max_retries` times.
    async fn send_with_retry<F>(&self, endpoint: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            self.wait_for_rate_limit().await;

            let result = match build().send().await {
                Ok(response) => Self::check_status(response).await,
                Err(e) => Err(self.transport_error(e, endpoint)),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = retry_backoff(&e);
                    warn!(
                        endpoint = %endpoint,
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retryable request failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, category = e.category(), error = %e, "Request failed");
                    return Err(e);
                }
                Ok(response) => return Ok(response),
            }
        }
    }

    /// Fetch one page of user activity.
    ///
    /// `cursor` is omitted from the request when `None` or empty.
    ///
    /// # Errors
    ///
    /// Returns a network/API error for transport failures and a parse error
    /// if the response lacks the `activities` array.
    #[instrument(skip(self, range), fields(from = %range.from_date(), to = %range.to_date()))]
    pub async fn get_users_activity(
        &self,
        range: &DateRange,
        cursor: Option<&str>,
    ) -> Result<ActivityPage> {
        let url = self.endpoints.users_activity();
        let body = Params {
            params: ActivityQuery {
                from_date: range.from_date(),
                to_date: range.to_date(),
                cursor: cursor.filter(|c| !c.is_empty()),
            },
        };

        debug!(url = %url, cursor = ?body.params.cursor, "Requesting user activity");

        let response = self
            .send_with_retry(crate::core::USERS_ACTIVITY_PATH, || {
                self.authed_post(&url)
                    .header(CONTENT_TYPE, "application/json")
                    .json(&body)
            })
            .await?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, crate::core::USERS_ACTIVITY_PATH))?;

        let page: ActivityPage = serde_json::from_str(&text).map_err(|e| {
            AgyliaError::parse_with_source(format!("Unexpected activity response shape: {e}"), e)
        })?;

        debug!(
            status = status.as_u16(),
            activity_count = page.len(),
            next_cursor = ?page.next_cursor(),
            "User activity page fetched"
        );

        Ok(page)
    }

    /// Fetch every activity page in `range`.
    ///
    /// # Errors
    ///
    /// Stops at the first failed page.
    pub async fn get_all_users_activity(&self, range: DateRange) -> Result<Vec<ActivityPage>> {
        self.activity_pager(range).collect_all().await
    }

    /// Submit a signature to the validation endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures or a non-success status.
    #[instrument(skip(self, signature))]
    pub async fn validate_signature(&self, signature: &str) -> Result<SignatureValidation> {
        let url = self.endpoints.validate_signature();
        let body = Params {
            params: SignatureQuery { signature },
        };

        debug!(url = %url, "Validating signature");

        let response = self
            .send_with_retry(crate::core::VALIDATE_SIGNATURE_PATH, || {
                self.authed_post(&url).header(ACCEPT, "json").json(&body)
            })
            .await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, crate::core::VALIDATE_SIGNATURE_PATH))?;

        info!(status, body = %body, "Signature validation response");

        Ok(SignatureValidation { status, body })
    }

    /// Build a fresh signature for `user` and validate it.
    ///
    /// # Errors
    ///
    /// Returns an auth error if signing fails (before any request is made),
    /// otherwise as [`PortalClient::validate_signature`].
    #[instrument(skip(self, user), fields(user = %user.username))]
    pub async fn validate_user(&self, user: &UserCredentials) -> Result<SignatureValidation> {
        let signature = self.signature_builder().sign(user)?;
        self.validate_signature(&signature).await
    }
}

#[async_trait]
impl ActivityFetcher for PortalClient {
    async fn fetch_activity_page(
        &self,
        range: &DateRange,
        cursor: Option<&str>,
    ) -> Result<ActivityPage> {
        self.get_users_activity(range, cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ApiCredentials {
        ApiCredentials::new("example.admin", "key")
    }

    #[test]
    fn test_portal_config_default() {
        let config = PortalConfig::default();
        assert_eq!(config.base_url, crate::core::api_base_url());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit_per_second, 5);
        assert_eq!(config.max_retries, 0);
        assert!(config.user_agent.starts_with("agylia-sdk/"));
    }

    #[test]
    fn test_retry_backoff_caps_server_hint() {
        let long = AgyliaError::rate_limit("slow down", Some(Duration::from_secs(3600)));
        assert_eq!(retry_backoff(&long), MAX_RETRY_DELAY);

        let short = AgyliaError::rate_limit("slow down", Some(Duration::from_secs(7)));
        assert_eq!(retry_backoff(&short), Duration::from_secs(7));
        assert_eq!(retry_backoff(&AgyliaError::api(503, "")), Duration::from_millis(500));
    }

    #[test]
    fn test_portal_config_builder() {
        let config = PortalConfig::builder()
            .with_base_url("https://custom.example.com")
            .with_timeout(Duration::from_secs(5))
            .with_rate_limit(10)
            .with_max_retries(2);

        assert_eq!(config.base_url, "https://custom.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.rate_limit_per_second, 10);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = PortalClient::new(PortalConfig::default().with_base_url("not a url"), creds())
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = PortalClient::new(
            PortalConfig::default().with_base_url("https://portal.example.com"),
            ApiCredentials::new("", ""),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AgyliaError::Auth {
                kind: AuthErrorKind::MissingCredentials,
                ..
            }
        ));
    }

    #[test]
    fn test_activity_query_omits_missing_cursor() {
        let body = Params {
            params: ActivityQuery {
                from_date: "2017-01-01T00:00:00.000Z",
                to_date: "2020-01-01T00:00:00.000Z",
                cursor: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "params": {
                    "from_date": "2017-01-01T00:00:00.000Z",
                    "to_date": "2020-01-01T00:00:00.000Z"
                }
            })
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = PortalClient::new(
            PortalConfig::default().with_base_url("https://portal.example.com"),
            ApiCredentials::new("example.admin", "very-secret"),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("very-secret"));
    }
}
