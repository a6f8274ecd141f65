//! Configuration structures for RackCorp clients.
//!
//! This module holds the endpoint settings shared by both API styles and knows how
//! to build the two URL shapes: the fixed legacy command endpoint and the REST
//! resource paths.

use crate::client::DEFAULT_TIMEOUT_SECS;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.rackcorp.net/api/";

/// Default API version segment.
pub const DEFAULT_API_VERSION: &str = "v2.8";

/// Configuration for a RackCorp client instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RackcorpConfig {
    /// API base URL (both endpoint styles hang off it)
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version path segment
    #[validate(length(min = 1))]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whole-call timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional user agent override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl RackcorpConfig {
    /// Create a configuration pointing at the public RackCorp API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: None,
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version segment.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the offending fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
    }

    /// URL of the legacy command endpoint: `{base}/rest/{apiVersion}/json.php`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the URL cannot be constructed.
    pub fn legacy_url(&self) -> Result<Url, Error> {
        let path = format!("rest/{}/json.php", self.api_version);
        Ok(self.parse_base_url()?.join(&path)?)
    }

    /// URL of a REST resource: `{base}/{apiVersion}/{segments…}`.
    ///
    /// Each segment is percent-encoded, so `/`, `?` and `#` inside an id stay
    /// part of that segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a `.` or `..` segment and
    /// [`Error::Transport`] if the URL cannot be constructed.
    pub fn rest_url(&self, segments: &[&str]) -> Result<Url, Error> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(Error::Validation(format!(
                "invalid resource path segment {dot:?}"
            )));
        }
        let mut url = self.parse_base_url()?;
        url.path_segments_mut()
            .map_err(|()| {
                Error::Transport(format!("base URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push(&self.api_version)
            .extend(segments);
        Ok(url)
    }

    /// Parse the base URL, normalised to end with `/` so joins append.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the URL cannot be parsed.
    pub fn parse_base_url(&self) -> Result<Url, Error> {
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?)
    }
}

impl Default for RackcorpConfig {
    fn default() -> Self {
        Self::new()
    }
}
