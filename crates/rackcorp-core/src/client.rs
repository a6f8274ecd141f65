//! HTTP transport and request dispatch.
//!
//! [`ServiceClient`] owns the configuration, the credential-bearing
//! [`Transport`] and the optional debug log sink. Resource clients build on its
//! two entry points: [`ServiceClient::legacy`] for the `json.php` command
//! endpoint and [`ServiceClient::rest`] for resource paths.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::RackcorpConfig;
use crate::credential::Credential;
use crate::envelope;
use crate::error::{Error, Result};

/// Default whole-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent when the configuration does not override it.
pub const USER_AGENT: &str = concat!("rackcorpapi/", env!("CARGO_PKG_VERSION"));

const JSON_MEDIA_TYPE: &str = "application/json";

/// Receives human readable request/response trace lines.
pub type DebugLog = Arc<dyn Fn(&str) + Send + Sync>;

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: Url,
    /// JSON body, if any
    pub body: Option<Vec<u8>>,
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response from a status and body.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends requests to the provider.
///
/// Implementations attach authentication and report failures as
/// [`Error::Transport`] or [`Error::Timeout`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed.
    async fn send(&self, request: ApiRequest) -> Result<RawResponse>;
}

/// `reqwest` backed transport using HTTP Basic authentication.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    credential: Credential,
}

impl HttpTransport {
    /// Build a transport honouring the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be constructed.
    pub fn new(credential: Credential, config: &RackcorpConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| USER_AGENT.to_string());
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(config.timeout())
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { http, credential })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .basic_auth(
                self.credential.uuid(),
                Some(self.credential.expose_secret()),
            )
            .header(ACCEPT, JSON_MEDIA_TYPE);
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, JSON_MEDIA_TYPE).body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| classify(&err, "failed to perform HTTP request"))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| classify(&err, "failed to read HTTP response body"))?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

fn classify(err: &reqwest::Error, what: &str) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{what}: {err}"))
    } else {
        Error::Transport(format!("{what}: {err}"))
    }
}

/// Body of a legacy command call: `{"cmd": …, <params>}`.
#[derive(Serialize)]
struct LegacyRequest<'a, P: ?Sized> {
    cmd: &'a str,
    #[serde(flatten)]
    params: &'a P,
}

/// Builder for [`ServiceClient`].
#[derive(Clone)]
pub struct ServiceClientBuilder {
    credential: Credential,
    config: RackcorpConfig,
    transport: Option<Arc<dyn Transport>>,
    debug_log: Option<DebugLog>,
}

impl ServiceClientBuilder {
    /// Start from the default configuration.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            config: RackcorpConfig::default(),
            transport: None,
            debug_log: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: RackcorpConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    /// Override the API version segment.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.config = self.config.with_api_version(api_version);
        self
    }

    /// Override the whole-call timeout, rounded up to whole seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let seconds = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.config = self.config.with_timeout(seconds);
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.with_user_agent(user_agent);
        self
    }

    /// Use a custom transport instead of [`HttpTransport`].
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Install a debug log sink.
    #[must_use]
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = Some(debug_log);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration.
    pub fn build(self) -> Result<ServiceClient> {
        self.config.check()?;
        let base_url = self
            .config
            .parse_base_url()
            .map_err(|err| Error::Config(format!("Invalid base URL: {err}")))?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.credential, &self.config)?),
        };

        Ok(ServiceClient {
            config: Arc::new(self.config),
            base_url,
            transport,
            debug_log: self.debug_log,
        })
    }
}

/// Shared request dispatcher for the legacy and REST endpoints.
#[derive(Clone)]
pub struct ServiceClient {
    config: Arc<RackcorpConfig>,
    base_url: Url,
    transport: Arc<dyn Transport>,
    debug_log: Option<DebugLog>,
}

impl ServiceClient {
    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the active configuration.
    #[must_use]
    pub fn config(&self) -> &RackcorpConfig {
        &self.config
    }

    /// Install or clear the debug log sink.
    pub fn set_debug_log(&mut self, debug_log: Option<DebugLog>) {
        self.debug_log = debug_log;
    }

    /// POST a legacy command and decode the response as `E`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`], [`Error::Timeout`] or [`Error::Decode`].
    /// Envelope status codes are left to the caller.
    pub async fn legacy<P, E>(&self, command: &str, params: &P) -> Result<E>
    where
        P: Serialize + ?Sized,
        E: DeserializeOwned,
    {
        let url = self.config.legacy_url()?;
        let body = encode_body(&LegacyRequest {
            cmd: command,
            params,
        })?;
        self.exchange(Method::POST, url, Some(body)).await
    }

    /// Call the REST resource named by `segments` and decode the response as `E`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`], [`Error::Timeout`] or [`Error::Decode`],
    /// and [`Error::Validation`] for a `.` or `..` segment.
    /// Envelope status codes are left to the caller.
    pub async fn rest<B, E>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<E>
    where
        B: Serialize + ?Sized,
        E: DeserializeOwned,
    {
        let url = self.config.rest_url(segments)?;
        let body = body.map(encode_body).transpose()?;
        self.exchange(method, url, body).await
    }

    async fn exchange<E>(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<E>
    where
        E: DeserializeOwned,
    {
        debug!(%method, %url, "dispatching RackCorp request");
        self.emit(|| format!("Rackcorp API HTTP request: {method} {url}"));
        if let Some(body) = &body {
            self.emit(|| {
                format!(
                    "Rackcorp API HTTP request body: '{}'",
                    String::from_utf8_lossy(body)
                )
            });
        }

        let response = self
            .transport
            .send(ApiRequest { method, url, body })
            .await?;

        debug!(
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "received RackCorp response"
        );
        self.emit(|| format!("Rackcorp API HTTP response status: {}", response.status));
        self.emit(|| {
            format!(
                "Rackcorp API HTTP response body: '{}'",
                String::from_utf8_lossy(&response.body)
            )
        });

        envelope::decode(response.status, &response.body)
    }

    fn emit<F>(&self, line: F)
    where
        F: FnOnce() -> String,
    {
        let Some(sink) = &self.debug_log else {
            return;
        };
        let line = line();
        if catch_unwind(AssertUnwindSafe(|| sink(&line))).is_err() {
            warn!("RackCorp debug log sink panicked; line dropped");
        }
    }
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.config.api_version)
            .field("debug_log", &self.debug_log.is_some())
            .finish_non_exhaustive()
    }
}

fn encode_body<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(value)
        .map_err(|err| Error::Transport(format!("failed to JSON encode request body: {err}")))
}

/// Run `call`, abandoning it with [`Error::Cancelled`] once `deadline` passes.
///
/// Dropping the returned future cancels the call as well.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] on expiry, otherwise the call's own result.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| Error::Cancelled(format!("call abandoned after {deadline:?}")))?
}
