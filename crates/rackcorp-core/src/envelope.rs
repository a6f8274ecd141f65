//! Response envelopes for the two RackCorp endpoint styles.
//!
//! Both styles answer with the same header (`code`, `message`, optional `debug`).
//! The legacy endpoint puts its payload in a command specific field beside the
//! header (`devices`, `rcTransactions`, `contract`, …), the REST endpoint always
//! uses `data`. Each operation picks its envelope type statically.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

const PREVIEW_LIMIT: usize = 256;

/// Header shared by every response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseHeader {
    /// Provider status code, `"OK"` on success
    #[serde(default)]
    pub code: String,
    /// Human readable status message
    #[serde(default)]
    pub message: String,
    /// Opaque debug detail
    #[serde(default)]
    pub debug: Option<Value>,
}

impl ResponseHeader {
    /// Success predicate: `code` equals `"OK"` ignoring ASCII case.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code.eq_ignore_ascii_case("OK")
    }

    /// Convert the header into a provider error for `operation`.
    #[must_use]
    pub fn into_error(self, operation: &str) -> Error {
        Error::Provider {
            operation: operation.to_string(),
            code: self.code,
            message: self.message,
            debug: self.debug,
        }
    }

    /// Fail unless the header reports success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when `code` is not `OK`.
    pub fn ensure_ok(self, operation: &str) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(self.into_error(operation))
        }
    }
}

/// Envelope returned by the REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RestEnvelope<T> {
    /// Shared header
    #[serde(flatten)]
    pub header: ResponseHeader,
    /// Resource payload
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> RestEnvelope<T> {
    /// Return `data`, failing on a non-OK code or a missing payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`].
    pub fn into_data(self, operation: &str) -> Result<T> {
        require_payload(self.header, operation, "data", self.data)
    }

    /// Acknowledge a call whose only result is the status code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when `code` is not `OK`.
    pub fn into_ack(self, operation: &str) -> Result<ResponseHeader> {
        self.header.ensure_ok(operation)
    }
}

/// Envelope returned by the legacy command endpoint.
///
/// `P` names the command specific payload fields that sit beside the header.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEnvelope<P> {
    /// Shared header
    #[serde(flatten)]
    pub header: ResponseHeader,
    /// Command specific payload
    #[serde(flatten)]
    pub payload: P,
}

impl<P> LegacyEnvelope<P> {
    /// Return the payload after checking the code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when `code` is not `OK`.
    pub fn into_payload(self, operation: &str) -> Result<P> {
        self.header.ensure_ok(operation)?;
        Ok(self.payload)
    }

    /// Check the code, then pull a mandatory value out of the payload.
    ///
    /// `field` names the payload member for the error message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] on a non-OK code or when `select` yields `None`.
    pub fn require<T, F>(self, operation: &str, field: &str, select: F) -> Result<T>
    where
        F: FnOnce(P) -> Option<T>,
    {
        let value = select(self.payload);
        require_payload(self.header, operation, field, value)
    }
}

fn require_payload<T>(
    header: ResponseHeader,
    operation: &str,
    field: &str,
    value: Option<T>,
) -> Result<T> {
    let header = header.ensure_ok(operation)?;
    value.ok_or_else(|| Error::Provider {
        operation: operation.to_string(),
        code: header.code,
        message: format!("response is missing `{field}`: {}", header.message),
        debug: header.debug,
    })
}

/// Deserialize a response body into the declared envelope.
///
/// # Errors
///
/// Returns [`Error::Decode`] for a body that does not fit `E`. The value is a
/// truncated preview of the body; on a non-success status the reason also
/// names the status.
pub fn decode<E>(status: StatusCode, body: &[u8]) -> Result<E>
where
    E: DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|err| {
        if status.is_success() {
            Error::decode("response body", preview(body), err)
        } else {
            Error::decode("response body", preview(body), format!("HTTP {status}: {err}"))
        }
    })
}

fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > PREVIEW_LIMIT {
        let mut cut: String = text.chars().take(PREVIEW_LIMIT).collect();
        cut.push('…');
        cut
    } else {
        text.into_owned()
    }
}
