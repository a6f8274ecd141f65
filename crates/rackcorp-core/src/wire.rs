//! Codecs for the provider's wire encodings.
//!
//! RackCorp emits the same field as a JSON number in one response and as a JSON
//! string in the next, suffixes IP addresses with a CIDR prefix length, and sends
//! timestamps as unix-epoch seconds where `0` means "never". The helpers here turn
//! those shapes into plain Rust values and report failures as [`Error::Decode`]
//! naming the field and raw value.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Catch-all map for provider fields that have no typed counterpart yet.
pub type Extra = BTreeMap<String, Value>;

/// A number that may arrive as a JSON number or a JSON string.
///
/// The raw text is kept so that conversion failures can quote what the provider sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NumberString(String);

impl NumberString {
    /// Wrap raw text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw text as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the provider sent an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parse as a signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming `field` when the text is not an integer.
    pub fn to_i64(&self, field: &str) -> Result<i64> {
        self.0
            .trim()
            .parse::<i64>()
            .map_err(|err| Error::decode(field, self.0.as_str(), err))
    }

    /// Parse as a float.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming `field` when the text is not a number.
    pub fn to_f64(&self, field: &str) -> Result<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .map_err(|err| Error::decode(field, self.0.as_str(), err))
    }
}

impl fmt::Display for NumberString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NumberString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumberStringVisitor;

        impl Visitor<'_> for NumberStringVisitor {
            type Value = NumberString;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a numeric string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(NumberString(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
                Ok(NumberString(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(NumberString(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(NumberString(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
                Ok(NumberString(v.to_string()))
            }
        }

        deserializer.deserialize_any(NumberStringVisitor)
    }
}

/// Optional integer: absent or empty text is `None`.
///
/// # Errors
///
/// Returns [`Error::Decode`] when present text is not an integer.
pub fn opt_i64(field: &str, raw: Option<&NumberString>) -> Result<Option<i64>> {
    match raw {
        Some(value) if !value.is_empty() => value.to_i64(field).map(Some),
        _ => Ok(None),
    }
}

/// Required integer.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the value is absent, empty, or not an integer.
pub fn required_i64(field: &str, raw: Option<&NumberString>) -> Result<i64> {
    opt_i64(field, raw)?.ok_or_else(|| Error::decode(field, "", "field is missing"))
}

/// Optional float: absent or empty text is `None`.
///
/// # Errors
///
/// Returns [`Error::Decode`] when present text is not a number.
pub fn opt_f64(field: &str, raw: Option<&NumberString>) -> Result<Option<f64>> {
    match raw {
        Some(value) if !value.is_empty() => value.to_f64(field).map(Some),
        _ => Ok(None),
    }
}

/// Optional identifier kept as text (order and contract ids are strings to callers).
#[must_use]
pub fn opt_text(raw: Option<NumberString>) -> Option<String> {
    raw.filter(|value| !value.is_empty())
        .map(NumberString::into_string)
}

/// Unix-epoch seconds to an instant. Absent, empty and `0` all mean "unset".
///
/// # Errors
///
/// Returns [`Error::Decode`] when the value is not an integer or out of range.
pub fn epoch_seconds(field: &str, raw: Option<&NumberString>) -> Result<Option<DateTime<Utc>>> {
    match opt_i64(field, raw)? {
        None | Some(0) => Ok(None),
        Some(secs) => DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(|| {
            Error::decode(field, secs.to_string(), "timestamp out of range")
        }),
    }
}

/// Parse an IP address that may carry a CIDR suffix (`"10.0.0.5/24"`).
///
/// Empty input is `None`. Everything from the first `/` on is discarded.
///
/// # Errors
///
/// Returns [`Error::Decode`] when the address part is not a valid IP.
pub fn parse_ip(field: &str, raw: &str) -> Result<Option<IpAddr>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let address = trimmed
        .split_once('/')
        .map_or(trimmed, |(address, _prefix)| address);
    address
        .parse::<IpAddr>()
        .map(Some)
        .map_err(|err| Error::decode(field, raw, err))
}

/// Treat empty strings as absent.
#[must_use]
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

/// Deserialize a boolean flag the provider may encode as `true`, `1`, `"1"`, `"Y"`…
///
/// `null` is `false`.
///
/// # Errors
///
/// Fails when the value is not recognisable as a flag.
pub fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(flag),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "y" | "yes" => Ok(true),
            "" | "0" | "false" | "n" | "no" => Ok(false),
            _ => Err(de::Error::invalid_value(
                Unexpected::Str(&text),
                &"a boolean flag",
            )),
        },
        Value::Array(_) => Err(de::Error::invalid_type(Unexpected::Seq, &"a boolean flag")),
        Value::Object(_) => Err(de::Error::invalid_type(Unexpected::Map, &"a boolean flag")),
    }
}

/// Deserialize an optional integer sent as a number or a numeric string.
///
/// `null` and empty text are `None`.
///
/// # Errors
///
/// Fails when the text is not an integer.
pub fn lenient_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberString>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => raw
            .as_str()
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|err| de::Error::custom(format!("invalid integer {:?}: {err}", raw.as_str()))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default)]
        id: Option<NumberString>,
        #[serde(default, deserialize_with = "flexible_bool")]
        flag: bool,
        #[serde(default, deserialize_with = "lenient_opt_i64")]
        port: Option<i64>,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn number_string_accepts_both_encodings() {
        let from_number = sample(json!({"id": 5075}));
        let from_string = sample(json!({"id": "5075"}));

        assert_eq!(
            from_number.id.as_ref().unwrap().to_i64("id").unwrap(),
            from_string.id.as_ref().unwrap().to_i64("id").unwrap()
        );
    }

    #[test]
    fn number_string_rejects_non_numeric() {
        let parsed = sample(json!({"id": "abc"}));
        let err = required_i64("deviceId", parsed.id.as_ref()).unwrap_err();
        assert_eq!(
            err,
            Error::Decode {
                field: "deviceId".to_string(),
                value: "abc".to_string(),
                reason: "invalid digit found in string".to_string(),
            }
        );
    }

    #[test]
    fn number_string_rejects_objects() {
        let result = serde_json::from_value::<Sample>(json!({"id": {"nested": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_number() {
        let err = required_i64("deviceId", None).unwrap_err();
        assert!(matches!(err, Error::Decode { ref reason, .. } if reason == "field is missing"));
    }

    #[test]
    fn empty_optional_number_is_none() {
        let parsed = sample(json!({"id": ""}));
        assert_eq!(opt_i64("id", parsed.id.as_ref()).unwrap(), None);
        assert_eq!(opt_i64("id", None).unwrap(), None);
    }

    #[test]
    fn float_numbers_parse() {
        let parsed = sample(json!({"id": 12.5}));
        assert_eq!(opt_f64("traffic", parsed.id.as_ref()).unwrap(), Some(12.5));
    }

    #[test]
    fn opt_text_keeps_digits() {
        assert_eq!(
            opt_text(Some(NumberString::new("123"))),
            Some("123".to_string())
        );
        assert_eq!(opt_text(Some(NumberString::new(""))), None);
    }

    #[test]
    fn cidr_suffix_is_stripped() {
        let with_suffix = parse_ip("primaryIP", "10.0.0.5/24").unwrap();
        let bare = parse_ip("primaryIP", "10.0.0.5").unwrap();
        assert_eq!(with_suffix, bare);
        assert_eq!(bare, Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn ipv6_with_prefix() {
        let ip = parse_ip("primaryIP", "2001:db8::1/64").unwrap();
        assert_eq!(ip, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn invalid_ip_is_decode_error() {
        let err = parse_ip("primaryIP", "300.1.1.1/24").unwrap_err();
        assert!(matches!(
            err,
            Error::Decode { ref field, ref value, .. } if field == "primaryIP" && value == "300.1.1.1/24"
        ));
    }

    #[test]
    fn empty_ip_is_unset() {
        assert_eq!(parse_ip("primaryIP", "").unwrap(), None);
    }

    #[test]
    fn epoch_zero_is_unset() {
        assert_eq!(
            epoch_seconds("dateCreated", Some(&NumberString::new("0"))).unwrap(),
            None
        );
        assert_eq!(epoch_seconds("dateCreated", None).unwrap(), None);
    }

    #[test]
    fn epoch_converts_to_instant() {
        let when = epoch_seconds("dateCreated", Some(&NumberString::new("1700000000")))
            .unwrap()
            .unwrap();
        assert_eq!(when.timestamp(), 1_700_000_000);
    }

    #[test]
    fn epoch_out_of_range() {
        let err = epoch_seconds("dateCreated", Some(&NumberString::new(i64::MAX.to_string())))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn flexible_bool_encodings() {
        assert!(sample(json!({"flag": true})).flag);
        assert!(sample(json!({"flag": 1})).flag);
        assert!(sample(json!({"flag": "1"})).flag);
        assert!(sample(json!({"flag": "Y"})).flag);
        assert!(!sample(json!({"flag": "0"})).flag);
        assert!(!sample(json!({"flag": null})).flag);
        assert!(!sample(json!({})).flag);
        assert!(serde_json::from_value::<Sample>(json!({"flag": "maybe"})).is_err());
    }

    #[test]
    fn non_empty_filters_blank() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
    }

    #[test]
    fn lenient_integer_encodings() {
        assert_eq!(sample(json!({"port": 22})).port, Some(22));
        assert_eq!(sample(json!({"port": "443"})).port, Some(443));
        assert_eq!(sample(json!({"port": ""})).port, None);
        assert_eq!(sample(json!({"port": null})).port, None);
        assert_eq!(sample(json!({})).port, None);
        assert!(serde_json::from_value::<Sample>(json!({"port": "ssh"})).is_err());
    }
}
