//! Converts the loosely-typed bodies returned by the spreadsheet proxy into `Transaction` values.
//!
//! The proxy is inconsistent: a list may come back as a bare array or wrapped as `{"data": [...]}`,
//! amounts may be locale-formatted strings, and a misconfigured URL yields an HTML page with a
//! success status. A body is first classified into a `RawResponse`, then `normalize` turns it into
//! transactions. Malformed shapes degrade to an empty list; only HTML is an error.

use crate::error::{Error, ErrorType, Result};
use crate::model::Transaction;
use serde_json::Value;
use tracing::{trace, warn};

/// Markers that identify an HTML document. Compared case-insensitively.
const HTML_MARKERS: &[&str] = &["<!doctype html", "<html"];

/// The shapes a response body can take.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// A bare JSON array of candidate records.
    Records(Vec<Value>),
    /// An object wrapping the records in its `data` field.
    Envelope(Vec<Value>),
    /// An HTML document, either as the raw body or as a JSON string.
    Html(String),
    /// Anything else: objects without `data`, scalars, unparsable text.
    Other(Value),
}

impl RawResponse {
    /// Classifies a response body.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) if looks_like_html(body) => RawResponse::Html(body.to_string()),
            Err(e) => {
                trace!("Response body is not JSON: {e}");
                RawResponse::Other(Value::String(body.to_string()))
            }
        }
    }

    /// Classifies an already-parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(records) => RawResponse::Records(records),
            Value::Object(mut obj) => match obj.remove("data") {
                Some(Value::Array(records)) => RawResponse::Envelope(records),
                Some(data) => {
                    obj.insert("data".to_string(), data);
                    RawResponse::Other(Value::Object(obj))
                }
                None => RawResponse::Other(Value::Object(obj)),
            },
            Value::String(s) if looks_like_html(&s) => RawResponse::Html(s),
            other => RawResponse::Other(other),
        }
    }

    /// Looks up `key` when the response is a plain object, e.g. the `deleted` count of a delete.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            RawResponse::Other(Value::Object(obj)) => obj.get(key),
            _ => None,
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, RawResponse::Html(_))
    }
}

/// Whether `text` contains an HTML document marker.
pub fn looks_like_html(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    HTML_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Fails with `ErrorType::UpstreamMisconfigured` if `response` is an HTML document.
pub fn reject_html(response: &RawResponse) -> Result<()> {
    match response {
        RawResponse::Html(body) => {
            let preview: String = body.chars().take(80).collect();
            Err(Error::msg(
                ErrorType::UpstreamMisconfigured,
                format!("Expected JSON from the transaction service but received HTML: {preview}"),
            ))
        }
        _ => Ok(()),
    }
}

/// Turns a `RawResponse` into transactions, preserving server order.
///
/// # Errors
/// - `ErrorType::UpstreamMisconfigured` when the response is an HTML document. Nothing else fails:
///   unknown shapes produce an empty list and records that cannot be understood are skipped.
pub fn normalize(response: RawResponse) -> Result<Vec<Transaction>> {
    reject_html(&response)?;
    let records = match response {
        RawResponse::Records(records) | RawResponse::Envelope(records) => records,
        RawResponse::Html(_) => return Ok(Vec::new()),
        RawResponse::Other(value) => {
            warn!("Unexpected response shape, treating it as empty: {value}");
            return Ok(Vec::new());
        }
    };

    let mut transactions = Vec::with_capacity(records.len());
    for (ix, record) in records.iter().enumerate() {
        match Transaction::from_raw(record) {
            Ok(t) => transactions.push(t),
            Err(e) => warn!("Skipping record {ix}: {e:#}"),
        }
    }
    Ok(transactions)
}
