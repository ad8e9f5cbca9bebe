//! Error types. Internally the crate works with `anyhow` (`Res<T>`), and at the public boundary each
//! error is tagged with an `ErrorType` so that callers can react to the kind of failure without
//! parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an `Error` so that callers can decide what to show the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// There is no signed-in user, or the caller acted on behalf of a user that is not signed in.
    /// The network was not touched.
    Unauthenticated,
    /// The remote service answered with an HTML document. The endpoint URL is almost certainly
    /// wrong, so retrying will not help.
    UpstreamMisconfigured,
    /// The remote service reported that the `id` + `userId` pair matched nothing. The service does
    /// not distinguish a missing record from a record that belongs to another user.
    NotFoundOrForbidden,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Any other transport failure, including non-success HTTP statuses.
    Network,
    /// The remote service answered with a shape that cannot satisfy the operation, e.g. a create
    /// that returned no record.
    InvalidResponse,
    /// The caller supplied input that cannot be sent, e.g. an empty description.
    Validation,
    /// Problems with the configuration file or home directory.
    Config,
}

serde_plain::derive_display_from_serialize!(ErrorType);

impl ErrorType {
    /// Whether the failure is worth retrying by hand. Nothing is retried automatically.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorType::Timeout | ErrorType::Network)
    }

    /// A message that can be shown to a user in a notification or banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorType::Unauthenticated => "You need to sign in first.",
            ErrorType::UpstreamMisconfigured => {
                "The transaction service returned a web page instead of data. \
                Check the configured API URL."
            }
            ErrorType::NotFoundOrForbidden => {
                "Transaction not found or it does not belong to you."
            }
            ErrorType::Timeout | ErrorType::Network => {
                "Could not reach the transaction service. Please try again."
            }
            ErrorType::InvalidResponse => "The transaction service returned an unexpected response.",
            ErrorType::Validation => "Some of the transaction fields are invalid.",
            ErrorType::Config => "The configuration could not be loaded.",
        }
    }
}

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Creates an `Error` from a message.
    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Whether this error matches `error_type`.
    pub fn is(&self, error_type: ErrorType) -> bool {
        self.error_type == error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Include the whole context chain
        write!(f, "{}: {:#}", self.error_type, self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into the public `Result` by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_display_includes_type_and_context() {
        let res: Res<()> = Err(anyhow::anyhow!("connection reset")).context("Failed to list");
        let err = res.pub_result(ErrorType::Network).unwrap_err();
        let s = err.to_string();
        assert!(s.starts_with("network: "), "{s}");
        assert!(s.contains("Failed to list"), "{s}");
        assert!(s.contains("connection reset"), "{s}");
    }

    #[test]
    fn test_transient() {
        assert!(ErrorType::Timeout.is_transient());
        assert!(ErrorType::Network.is_transient());
        assert!(!ErrorType::UpstreamMisconfigured.is_transient());
        assert!(!ErrorType::NotFoundOrForbidden.is_transient());
        assert!(!ErrorType::Unauthenticated.is_transient());
    }

    #[test]
    fn test_is() {
        let err = Error::msg(ErrorType::Unauthenticated, "no user");
        assert!(err.is(ErrorType::Unauthenticated));
        assert!(!err.is(ErrorType::Network));
    }
}
