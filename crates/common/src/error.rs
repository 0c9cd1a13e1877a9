use serde::{Deserialize, Serialize};

/// Machine-readable failure kind, serialized in operation replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Resource absent. Non-fatal on optional-metadata read paths.
    NotFound,
    /// Policy denies the operation, or the upstream store rejected our
    /// credentials / rate-limited us. Must not be retried without backoff.
    Unauthorized,
    /// Optimistic-concurrency version tag was stale on write.
    Conflict,
    /// Redemption token was already consumed.
    AlreadyConsumed,
    /// Token (or other time-boxed resource) past its TTL, or never existed.
    Expired,
    /// Malformed input: path, declaration header, version string.
    Invalid,
    /// Transient network/service failure talking to the remote store.
    RemoteUnavailable,
    /// Anything else.
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    Unauthorized(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("token already consumed")]
    AlreadyConsumed,
    #[error("expired or unknown: {0}")]
    Expired(String),
    #[error("invalid: {0}")]
    Invalid(String),
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    #[must_use]
    pub fn expired(what: impl Into<String>) -> Self {
        Self::Expired(what.into())
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteUnavailable(message.into())
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::AlreadyConsumed => ErrorKind::AlreadyConsumed,
            Self::Expired(_) => ErrorKind::Expired,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Self::Message(_) | Self::Io(_) | Self::SerdeJson(_) => ErrorKind::Internal,
        }
    }

    /// True when the error means "resource absent" rather than a real fault.
    /// Optional-metadata read paths use this to substitute defaults.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Shared context trait ────────────────────────────────────────────────────

/// Trait for error types that can be constructed from a plain message string.
///
/// Implement this for your crate's error type, then invoke [`impl_context!`]
/// in your error module to get `.context()` and `.with_context()` on `Result`
/// and `Option`.
pub trait FromMessage: Sized {
    fn from_message(message: String) -> Self;
}

/// Generate a crate-local `Context` trait with `.context()` and `.with_context()`
/// methods on `Result` and `Option`.
///
/// Invoke inside a module that defines `Error: FromMessage` and
/// `type Result<T> = std::result::Result<T, Error>`.
#[macro_export]
macro_rules! impl_context {
    () => {
        pub trait Context<T> {
            fn context(self, context: impl Into<String>) -> Result<T>;
            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C;
        }

        impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                let ctx = context.into();
                self.map_err(|source| {
                    <Error as $crate::FromMessage>::from_message(format!("{ctx}: {source}"))
                })
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.map_err(|source| {
                    let ctx = f().into();
                    <Error as $crate::FromMessage>::from_message(format!("{ctx}: {source}"))
                })
            }
        }

        impl<T> Context<T> for Option<T> {
            fn context(self, context: impl Into<String>) -> Result<T> {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(context.into()))
            }

            fn with_context<C, F>(self, f: F) -> Result<T>
            where
                C: Into<String>,
                F: FnOnce() -> C,
            {
                self.ok_or_else(|| <Error as $crate::FromMessage>::from_message(f().into()))
            }
        }
    };
}

impl_context!();

/// Typed failure shape returned to the invocation-dispatch collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_taxonomy() {
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(Error::AlreadyConsumed.kind(), ErrorKind::AlreadyConsumed);
        assert_eq!(Error::invalid("bad path").kind(), ErrorKind::Invalid);
        assert_eq!(Error::message("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn failure_serializes_snake_case_kind() {
        let failure = Failure::from(&Error::conflict("stale tag"));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "conflict");
        assert!(json["message"].as_str().unwrap().contains("stale tag"));
    }

    #[test]
    fn context_wraps_message() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("io boom"));
        let wrapped = res.context("reading manifest");
        assert!(wrapped.unwrap_err().to_string().contains("reading manifest"));
    }
}
