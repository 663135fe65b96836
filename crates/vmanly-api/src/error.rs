use thiserror::Error;

/// Top-level error type for the `vmanly-api` crate.
///
/// Covers every failure mode of the dataservice client: session
/// handshake, transport, structured API errors, and malformed bodies.
/// `vmanly-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or the session lapsed and the controller answered
    /// with its login page.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Dataservice ─────────────────────────────────────────────────
    /// Structured error from the dataservice, parsed from the
    /// `{"error": {"message", "details", "code"}}` body.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
        code: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is gone and a fresh login might help.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 503 || *status == 504,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Extract the dataservice error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detection() {
        let err = Error::Api {
            status: 404,
            message: "missing".into(),
            details: None,
            code: None,
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));

        let err = Error::Api {
            status: 400,
            message: "bad".into(),
            details: None,
            code: Some("POLICY0001".into()),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.api_error_code(), Some("POLICY0001"));
    }

    #[test]
    fn auth_errors_are_expired() {
        let err = Error::Authentication {
            message: "login page".into(),
        };
        assert!(err.is_auth_expired());
        assert!(!err.is_transient());
    }
}
