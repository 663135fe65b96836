// ── Core error types ──
//
// User-facing errors from vmanly-core. The `From<vmanly_api::Error>` impl
// translates transport-layer errors into the sync engine's taxonomy so
// consumers match on one enum.

use thiserror::Error;

use crate::model::EntityKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to controller timed out")]
    Timeout,

    // ── Resolution errors ────────────────────────────────────────────
    #[error("{} not found: {value}{}", .kind.label(), type_suffix(.entity_type.as_deref()))]
    NotFound {
        kind: EntityKind,
        entity_type: Option<String>,
        value: String,
    },

    // ── Remote errors ────────────────────────────────────────────────
    #[error(
        "Controller error{}: {message}{}",
        status_suffix(.status.as_ref().copied()),
        details_suffix(.details.as_deref())
    )]
    Transport {
        status: Option<u16>,
        message: String,
        details: Option<String>,
    },

    #[error("Action {action_id} failed: {activity}")]
    ActionFailed { action_id: String, activity: String },

    #[error("Action {action_id} still running after {attempts} status checks")]
    ActionTimeout { action_id: String, attempts: u32 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Cannot compare bodies: {message}")]
    Shape { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn not_found(
        kind: EntityKind,
        entity_type: Option<&str>,
        value: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind,
            entity_type: entity_type.map(str::to_owned),
            value: value.into(),
        }
    }
}

fn type_suffix(entity_type: Option<&str>) -> String {
    entity_type.map(|t| format!(" (type {t})")).unwrap_or_default()
}

fn status_suffix(status: Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn details_suffix(details: Option<&str>) -> String {
    details.map(|d| format!(": {d}")).unwrap_or_default()
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vmanly_api::Error> for CoreError {
    fn from(err: vmanly_api::Error) -> Self {
        match err {
            vmanly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vmanly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                        details: None,
                    }
                }
            }
            vmanly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vmanly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vmanly_api::Error::Api {
                status,
                message,
                details,
                code: _,
            } => CoreError::Transport {
                status: Some(status),
                message,
                details,
            },
            vmanly_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                status: None,
                message: format!("unexpected response body: {message}"),
                details: None,
            },
        }
    }
}
