//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use vmanly_config::ConfigError;
use vmanly_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const ACTION_FAILED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(vmanly::connection_failed),
        help(
            "Check that the controller is running and reachable: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(vmanly::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vmanly::auth_failed),
        help(
            "Verify the username and password for this profile.\n\
             Run: vmanly config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vmanly::no_credentials),
        help(
            "Configure credentials with: vmanly config init\n\
             Or set VMANLY_USERNAME and VMANLY_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vmanly::not_found),
        help("Run: vmanly {list_command} to see what the controller has")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Controller ───────────────────────────────────────────────────

    #[error("Controller rejected the request{status}: {message}")]
    #[diagnostic(code(vmanly::api_error))]
    ApiError { status: String, message: String },

    #[error("Action {action_id} failed: {activity}")]
    #[diagnostic(
        code(vmanly::action_failed),
        help("Check the device's task view on the controller for the full log.")
    )]
    ActionFailed { action_id: String, activity: String },

    #[error("Action {action_id} still running after {attempts} status checks")]
    #[diagnostic(
        code(vmanly::action_timeout),
        help(
            "The push may still complete on the controller.\n\
             Raise poll_max_attempts or poll_interval_secs in your profile."
        )
    )]
    ActionTimeout { action_id: String, attempts: u32 },

    #[error("Import finished with {count} failure(s)")]
    #[diagnostic(code(vmanly::sync_failed))]
    SyncFailed { count: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vmanly::validation))]
    Validation { field: String, reason: String },

    #[error("Cannot use document {path}: {reason}")]
    #[diagnostic(
        code(vmanly::document),
        help("Documents are JSON, or YAML when the file ends in .yaml or .yml.")
    )]
    Document { path: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vmanly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vmanly config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(vmanly::no_config),
        help(
            "Create one with: vmanly config init\n\
             Expected at: {path}\n\
             Or pass --controller with VMANLY_USERNAME and VMANLY_PASSWORD."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vmanly::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(vmanly::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Internal error: {0}")]
    #[diagnostic(code(vmanly::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON rendering failed: {0}")]
    #[diagnostic(code(vmanly::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(vmanly::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout | Self::ActionTimeout { .. } => exit_code::TIMEOUT,
            Self::ActionFailed { .. } => exit_code::ACTION_FAILED,
            Self::Validation { .. }
            | Self::Document { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound {
                kind,
                entity_type,
                value,
            } => CliError::NotFound {
                resource_type: match entity_type {
                    Some(t) => format!("{} ({t})", kind.label()),
                    None => kind.label().to_owned(),
                },
                identifier: value,
                list_command: format!("list {}", kind.as_ref().replace('_', "-")),
            },

            CoreError::Transport {
                status,
                message,
                details,
            } => CliError::ApiError {
                status: status.map(|s| format!(" (HTTP {s})")).unwrap_or_default(),
                message: match details {
                    Some(details) => format!("{message}: {details}"),
                    None => message,
                },
            },

            CoreError::ActionFailed {
                action_id,
                activity,
            } => CliError::ActionFailed {
                action_id,
                activity,
            },

            CoreError::ActionTimeout {
                action_id,
                attempts,
            } => CliError::ActionTimeout {
                action_id,
                attempts,
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "document".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Shape { message } | CoreError::Internal(message) => {
                CliError::Internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmanly_core::EntityKind;

    #[test]
    fn not_found_points_at_the_list_command() {
        let err = CliError::from(CoreError::NotFound {
            kind: EntityKind::FeatureTemplates,
            entity_type: None,
            value: "system-base".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        match err {
            CliError::NotFound { list_command, .. } => {
                assert_eq!(list_command, "list feature-templates");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn action_errors_have_distinct_codes() {
        let failed = CliError::from(CoreError::ActionFailed {
            action_id: "push-1".into(),
            activity: "device offline".into(),
        });
        let timed_out = CliError::from(CoreError::ActionTimeout {
            action_id: "push-1".into(),
            attempts: 3,
        });
        assert_eq!(failed.exit_code(), exit_code::ACTION_FAILED);
        assert_eq!(timed_out.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn missing_credentials_is_an_auth_error() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "lab".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
