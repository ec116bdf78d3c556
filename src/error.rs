//! Error types for ShareSync CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=fetch, 4=validation, 6=apply, etc.)
//! - Retryability flags for transient network failures
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

use crate::model::{ApplyKind, Side};

/// Result type alias for ShareSync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string; shell pipelines on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Fetch (exit 2)
    FetchFailed,

    // Not Found (exit 3)
    NoReport,

    // Validation (exit 4)
    MalformedRecord,
    DuplicateKey,
    InvalidArgument,

    // Apply (exit 6)
    ApplyFailed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::FetchFailed => "FETCH_FAILED",
            Self::NoReport => "NO_REPORT",
            Self::MalformedRecord => "MALFORMED_RECORD",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ApplyFailed => "APPLY_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::FetchFailed => 2,
            Self::NoReport => 3,
            Self::MalformedRecord | Self::DuplicateKey | Self::InvalidArgument => 4,
            Self::ApplyFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller should retry the same invocation.
    ///
    /// True for network failures (a re-run converges: repeated application
    /// of a successful sync only produces unchanged dispositions). False
    /// for validation, config, or internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::ApplyFailed)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in ShareSync CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Fetch from {side} backend failed: {message}")]
    Fetch { side: Side, message: String },

    #[error("Apply {kind} batch to {side} backend failed: {message}")]
    Apply {
        side: Side,
        kind: ApplyKind,
        message: String,
    },

    #[error("Malformed {side} record: {detail}")]
    MalformedRecord { side: Side, detail: String },

    #[error("Duplicate natural key on {side}: {key}")]
    DuplicateKey { side: Side, key: String },

    #[error("No sync report found")]
    NoReport,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Fetch { .. } => ErrorCode::FetchFailed,
            Self::Apply { .. } => ErrorCode::ApplyFailed,
            Self::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            Self::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            Self::NoReport => ErrorCode::NoReport,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint for operators.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Fetch { side, .. } => Some(format!(
                "Check the {side} backend URL and token in your config. \
                 Nothing was applied; re-run once the backend is reachable."
            )),

            Self::Apply { side, kind, .. } => Some(format!(
                "The {side} {kind} batch failed; other batches were still attempted. \
                 Re-running sync is safe (already-applied records resolve as unchanged)."
            )),

            Self::NoReport => {
                Some("Run `ssync sync` first to produce a run report.".to_string())
            }

            Self::Config(_) => Some(
                "Create ~/.sharesync/config.json or set SSYNC_LIST_URL / \
                 SSYNC_DOCS_URL (see `ssync --help` for the full set)."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("side") {
                    Some("Valid sides: list, docs".to_string())
                } else {
                    None
                }
            }

            Self::MalformedRecord { .. }
            | Self::DuplicateKey { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
