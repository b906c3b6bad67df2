//! # Error Types
//!
//! Structured error types for mathbox_core. Most calculators never surface
//! an error to the user (a bad input simply produces no result), so these
//! are used by the typed API, the storage port and the AI gateway reply
//! handling, where a caller needs to know *why* something failed.
//!
//! ## Example
//!
//! ```rust
//! use mathbox_core::errors::{CalcError, CalcResult};
//!
//! fn validate_cost(cost: f64) -> CalcResult<()> {
//!     if cost <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "cost_price".to_string(),
//!             value: cost.to_string(),
//!             reason: "Cost price must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mathbox_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculator, storage and gateway operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (unparsable, out of range, zero divisor)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing or blank
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Unit name not part of the selected conversion category
    #[error("Unknown unit '{unit}' for category {category}")]
    UnknownUnit { category: String, unit: String },

    /// Expression text could not be parsed
    #[error("Parse error at {position}: {reason}")]
    ParseError { position: usize, reason: String },

    /// Expression parsed but could not be evaluated
    #[error("Evaluation failed for '{expression}': {reason}")]
    EvaluationFailed { expression: String, reason: String },

    /// Key-value store I/O error
    #[error("Storage error: {operation} on '{path}' - {reason}")]
    StorageError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Store file is held by another process
    #[error("Store locked: '{path}' is locked by pid {pid} since {locked_at}")]
    StoreLocked {
        path: String,
        pid: u32,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Store schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// The AI gateway answered 429
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    /// The AI gateway answered 402
    #[error("AI credits exhausted. Please try again later.")]
    QuotaExhausted,

    /// The AI gateway failed or returned something unusable
    #[error("Remote call failed: {reason}")]
    RemoteFailed {
        status: Option<u16>,
        reason: String,
    },

    /// The AI gateway could not be reached
    #[error("Failed to process your question. Please try again. ({reason})")]
    Unreachable { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownUnit error
    pub fn unknown_unit(category: impl Into<String>, unit: impl Into<String>) -> Self {
        CalcError::UnknownUnit {
            category: category.into(),
            unit: unit.into(),
        }
    }

    /// Create a ParseError
    pub fn parse_error(position: usize, reason: impl Into<String>) -> Self {
        CalcError::ParseError {
            position,
            reason: reason.into(),
        }
    }

    /// Create an EvaluationFailed error
    pub fn evaluation_failed(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::EvaluationFailed {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create a StorageError
    pub fn storage_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::StorageError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError from any displayable error
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        CalcError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Create a RemoteFailed error
    pub fn remote_failed(status: Option<u16>, reason: impl Into<String>) -> Self {
        CalcError::RemoteFailed {
            status,
            reason: reason.into(),
        }
    }

    /// Create an Unreachable error from a transport failure
    pub fn unreachable(reason: impl std::fmt::Display) -> Self {
        CalcError::Unreachable {
            reason: reason.to_string(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::StoreLocked { .. }
                | CalcError::RateLimited
                | CalcError::QuotaExhausted
                | CalcError::RemoteFailed { .. }
                | CalcError::Unreachable { .. }
        )
    }

    /// Title for a transient user notification.
    ///
    /// Gateway refusals read "Could not calculate"; everything else is a
    /// plain "Error".
    pub fn notification_title(&self) -> &'static str {
        match self {
            CalcError::RemoteFailed { status: None, .. } => "Could not calculate",
            _ => "Error",
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::UnknownUnit { .. } => "UNKNOWN_UNIT",
            CalcError::ParseError { .. } => "PARSE_ERROR",
            CalcError::EvaluationFailed { .. } => "EVALUATION_FAILED",
            CalcError::StorageError { .. } => "STORAGE_ERROR",
            CalcError::StoreLocked { .. } => "STORE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::RateLimited => "RATE_LIMITED",
            CalcError::QuotaExhausted => "QUOTA_EXHAUSTED",
            CalcError::RemoteFailed { .. } => "REMOTE_FAILED",
            CalcError::Unreachable { .. } => "UNREACHABLE",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("cost_price", "-5", "Cost price must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("query").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::unknown_unit("Length", "parsec").error_code(), "UNKNOWN_UNIT");
        assert_eq!(CalcError::RateLimited.error_code(), "RATE_LIMITED");
    }

    #[test]
    fn test_recoverable() {
        assert!(CalcError::QuotaExhausted.is_recoverable());
        assert!(CalcError::remote_failed(Some(500), "AI gateway error").is_recoverable());
        assert!(!CalcError::parse_error(0, "empty").is_recoverable());
    }

    #[test]
    fn test_notification_title() {
        let refused = CalcError::remote_failed(None, "Could not parse math question");
        assert_eq!(refused.notification_title(), "Could not calculate");
        assert_eq!(CalcError::RateLimited.notification_title(), "Error");
        assert_eq!(CalcError::unreachable("timed out").notification_title(), "Error");
    }

    #[test]
    fn test_rate_limit_message() {
        assert_eq!(
            CalcError::RateLimited.to_string(),
            "Rate limit exceeded. Please try again in a moment."
        );
    }
}
