//! Error types for txconsole-core
//!
//! This module provides error handling for the transaction console core,
//! including error codes, detailed messages, and suggestions.

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transaction API could not be reached
    NetworkError,
    /// Transaction API answered with a non-success status
    HttpStatus,
    /// Response body could not be decoded
    DecodeError,
    /// Edited value could not be applied
    InvalidField,
    /// Edited field does not exist
    UnknownField,
    /// Transaction not found
    TransactionNotFound,
    /// No editor open for the transaction
    EditorNotOpen,
    /// Console session not found
    SessionNotFound,
    /// Validation error
    ValidationError,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::NetworkError => write!(f, "NETWORK_ERROR"),
            ErrorCode::HttpStatus => write!(f, "HTTP_STATUS"),
            ErrorCode::DecodeError => write!(f, "DECODE_ERROR"),
            ErrorCode::InvalidField => write!(f, "INVALID_FIELD"),
            ErrorCode::UnknownField => write!(f, "UNKNOWN_FIELD"),
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::EditorNotOpen => write!(f, "EDITOR_NOT_OPEN"),
            ErrorCode::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - application may be unstable
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for txconsole-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Transaction API unreachable: {message}")]
    NetworkError { message: String },

    #[error("Transaction API returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Unexpected response from transaction API: {message}")]
    DecodeError { message: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: u64 },

    #[error("No editor open for transaction {id}")]
    EditorNotOpen { id: u64 },

    #[error("Console session not found")]
    SessionNotFound,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::NetworkError { .. } => ErrorCode::NetworkError,
            CoreError::HttpStatus { .. } => ErrorCode::HttpStatus,
            CoreError::DecodeError { .. } => ErrorCode::DecodeError,
            CoreError::InvalidField { .. } => ErrorCode::InvalidField,
            CoreError::UnknownField { .. } => ErrorCode::UnknownField,
            CoreError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            CoreError::EditorNotOpen { .. } => ErrorCode::EditorNotOpen,
            CoreError::SessionNotFound => ErrorCode::SessionNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::NetworkError { .. } => ErrorSeverity::Error,
            CoreError::HttpStatus { status, .. } if *status >= 500 => ErrorSeverity::Error,
            CoreError::HttpStatus { .. } => ErrorSeverity::Warning,
            CoreError::DecodeError { .. } => ErrorSeverity::Error,
            CoreError::InvalidField { .. } => ErrorSeverity::Info,
            CoreError::UnknownField { .. } => ErrorSeverity::Warning,
            CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
            CoreError::EditorNotOpen { .. } => ErrorSeverity::Info,
            CoreError::SessionNotFound => ErrorSeverity::Warning,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::NetworkError { .. } => {
                details = details.with_suggestion(
                    "Check that API_ENDPOINT points at a reachable transaction API.".to_string()
                );
            }
            CoreError::HttpStatus { status, body } => {
                details = details.with_detail(serde_json::json!({ "status": status, "body": body }));
                if *status >= 500 {
                    details = details.with_suggestion(
                        "The transaction API failed; try again shortly.".to_string()
                    );
                }
            }
            CoreError::InvalidField { field, reason } => {
                details = details.with_detail(serde_json::json!({ "field": field }));
                details = details.with_suggestion(reason.clone());
            }
            CoreError::TransactionNotFound { .. } => {
                details = details.with_suggestion(
                    "The transaction may have been archived; refresh the list.".to_string()
                );
            }
            CoreError::SessionNotFound => {
                details = details.with_suggestion(
                    "Reload the page to start a new console session.".to_string()
                );
            }
            CoreError::EditorNotOpen { .. } => {
                details = details.with_suggestion(
                    "Open the transaction again from the list.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            CoreError::DecodeError { message: error.to_string() }
        } else {
            CoreError::NetworkError { message: error.to_string() }
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::DecodeError { message: error.to_string() }
    }
}

/// Log a failed operation with its code and details
pub fn log_error(operation: &str, error: &CoreError) {
    match error.severity() {
        ErrorSeverity::Info => log::info!(
            target: "txconsole::error",
            "{} failed: {}", operation, error.to_details()
        ),
        ErrorSeverity::Warning => log::warn!(
            target: "txconsole::error",
            "{} failed: {}", operation, error.to_details()
        ),
        ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
            target: "txconsole::error",
            "{} failed: {}", operation, error.to_details()
        ),
    }
}

// ==================== Tests ====================
