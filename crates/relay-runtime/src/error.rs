// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime error types.
//!
//! Two families live here. [`RuntimeError`] is fatal: it ends the process
//! and the host provisions a fresh execution environment. [`HandlerError`]
//! is recoverable: the run loop turns it into a failure report for the
//! current invocation and keeps going.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that terminate the run loop.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error (missing or invalid environment variable)
    #[error("configuration error: {0}")]
    Config(String),

    /// The configured handler could not be resolved before accepting work
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Transport failure or malformed response from the control API
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A value could not be encoded for the control API
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RuntimeError {
    fn from(err: serde_json::Error) -> Self {
        RuntimeError::Serialization(err.to_string())
    }
}

/// Type alias for runtime results.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Type alias for handler results; handlers produce JSON by default.
pub type HandlerResult<T = serde_json::Value> = std::result::Result<T, HandlerError>;

/// An error raised by user handler code while processing an invocation.
///
/// Any `std::error::Error` converts into a `HandlerError` with `?`; the
/// last segment of the source type name becomes the reported error type.
/// Like `anyhow::Error`, this type deliberately does not implement
/// `std::error::Error` itself, which is what makes the blanket conversion
/// possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    error_type: String,
    message: String,
}

impl HandlerError {
    /// Error type used when a handler fails with a plain message.
    pub const GENERIC_TYPE: &'static str = "HandlerError";
    /// Error type used when a result cannot be encoded.
    pub const SERIALIZATION_TYPE: &'static str = "SerializationError";
    /// Error type used when handler code panics.
    pub const PANIC_TYPE: &'static str = "Panic";
    /// Error type used when the event payload is not valid JSON.
    pub const INVALID_EVENT_TYPE: &'static str = "InvalidEvent";

    /// Create an error with an explicit type and message.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create an error of the generic handler type.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Self::GENERIC_TYPE, message)
    }

    /// Create an error for a result that could not be encoded.
    pub fn serialization(message: impl fmt::Display) -> Self {
        Self::new(Self::SERIALIZATION_TYPE, message.to_string())
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self::new(short_type_name::<E>(), err.to_string())
    }
}

/// Type name without module path or generics
/// (`std::num::ParseIntError` -> `ParseIntError`).
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Wire body of the error endpoints: `{"errorMessage": ..., "errorType": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_message: String,
    pub error_type: String,
}

impl ErrorReport {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        let error_type = non_empty(error_type.into(), HandlerError::GENERIC_TYPE);
        let error_message = non_empty(error_message.into(), &error_type);
        Self {
            error_message,
            error_type,
        }
    }
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

impl From<&HandlerError> for ErrorReport {
    fn from(err: &HandlerError) -> Self {
        ErrorReport::new(err.error_type(), err.message())
    }
}

impl From<&RuntimeError> for ErrorReport {
    fn from(err: &RuntimeError) -> Self {
        let error_type = match err {
            RuntimeError::Config(_) => "ConfigError",
            RuntimeError::Initialization(_) => "InitializationError",
            RuntimeError::Protocol(_) => "ProtocolError",
            RuntimeError::Serialization(_) => HandlerError::SERIALIZATION_TYPE,
        };
        ErrorReport::new(error_type, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> HandlerResult<i64> {
        Ok(input.parse::<i64>()?)
    }

    #[test]
    fn test_std_errors_convert_with_short_type_name() {
        let err = parse("nope").unwrap_err();
        assert_eq!(err.error_type(), "ParseIntError");
        assert_eq!(err.message(), "invalid digit found in string");
    }

    #[test]
    fn test_msg_uses_generic_type() {
        let err = HandlerError::msg("boom");
        assert_eq!(err.error_type(), HandlerError::GENERIC_TYPE);
        assert_eq!(err.to_string(), "HandlerError: boom");
    }

    #[test]
    fn test_report_wire_format() {
        let report = ErrorReport::from(&HandlerError::msg("boom"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"errorMessage": "boom", "errorType": "HandlerError"})
        );
    }

    #[test]
    fn test_report_never_carries_empty_fields() {
        let report = ErrorReport::new("", "  ");
        assert_eq!(report.error_type, "HandlerError");
        assert_eq!(report.error_message, "HandlerError");
    }

    #[test]
    fn test_runtime_error_report_types() {
        let report = ErrorReport::from(&RuntimeError::Initialization("no handler".into()));
        assert_eq!(report.error_type, "InitializationError");
        assert_eq!(report.error_message, "initialization error: no handler");
    }
}
