// Agent error types
// JSON-RPC 2.0 error objects returned to the caller

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard JSON-RPC 2.0 error codes used by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Message is not valid JSON
    ParseError,
    /// JSON is not a request object
    InvalidRequest,
    /// Unknown domain or method
    MethodNotFound,
    /// Parameters do not match the method
    InvalidParams,
    /// The method failed inside the agent
    InternalError,
}

impl ErrorCode {
    /// Numeric code on the wire
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }

    /// Default message for this code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

/// Wire error following the JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentError {
    /// Error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Structured detail, e.g. the unknown method name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for AgentError {}

impl From<ErrorCode> for AgentError {
    fn from(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data: None,
        }
    }
}

impl AgentError {
    /// Error for `code` carrying one named detail field
    fn detailed(code: ErrorCode, key: &str, value: String) -> Self {
        let mut error = Self::from(code);
        error.data = Some(serde_json::json!({ key: value }));
        error
    }

    /// Which standard code this error carries, if any
    pub fn kind(&self) -> Option<ErrorCode> {
        [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
        ]
        .into_iter()
        .find(|kind| kind.code() == self.code)
    }

    /// Message was not valid JSON
    pub fn parse_error() -> Self {
        ErrorCode::ParseError.into()
    }

    /// Message was JSON but not a request
    pub fn invalid_request() -> Self {
        ErrorCode::InvalidRequest.into()
    }

    /// Unknown `Domain.method`
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::detailed(ErrorCode::MethodNotFound, "method", method.into())
    }

    /// Parameters failed to deserialize
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::detailed(ErrorCode::InvalidParams, "details", details.into())
    }

    /// The handler failed
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::detailed(ErrorCode::InternalError, "details", details.into())
    }
}
