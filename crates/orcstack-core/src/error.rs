//! Error types for stack declaration and synthesis

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// S001: Function may outlive the queue visibility window
    S001TimeoutExceedsVisibility,
    /// S002: Value outside provider limits
    S002LimitExceeded,
    /// S003: Handler does not follow `<package>.<Class>::<method>`
    S003InvalidHandler,
    /// S004: Template could not be serialized
    S004Serialization,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S001TimeoutExceedsVisibility => "S001",
            Self::S002LimitExceeded => "S002",
            Self::S003InvalidHandler => "S003",
            Self::S004Serialization => "S004",
        }
    }
}

/// Errors raised while declaring or rendering a stack
#[derive(Debug, Error)]
pub enum StackError {
    #[error("[{code}] Function timeout {timeout_secs}s exceeds queue visibility timeout {visibility_secs}s; slow invocations would be delivered twice")]
    TimeoutExceedsVisibility {
        code: &'static str,
        timeout_secs: u64,
        visibility_secs: u64,
    },

    #[error("[{code}] {field} is {value}, outside the allowed range {min}..={max}")]
    LimitExceeded {
        code: &'static str,
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("[{code}] Invalid handler '{handler}': expected <package>.<Class>::<method>")]
    InvalidHandler { code: &'static str, handler: String },

    #[error("[{code}] Failed to serialize template: {source}")]
    Serialization {
        code: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StackError {
    pub fn timeout_exceeds_visibility(timeout_secs: u64, visibility_secs: u64) -> Self {
        Self::TimeoutExceedsVisibility {
            code: ErrorCode::S001TimeoutExceedsVisibility.as_str(),
            timeout_secs,
            visibility_secs,
        }
    }

    pub fn limit_exceeded(field: &'static str, value: u64, min: u64, max: u64) -> Self {
        Self::LimitExceeded {
            code: ErrorCode::S002LimitExceeded.as_str(),
            field,
            value,
            min,
            max,
        }
    }

    pub fn invalid_handler(handler: impl Into<String>) -> Self {
        Self::InvalidHandler {
            code: ErrorCode::S003InvalidHandler.as_str(),
            handler: handler.into(),
        }
    }

    /// Error code string for logs and exit diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::TimeoutExceedsVisibility { code, .. }
            | Self::LimitExceeded { code, .. }
            | Self::InvalidHandler { code, .. }
            | Self::Serialization { code, .. } => code,
        }
    }
}

impl From<serde_json::Error> for StackError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::S004Serialization.as_str(),
            source,
        }
    }
}

/// Result type alias for StackError
pub type Result<T> = std::result::Result<T, StackError>;
