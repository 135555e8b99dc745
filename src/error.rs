//! Error types for streamcall.

use thiserror::Error;

/// Boxed error returned by handlers and default executors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all call, stream and lifecycle operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// The manager has not been started, or has been stopped.
    #[error("Manager not running")]
    NotRunning,

    /// The protocol is not in the connected state.
    #[error("Protocol not initialized")]
    NotInitialized,

    /// No descriptor registered under the requested name.
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Parameters could not be decoded for a built-in streaming behaviour.
    #[error("Invalid parameters for '{function}': {source}")]
    InvalidParameters {
        function: String,
        #[source]
        source: serde_json::Error,
    },

    /// A handler or the default executor failed. The original error is the source.
    #[error("Handler for '{function}' failed: {source}")]
    Handler {
        function: String,
        #[source]
        source: BoxError,
    },

    /// The single-call fallback of a stream failed.
    #[error("Stream for '{function}' failed: {source}")]
    Stream {
        function: String,
        #[source]
        source: Box<McpError>,
    },
}

impl McpError {
    /// Lifecycle errors may succeed once the system is started.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, McpError::NotRunning | McpError::NotInitialized)
    }

    /// Not-found errors will not succeed on retry.
    pub fn is_not_found(&self) -> bool {
        match self {
            McpError::FunctionNotFound(_) => true,
            McpError::Stream { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias using McpError.
pub type Result<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_classification() {
        assert!(McpError::NotRunning.is_lifecycle());
        assert!(McpError::NotInitialized.is_lifecycle());
        assert!(!McpError::FunctionNotFound("x".into()).is_lifecycle());
        assert!(McpError::FunctionNotFound("x".into()).is_not_found());
    }

    #[test]
    fn test_stream_error_wraps_cause() {
        let err = McpError::Stream {
            function: "missing".into(),
            source: Box::new(McpError::FunctionNotFound("missing".into())),
        };

        assert!(err.is_not_found());
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Function 'missing' not found".to_string())
        );
    }

    #[test]
    fn test_handler_error_keeps_source() {
        let cause: BoxError = "disk on fire".into();
        let err = McpError::Handler {
            function: "burn".into(),
            source: cause,
        };

        assert_eq!(err.to_string(), "Handler for 'burn' failed: disk on fire");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
    }
}
