//! SDK Error Types

use jsonrpsee::core::ClientError;
use thiserror::Error;

/// Server error codes (mirrors the daemon's RPC layer)
///
/// Codes without a dedicated variant surface as [`SdkError::Server`].
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
    /// JSON-RPC 2.0 "Invalid params"
    pub const INVALID_PARAMS: i32 = -32602;
}

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Server error ({code}): {message}")]
    Server { code: i32, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ClientError> for SdkError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Call(call_err) => {
                let message = call_err.message().to_string();
                match call_err.code() {
                    code::NOT_FOUND => SdkError::NotFound(message),
                    code::CONFLICT => SdkError::Conflict(message),
                    code::VALIDATION_ERROR | code::INVALID_PARAMS => {
                        SdkError::InvalidArgument(message)
                    }
                    code => SdkError::Server { code, message },
                }
            }
            ClientError::Transport(e) => SdkError::Transport(e.to_string()),
            ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            ClientError::ParseError(e) => SdkError::Serialization(e),
            ClientError::RequestTimeout => SdkError::Transport("Request timed out".to_string()),
            other => SdkError::Transport(other.to_string()),
        }
    }
}
