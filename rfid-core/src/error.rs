use std::time::Duration;
use thiserror::Error;

/// Result code reported for failures raised on the host side of the API
pub const RESULT_CODE_SYSTEM: i32 = -1;

/// Result code reported when the reader answered but the answer is unusable
pub const RESULT_CODE_READER: i32 = -2;

/// Main error type for RFID reader operations
#[derive(Error, Debug)]
pub enum RfidError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("No connection: {0}")]
    NoConnection(String),

    #[error("No reply within {0:?}")]
    NoReply(Duration),

    #[error("Invalid reply: {0}")]
    InvalidReply(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Reader error {result_code}: {error} ({cause})")]
    Device {
        result_code: i32,
        error: String,
        cause: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Timeout")]
    Timeout,
}

impl RfidError {
    /// Numeric result code as reported to callers
    ///
    /// Device errors carry the reader's own code. Errors about a reply that
    /// arrived but lacks required content use [`RESULT_CODE_READER`], every
    /// other failure is a host side [`RESULT_CODE_SYSTEM`].
    pub fn result_code(&self) -> i32 {
        match self {
            RfidError::Device { result_code, .. } => *result_code,
            RfidError::MissingParameter(_) => RESULT_CODE_READER,
            _ => RESULT_CODE_SYSTEM,
        }
    }

    /// Stable error name matching the reader API error codes
    pub fn error_code(&self) -> &str {
        match self {
            RfidError::Connection(_) | RfidError::NoConnection(_) => "ERROR_NO_CONNECTION",
            RfidError::NoReply(_) | RfidError::Timeout => "ERROR_NO_REPLY",
            RfidError::InvalidReply(_) => "ERROR_INVALID_REPLY",
            RfidError::InvalidParameter(_) => "ERROR_INVALID_PARAMETER",
            RfidError::MissingParameter(_) => "ERROR_MISSING_PARAMETER",
            RfidError::InvalidMode(_) => "ERROR_INVALID_MODE",
            RfidError::Device { error, .. } => error,
            RfidError::Internal(_) => "ERROR_INTERNAL",
        }
    }

    /// Whether the error means the connection is gone
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, RfidError::Connection(_) | RfidError::NoConnection(_))
    }
}

/// Result type alias for RFID reader operations
pub type RfidResult<T> = Result<T, RfidError>;
