use serde::Serialize;
use thiserror::Error;

/// Errors raised while driving the camera, the encoder, or the output file.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CaptureError {
    /// The camera could not be opened, configured, or handed back.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// The encoder rejected its configuration or failed to start.
    #[error("Encoder prepare failed: {0}")]
    EncoderPrepareFailed(String),

    /// Stop was issued before the encoder produced any valid data.
    #[error("Encoder stopped before any data was written")]
    EncoderStopRace,

    /// The output location cannot be created or written.
    #[error("Storage unwritable: {0}")]
    StorageUnwritable(String),

    /// The operation is not legal in the current recorder state.
    #[error("Invalid recorder state: {0}")]
    InvalidState(String),

    /// Configuration could not be read, parsed, or validated.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    /// Benign errors are recovered locally and never abort an operation.
    pub fn is_benign(&self) -> bool {
        matches!(self, CaptureError::EncoderStopRace)
    }

    pub fn already_recording() -> Self {
        CaptureError::InvalidState("a recording session is already active".to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        CaptureError::StorageUnwritable(e.to_string())
    }
}
