//! Preprocessor error types

use contracts::{CameraId, ContractError};
use thiserror::Error;

/// Preprocessor specific error
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// A camera pass task panicked or was cancelled
    #[error("preprocessing task for camera '{camera}' did not complete: {message}")]
    TaskFailed { camera: CameraId, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl PreprocessError {
    pub fn task_failed(camera: CameraId, message: impl Into<String>) -> Self {
        Self::TaskFailed {
            camera,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PreprocessError>;
