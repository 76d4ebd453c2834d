//! Device error types

use thiserror::Error;

/// Errors from keyboard lighting backends
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The backend refused to start; carries the user-facing explanation
    #[error("{0}")]
    CannotEnable(String),

    /// Frame pushed to a backend that was never enabled (or was disabled)
    #[error("Device not enabled: {0}")]
    NotEnabled(String),

    /// Bitmap handed to `draw_bitmap` is unusable
    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),

    /// No backend registered under the requested slug
    #[error("Device not found: {0}")]
    NotFound(String),
}
