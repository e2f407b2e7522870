//! Error types for the camera session and device adapter.

use std::fmt;
use std::path::PathBuf;

use crate::effect::ImageEffect;

/// Errors surfaced by camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// No capture device is available on this system
    NoDevice,
    /// Failed to open the capture device
    OpenFailed(String),
    /// Camera permission denied (macOS)
    PermissionDenied,
    /// Failed to start the video stream
    StreamFailed(String),
    /// Capture requested with an effect name outside the supported set
    InvalidEffect(String),
    /// Countdown or wait requested with a non-positive duration
    InvalidDuration(u64),
    /// The dedicated capture read yielded no frame
    CaptureFailed,
    /// Post-process requested for a destination with no buffered capture
    NoPendingCapture(PathBuf),
    /// Operation attempted after the session was shut down
    SessionClosed,
    /// Failed to persist the final image
    Save { path: PathBuf, message: String },
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoDevice => write!(f, "No capture device found"),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::PermissionDenied => {
                write!(
                    f,
                    "Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera"
                )
            }
            CameraError::StreamFailed(msg) => write!(f, "Failed to start camera stream: {}", msg),
            CameraError::InvalidEffect(name) => {
                write!(f, "Invalid capture effect '{}'. Supported effects: ", name)?;
                for (i, effect) in ImageEffect::ALL.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", effect)?;
                }
                Ok(())
            }
            CameraError::InvalidDuration(seconds) => {
                write!(
                    f,
                    "Duration must be at least 1 second, got {} second(s)",
                    seconds
                )
            }
            CameraError::CaptureFailed => write!(f, "Could not read a frame from the camera"),
            CameraError::NoPendingCapture(path) => {
                write!(f, "No pending capture for '{}'", path.display())
            }
            CameraError::SessionClosed => {
                write!(f, "Camera session has been shut down")
            }
            CameraError::Save { path, message } => {
                write!(
                    f,
                    "Failed to save capture to '{}': {}",
                    path.display(),
                    message
                )
            }
        }
    }
}

impl std::error::Error for CameraError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_effect_lists_supported_names() {
        let msg = format!("{}", CameraError::InvalidEffect("bogus".to_string()));
        assert!(msg.contains("'bogus'"));
        assert!(msg.contains("none"));
        assert!(msg.contains("edge_enhance_more"));
        assert!(msg.contains("sharpen"));
    }

    #[test]
    fn test_invalid_duration_display() {
        let msg = format!("{}", CameraError::InvalidDuration(0));
        assert!(msg.contains("at least 1 second"));
        assert!(msg.contains("0 second(s)"));
    }

    #[test]
    fn test_save_error_includes_path() {
        let err = CameraError::Save {
            path: PathBuf::from("/tmp/booth.png"),
            message: "disk full".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/tmp/booth.png"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_session_closed_display() {
        assert_eq!(
            format!("{}", CameraError::SessionClosed),
            "Camera session has been shut down"
        );
    }
}
