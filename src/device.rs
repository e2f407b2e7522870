//! Capture device adapter.
//!
//! [`FrameSource`] is the seam between the session and the physical camera:
//! the production implementation wraps a nokhwa stream, tests substitute a
//! synthetic source. Frames always leave the adapter in canonical RGB
//! ordering, whatever the sensor delivers.

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::{query, Camera};

use crate::error::CameraError;
use crate::geometry::Size;

/// A source of raw RGB frames.
pub trait FrameSource {
    /// One blocking read. `None` signals a transient failure; the caller
    /// skips the tick and retries next time.
    fn read_raw(&mut self) -> Option<RgbImage>;

    /// Release the underlying handle. Safe to call more than once.
    fn release(&mut self);
}

/// Return true if any capture device compatible with the native backend is
/// present.
pub fn any_connected() -> bool {
    match query(ApiBackend::Auto) {
        Ok(devices) => !devices.is_empty(),
        Err(e) => {
            log::debug!("Camera query failed: {}", e);
            false
        }
    }
}

/// Physical camera handle (nokhwa backend).
pub struct CameraDevice {
    camera: Option<Camera>,
}

impl std::fmt::Debug for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraDevice")
            .field("released", &self.camera.is_none())
            .finish()
    }
}

impl CameraDevice {
    /// Acquire the device at `index`, configured for `resolution` and the
    /// given ISO/gain. Failure to acquire is fatal; the sensitivity setting
    /// is best-effort because many UVC cameras expose no gain control.
    pub fn open(index: u32, resolution: Size, iso: u32) -> Result<Self, CameraError> {
        let index = CameraIndex::Index(index);
        let mut camera = open_with_fallback(&index, resolution)?;

        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        if let Err(e) = camera.set_camera_control(
            KnownCameraControl::Gain,
            ControlValueSetter::Integer(iso as i64),
        ) {
            log::warn!("Camera does not accept gain/ISO {}: {}", iso, e);
        }

        let actual = camera.resolution();
        log::info!(
            "Camera open at {}x{} (requested {})",
            actual.width(),
            actual.height(),
            resolution
        );

        Ok(Self {
            camera: Some(camera),
        })
    }
}

impl FrameSource for CameraDevice {
    fn read_raw(&mut self) -> Option<RgbImage> {
        let camera = self.camera.as_mut()?;
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::debug!("Frame read failed: {}", e);
                return None;
            }
        };
        // Normalizes whatever the sensor produced (MJPEG, YUYV, NV12, ...)
        // into RGB ordering
        buffer.decode_image::<RgbFormat>().ok()
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Error stopping camera stream: {}", e);
            }
            log::info!("Camera released");
        }
    }
}

impl Drop for CameraDevice {
    fn drop(&mut self) {
        self.release();
    }
}

/// Try multiple format strategies in order of preference:
/// NV12 (native on macOS), then MJPEG (widely supported), then whatever the
/// camera offers at its highest resolution.
fn open_with_fallback(index: &CameraIndex, resolution: Size) -> Result<Camera, CameraError> {
    let requested = Resolution::new(resolution.width, resolution.height);
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested,
            FrameFormat::NV12,
            30,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested,
            FrameFormat::MJPEG,
            30,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => last_error = Some(e),
        }
    }

    let e = last_error.expect("format_attempts is non-empty");
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission") || msg.contains("denied") || msg.contains("access") {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(e.to_string()))
    }
}
