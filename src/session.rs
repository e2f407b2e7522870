//! Camera session and the timed preview/capture state machine.
//!
//! One [`CameraSession`] exclusively owns the capture device for its entire
//! life. Starting a preview binds a caller-owned [`DisplaySink`] and yields a
//! [`Preview`] guard; the countdown and wait phases are blocking loops on the
//! session clock that render one frame per tick and pump the sink's events in
//! between, so the UI stays responsive without a background thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;

use crate::device::{self, CameraDevice, FrameSource};
use crate::effect::{EffectRegistry, ImageEffect};
use crate::error::CameraError;
use crate::font::FontSource;
use crate::geometry::{Rect, Size};
use crate::locale;
use crate::overlay::Overlay;
use crate::pipeline;
use crate::timer::{Clock, PoolingTimer, SystemClock};

/// Default overlay opacity.
pub const DEFAULT_ALPHA: u8 = 80;

/// Pause between loop iterations of the timed phases.
const TICK: Duration = Duration::from_millis(20);

/// Pause after a capture read, long enough to see the "smile" prompt.
const CAPTURE_HOLD: Duration = Duration::from_millis(500);

/// Display surface owned by the caller and referenced during a preview.
pub trait DisplaySink {
    /// Render `image`; returns the dirty region, or `None` if nothing
    /// changed on screen.
    fn show_image(&mut self, image: &RgbImage) -> Option<Rect>;

    /// Pixel size of the drawable area.
    fn viewport(&self) -> Size;

    /// Process pending UI/input events. Called between frames so the
    /// surface stays responsive during blocking phases.
    fn pump_events(&mut self) {}

    /// Flush a previously reported dirty region to the screen.
    fn flush_region(&mut self, region: Rect) {
        let _ = region;
    }
}

/// Session configuration applied at device open time.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub device_index: u32,
    pub resolution: Size,
    pub iso: u32,
    /// Sensor mounting rotation in degrees; accepted values 0/90/180/270.
    pub rotation: u16,
    /// Mirror the final capture horizontally (same axis as the preview).
    pub capture_hflip: bool,
    /// Language code for overlay prompts.
    pub language: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Size::new(1920, 1080),
            iso: 200,
            rotation: 0,
            capture_hflip: false,
            language: "en".to_string(),
        }
    }
}

/// A raw frame buffered between capture and post-processing.
#[derive(Debug)]
struct PendingCapture {
    frame: RgbImage,
    effect: ImageEffect,
}

/// Long-lived handle to the capture device plus all preview/capture state.
pub struct CameraSession<S: FrameSource> {
    device: Option<S>,
    resolution: Size,
    rotation: u16,
    capture_hflip: bool,
    language: String,
    font: FontSource,
    overlay: Option<Overlay>,
    pending: HashMap<PathBuf, PendingCapture>,
    effects: EffectRegistry,
    clock: Box<dyn Clock>,
}

impl CameraSession<CameraDevice> {
    /// Open the physical camera described by `settings`.
    ///
    /// Fatal if no device is present or the device cannot be acquired; the
    /// caller must construct a fresh session to retry.
    pub fn open(settings: SessionSettings) -> Result<Self, CameraError> {
        if !device::any_connected() {
            return Err(CameraError::NoDevice);
        }
        let device = CameraDevice::open(settings.device_index, settings.resolution, settings.iso)?;
        Ok(Self::with_device(device, settings, Box::new(SystemClock)))
    }
}

impl<S: FrameSource> CameraSession<S> {
    /// Build a session around an already-open frame source. Tests inject a
    /// synthetic source and a fake clock here.
    pub fn with_device(device: S, settings: SessionSettings, clock: Box<dyn Clock>) -> Self {
        let rotation = match settings.rotation {
            r @ (0 | 90 | 180 | 270) => r,
            other => {
                log::warn!("Unsupported rotation {} degrees, using 0", other);
                0
            }
        };

        Self {
            device: Some(device),
            resolution: settings.resolution,
            rotation,
            capture_hflip: settings.capture_hflip,
            language: settings.language,
            font: FontSource::load(),
            overlay: None,
            pending: HashMap::new(),
            effects: EffectRegistry::new(),
            clock,
        }
    }

    pub fn resolution(&self) -> Size {
        self.resolution
    }

    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Effect implementations applied during post-processing.
    pub fn effects_mut(&mut self) -> &mut EffectRegistry {
        &mut self.effects
    }

    /// Start a live preview on `sink`, mirroring frames when `flip` is set.
    ///
    /// Renders one frame immediately. The returned guard drives the timed
    /// phases; dropping it stops the preview and clears any overlay.
    pub fn start_preview<'a, D: DisplaySink>(
        &'a mut self,
        sink: &'a mut D,
        flip: bool,
    ) -> Result<Preview<'a, S, D>, CameraError> {
        if self.device.is_none() {
            return Err(CameraError::SessionClosed);
        }
        log::info!("Preview started (mirror: {})", flip);
        let mut preview = Preview {
            session: self,
            sink,
            hflip: flip,
        };
        preview.render_frame()?;
        Ok(preview)
    }

    /// Capture one raw frame for `destination`, to be post-processed later.
    ///
    /// The effect name is validated before the device is touched. A second
    /// capture for the same destination before post-processing replaces the
    /// buffered frame.
    pub fn capture(&mut self, destination: &Path, effect: &str) -> Result<(), CameraError> {
        let effect = ImageEffect::from_str(effect)
            .ok_or_else(|| CameraError::InvalidEffect(effect.to_string()))?;

        let device = self.device.as_mut().ok_or(CameraError::SessionClosed)?;
        let frame = device.read_raw().ok_or(CameraError::CaptureFailed)?;

        log::info!("Captured frame for '{}' ({})", destination.display(), effect);
        self.pending
            .insert(destination.to_path_buf(), PendingCapture { frame, effect });

        // Let the subject see the "smile" moment before the overlay goes
        self.clock.sleep(CAPTURE_HOLD);
        self.overlay = None;
        Ok(())
    }

    /// Transform and persist the capture buffered for `destination`.
    ///
    /// Consumes the pending entry; a second call for the same destination
    /// fails unless a new capture was taken in between.
    pub fn post_process(&mut self, destination: &Path) -> Result<RgbImage, CameraError> {
        let pending = self
            .pending
            .remove(destination)
            .ok_or_else(|| CameraError::NoPendingCapture(destination.to_path_buf()))?;

        let final_image = pipeline::post_process_capture(
            &pending.frame,
            self.resolution,
            self.capture_hflip,
            pending.effect,
            &self.effects,
        );

        final_image.save(destination).map_err(|e| CameraError::Save {
            path: destination.to_path_buf(),
            message: e.to_string(),
        })?;

        log::info!("Saved capture to '{}'", destination.display());
        Ok(final_image)
    }

    /// Release the device. Safe to call more than once; every operation
    /// after the first call fails with [`CameraError::SessionClosed`].
    pub fn shutdown(&mut self) {
        self.overlay = None;
        if let Some(mut device) = self.device.take() {
            device.release();
            log::info!("Camera session shut down");
        }
    }
}

impl<S: FrameSource> Drop for CameraSession<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Active preview: the session with a display sink bound to it.
pub struct Preview<'a, S: FrameSource, D: DisplaySink> {
    session: &'a mut CameraSession<S>,
    sink: &'a mut D,
    hflip: bool,
}

impl<S: FrameSource, D: DisplaySink> Preview<'_, S, D> {
    /// Read, transform and display one frame.
    ///
    /// A failed device read skips the tick and reports no dirty region; the
    /// next tick retries.
    pub fn render_frame(&mut self) -> Result<Option<Rect>, CameraError> {
        let device = self
            .session
            .device
            .as_mut()
            .ok_or(CameraError::SessionClosed)?;
        let raw = match device.read_raw() {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let frame = pipeline::process_preview_frame(
            &raw,
            self.session.resolution,
            self.hflip,
            self.sink.viewport(),
            self.session.overlay.as_ref(),
        );
        Ok(self.sink.show_image(&frame))
    }

    /// Render `text` as the active overlay, sized to the current display.
    fn show_overlay(&mut self, text: &str, alpha: u8) {
        let display = pipeline::preview_display_size(self.session.resolution, self.sink.viewport());
        self.session.overlay = Some(Overlay::render(&self.session.font, text, display, alpha));
    }

    /// Show a countdown of `seconds` on the preview, then the localized
    /// smile prompt. Blocks until the full duration has elapsed.
    ///
    /// The digit overlay is re-rendered only when the remaining whole second
    /// changes.
    pub fn run_countdown(&mut self, seconds: u64, alpha: u8) -> Result<(), CameraError> {
        if seconds < 1 {
            return Err(CameraError::InvalidDuration(seconds));
        }

        let timer = PoolingTimer::start(Duration::from_secs(seconds), self.session.clock.now());
        let mut shown: Option<u64> = None;

        loop {
            let now = self.session.clock.now();
            if timer.is_timeout(now) {
                break;
            }

            let digit = timer.remaining(now).as_secs_f64().ceil().max(1.0) as u64;
            if shown != Some(digit) {
                self.show_overlay(&digit.to_string(), alpha);
                shown = Some(digit);
            }

            let region = self.render_frame()?;
            self.sink.pump_events();
            if let Some(region) = region {
                self.sink.flush_region(region);
            }
            self.session.clock.sleep(TICK);
        }

        self.finish_with_smile(alpha)
    }

    /// Hold the live preview for `seconds`, then show the smile prompt.
    /// Blocks until the full duration has elapsed.
    pub fn run_wait(&mut self, seconds: u64, alpha: u8) -> Result<(), CameraError> {
        if seconds < 1 {
            return Err(CameraError::InvalidDuration(seconds));
        }

        let timer = PoolingTimer::start(Duration::from_secs(seconds), self.session.clock.now());
        loop {
            let now = self.session.clock.now();
            if timer.is_timeout(now) {
                break;
            }

            let region = self.render_frame()?;
            self.sink.pump_events();
            if let Some(region) = region {
                self.sink.flush_region(region);
            }
            self.session.clock.sleep(TICK);
        }

        self.finish_with_smile(alpha)
    }

    fn finish_with_smile(&mut self, alpha: u8) -> Result<(), CameraError> {
        let message = locale::prompts(&self.session.language).smile_message;
        self.show_overlay(message, alpha);
        self.render_frame()?;
        Ok(())
    }

    /// Capture one raw frame for `destination` (see [`CameraSession::capture`]).
    pub fn capture(&mut self, destination: &Path, effect: &str) -> Result<(), CameraError> {
        self.session.capture(destination, effect)
    }

    /// Stop the preview explicitly. Dropping the guard has the same effect.
    pub fn stop(self) {}
}

impl<S: FrameSource, D: DisplaySink> Drop for Preview<'_, S, D> {
    fn drop(&mut self) {
        self.session.overlay = None;
        log::info!("Preview stopped");
    }
}
