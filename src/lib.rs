//! snapbooth library crate.
//!
//! Photo-booth camera core: device adapter, frame pipeline, text overlays
//! and the timed preview/capture state machine. The binary in `main.rs` is a
//! thin CLI over [`session::CameraSession`]; integration tests drive the same
//! API with synthetic devices.

pub mod config;
pub mod device;
pub mod effect;
pub mod error;
pub mod font;
pub mod geometry;
pub mod locale;
pub mod overlay;
pub mod pipeline;
pub mod session;
pub mod timer;

pub use effect::{EffectRegistry, ImageEffect};
pub use error::CameraError;
pub use geometry::{Rect, Size};
pub use session::{CameraSession, DisplaySink, Preview, SessionSettings, DEFAULT_ALPHA};
