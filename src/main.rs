mod config;
mod device;
mod effect;
mod error;
mod font;
mod geometry;
mod locale;
mod overlay;
mod pipeline;
mod session;
mod timer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use image::imageops;
use image::RgbImage;

use effect::{EffectRegistry, ImageEffect};
use geometry::{Rect, Size};
use session::{CameraSession, DisplaySink};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
    })
}

fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
fn parse_resolution(s: &str) -> Result<Size, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 1920x1080)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    Ok(Size::new(width, height))
}

/// Parse and validate the countdown duration (1-60 seconds)
fn parse_timeout(s: &str) -> Result<u64, String> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid duration", s))?;
    if !(1..=60).contains(&secs) {
        return Err(format!(
            "Countdown must be between 1 and 60 seconds, got {}",
            secs
        ));
    }
    Ok(secs)
}

/// Parse effect preset by name
fn parse_effect(s: &str) -> Result<ImageEffect, String> {
    ImageEffect::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = ImageEffect::ALL.iter().map(|e| e.as_str()).collect();
        format!("Unknown effect '{}'. Available effects: {}", s, names.join(", "))
    })
}

/// snapbooth: photo-booth camera with countdown overlays
#[derive(Parser)]
#[command(name = "snapbooth")]
#[command(version, about = "Photo-booth camera with countdown overlays")]
#[command(after_help = "EXAMPLES:
    # Take a picture after a 3 second countdown
    snapbooth snap photo.png

    # 5 second countdown, mirrored, blur effect
    snapbooth snap photo.png --timeout 5 --mirror --effect blur

    # Check for a connected camera
    snapbooth probe

    # List effect presets
    snapbooth effects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a compatible capture device is connected
    Probe,

    /// List available effect presets
    Effects,

    /// Preview with a countdown, then capture a still
    Snap {
        /// Destination image path (format from the extension, e.g. photo.png)
        output: PathBuf,

        /// Countdown duration in seconds (1-60)
        #[arg(long, short = 't', value_parser = parse_timeout, default_value = "3")]
        timeout: u64,

        /// Effect preset applied to the capture
        #[arg(long, short = 'e', value_parser = parse_effect, default_value = "none")]
        effect: ImageEffect,

        /// Mirror the preview and the capture horizontally
        #[arg(long, short = 'm')]
        mirror: bool,

        /// Overlay text opacity (0-255), default from config
        #[arg(long, short = 'a')]
        alpha: Option<u8>,

        /// Capture resolution (WIDTHxHEIGHT), default from config
        #[arg(long, short = 'r', value_parser = parse_resolution)]
        resolution: Option<Size>,

        /// Preview surface size (WIDTHxHEIGHT)
        #[arg(long, value_parser = parse_resolution, default_value = "800x480")]
        viewport: Size,

        /// File the live preview frames are written to
        #[arg(long, default_value = "preview.png")]
        preview_file: PathBuf,

        /// Custom config file path (default: ~/.config/snapbooth/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// Preview surface backed by an image file: every changed frame overwrites
/// the file, so any auto-reloading viewer shows the live preview.
struct FileSink {
    path: PathBuf,
    viewport: Size,
    last: Option<RgbImage>,
}

impl FileSink {
    fn new(path: PathBuf, viewport: Size) -> Self {
        Self {
            path,
            viewport,
            last: None,
        }
    }
}

impl DisplaySink for FileSink {
    fn show_image(&mut self, image: &RgbImage) -> Option<Rect> {
        if self.last.as_ref() == Some(image) {
            return None;
        }
        self.last = Some(image.clone());
        if let Err(e) = image.save(&self.path) {
            log::warn!("Failed to write preview frame to '{}': {}", self.path.display(), e);
        }
        Some(Rect {
            left: 0,
            top: 0,
            right: image.width(),
            bottom: image.height(),
        })
    }

    fn viewport(&self) -> Size {
        self.viewport
    }
}

/// Laplacian edge-detection kernel, shared by find_edges and contour.
const EDGES_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

/// Normalized detail-sharpening kernel.
const DETAIL_KERNEL: [f32; 9] = [
    0.0, -1.0 / 6.0, 0.0, -1.0 / 6.0, 10.0 / 6.0, -1.0 / 6.0, 0.0, -1.0 / 6.0, 0.0,
];

/// Register pixel implementations for the effect presets. The registry
/// applies unregistered presets as identity.
fn register_builtin_effects(effects: &mut EffectRegistry) {
    effects.register(ImageEffect::Blur, |img| imageops::blur(&img, 2.0));
    effects.register(ImageEffect::Smooth, |img| imageops::blur(&img, 0.8));
    effects.register(ImageEffect::SmoothMore, |img| imageops::blur(&img, 1.4));
    effects.register(ImageEffect::Sharpen, |img| imageops::unsharpen(&img, 1.0, 4));
    effects.register(ImageEffect::Detail, |img| {
        imageops::filter3x3(&img, &DETAIL_KERNEL)
    });
    effects.register(ImageEffect::EdgeEnhance, |img| {
        imageops::filter3x3(&img, &[-0.5, -0.5, -0.5, -0.5, 5.0, -0.5, -0.5, -0.5, -0.5])
    });
    effects.register(ImageEffect::EdgeEnhanceMore, |img| {
        imageops::filter3x3(&img, &[-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0])
    });
    effects.register(ImageEffect::FindEdges, |img| {
        imageops::filter3x3(&img, &EDGES_KERNEL)
    });
    effects.register(ImageEffect::Contour, |img| {
        let mut inverted = imageops::filter3x3(&img, &EDGES_KERNEL);
        imageops::invert(&mut inverted);
        inverted
    });
    effects.register(ImageEffect::Emboss, |img| {
        let mut out = imageops::filter3x3(&img, &[-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        for pixel in out.pixels_mut() {
            for c in 0..3 {
                pixel.0[c] = pixel.0[c].saturating_add(128);
            }
        }
        out
    });
}

fn run_probe() -> Result<(), String> {
    if device::any_connected() {
        println!("Camera detected.");
        Ok(())
    } else {
        Err("No compatible camera found".to_string())
    }
}

fn run_effects() {
    println!("Available effects:");
    for effect in ImageEffect::ALL {
        println!("  {}", effect);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_snap(
    output: &Path,
    timeout: u64,
    effect: ImageEffect,
    mirror: bool,
    alpha: Option<u8>,
    resolution: Option<Size>,
    viewport: Size,
    preview_file: PathBuf,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let cfg = config::Config::load(config_path).map_err(|e| e.to_string())?;

    // CLI args > config file > built-in defaults
    let mut settings = cfg.session_settings();
    if let Some(resolution) = resolution {
        settings.resolution = resolution;
    }
    if mirror {
        settings.capture_hflip = true;
    }
    let alpha = alpha.unwrap_or(cfg.overlay.alpha);

    if let Err(e) = setup_ctrlc_handler() {
        log::warn!("Could not set up Ctrl+C handler: {}", e);
    }

    let mirror = settings.capture_hflip;
    let mut session = CameraSession::open(settings).map_err(|e| e.to_string())?;
    register_builtin_effects(session.effects_mut());

    println!(
        "Previewing to '{}' ({} countdown: {}s)",
        preview_file.display(),
        session.resolution(),
        timeout
    );

    let mut sink = FileSink::new(preview_file, viewport);
    {
        let mut preview = session
            .start_preview(&mut sink, mirror)
            .map_err(|e| e.to_string())?;
        preview
            .run_countdown(timeout, alpha)
            .map_err(|e| e.to_string())?;

        if shutdown_requested() {
            return Err("Interrupted before capture".to_string());
        }
        preview
            .capture(output, effect.as_str())
            .map_err(|e| e.to_string())?;
    }

    session.post_process(output).map_err(|e| e.to_string())?;
    println!("Saved '{}'", output.display());
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Probe => run_probe(),
        Commands::Effects => {
            run_effects();
            Ok(())
        }
        Commands::Snap {
            output,
            timeout,
            effect,
            mirror,
            alpha,
            resolution,
            viewport,
            preview_file,
            config,
        } => run_snap(
            &output,
            timeout,
            effect,
            mirror,
            alpha,
            resolution,
            viewport,
            preview_file,
            config.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
