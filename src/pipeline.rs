//! Per-frame transform chain for preview and capture.
//!
//! Pure functions: every input (frame, configured resolution, flip, viewport,
//! overlay) is passed explicitly so the chain is testable without a session
//! or device.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::effect::{EffectRegistry, ImageEffect};
use crate::geometry::{center_crop, fit_outer, Size};
use crate::overlay::Overlay;

fn size_of(image: &RgbImage) -> Size {
    Size::new(image.width(), image.height())
}

/// Resize and centre-crop `image` to exactly `resolution`.
///
/// Same policy for preview frames and final captures, so what was framed
/// live matches what gets saved.
pub fn fit_to_resolution(image: &RgbImage, resolution: Size) -> RgbImage {
    let covered = fit_outer(size_of(image), resolution);
    let resized = imageops::resize(image, covered.width, covered.height, FilterType::Triangle);
    let rect = center_crop(Size::new(resized.width(), resized.height()), resolution);
    imageops::crop_imm(&resized, rect.left, rect.top, rect.width(), rect.height()).to_image()
}

/// The size a preview frame is displayed at: the configured resolution scaled
/// to cover `viewport` while keeping its aspect ratio.
///
/// Overlays are rendered at this size so the select-composite lines up with
/// the frame pixel for pixel.
pub fn preview_display_size(resolution: Size, viewport: Size) -> Size {
    fit_outer(resolution, viewport)
}

/// Transform one raw RGB frame into a displayable preview image.
///
/// Chain: fit + centre-crop to the configured resolution, optional horizontal
/// mirror, scale to the viewport (no second crop), overlay select-composite.
pub fn process_preview_frame(
    raw: &RgbImage,
    resolution: Size,
    hflip: bool,
    viewport: Size,
    overlay: Option<&Overlay>,
) -> RgbImage {
    let mut image = fit_to_resolution(raw, resolution);

    if hflip {
        image = imageops::flip_horizontal(&image);
    }

    let display = preview_display_size(resolution, viewport);
    let mut image = imageops::resize(&image, display.width, display.height, FilterType::Triangle);

    if let Some(overlay) = overlay {
        overlay.composite(&mut image);
    }
    image
}

/// Transform a buffered raw capture into the final still.
///
/// Mirroring uses the horizontal axis, matching the preview, so the saved
/// picture reads the same way the subject saw themselves on screen.
pub fn post_process_capture(
    raw: &RgbImage,
    resolution: Size,
    hflip: bool,
    effect: ImageEffect,
    effects: &EffectRegistry,
) -> RgbImage {
    let mut image = fit_to_resolution(raw, resolution);

    if hflip {
        image = imageops::flip_horizontal(&image);
    }

    effects.apply(effect, image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontSource;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 100])
        })
    }

    #[test]
    fn test_fit_to_resolution_exact_output_size() {
        let resolution = Size::new(640, 480);
        for (w, h) in [(1920, 1080), (320, 240), (800, 800), (1000, 300)] {
            let out = fit_to_resolution(&gradient(w, h), resolution);
            assert_eq!(
                Size::new(out.width(), out.height()),
                resolution,
                "input {}x{}",
                w,
                h
            );
        }
    }

    #[test]
    fn test_preview_output_covers_viewport() {
        let out = process_preview_frame(
            &gradient(1920, 1080),
            Size::new(640, 480),
            false,
            Size::new(320, 240),
            None,
        );
        assert!(out.width() >= 320 && out.height() >= 240);
        // Same aspect as the configured resolution: covers exactly here
        assert_eq!((out.width(), out.height()), (320, 240));
    }

    #[test]
    fn test_preview_mirror_flips_horizontally() {
        let raw = gradient(640, 480);
        let resolution = Size::new(640, 480);
        let viewport = Size::new(640, 480);
        let plain = process_preview_frame(&raw, resolution, false, viewport, None);
        let mirrored = process_preview_frame(&raw, resolution, true, viewport, None);
        for y in [0u32, 200, 479] {
            for x in [0u32, 100, 639] {
                assert_eq!(plain.get_pixel(x, y), mirrored.get_pixel(639 - x, y));
            }
        }
    }

    #[test]
    fn test_preview_composites_overlay() {
        let resolution = Size::new(160, 120);
        let viewport = Size::new(160, 120);
        let font = FontSource::builtin();
        let display = preview_display_size(resolution, viewport);
        let overlay = Overlay::render(&font, "3", display, 255);

        let raw = RgbImage::from_pixel(160, 120, Rgb([40, 40, 40]));
        let out = process_preview_frame(&raw, resolution, false, viewport, Some(&overlay));

        let overlaid = out
            .pixels()
            .zip(overlay.mask().pixels())
            .filter(|(_, keep)| keep.0 == [0, 0, 0])
            .count();
        assert!(overlaid > 0);
        for (pixel, (over, keep)) in out
            .pixels()
            .zip(overlay.image().pixels().zip(overlay.mask().pixels()))
        {
            if keep.0 == [0, 0, 0] {
                assert_eq!(pixel.0, over.0);
            }
        }
    }

    #[test]
    fn test_post_process_output_is_device_resolution() {
        let resolution = Size::new(640, 480);
        let registry = EffectRegistry::new();
        let out = post_process_capture(
            &gradient(1280, 720),
            resolution,
            false,
            ImageEffect::None,
            &registry,
        );
        assert_eq!(Size::new(out.width(), out.height()), resolution);
    }

    #[test]
    fn test_post_process_mirror_matches_preview_axis() {
        let raw = gradient(320, 240);
        let resolution = Size::new(320, 240);
        let registry = EffectRegistry::new();
        let plain = post_process_capture(&raw, resolution, false, ImageEffect::None, &registry);
        let mirrored = post_process_capture(&raw, resolution, true, ImageEffect::None, &registry);
        assert_eq!(plain.get_pixel(0, 10), mirrored.get_pixel(319, 10));
    }

    #[test]
    fn test_post_process_runs_registered_effect() {
        let mut registry = EffectRegistry::new();
        registry.register(ImageEffect::Blur, |img| {
            RgbImage::from_pixel(img.width(), img.height(), Rgb([7, 7, 7]))
        });
        let out = post_process_capture(
            &gradient(320, 240),
            Size::new(320, 240),
            false,
            ImageEffect::Blur,
            &registry,
        );
        assert!(out.pixels().all(|p| p.0 == [7, 7, 7]));
    }
}
