//! Text overlay layer and its binary keep-mask.
//!
//! The overlay is pre-rendered once per distinct text and composited onto
//! every preview frame with a per-pixel select (`frame = frame * mask +
//! overlay`) instead of alpha blending. That trades anti-aliased edges for a
//! multiply-add the booth hardware can afford at preview rate.

use image::{Rgb, RgbImage};

use crate::font::FontSource;
use crate::geometry::Size;

/// Effective opacity above which a pixel counts as overlay-present.
const OPACITY_THRESHOLD: u8 = 10;

/// A rendered overlay sized to one viewport.
///
/// `mask` is 3-channel with values 0/1: 1 keeps the camera pixel, 0 where the
/// overlay lands. Both buffers always match the viewport they were rendered
/// for; the session drops the overlay whenever the preview stops or the text
/// changes.
#[derive(Debug, Clone)]
pub struct Overlay {
    image: RgbImage,
    mask: RgbImage,
}

impl Overlay {
    /// Render `text` centered on a transparent canvas of `viewport` size,
    /// composited at `alpha` over a black background.
    pub fn render(font: &FontSource, text: &str, viewport: Size, alpha: u8) -> Self {
        let raster = font.rasterize(text, viewport);

        let mut image = RgbImage::new(viewport.width, viewport.height);
        let mut mask = RgbImage::from_pixel(viewport.width, viewport.height, Rgb([1, 1, 1]));

        let left = viewport.width.saturating_sub(raster.width) / 2;
        let top = viewport.height.saturating_sub(raster.height) / 2;

        for y in 0..raster.height.min(viewport.height) {
            for x in 0..raster.width.min(viewport.width) {
                let coverage = raster.coverage[(y * raster.width + x) as usize];
                // White glyph at `coverage`, dimmed by the requested alpha
                let value = (coverage as u16 * alpha as u16 / 255) as u8;
                if value > OPACITY_THRESHOLD {
                    image.put_pixel(left + x, top + y, Rgb([value, value, value]));
                    mask.put_pixel(left + x, top + y, Rgb([0, 0, 0]));
                }
            }
        }

        log::debug!(
            "Rendered overlay '{}' at {} (alpha {})",
            text,
            viewport,
            alpha
        );
        Self { image, mask }
    }

    /// The viewport this overlay was rendered for.
    pub fn viewport(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn mask(&self) -> &RgbImage {
        &self.mask
    }

    /// Composite this overlay onto `frame` in place.
    ///
    /// A frame whose size does not match the overlay's viewport is left
    /// untouched; the session re-renders on the next tick.
    pub fn composite(&self, frame: &mut RgbImage) {
        if frame.width() != self.image.width() || frame.height() != self.image.height() {
            log::debug!(
                "Skipping overlay composite: frame {}x{} vs overlay {}",
                frame.width(),
                frame.height(),
                self.viewport()
            );
            return;
        }

        for (pixel, (over, keep)) in frame
            .pixels_mut()
            .zip(self.image.pixels().zip(self.mask.pixels()))
        {
            for c in 0..3 {
                pixel.0[c] = (pixel.0[c] * keep.0[c]).saturating_add(over.0[c]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Size {
        Size::new(160, 120)
    }

    #[test]
    fn test_mask_is_strictly_binary() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "3", viewport(), 80);
        for pixel in overlay.mask().pixels() {
            for c in 0..3 {
                assert!(pixel.0[c] == 0 || pixel.0[c] == 1);
            }
        }
    }

    #[test]
    fn test_mask_binary_for_empty_text() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "", viewport(), 80);
        // Nothing rendered: every pixel keeps the camera frame
        assert!(overlay.mask().pixels().all(|p| p.0 == [1, 1, 1]));
        assert!(overlay.image().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_overlay_matches_viewport_size() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "SMILE !", viewport(), 80);
        assert_eq!(overlay.viewport(), viewport());
        assert_eq!(overlay.image().dimensions(), overlay.mask().dimensions());
    }

    #[test]
    fn test_overlay_has_text_pixels() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "5", viewport(), 255);
        let covered = overlay.mask().pixels().filter(|p| p.0 == [0, 0, 0]).count();
        assert!(covered > 0, "expected some overlay-present pixels");
    }

    #[test]
    fn test_low_alpha_renders_nothing() {
        let font = FontSource::builtin();
        // alpha 10 leaves every effective value at or under the threshold
        let overlay = Overlay::render(&font, "8", viewport(), 10);
        assert!(overlay.mask().pixels().all(|p| p.0 == [1, 1, 1]));
    }

    #[test]
    fn test_composite_selects_overlay_pixels() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "1", viewport(), 255);
        let mut frame = RgbImage::from_pixel(160, 120, Rgb([50, 60, 70]));
        overlay.composite(&mut frame);

        for (pixel, (over, keep)) in frame
            .pixels()
            .zip(overlay.image().pixels().zip(overlay.mask().pixels()))
        {
            if keep.0 == [1, 1, 1] {
                assert_eq!(pixel.0, [50, 60, 70]);
            } else {
                assert_eq!(pixel.0, over.0);
            }
        }
    }

    #[test]
    fn test_composite_skips_mismatched_frame() {
        let font = FontSource::builtin();
        let overlay = Overlay::render(&font, "1", viewport(), 255);
        let mut frame = RgbImage::from_pixel(100, 80, Rgb([9, 9, 9]));
        let before = frame.clone();
        overlay.composite(&mut frame);
        assert_eq!(frame, before);
    }
}
