//! Sizing and cropping math shared by the preview and capture paths.

use std::fmt;

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned pixel rectangle. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }
}

/// Compute the smallest size that preserves `source`'s aspect ratio while
/// covering `target` in both dimensions.
///
/// The result may exceed `target` in one dimension; callers crop the excess
/// with [`center_crop`]. Both preview frames and final captures go through
/// this so the framing shown live matches the framing saved to disk.
pub fn fit_outer(source: Size, target: Size) -> Size {
    let scale_w = target.width as f64 / source.width as f64;
    let scale_h = target.height as f64 / source.height as f64;
    let scale = scale_w.max(scale_h);

    let width = (source.width as f64 * scale).round() as u32;
    let height = (source.height as f64 * scale).round() as u32;

    // Rounding must never undershoot the box the caller wants covered
    Size::new(width.max(target.width), height.max(target.height))
}

/// Centered crop rectangle of exactly `target` size within `current`.
///
/// Panics if `current` is smaller than `target` in either dimension; callers
/// are expected to apply [`fit_outer`] first, so an undersized input is a
/// programming error rather than a runtime condition.
pub fn center_crop(current: Size, target: Size) -> Rect {
    assert!(
        current.width >= target.width && current.height >= target.height,
        "center_crop: current size {} is smaller than target {}",
        current,
        target
    );

    let left = (current.width - target.width) / 2;
    let top = (current.height - target.height) / 2;
    Rect {
        left,
        top,
        right: left + target.width,
        bottom: top + target.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_outer_same_aspect() {
        let size = fit_outer(Size::new(1920, 1080), Size::new(960, 540));
        assert_eq!(size, Size::new(960, 540));
    }

    #[test]
    fn test_fit_outer_wider_source_covers_target() {
        // 16:9 source into a 4:3 box: height is the binding dimension
        let size = fit_outer(Size::new(1920, 1080), Size::new(640, 480));
        assert!(size.width >= 640 && size.height >= 480);
        assert_eq!(size.height, 480);
        assert_eq!(size.width, 853);
    }

    #[test]
    fn test_fit_outer_taller_source_covers_target() {
        let size = fit_outer(Size::new(480, 640), Size::new(640, 480));
        assert!(size.width >= 640 && size.height >= 480);
        assert_eq!(size.width, 640);
        assert_eq!(size.height, 853);
    }

    #[test]
    fn test_fit_outer_upscales_small_source() {
        let size = fit_outer(Size::new(320, 240), Size::new(1920, 1080));
        assert!(size.width >= 1920 && size.height >= 1080);
    }

    #[test]
    fn test_fit_outer_preserves_aspect_within_rounding() {
        let source = Size::new(1234, 777);
        let size = fit_outer(source, Size::new(800, 600));
        let src_aspect = source.width as f64 / source.height as f64;
        let out_aspect = size.width as f64 / size.height as f64;
        assert!((src_aspect - out_aspect).abs() < 0.01);
    }

    #[test]
    fn test_center_crop_exact_and_centered() {
        let rect = center_crop(Size::new(853, 480), Size::new(640, 480));
        assert_eq!(rect.size(), Size::new(640, 480));
        assert_eq!(rect.left, 106);
        assert_eq!(rect.top, 0);
        // Symmetric within one pixel of integer division
        assert!(853 - rect.right <= rect.left + 1);
    }

    #[test]
    fn test_center_crop_identity_when_equal() {
        let rect = center_crop(Size::new(640, 480), Size::new(640, 480));
        assert_eq!(rect.left, 0);
        assert_eq!(rect.top, 0);
        assert_eq!(rect.size(), Size::new(640, 480));
    }

    #[test]
    #[should_panic(expected = "smaller than target")]
    fn test_center_crop_panics_on_undersized_input() {
        center_crop(Size::new(600, 480), Size::new(640, 480));
    }
}
