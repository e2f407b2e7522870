//! Text rasterization for overlay rendering.
//!
//! Prefers a TrueType face found on the host; falls back to a built-in
//! scalable 5x7 bitmap face so overlay rendering always succeeds, fonts
//! installed or not.

use rusttype::{point, Font, Scale};

use crate::geometry::Size;

/// System font candidates, tried in order.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Fraction of the viewport width the rendered text may occupy.
const MAX_WIDTH_RATIO: f64 = 0.9;
/// Fraction of the viewport height used as the text height.
const HEIGHT_RATIO: f64 = 0.4;

/// A rasterized line of text: one coverage byte (0-255) per pixel, row-major.
#[derive(Debug, Clone)]
pub struct Raster {
    pub coverage: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Raster {
    fn empty() -> Self {
        Self {
            coverage: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

/// A text face usable for overlay rendering.
pub enum FontSource {
    TrueType(Font<'static>),
    Builtin,
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontSource::TrueType(_) => f.write_str("FontSource::TrueType"),
            FontSource::Builtin => f.write_str("FontSource::Builtin"),
        }
    }
}

impl FontSource {
    /// Load the first available system font, falling back to the built-in
    /// bitmap face.
    pub fn load() -> Self {
        for path in FONT_CANDIDATES {
            if let Ok(bytes) = std::fs::read(path) {
                if let Some(font) = Font::try_from_vec(bytes) {
                    log::debug!("Loaded overlay font from {}", path);
                    return FontSource::TrueType(font);
                }
            }
        }
        log::debug!("No system font found, using built-in bitmap face");
        FontSource::Builtin
    }

    /// The built-in bitmap face. Deterministic on every host; used by tests.
    pub fn builtin() -> Self {
        FontSource::Builtin
    }

    /// Rasterize `text` sized to fit within `bounds`.
    ///
    /// Returns an empty raster for empty or all-whitespace text.
    pub fn rasterize(&self, text: &str, bounds: Size) -> Raster {
        if text.trim().is_empty() || bounds.width == 0 || bounds.height == 0 {
            return Raster::empty();
        }
        match self {
            FontSource::TrueType(font) => rasterize_truetype(font, text, bounds),
            FontSource::Builtin => rasterize_builtin(text, bounds),
        }
    }
}

fn rasterize_truetype(font: &Font<'_>, text: &str, bounds: Size) -> Raster {
    let max_width = (bounds.width as f64 * MAX_WIDTH_RATIO).max(1.0) as f32;
    let mut px_height = (bounds.height as f64 * HEIGHT_RATIO).max(8.0) as f32;

    // Shrink until the line fits the width budget
    loop {
        let scale = Scale::uniform(px_height);
        let width = line_width(font, text, scale);
        if width <= max_width || px_height <= 8.0 {
            break;
        }
        px_height *= max_width / width;
        px_height = px_height.max(8.0);
    }

    let scale = Scale::uniform(px_height);
    let v_metrics = font.v_metrics(scale);
    let height = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;
    let width = line_width(font, text, scale).ceil().max(1.0) as u32;

    let mut raster = Raster {
        coverage: vec![0u8; (width * height) as usize],
        width,
        height,
    };

    for glyph in font.layout(text, scale, point(0.0, v_metrics.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    let idx = (y as u32 * width + x as u32) as usize;
                    let v = (v * 255.0) as u8;
                    raster.coverage[idx] = raster.coverage[idx].max(v);
                }
            });
        }
    }
    raster
}

fn line_width(font: &Font<'_>, text: &str, scale: Scale) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .filter_map(|g| {
            g.pixel_bounding_box()
                .map(|bb| bb.max.x as f32)
                .or_else(|| Some(g.position().x + g.unpositioned().h_metrics().advance_width))
        })
        .fold(0.0f32, f32::max)
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Advance per glyph cell (5 pixels plus 1 of spacing), pre-scale.
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

fn rasterize_builtin(text: &str, bounds: Size) -> Raster {
    let glyphs: Vec<[u8; 7]> = text.chars().map(builtin_glyph).collect();
    let line_cells = glyphs.len() as u32 * GLYPH_ADVANCE - 1;

    // Integer scale chosen from the height budget, clamped by the width budget
    let mut scale = ((bounds.height as f64 * HEIGHT_RATIO) as u32 / GLYPH_HEIGHT).max(1);
    let max_width = (bounds.width as f64 * MAX_WIDTH_RATIO) as u32;
    while scale > 1 && line_cells * scale > max_width {
        scale -= 1;
    }

    let width = line_cells * scale;
    let height = GLYPH_HEIGHT * scale;
    let mut raster = Raster {
        coverage: vec![0u8; (width * height) as usize],
        width,
        height,
    };

    for (i, rows) in glyphs.iter().enumerate() {
        let origin_x = i as u32 * GLYPH_ADVANCE * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = origin_x + col * scale + dx;
                        let y = row as u32 * scale + dy;
                        if x < width {
                            raster.coverage[(y * width + x) as usize] = 255;
                        }
                    }
                }
            }
        }
    }
    raster
}

/// 5x7 bitmap rows for one character, MSB-left within the low 5 bits.
/// Lowercase maps to uppercase; characters outside the face render blank.
fn builtin_glyph(c: char) -> [u8; 7] {
    let c = c.to_ascii_uppercase();
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100],
        '-' => [0b00000, 0b00000, 0b00000, 0b01110, 0b00000, 0b00000, 0b00000],
        _ => [0; 7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rasterize_digit_has_coverage() {
        let font = FontSource::builtin();
        let raster = font.rasterize("3", Size::new(640, 480));
        assert!(raster.width > 0 && raster.height > 0);
        assert!(raster.coverage.iter().any(|&v| v == 255));
        assert_eq!(
            raster.coverage.len(),
            (raster.width * raster.height) as usize
        );
    }

    #[test]
    fn test_builtin_rasterize_empty_text() {
        let font = FontSource::builtin();
        let raster = font.rasterize("", Size::new(640, 480));
        assert_eq!(raster.width, 0);
        assert_eq!(raster.height, 0);
        assert!(raster.coverage.is_empty());

        let raster = font.rasterize("   ", Size::new(640, 480));
        assert!(raster.coverage.is_empty());
    }

    #[test]
    fn test_builtin_rasterize_fits_bounds() {
        let font = FontSource::builtin();
        let bounds = Size::new(320, 240);
        let raster = font.rasterize("SMILE !", bounds);
        assert!(raster.width <= bounds.width);
        assert!(raster.height <= bounds.height);
    }

    #[test]
    fn test_builtin_rasterize_tiny_viewport_still_renders() {
        let font = FontSource::builtin();
        let raster = font.rasterize("10", Size::new(16, 10));
        // Scale clamps to 1; the raster stays internally consistent even if
        // the line overflows the width budget
        assert!(raster.height >= GLYPH_HEIGHT);
        assert_eq!(
            raster.coverage.len(),
            (raster.width * raster.height) as usize
        );
    }

    #[test]
    fn test_builtin_unknown_chars_render_blank() {
        let font = FontSource::builtin();
        let known = font.rasterize("A", Size::new(100, 100));
        let unknown = font.rasterize("€", Size::new(100, 100));
        assert!(known.coverage.iter().any(|&v| v > 0));
        assert!(unknown.coverage.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_coverage_values_are_full_on_for_builtin() {
        let font = FontSource::builtin();
        let raster = font.rasterize("8", Size::new(200, 200));
        assert!(raster.coverage.iter().all(|&v| v == 0 || v == 255));
    }
}
