use std::{
    fs,
    path::{Path, PathBuf},
};

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use color_eyre::{Result, eyre::eyre};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use log::{debug, warn};

/// Something that can measure and draw a single line of text.
pub trait GlyphRenderer {
    fn name(&self) -> &str;
    fn line_height(&self) -> u32;
    fn text_width(&self, text: &str) -> u32;
    /// `(x, y)` is the top-left corner of the line
    fn draw_text(&self, canvas: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>);
}

/// Fonts tried when nothing is configured.
const SYSTEM_FONTS: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn font_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// Returns the first candidate that loads as a TrueType/OpenType font, or the
/// built-in bitmap font. Never fails.
pub fn load_font(candidates: &[PathBuf], size: f32) -> Box<dyn GlyphRenderer> {
    for path in candidates {
        match TrueTypeFont::load(path, size) {
            Ok(font) => {
                debug!("Using font {}", path.display());
                return Box::new(font);
            }
            Err(e) => debug!("Skipping font candidate: {e}"),
        }
    }

    warn!("No usable font found, falling back to the built-in bitmap font");
    Box::new(BitmapFont::new(size))
}

pub struct TrueTypeFont {
    name: String,
    font: FontVec,
    scale: PxScale,
}

impl TrueTypeFont {
    pub fn load(path: &Path, size: f32) -> Result<Self> {
        let data = fs::read(path).map_err(|e| eyre!("{}: {e}", path.display()))?;
        let font = FontVec::try_from_vec(data).map_err(|e| eyre!("{}: {e}", path.display()))?;

        Ok(Self {
            name: path.display().to_string(),
            font,
            scale: PxScale::from(size),
        })
    }

    /// Walks the glyphs of `text`, calling `f` with each glyph and its caret
    /// position. Returns the final caret position.
    fn layout(&self, text: &str, mut f: impl FnMut(GlyphId, f32)) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            f(id, caret);
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        caret
    }
}

impl GlyphRenderer for TrueTypeFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn line_height(&self) -> u32 {
        self.font.as_scaled(self.scale).height().ceil() as u32
    }

    fn text_width(&self, text: &str) -> u32 {
        self.layout(text, |_, _| {}).ceil() as u32
    }

    fn draw_text(&self, canvas: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>) {
        let baseline = y as f32 + self.font.as_scaled(self.scale).ascent();

        self.layout(text, |id, caret| {
            let glyph = id.with_scale_and_position(self.scale, point(x as f32 + caret, baseline));
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                return;
            };

            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                blend(canvas, px, py, color, coverage);
            });
        });
    }
}

/// The 8x8 font from `font8x8`, scaled up by an integer factor.
pub struct BitmapFont {
    factor: u32,
}

impl BitmapFont {
    const CELL: u32 = 8;

    pub fn new(size: f32) -> Self {
        Self {
            factor: ((size / Self::CELL as f32).round() as u32).max(1),
        }
    }

    fn glyph(ch: char) -> [u8; 8] {
        BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }
}

impl GlyphRenderer for BitmapFont {
    fn name(&self) -> &str {
        "built-in 8x8 bitmap font"
    }

    fn line_height(&self) -> u32 {
        Self::CELL * self.factor
    }

    fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * Self::CELL * self.factor
    }

    fn draw_text(&self, canvas: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>) {
        let advance = Self::CELL * self.factor;

        for (i, ch) in text.chars().enumerate() {
            let left = x as i64 + (i as u32 * advance) as i64;

            for (row, bits) in Self::glyph(ch).iter().enumerate() {
                for col in 0..Self::CELL {
                    // bit 0 is the leftmost pixel
                    if bits & (1 << col) == 0 {
                        continue;
                    }

                    for dy in 0..self.factor {
                        for dx in 0..self.factor {
                            let px = left + (col * self.factor + dx) as i64;
                            let py = y as i64 + (row as u32 * self.factor + dy) as i64;
                            blend(canvas, px, py, color, 1.0);
                        }
                    }
                }
            }
        }
    }
}

/// Mixes `color` into the pixel at `(x, y)`; anything off the canvas is clipped.
fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }

    let coverage = coverage.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        let base = pixel.0[channel] as f32;
        let ink = color.0[channel] as f32;
        pixel.0[channel] = (base + (ink - base) * coverage).round() as u8;
    }
    pixel.0[3] = 255;
}
