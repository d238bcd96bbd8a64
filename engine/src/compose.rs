//! Places the generated image on a white canvas and writes the key message
//! underneath it.
//!
//! ```text
//! +--------------------------------+
//! |            MARGIN              |
//! |   +------------------------+   |
//! |   |    generated image     |   |
//! |   |        w x h           |   |
//! |   +------------------------+   |
//! |   |   TEXT_BLOCK_HEIGHT    |   |
//! |   |   wrapped key message  |   |
//! |   +------------------------+   |
//! |            MARGIN              |
//! +--------------------------------+
//! ```

use color_eyre::Result;
use image::{Rgba, RgbaImage, imageops};
use log::{debug, warn};

use crate::PipelineError;

pub mod font;
pub mod wrap;

pub use font::{GlyphRenderer, load_font};
pub use wrap::wrap_text;

pub const MARGIN: u32 = 50;
pub const TEXT_BLOCK_HEIGHT: u32 = 200;
pub const FONT_SIZE: f32 = 40.0;
pub const LINE_SPACING: u32 = 8;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Decodes the downloaded image and composes it with `key_message`.
pub fn compose(image_bytes: &[u8], key_message: &str, font: &dyn GlyphRenderer) -> Result<RgbaImage> {
    let original = image::load_from_memory(image_bytes)
        .map_err(|e| PipelineError::Render(format!("couldn't decode generated image: {e}")))?
        .to_rgba8();

    Ok(compose_image(&original, key_message, font))
}

pub fn compose_image(original: &RgbaImage, key_message: &str, font: &dyn GlyphRenderer) -> RgbaImage {
    let (width, height) = original.dimensions();
    let mut canvas = RgbaImage::from_pixel(
        width + 2 * MARGIN,
        height + TEXT_BLOCK_HEIGHT + 2 * MARGIN,
        WHITE,
    );
    imageops::overlay(&mut canvas, original, MARGIN.into(), MARGIN.into());

    let mut lines = wrap_text(key_message, width, |s| font.text_width(s));
    let line_height = font.line_height() + LINE_SPACING;
    let max_lines = (TEXT_BLOCK_HEIGHT / line_height).max(1) as usize;
    if lines.len() > max_lines {
        warn!(
            "Key message needs {} lines, only {max_lines} fit below the image",
            lines.len()
        );
        lines.truncate(max_lines);
    }
    debug!("Rendering {} line(s) with {}", lines.len(), font.name());

    let block_top = MARGIN + height;
    let used_height = (lines.len() as u32 * line_height).saturating_sub(LINE_SPACING);
    let mut y = block_top + TEXT_BLOCK_HEIGHT.saturating_sub(used_height) / 2;

    for line in &lines {
        let line_width = font.text_width(line);
        let x = MARGIN + width.saturating_sub(line_width) / 2;
        font.draw_text(&mut canvas, x, y, line, TEXT_COLOR);
        y += line_height;
    }

    canvas
}
