// src/drawers/paint.rs

//! Small painting helpers shared by the bundled drawers: a 3x5 bitmap font
//! for numeric read-outs and a horizontal gauge.

use crate::canvas::{CanvasView, Rect};
use crate::color::Color;

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
/// Blank columns between glyphs, in font cells.
const GLYPH_SPACING: u32 = 1;

/// Rows of a glyph, top to bottom; bit 2 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ' ' => [0; 5],
        _ => return None,
    };
    Some(rows)
}

/// Font cell size in pixels that fits `height` with a cell of margin above
/// and below the text.
pub fn text_scale(height: u32) -> u32 {
    (height / (GLYPH_HEIGHT + 2)).max(1)
}

/// Width in pixels of `text` rendered at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0;
    }
    (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale
}

/// Draws `text` with its top-left corner at `(x, y)`.
///
/// Characters outside the font render as a filled block so unsupported
/// input is visible rather than silently dropped.
pub fn draw_text(view: &mut CanvasView<'_>, x: u32, y: u32, text: &str, scale: u32, color: Color) {
    let mut pen_x = x;
    for c in text.chars() {
        let rows = glyph(c).unwrap_or([0b111; 5]);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0b100 >> col) != 0 {
                    view.fill_rect(
                        Rect::new(
                            pen_x + col * scale,
                            y + row as u32 * scale,
                            scale,
                            scale,
                        ),
                        color,
                    );
                }
            }
        }
        pen_x += (GLYPH_WIDTH + GLYPH_SPACING) * scale;
    }
}

/// Draws `text` vertically centered, starting `left` pixels into the view.
/// Returns the x coordinate just past the text.
pub fn draw_label(view: &mut CanvasView<'_>, left: u32, text: &str, color: Color) -> u32 {
    let scale = text_scale(view.height());
    let y = view.height().saturating_sub(GLYPH_HEIGHT * scale) / 2;
    draw_text(view, left, y, text, scale, color);
    left + text_width(text, scale)
}

/// Draws a one-pixel outline in `area` and fills `fraction` (0.0..=1.0) of
/// its interior from the left.
pub fn draw_gauge(view: &mut CanvasView<'_>, area: Rect, fraction: f64, color: Color) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    view.fill_rect(Rect::new(area.x, area.y, area.width, 1), color);
    view.fill_rect(Rect::new(area.x, area.bottom() - 1, area.width, 1), color);
    view.fill_rect(Rect::new(area.x, area.y, 1, area.height), color);
    view.fill_rect(Rect::new(area.right() - 1, area.y, 1, area.height), color);

    let inner_width = area.width - 2;
    let filled = (f64::from(inner_width) * fraction.clamp(0.0, 1.0)).round() as u32;
    view.fill_rect(
        Rect::new(area.x + 1, area.y + 1, filled, area.height - 2),
        color,
    );
}
