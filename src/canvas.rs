// src/canvas.rs

//! The bar's pixel buffer and the sub-rectangle views handed to drawers.
//!
//! Pixels are `0x00RRGGBB` words laid out row-major, which matches a 24-bit
//! TrueColor `ZPixmap` image on little-endian hosts, so the buffer can be
//! presented without conversion.

use crate::color::Color;
use std::fmt;

/// An axis-aligned rectangle in pixels. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge, saturating at `u32::MAX`.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge, saturating at `u32::MAX`.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Clips `self` to `bounds`, returning `None` when nothing remains.
    pub fn clip_to(&self, bounds: &Rect) -> Option<Rect> {
        let x = self.x.max(bounds.x);
        let y = self.y.max(bounds.y);
        let right = self.right().min(bounds.right());
        let bottom = self.bottom().min(bounds.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.x,
            self.y,
            self.right(),
            self.bottom()
        )
    }
}

/// Owned pixel buffer the size of the bar window.
#[derive(Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Row-major pixel words.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Fills the whole canvas.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_pixel());
    }

    /// Borrows a writable view over `rect` without copying.
    ///
    /// Returns `None` when `rect` is empty or reaches outside the canvas.
    pub fn view(&mut self, rect: Rect) -> Option<CanvasView<'_>> {
        if rect.is_empty() || !self.bounds().contains(&rect) {
            return None;
        }
        Some(CanvasView {
            pixels: &mut self.pixels,
            stride: self.width as usize,
            rect,
        })
    }
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A writable window onto part of a [`Canvas`].
///
/// Coordinates are relative to the view's own top-left corner and every
/// write is clipped to the view, so a drawer can never paint outside the
/// slice it was given. A view mutably borrows its canvas, which bounds its
/// life to a single compose pass.
pub struct CanvasView<'a> {
    pixels: &'a mut [u32],
    stride: usize,
    rect: Rect,
}

impl CanvasView<'_> {
    pub fn width(&self) -> u32 {
        self.rect.width
    }

    pub fn height(&self) -> u32 {
        self.rect.height
    }

    /// The view's position on the underlying canvas.
    pub fn canvas_rect(&self) -> Rect {
        self.rect
    }

    /// Local bounds, always anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.rect.width, self.rect.height)
    }

    pub fn fill(&mut self, color: Color) {
        let bounds = self.bounds();
        self.fill_rect(bounds, color);
    }

    /// Fills `rect` (view coordinates), clipped to the view.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some(clipped) = rect.clip_to(&self.bounds()) else {
            return;
        };
        let pixel = color.to_pixel();
        for row in clipped.y..clipped.bottom() {
            let start = self.index(clipped.x, row);
            self.pixels[start..start + clipped.width as usize].fill(pixel);
        }
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.rect.width && y < self.rect.height {
            let index = self.index(x, y);
            self.pixels[index] = color.to_pixel();
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.rect.width && y < self.rect.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (self.rect.y + y) as usize * self.stride + (self.rect.x + x) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const RED: Color = Color::Rgb(255, 0, 0);
    const BLUE: Color = Color::Rgb(0, 0, 255);

    #[test]
    fn view_rejects_empty_and_out_of_bounds_rects() {
        let mut canvas = Canvas::new(10, 4);
        assert!(canvas.view(Rect::new(0, 0, 0, 4)).is_none());
        assert!(canvas.view(Rect::new(0, 0, 3, 0)).is_none());
        assert!(canvas.view(Rect::new(8, 0, 3, 4)).is_none());
        assert!(canvas.view(Rect::new(0, 1, 10, 4)).is_none());
        assert!(canvas.view(Rect::new(0, 0, 10, 4)).is_some());
    }

    #[test]
    fn view_writes_land_at_offset_without_spilling() {
        let mut canvas = Canvas::new(6, 3);
        canvas.clear(BLUE);
        {
            let mut view = canvas.view(Rect::new(2, 1, 2, 2)).unwrap();
            assert_eq!(view.bounds(), Rect::new(0, 0, 2, 2));
            view.fill(RED);
            // Clipped writes are ignored.
            view.put_pixel(5, 0, RED);
            view.fill_rect(Rect::new(1, 1, 10, 10), RED);
        }
        for y in 0..3 {
            for x in 0..6 {
                let inside = (2..4).contains(&x) && (1..3).contains(&y);
                let expected = if inside { RED } else { BLUE };
                assert_eq!(
                    canvas.pixel(x, y),
                    Some(expected.to_pixel()),
                    "pixel ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn far_off_view_writes_are_clipped_not_overflowed() {
        let mut canvas = Canvas::new(10, 2);
        canvas.clear(BLUE);
        {
            let mut view = canvas.view(Rect::new(0, 0, 10, 2)).unwrap();
            view.fill_rect(Rect::new(u32::MAX - 1, 0, 4, 1), RED);
            view.fill_rect(Rect::new(0, u32::MAX, 3, u32::MAX), RED);
            view.put_pixel(u32::MAX, u32::MAX, RED);
            // Reaches the view from the left despite a huge width.
            view.fill_rect(Rect::new(8, 1, u32::MAX, 1), RED);
        }
        assert_eq!(canvas.pixel(7, 1), Some(BLUE.to_pixel()));
        assert_eq!(canvas.pixel(8, 1), Some(RED.to_pixel()));
        assert_eq!(canvas.pixel(9, 1), Some(RED.to_pixel()));
        let red = canvas
            .pixels()
            .iter()
            .filter(|&&p| p == RED.to_pixel())
            .count();
        assert_eq!(red, 2);
    }

    #[test]
    fn rect_clip_and_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        assert_eq!(
            Rect::new(5, 5, 10, 10).clip_to(&a),
            Some(Rect::new(5, 5, 5, 5))
        );
        assert_eq!(Rect::new(10, 0, 5, 5).clip_to(&a), None);
        assert!(a.intersects(&Rect::new(9, 9, 1, 1)));
        assert!(!a.intersects(&Rect::new(10, 0, 1, 1)));
        assert_eq!(Rect::new(1, 2, 3, 4).to_string(), "(1,2)-(4,6)");
    }
}
