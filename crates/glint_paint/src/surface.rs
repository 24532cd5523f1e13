//! CPU pixel buffer that text and shapes are painted into.

use crate::color::Color;
use crate::primitives::Rect;

/// Row-major buffer of packed ARGB pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a buffer cleared to transparent.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    /// Create a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            pixels: vec![color.argb(); width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The whole buffer as a rectangle at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            0,
            0,
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
        )
    }

    /// Get the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Get a pixel at (x, y), `None` outside the buffer.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|idx| Color::from_argb(self.pixels[idx]))
    }

    /// Store a pixel; out-of-bounds writes are dropped and return `false`.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.pixels[idx] = color.argb();
                true
            }
            None => false,
        }
    }

    /// Set every pixel inside `rect` (clamped to the buffer) to `color`.
    pub fn fill(&mut self, rect: Rect, color: Color) {
        let area = rect.intersect(&self.bounds());
        if area.is_empty() {
            return;
        }
        let stride = self.width as usize;
        for y in area.y..area.bottom() {
            let start = y as usize * stride + area.x as usize;
            self.pixels[start..start + area.width as usize].fill(color.argb());
        }
    }

    /// Number of pixels that differ from `other`.
    ///
    /// Buffers of different sizes count every pixel of the larger one.
    pub fn diff_pixel_count(&self, other: &PixelBuffer) -> usize {
        if self.width != other.width || self.height != other.height {
            return self.pixel_count().max(other.pixel_count());
        }
        self.pixels
            .iter()
            .zip(other.pixels.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Count the pixels whose value is `color`.
    pub fn count_color(&self, color: Color) -> usize {
        self.pixels.iter().filter(|&&p| p == color.argb()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = PixelBuffer::filled(100, 50, Color::WHITE);
        assert_eq!(buffer.pixel_count(), 5000);
        assert_eq!(buffer.count_color(Color::WHITE), 5000);
        assert_eq!(buffer.bounds(), Rect::new(0, 0, 100, 50));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut buffer = PixelBuffer::new(4, 4);
        assert!(!buffer.set_pixel(-1, 0, Color::RED));
        assert!(!buffer.set_pixel(4, 0, Color::RED));
        assert!(buffer.get_pixel(0, 4).is_none());
        assert_eq!(buffer.count_color(Color::RED), 0);

        assert!(buffer.set_pixel(3, 3, Color::RED));
        assert_eq!(buffer.get_pixel(3, 3), Some(Color::RED));
    }

    #[test]
    fn test_fill_clamps_to_buffer() {
        let mut buffer = PixelBuffer::new(10, 10);
        buffer.fill(Rect::new(-5, 8, 100, 100), Color::BLUE);
        assert_eq!(buffer.count_color(Color::BLUE), 20);
    }

    #[test]
    fn test_diff() {
        let a = PixelBuffer::filled(8, 8, Color::WHITE);
        let mut b = a.clone();
        b.set_pixel(1, 1, Color::BLACK);
        b.set_pixel(2, 1, Color::BLACK);
        assert_eq!(a.diff_pixel_count(&b), 2);
        assert_eq!(a.diff_pixel_count(&PixelBuffer::new(2, 2)), 64);
    }
}
