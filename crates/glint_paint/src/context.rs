//! Draw state - the ambient context every paint operation goes through

use crate::color::Color;
use crate::primitives::Rect;
use crate::surface::PixelBuffer;

/// Stroke style for outlined shapes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// Alternate painted and skipped pixels along the outline
    Dotted,
}

/// Current color, clip and stroke style, bound to one destination buffer.
///
/// The caller owns the state and lends it to a single draw call; nothing in
/// the engine keeps it afterwards.
pub struct DrawState<'a> {
    target: &'a mut PixelBuffer,
    color: Color,
    clip: Rect,
    stroke: StrokeStyle,
}

impl<'a> DrawState<'a> {
    /// Black, solid, clipped to the whole buffer
    pub fn new(target: &'a mut PixelBuffer) -> Self {
        let clip = target.bounds();
        Self {
            target,
            color: Color::BLACK,
            clip,
            stroke: StrokeStyle::Solid,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Replace the clip; it is always kept inside the buffer.
    pub fn set_clip(&mut self, clip: Rect) {
        self.clip = clip.intersect(&self.target.bounds());
        if self.clip.is_empty() {
            tracing::trace!("clip {:?} leaves nothing drawable", clip);
        }
    }

    /// Restore the clip to the full buffer
    pub fn reset_clip(&mut self) {
        self.clip = self.target.bounds();
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        self.stroke
    }

    pub fn set_stroke_style(&mut self, stroke: StrokeStyle) {
        self.stroke = stroke;
    }

    pub fn target(&self) -> &PixelBuffer {
        &*self.target
    }

    /// Paint one pixel with the current color at full alpha.
    ///
    /// Returns `false` when the pixel falls outside the clip.
    pub fn plot(&mut self, x: i32, y: i32) -> bool {
        if !self.clip.contains(x, y) {
            return false;
        }
        self.target.set_pixel(x, y, self.color.opaque())
    }

    /// Fill `rect` with the current color as-is.
    ///
    /// A transparent color writes transparent pixels, which is how callers
    /// clear a region.
    pub fn fill_rect(&mut self, rect: Rect) {
        let area = rect.intersect(&self.clip);
        self.target.fill(area, self.color);
    }

    /// Fill the whole clip with `color`, leaving the current color untouched
    pub fn clear(&mut self, color: Color) {
        self.target.fill(self.clip, color);
    }

    /// Outline `rect` with a one pixel stroke in the current stroke style.
    pub fn draw_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let color = self.color;
        let (left, top) = (rect.x, rect.y);
        let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);

        // Walk the perimeter once, clockwise, so dotted strokes stay in phase.
        let mut step = 0usize;
        let mut stroke = |state: &mut Self, x: i32, y: i32| {
            let paint = match state.stroke {
                StrokeStyle::Solid => true,
                StrokeStyle::Dotted => step % 2 == 0,
            };
            step += 1;
            if paint && state.clip.contains(x, y) {
                state.target.set_pixel(x, y, color);
            }
        };

        for x in left..=right {
            stroke(self, x, top);
        }
        for y in top.saturating_add(1)..=bottom {
            stroke(self, right, y);
        }
        if bottom > top {
            for x in (left..right).rev() {
                stroke(self, x, bottom);
            }
        }
        if right > left {
            for y in (top.saturating_add(1)..bottom).rev() {
                stroke(self, left, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_respects_clip() {
        let mut buffer = PixelBuffer::filled(10, 10, Color::WHITE);
        let mut state = DrawState::new(&mut buffer);
        state.set_clip(Rect::new(2, 2, 3, 3));

        assert!(!state.plot(1, 1));
        assert!(state.plot(2, 2));
        assert!(!state.plot(5, 5));
        assert_eq!(buffer.count_color(Color::BLACK), 1);
    }

    #[test]
    fn test_plot_is_opaque() {
        let mut buffer = PixelBuffer::new(2, 2);
        let mut state = DrawState::new(&mut buffer);
        state.set_color(Color::from_argb(0x0012_3456));
        state.plot(0, 0);
        assert_eq!(buffer.get_pixel(0, 0), Some(Color::from_argb(0xFF12_3456)));
    }

    #[test]
    fn test_transparent_fill_erases() {
        let mut buffer = PixelBuffer::filled(4, 4, Color::BLACK);
        let mut state = DrawState::new(&mut buffer);
        state.set_color(Color::from_argb(0x00FF_FFFF));
        state.fill_rect(Rect::new(0, 0, 4, 2));
        assert_eq!(buffer.count_color(Color::from_argb(0x00FF_FFFF)), 8);
        assert_eq!(buffer.count_color(Color::BLACK), 8);
    }

    #[test]
    fn test_clip_clamped_to_buffer() {
        let mut buffer = PixelBuffer::new(10, 10);
        let mut state = DrawState::new(&mut buffer);
        state.set_clip(Rect::new(-10, -10, 15, 15));
        assert_eq!(state.clip(), Rect::new(0, 0, 5, 5));
        state.reset_clip();
        assert_eq!(state.clip(), Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_solid_and_dotted_outline() {
        let mut solid = PixelBuffer::new(10, 10);
        DrawState::new(&mut solid).draw_rect(Rect::new(0, 0, 5, 5));
        // 5x5 outline has 16 perimeter pixels
        assert_eq!(solid.count_color(Color::BLACK), 16);

        let mut dotted = PixelBuffer::new(10, 10);
        let mut state = DrawState::new(&mut dotted);
        state.set_stroke_style(StrokeStyle::Dotted);
        state.draw_rect(Rect::new(0, 0, 5, 5));
        assert_eq!(dotted.count_color(Color::BLACK), 8);
    }
}
