//! Glyph blitting into a draw state

use crate::layout::LayoutRun;
use glint_paint::{DrawState, Rect};

/// Paint every glyph of `run` in the state's current color.
///
/// Only pixels with nonzero coverage are written, and only inside the clip.
/// Glyphs without a bitmap are skipped.
pub fn blit(run: &LayoutRun, state: &mut DrawState<'_>) {
    let clip = state.clip();
    let mut painted = 0usize;

    for positioned in run.iter() {
        let Some(bitmap) = positioned.bitmap.as_deref() else {
            continue;
        };
        if bitmap.is_empty() {
            continue;
        }

        let left = positioned.x.saturating_add(i32::from(bitmap.bearing_x));
        let top = positioned.baseline.saturating_sub(i32::from(bitmap.bearing_y));
        let glyph_rect = Rect::new(left, top, bitmap.width as i32, bitmap.height as i32);
        let visible = glyph_rect.intersect(&clip);
        if visible.is_empty() {
            continue;
        }

        for y in visible.y..visible.bottom() {
            let row = (y - top) as u32;
            for x in visible.x..visible.right() {
                if bitmap.coverage_at((x - left) as u32, row) != 0 && state.plot(x, y) {
                    painted += 1;
                }
            }
        }
    }

    tracing::trace!(
        "Blitted {} glyphs, {} pixels",
        run.glyph_count(),
        painted
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PositionedGlyph;
    use crate::rasterizer::GlyphBitmap;
    use crate::resolver::GlyphRef;
    use glint_paint::{Color, PixelBuffer};
    use std::sync::Arc;

    fn square(size: u32) -> Arc<GlyphBitmap> {
        Arc::new(GlyphBitmap {
            coverage: vec![255; (size * size) as usize],
            width: size,
            height: size,
            bearing_x: 0,
            bearing_y: size as i16,
        })
    }

    fn run_at(x: i32, baseline: i32, bitmap: Arc<GlyphBitmap>) -> LayoutRun {
        LayoutRun {
            glyphs: vec![PositionedGlyph {
                glyph: GlyphRef {
                    source: 0,
                    source_key: 1,
                    glyph_id: 1,
                    advance: bitmap.width as u16,
                },
                units: 0..1,
                x,
                baseline,
                bitmap: Some(bitmap),
            }],
            ..LayoutRun::default()
        }
    }

    #[test]
    fn test_glyph_sits_on_baseline() {
        let mut buffer = PixelBuffer::new(10, 10);
        let mut state = DrawState::new(&mut buffer);
        state.set_color(Color::RED);
        blit(&run_at(2, 6, square(3)), &mut state);

        assert_eq!(buffer.count_color(Color::RED), 9);
        assert_eq!(buffer.get_pixel(2, 3), Some(Color::RED));
        assert_eq!(buffer.get_pixel(4, 5), Some(Color::RED));
        assert_eq!(buffer.get_pixel(4, 6), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_zero_coverage_leaves_background() {
        let mut bitmap = (*square(2)).clone();
        bitmap.coverage = vec![255, 0, 0, 255];
        let mut buffer = PixelBuffer::filled(4, 4, Color::WHITE);
        let mut state = DrawState::new(&mut buffer);
        blit(&run_at(0, 2, Arc::new(bitmap)), &mut state);

        assert_eq!(buffer.count_color(Color::BLACK), 2);
        assert_eq!(buffer.get_pixel(1, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_clip_and_buffer_edges() {
        let mut buffer = PixelBuffer::new(8, 8);
        let mut state = DrawState::new(&mut buffer);
        state.set_clip(Rect::new(0, 0, 4, 4));
        // Partly outside the clip and partly off the buffer
        blit(&run_at(-2, 6, square(6)), &mut state);

        assert_eq!(buffer.count_color(Color::BLACK), 4 * 4);
        assert_eq!(buffer.get_pixel(4, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_glyph_without_bitmap_is_skipped() {
        let mut buffer = PixelBuffer::new(4, 4);
        let mut run = run_at(0, 4, square(4));
        run.glyphs[0].bitmap = None;
        blit(&run, &mut DrawState::new(&mut buffer));
        assert_eq!(buffer.count_color(Color::TRANSPARENT), 16);
    }

    #[test]
    fn test_bearings_at_coordinate_limits() {
        let mut bitmap = (*square(3)).clone();
        bitmap.bearing_x = -3;
        bitmap.bearing_y = -3;
        let bitmap = Arc::new(bitmap);
        let mut buffer = PixelBuffer::new(4, 4);
        let mut state = DrawState::new(&mut buffer);

        blit(&run_at(i32::MIN, i32::MAX, Arc::clone(&bitmap)), &mut state);
        blit(&run_at(i32::MAX, i32::MIN, bitmap), &mut state);
        assert_eq!(buffer.count_color(Color::TRANSPARENT), 16);
    }
}
