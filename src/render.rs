// SPDX-License-Identifier: MPL-2.0
//! Marker glyph and legend rendering.
//!
//! All drawing mutates the canvas in place and clips silently at the canvas
//! edges, so out-of-bounds pixel coordinates from the projector are
//! tolerated. Legend drawing is not idempotent: each call stacks another box
//! at the same fixed position, so the orchestrator calls it exactly once,
//! after all markers.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use log::warn;

/// Default marker color (red).
pub const MARKER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Default marker size: the outer ring radius in pixels.
pub const MARKER_SIZE: i64 = 20;
/// Caption shown in the legend box.
pub const LEGEND_CAPTION: &str = "GPS Markers";

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

const LEGEND_MARGIN: i64 = 20;
const LEGEND_PADDING: i64 = 10;
const LEGEND_FONT_SIZE: f32 = 24.0;
/// Extra box width reserved for the sample glyph.
const LEGEND_GLYPH_ALLOWANCE: i64 = 30;
/// Per-character advance used to size the box when no font is available.
const FALLBACK_CHAR_ADVANCE: i64 = 14;

fn px(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Draws a marker glyph centered at `(x, y)`: an unfilled outer ring of
/// radius `size` (stroke width 3, drawn inward), a filled inner disk of
/// radius `size / 2`, and a crosshair reaching `1.5 * size` in each
/// direction (stroke width 2).
pub fn draw_marker(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, size: i64) {
    draw_ring(canvas, x, y, color, size);
    draw_core(canvas, x, y, color, size);
    draw_crosshair(canvas, x, y, color, size);
}

/// The three 1-px rings stroke inward from `size` so the glyph's bounding
/// box stays exactly `(x - size, y - size)..(x + size, y + size)`.
fn draw_ring(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, size: i64) {
    for radius in (size - 2)..=size {
        if radius > 0 {
            draw_hollow_circle_mut(canvas, (px(x), px(y)), px(radius), color);
        }
    }
}

fn draw_core(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, size: i64) {
    draw_filled_circle_mut(canvas, (px(x), px(y)), px(size / 2), color);
}

/// Width-2 strokes are two adjacent 1-px segments. An even-width stroke has
/// no center column on the pixel grid; the second segment goes to the
/// right/below (offset +1), so the glyph sits half a pixel right/down of a
/// centered stroke.
fn draw_crosshair(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, size: i64) {
    let reach = size * 3 / 2;
    let (x, y) = (px(x) as f32, px(y) as f32);
    let reach = px(reach) as f32;

    for offset in [0.0, 1.0] {
        draw_line_segment_mut(
            canvas,
            (x + offset, y - reach),
            (x + offset, y + reach),
            color,
        );
        draw_line_segment_mut(
            canvas,
            (x - reach, y + offset),
            (x + reach, y + offset),
            color,
        );
    }
}

/// Attempts to load a TTF font for the legend caption from well-known
/// system locations. `None` degrades the legend, it never fails the run.
pub fn load_legend_font() -> Option<FontVec> {
    const CANDIDATES: [&str; 4] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
    ];

    CANDIDATES
        .iter()
        .filter_map(|path| std::fs::read(path).ok())
        .find_map(|bytes| FontVec::try_from_vec(bytes).ok())
}

struct LegendLayout {
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

fn legend_layout(canvas_width: u32, caption: &str, font: Option<&FontVec>) -> LegendLayout {
    let (text_width, text_height) = match font {
        Some(font) => {
            let (w, h) = text_size(PxScale::from(LEGEND_FONT_SIZE), font, caption);
            (i64::from(w), i64::from(h))
        }
        // No measurable text without a font; size the box from a fixed
        // advance so it still renders in a stable position.
        None => (
            caption.chars().count() as i64 * FALLBACK_CHAR_ADVANCE,
            LEGEND_FONT_SIZE as i64,
        ),
    };

    let width = text_width + LEGEND_PADDING * 4 + LEGEND_GLYPH_ALLOWANCE;
    let height = text_height + LEGEND_PADDING * 2;

    LegendLayout {
        x: i64::from(canvas_width) - width - LEGEND_MARGIN,
        y: LEGEND_MARGIN,
        width,
        height,
    }
}

/// Draws the legend: a white, black-bordered box anchored 20 px from the
/// canvas's top-right corner, containing a half-size sample glyph and the
/// caption.
///
/// Not idempotent; call once per run, after all markers, so it layers on
/// top of any marker that falls under it.
pub fn draw_legend(canvas: &mut RgbaImage, caption: &str, font: Option<&FontVec>) {
    let layout = legend_layout(canvas.width(), caption, font);

    // Box corners are inclusive, hence the +1 when converting to sizes.
    let rect = Rect::at(px(layout.x), px(layout.y))
        .of_size((layout.width + 1) as u32, (layout.height + 1) as u32);
    draw_filled_rect_mut(canvas, rect, WHITE);
    draw_hollow_rect_mut(canvas, rect, BLACK);

    let glyph_x = layout.x + LEGEND_PADDING + 15;
    let glyph_y = layout.y + layout.height / 2;
    draw_marker(canvas, glyph_x, glyph_y, MARKER_COLOR, MARKER_SIZE / 2);

    let text_x = glyph_x + LEGEND_GLYPH_ALLOWANCE;
    let text_y = layout.y + LEGEND_PADDING;
    match font {
        Some(font) => draw_text_mut(
            canvas,
            BLACK,
            px(text_x),
            px(text_y),
            PxScale::from(LEGEND_FONT_SIZE),
            font,
            caption,
        ),
        None => warn!("no legend font available, drawing legend without caption"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))
    }

    fn colored_bbox(canvas: &RgbaImage, color: Rgba<u8>) -> Option<(u32, u32, u32, u32)> {
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in canvas.enumerate_pixels() {
            if *pixel == color {
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bbox
    }

    #[test]
    fn outer_ring_bounding_box_matches_size() {
        let mut canvas = blank(200, 200);
        draw_ring(&mut canvas, 100, 100, MARKER_COLOR, 20);
        assert_eq!(colored_bbox(&canvas, MARKER_COLOR), Some((80, 80, 120, 120)));
    }

    #[test]
    fn ring_is_unfilled() {
        let mut canvas = blank(200, 200);
        draw_ring(&mut canvas, 100, 100, MARKER_COLOR, 20);
        assert_ne!(*canvas.get_pixel(100, 100), MARKER_COLOR);
    }

    #[test]
    fn inner_disk_radius_is_half_size() {
        let mut canvas = blank(200, 200);
        draw_core(&mut canvas, 100, 100, MARKER_COLOR, 20);
        // Radius 10 from integer division.
        assert_eq!(*canvas.get_pixel(90, 100), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(110, 100), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(89, 100), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(111, 100), MARKER_COLOR);
    }

    #[test]
    fn crosshair_reaches_one_and_a_half_sizes() {
        let mut canvas = blank(200, 200);
        draw_crosshair(&mut canvas, 100, 100, MARKER_COLOR, 20);
        assert_eq!(*canvas.get_pixel(100, 70), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(100, 130), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(70, 100), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(130, 100), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(100, 69), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(69, 100), MARKER_COLOR);
    }

    #[test]
    fn crosshair_second_stroke_goes_right_and_down() {
        let mut canvas = blank(200, 200);
        draw_crosshair(&mut canvas, 100, 100, MARKER_COLOR, 20);
        // Vertical stroke occupies columns x and x+1, never x-1; same for
        // the horizontal stroke's rows.
        assert_eq!(*canvas.get_pixel(100, 80), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(101, 80), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(99, 80), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(80, 100), MARKER_COLOR);
        assert_eq!(*canvas.get_pixel(80, 101), MARKER_COLOR);
        assert_ne!(*canvas.get_pixel(80, 99), MARKER_COLOR);
    }

    #[test]
    fn off_canvas_marker_clips_silently() {
        let mut canvas = blank(50, 50);
        draw_marker(&mut canvas, -100, -100, MARKER_COLOR, MARKER_SIZE);
        draw_marker(&mut canvas, 500, 25, MARKER_COLOR, MARKER_SIZE);
        // Nothing from either marker reaches the canvas; no panic either.
        assert_eq!(colored_bbox(&canvas, MARKER_COLOR), None);
    }

    #[test]
    fn partially_off_canvas_marker_draws_visible_part() {
        let mut canvas = blank(100, 100);
        draw_marker(&mut canvas, 0, 50, MARKER_COLOR, MARKER_SIZE);
        assert!(colored_bbox(&canvas, MARKER_COLOR).is_some());
    }

    #[test]
    fn legend_right_edge_sits_twenty_pixels_from_canvas_edge() {
        let mut canvas = blank(400, 300);
        draw_legend(&mut canvas, LEGEND_CAPTION, None);

        let layout = legend_layout(400, LEGEND_CAPTION, None);
        assert_eq!(layout.x + layout.width, 400 - 20);
        assert_eq!(layout.y, 20);
        // Border pixels at the box corners.
        assert_eq!(*canvas.get_pixel(layout.x as u32, 20), BLACK);
        assert_eq!(*canvas.get_pixel((400 - 20) as u32, 20), BLACK);
        // Interior is white.
        assert_eq!(*canvas.get_pixel(layout.x as u32 + 2, 22), WHITE);
    }

    #[test]
    fn legend_drawn_twice_stacks_in_the_same_position() {
        // Documents non-idempotence: a second call repaints an identical box
        // at the same fixed position, so the pixels do not change, but each
        // call repaints on top of whatever is under the box.
        let mut canvas = blank(400, 300);
        draw_marker(&mut canvas, 380, 40, MARKER_COLOR, MARKER_SIZE);
        draw_legend(&mut canvas, LEGEND_CAPTION, None);
        let once = canvas.clone();
        draw_legend(&mut canvas, LEGEND_CAPTION, None);
        assert_eq!(once.as_raw(), canvas.as_raw());
    }

    #[test]
    fn legend_layout_grows_with_caption_length() {
        let short = legend_layout(800, "a", None);
        let long = legend_layout(800, "a much longer caption", None);
        assert!(long.width > short.width);
        assert!(long.x < short.x);
    }
}
