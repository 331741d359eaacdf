use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{RectStyle, SceneWorld, ScreenAnchor, ScreenText};

use super::text::{draw_text, line_advance, text_width};
use super::transform::{view_bounds_world, world_rect_to_screen, Viewport};

const DEBUG_TEXT_SCALE: i32 = 2;
const DEBUG_PANEL_PADDING: i32 = 8;
const DEBUG_PANEL_INSET: i32 = 6;
const DEBUG_TEXT_COLOR: [u8; 4] = [236, 242, 248, 255];
const DEBUG_PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 200];
const DEBUG_PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const SCREEN_TEXT_MARGIN: i32 = 16;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        compose_frame(self.pixels.frame_mut(), self.viewport, world);
        self.pixels.render()
    }
}

/// Paints one frame: clear, world rects, screen text, then the debug panel.
pub(crate) fn compose_frame(frame: &mut [u8], viewport: Viewport, world: &SceneWorld) {
    let clear_color = world.clear_color();
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&clear_color);
    }

    let Viewport { width, height } = viewport;
    let camera = world.camera();
    let view_bounds = view_bounds_world(camera, viewport);
    for rect in world.rects() {
        if !rect.bounds.intersects(&view_bounds) {
            continue;
        }
        let screen = world_rect_to_screen(&rect.bounds, camera, viewport);
        match rect.style {
            RectStyle::Filled => fill_rect(
                frame,
                width,
                height,
                screen.left,
                screen.top,
                screen.width.max(1),
                screen.height.max(1),
                rect.color,
            ),
            RectStyle::Outline => draw_rect_outline(
                frame,
                width,
                height,
                screen.left,
                screen.top,
                screen.width,
                screen.height,
                rect.color,
            ),
        }
    }

    for text in world.texts() {
        draw_screen_text(frame, viewport, text);
    }

    draw_debug_panel(frame, viewport, world.debug_lines());
}

fn draw_screen_text(frame: &mut [u8], viewport: Viewport, text: &ScreenText) {
    let line_y = text.line * line_advance(text.scale);
    let (x, y) = match text.anchor {
        ScreenAnchor::TopLeft => (SCREEN_TEXT_MARGIN, SCREEN_TEXT_MARGIN + line_y),
        ScreenAnchor::Center => (
            (viewport.width as i32 - text_width(&text.text, text.scale)) / 2,
            viewport.height as i32 / 2 + line_y,
        ),
    };
    draw_text(
        frame,
        viewport.width,
        viewport.height,
        x,
        y,
        &text.text,
        text.scale,
        text.color,
    );
}

fn draw_debug_panel(frame: &mut [u8], viewport: Viewport, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let longest = lines
        .iter()
        .map(|line| text_width(line, DEBUG_TEXT_SCALE))
        .max()
        .unwrap_or(0);
    let line_height = line_advance(DEBUG_TEXT_SCALE);
    let panel_width = longest + DEBUG_PANEL_INSET * 2;
    let panel_height = lines.len() as i32 * line_height + DEBUG_PANEL_INSET * 2;
    let panel_left = viewport.width as i32 - DEBUG_PANEL_PADDING - panel_width;
    let panel_top = DEBUG_PANEL_PADDING;

    fill_rect(
        frame,
        viewport.width,
        viewport.height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        DEBUG_PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        viewport.width,
        viewport.height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        DEBUG_PANEL_BORDER_COLOR,
    );
    for (index, line) in lines.iter().enumerate() {
        draw_text(
            frame,
            viewport.width,
            viewport.height,
            panel_left + DEBUG_PANEL_INSET,
            panel_top + DEBUG_PANEL_INSET + index as i32 * line_height,
            line,
            DEBUG_TEXT_SCALE,
            DEBUG_TEXT_COLOR,
        );
    }
}

fn pixel_range(frame: &[u8], width: u32, height: u32, x: i32, y: i32) -> Option<(usize, usize)> {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return None;
    }
    let pixel_offset = (y as usize)
        .checked_mul(width as usize)
        .and_then(|row| row.checked_add(x as usize))?;
    let byte_offset = pixel_offset.checked_mul(4)?;
    let end = byte_offset.checked_add(4)?;
    if end > frame.len() {
        return None;
    }
    Some((byte_offset, end))
}

/// Source-over blend. Opaque colors overwrite, zero alpha is a no-op.
pub(crate) fn blend_pixel_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    let Some((start, end)) = pixel_range(frame, width, height, x, y) else {
        return;
    };
    let alpha = color[3] as u32;
    if alpha == 255 {
        frame[start..end].copy_from_slice(&color);
        return;
    }
    if alpha == 0 {
        return;
    }
    let pixel = &mut frame[start..end];
    for channel in 0..3 {
        let src = color[channel] as u32;
        let dst = pixel[channel] as u32;
        pixel[channel] = ((src * alpha + dst * (255 - alpha) + 127) / 255) as u8;
    }
    pixel[3] = 255;
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }
    for py in start_y..end_y {
        for px in start_x..end_x {
            blend_pixel_clipped(frame, width, height, px, py, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    fill_rect(frame, width, height, x, y, rect_width, 1, color);
    fill_rect(frame, width, height, x, y + rect_height - 1, rect_width, 1, color);
    fill_rect(frame, width, height, x, y + 1, 1, rect_height - 2, color);
    fill_rect(frame, width, height, x + rect_width - 1, y + 1, 1, rect_height - 2, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Camera2D;
    use crate::sim::{Aabb, Vec2};

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn blend_mixes_half_alpha() {
        let mut frame = vec![0u8; 4];
        frame[3] = 255;
        blend_pixel_clipped(&mut frame, 1, 1, 0, 0, [200, 100, 0, 128]);
        assert_eq!(frame, vec![100, 50, 0, 255]);
    }

    #[test]
    fn out_of_frame_writes_are_ignored() {
        let mut frame = vec![0u8; 2 * 2 * 4];
        blend_pixel_clipped(&mut frame, 2, 2, -1, 0, [255; 4]);
        blend_pixel_clipped(&mut frame, 2, 2, 2, 1, [255; 4]);
        blend_pixel_clipped(&mut frame, 2, 2, 0, 5, [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        fill_rect(&mut frame, 4, 4, -2, 2, 4, 10, [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 0, 2), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 1, 3), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 2, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 5 * 5 * 4];
        draw_rect_outline(&mut frame, 5, 5, 0, 0, 5, 5, [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 0, 0), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 4, 4), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 0, 2), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 5, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn compose_clears_and_draws_world_rects_through_camera() {
        let viewport = Viewport {
            width: 40,
            height: 40,
        };
        let mut world = SceneWorld::default();
        world.set_clear_color([1, 2, 3, 255]);
        *world.camera_mut() = Camera2D {
            position: Vec2::new(10.0, 10.0),
            zoom: 2.0,
        };
        world.fill_rect(
            Aabb::from_top_left(Vec2::new(10.0, 10.0), Vec2::new(5.0, 5.0)),
            [200, 0, 0, 255],
        );
        // Entirely outside the 20x20 world view.
        world.fill_rect(
            Aabb::from_top_left(Vec2::new(100.0, 100.0), Vec2::new(5.0, 5.0)),
            [0, 200, 0, 255],
        );

        let mut frame = vec![0u8; 40 * 40 * 4];
        compose_frame(&mut frame, viewport, &world);

        assert_eq!(pixel(&frame, 40, 0, 0), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 40, 20, 20), [200, 0, 0, 255]);
        assert_eq!(pixel(&frame, 40, 29, 29), [200, 0, 0, 255]);
        assert_eq!(pixel(&frame, 40, 30, 30), [1, 2, 3, 255]);
    }

    #[test]
    fn debug_panel_draws_in_top_right() {
        let viewport = Viewport {
            width: 120,
            height: 60,
        };
        let mut world = SceneWorld::default();
        world.push_debug_line("FPS 60");

        let mut frame = vec![0u8; 120 * 60 * 4];
        compose_frame(&mut frame, viewport, &world);

        let border_x = 120 - DEBUG_PANEL_PADDING as u32 - 1;
        assert_eq!(
            pixel(&frame, 120, border_x, DEBUG_PANEL_PADDING as u32),
            DEBUG_PANEL_BORDER_COLOR
        );
        assert_eq!(pixel(&frame, 120, 2, 2), [0, 0, 0, 255]);
    }
}
