use crate::app::Camera2D;
use crate::sim::{Aabb, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// World pixels are y-down, the same as the screen.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (f32, f32) {
    let zoom = camera.effective_zoom();
    let x = (world.x - camera.position.x) * zoom + viewport.width as f32 * 0.5;
    let y = (world.y - camera.position.y) * zoom + viewport.height as f32 * 0.5;
    (x, y)
}

/// Edges are floored so that adjacent tiles share a pixel boundary.
pub fn world_rect_to_screen(bounds: &Aabb, camera: &Camera2D, viewport: Viewport) -> ScreenRect {
    let (left, top) = world_to_screen(bounds.min, camera, viewport);
    let (right, bottom) = world_to_screen(bounds.max, camera, viewport);
    let left = left.floor() as i32;
    let top = top.floor() as i32;
    ScreenRect {
        left,
        top,
        width: right.floor() as i32 - left,
        height: bottom.floor() as i32 - top,
    }
}

pub fn view_bounds_world(camera: &Camera2D, viewport: Viewport) -> Aabb {
    Aabb::from_center(
        camera.position,
        camera.view_size((viewport.width, viewport.height)),
    )
}
