mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    glyph_advance, line_advance, text_width, view_bounds_world, world_rect_to_screen,
    world_to_screen, Renderer, ScreenRect, Viewport, GLYPH_HEIGHT, GLYPH_WIDTH,
};
pub use scene::{
    Camera2D, InputSnapshot, RectStyle, Scene, SceneCommand, SceneWorld, ScreenAnchor, ScreenText,
    WorldRect, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN,
};
