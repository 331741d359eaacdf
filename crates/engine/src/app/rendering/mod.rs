mod renderer;
mod text;
mod transform;

pub use renderer::Renderer;
pub use text::{glyph_advance, line_advance, text_width, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use transform::{view_bounds_world, world_rect_to_screen, world_to_screen, ScreenRect, Viewport};
