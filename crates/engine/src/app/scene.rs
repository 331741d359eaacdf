use crate::sim::{Aabb, Vec2};

use super::input::{ActionStates, InputAction};
use super::metrics::LoopMetricsSnapshot;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.25;
pub const CAMERA_ZOOM_MAX: f32 = 8.0;
const DEFAULT_CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    any_key_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        any_key_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            any_key_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// True only on the first tick after the action went down.
    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.pressed(action)
    }

    /// Any keyboard key went down since the previous tick, bound or not.
    pub fn any_key_pressed(&self) -> bool {
        self.any_key_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set_down(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.actions.set_pressed(action, pressed);
        if pressed {
            self.actions.set_down(action, true);
            self.any_key_pressed = true;
        }
        self
    }

    pub fn with_any_key_pressed(mut self, any_key_pressed: bool) -> Self {
        self.any_key_pressed = any_key_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

/// `position` is the world point shown at the viewport center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    /// Size of the visible world region for a viewport in pixels.
    pub fn view_size(&self, viewport: (u32, u32)) -> Vec2 {
        let zoom = self.effective_zoom();
        Vec2::new(viewport.0 as f32 / zoom, viewport.1 as f32 / zoom)
    }

    /// Centers on `target` without showing anything outside `0..world_size`.
    /// An axis narrower than the view is centered on the world instead.
    pub fn follow_clamped(&mut self, target: Vec2, viewport: (u32, u32), world_size: Vec2) {
        let view = self.view_size(viewport);
        self.position = Vec2::new(
            clamp_axis(target.x, view.x, world_size.x),
            clamp_axis(target.y, view.y, world_size.y),
        );
    }
}

fn clamp_axis(target: f32, view: f32, world: f32) -> f32 {
    let half = view * 0.5;
    if world <= view {
        return world * 0.5;
    }
    target.clamp(half, world - half)
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectStyle {
    Filled,
    Outline,
}

/// A rectangle in world pixels. Alpha below 255 is blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub bounds: Aabb,
    pub color: [u8; 4],
    pub style: RectStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAnchor {
    TopLeft,
    Center,
}

/// Text fixed to the screen. `line` offsets from the anchor in whole lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenText {
    pub text: String,
    pub anchor: ScreenAnchor,
    pub line: i32,
    pub scale: i32,
    pub color: [u8; 4],
}

/// Per-scene state the host shares with the renderer. The draw lists are
/// rebuilt every frame by `Scene::render`.
#[derive(Debug, Clone)]
pub struct SceneWorld {
    camera: Camera2D,
    clear_color: [u8; 4],
    rects: Vec<WorldRect>,
    texts: Vec<ScreenText>,
    debug_lines: Vec<String>,
    loop_metrics: LoopMetricsSnapshot,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self {
            camera: Camera2D::default(),
            clear_color: DEFAULT_CLEAR_COLOR,
            rects: Vec::new(),
            texts: Vec::new(),
            debug_lines: Vec::new(),
            loop_metrics: LoopMetricsSnapshot::default(),
        }
    }
}

impl SceneWorld {
    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn clear_color(&self) -> [u8; 4] {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: [u8; 4]) {
        self.clear_color = color;
    }

    pub fn fill_rect(&mut self, bounds: Aabb, color: [u8; 4]) {
        self.rects.push(WorldRect {
            bounds,
            color,
            style: RectStyle::Filled,
        });
    }

    pub fn outline_rect(&mut self, bounds: Aabb, color: [u8; 4]) {
        self.rects.push(WorldRect {
            bounds,
            color,
            style: RectStyle::Outline,
        });
    }

    pub fn push_text(&mut self, text: ScreenText) {
        self.texts.push(text);
    }

    pub fn push_debug_line(&mut self, line: impl Into<String>) {
        self.debug_lines.push(line.into());
    }

    pub fn rects(&self) -> &[WorldRect] {
        &self.rects
    }

    pub fn texts(&self) -> &[ScreenText] {
        &self.texts
    }

    pub fn debug_lines(&self) -> &[String] {
        &self.debug_lines
    }

    pub fn loop_metrics(&self) -> LoopMetricsSnapshot {
        self.loop_metrics
    }

    pub(crate) fn set_loop_metrics(&mut self, metrics: LoopMetricsSnapshot) {
        self.loop_metrics = metrics;
    }

    pub(crate) fn begin_frame(&mut self) {
        self.rects.clear();
        self.texts.clear();
        self.debug_lines.clear();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Unload, clear the world, and load again.
    HardReset,
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &mut SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            return SceneCommand::None;
        }
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn render(&mut self) {
        self.world.begin_frame();
        if self.is_loaded {
            self.scene.render(&mut self.world);
        }
    }

    pub(crate) fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        let metrics = self.world.loop_metrics();
        self.world.clear();
        self.world.set_loop_metrics(metrics);
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }
}
