use engine::sim::{AnimationState, Facing, PickupKind, PlayerTint};
use engine::{
    Aabb, InputAction, InputSnapshot, LevelDef, LevelError, PhysicsTuning, PlayerInput,
    RestartKind, Scene, SceneCommand, ScenePhase, SceneWorld, ScreenAnchor, ScreenText, SimEvent,
    Simulation, TickSnapshot, Vec2,
};
use tracing::{debug, info};

mod vfx;

use vfx::DustEmitter;

const WINDOW_TITLE: &str = "Nifty Ice Jumps";
const INTRO_TITLE_TEXT: &str = "Welcome to Nifty Ice Jumps!";
const INTRO_PROMPT_TEXT: &str = "Press any key to begin!";
const WIN_TITLE_TEXT: &str = "You have won!";
const WIN_PROMPT_TEXT: &str = "Press any key to restart";
const JUMP_SOUND_CUE: &str = "jump";

const CLEAR_COLOR: [u8; 4] = [28, 36, 58, 255];
const ICE_TILE_COLOR: [u8; 4] = [178, 222, 242, 255];
const HAZARD_TILE_COLOR: [u8; 4] = [214, 74, 58, 255];
const DECOR_TILE_COLOR: [u8; 4] = [64, 84, 116, 255];
const COIN_COLOR: [u8; 4] = [250, 210, 60, 255];
const KEY_COLOR: [u8; 4] = [255, 150, 40, 255];
const FLAG_COLOR: [u8; 4] = [84, 204, 112, 255];
const FLAG_POLE_COLOR: [u8; 4] = [220, 220, 220, 255];
const PLAYER_COLOR: [u8; 4] = [236, 240, 255, 255];
const PLAYER_AIR_COLOR: [u8; 4] = [198, 214, 255, 255];
const PLAYER_FINISHED_COLOR: [u8; 4] = [232, 38, 38, 255];
const PLAYER_EYE_COLOR: [u8; 4] = [20, 22, 34, 255];
const DUST_COLOR: [u8; 3] = [236, 246, 255];
const INTRO_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const WIN_TEXT_COLOR: [u8; 4] = [96, 140, 255, 255];
const HUD_TEXT_COLOR: [u8; 4] = [236, 242, 248, 255];
const DEBUG_BODY_COLOR: [u8; 4] = [255, 64, 255, 255];
const DEBUG_GROUND_COLOR: [u8; 4] = [255, 236, 80, 255];
const DEBUG_PICKUP_COLOR: [u8; 4] = [80, 240, 255, 255];
const COIN_INSET_PX: f32 = 4.0;
const EYE_SIZE_PX: f32 = 4.0;

/// Drives one level: feeds input to the simulation, turns its events into
/// cues, applies restarts, and draws the snapshot.
pub(crate) struct PlatformerScene {
    sim: Simulation,
    camera_zoom: f32,
    dust: DustEmitter,
    debug_draw: bool,
    needs_reload: bool,
    jump_cues: u32,
    last_viewport: (u32, u32),
}

impl PlatformerScene {
    /// Builds the simulation eagerly so a bad level fails before any window
    /// exists.
    pub(crate) fn new(
        level: LevelDef,
        tuning: PhysicsTuning,
        camera_zoom: f32,
    ) -> Result<Self, LevelError> {
        Ok(Self {
            sim: Simulation::new(level, tuning)?,
            camera_zoom,
            dust: DustEmitter::default(),
            debug_draw: false,
            needs_reload: false,
            jump_cues: 0,
            last_viewport: (0, 0),
        })
    }

    #[cfg(test)]
    pub(crate) fn simulation(&self) -> &Simulation {
        &self.sim
    }

    fn handle_events(&mut self, snapshot: &TickSnapshot) {
        for event in &snapshot.events {
            match *event {
                SimEvent::Jumped => {
                    self.jump_cues = self.jump_cues.saturating_add(1);
                    info!(cue = JUMP_SOUND_CUE, tick = snapshot.tick, "sound_cue");
                }
                SimEvent::CoinCollected { pickup } => {
                    debug!(
                        pickup = pickup.0,
                        coins = snapshot.coins_collected,
                        "coin_collected"
                    );
                }
                SimEvent::HazardTouched { cell } => {
                    info!(cell_x = cell.x, cell_y = cell.y, "hazard_restart");
                }
                SimEvent::BodyRecovered => self.dust.clear(),
                SimEvent::IntroDismissed
                | SimEvent::ParticlesStarted
                | SimEvent::ParticlesStopped
                | SimEvent::KeyCollected { .. }
                | SimEvent::FlagReached { .. }
                | SimEvent::RestartRequested(_) => {}
            }
        }
    }

    fn follow_player(&self, world: &mut SceneWorld) {
        let target = self.sim.snapshot().player.position;
        let map_size = self.sim.tile_world().pixel_size();
        world
            .camera_mut()
            .follow_clamped(target, self.last_viewport, map_size);
    }

    fn draw_tiles(&self, world: &mut SceneWorld) {
        let tiles = self.sim.tile_world();
        for (cell, kind) in tiles.occupied_cells() {
            let color = if kind.forces_restart() {
                HAZARD_TILE_COLOR
            } else if kind.solid {
                ICE_TILE_COLOR
            } else {
                DECOR_TILE_COLOR
            };
            let bounds = Aabb::from_top_left(
                Vec2::new(tiles.cell_left(cell.x), tiles.cell_top(cell.y)),
                Vec2::new(tiles.tile_size(), tiles.tile_size()),
            );
            world.fill_rect(bounds, color);
        }
    }

    fn draw_pickups(&self, world: &mut SceneWorld) {
        for pickup in self.sim.objectives().live_pickups() {
            let bounds = pickup.bounds();
            match pickup.kind() {
                PickupKind::Coin => world.fill_rect(inset(bounds, COIN_INSET_PX), COIN_COLOR),
                PickupKind::Key => world.fill_rect(inset(bounds, COIN_INSET_PX * 0.5), KEY_COLOR),
                PickupKind::Flag => {
                    let pole = Aabb::from_top_left(
                        bounds.min,
                        Vec2::new(2.0, bounds.height()),
                    );
                    let banner = Aabb::from_top_left(
                        Vec2::new(bounds.min.x + 2.0, bounds.min.y),
                        Vec2::new(bounds.width() - 2.0, bounds.height() * 0.5),
                    );
                    world.fill_rect(pole, FLAG_POLE_COLOR);
                    world.fill_rect(banner, FLAG_COLOR);
                }
            }
        }
    }

    fn draw_player(&self, world: &mut SceneWorld, snapshot: &TickSnapshot) {
        for particle in self.dust.particles() {
            let alpha = (particle.alpha() * 255.0).round().clamp(0.0, 255.0) as u8;
            let [r, g, b] = DUST_COLOR;
            world.fill_rect(particle.bounds(), [r, g, b, alpha]);
        }

        let player = &snapshot.player;
        let bounds = player.bounds();
        let color = match (player.tint, player.animation) {
            (PlayerTint::Finished, _) => PLAYER_FINISHED_COLOR,
            (PlayerTint::Normal, AnimationState::Jump) => PLAYER_AIR_COLOR,
            (PlayerTint::Normal, AnimationState::Idle | AnimationState::Walk) => PLAYER_COLOR,
        };
        world.fill_rect(bounds, color);

        let eye_x = match player.facing {
            Facing::Left => bounds.min.x + EYE_SIZE_PX,
            Facing::Right => bounds.max.x - EYE_SIZE_PX * 2.0,
        };
        let eye = Aabb::from_top_left(
            Vec2::new(eye_x, bounds.min.y + EYE_SIZE_PX),
            Vec2::new(EYE_SIZE_PX, EYE_SIZE_PX),
        );
        world.fill_rect(eye, PLAYER_EYE_COLOR);
    }

    fn draw_overlays(&self, world: &mut SceneWorld, snapshot: &TickSnapshot) {
        match snapshot.phase {
            ScenePhase::Intro => {
                world.push_text(centered(INTRO_TITLE_TEXT, -2, 4, INTRO_TEXT_COLOR));
                world.push_text(centered(INTRO_PROMPT_TEXT, 1, 3, INTRO_TEXT_COLOR));
            }
            ScenePhase::Won => {
                world.push_text(centered(WIN_TITLE_TEXT, -2, 4, WIN_TEXT_COLOR));
                world.push_text(centered(WIN_PROMPT_TEXT, 1, 3, WIN_TEXT_COLOR));
            }
            ScenePhase::Playing => {}
        }

        if snapshot.phase != ScenePhase::Intro {
            world.push_text(ScreenText {
                text: format!("Coins {}", snapshot.coins_collected),
                anchor: ScreenAnchor::TopLeft,
                line: 0,
                scale: 3,
                color: HUD_TEXT_COLOR,
            });
            if snapshot.has_key {
                world.push_text(ScreenText {
                    text: "Key".to_string(),
                    anchor: ScreenAnchor::TopLeft,
                    line: 1,
                    scale: 3,
                    color: KEY_COLOR,
                });
            }
        }
    }

    fn draw_debug(&self, world: &mut SceneWorld, snapshot: &TickSnapshot) {
        let body = self.sim.body();
        world.outline_rect(body.aabb(), DEBUG_BODY_COLOR);

        let tiles = self.sim.tile_world();
        for cell in &body.contacts().ground_cells {
            let bounds = Aabb::from_top_left(
                Vec2::new(tiles.cell_left(cell.x), tiles.cell_top(cell.y)),
                Vec2::new(tiles.tile_size(), tiles.tile_size()),
            );
            world.outline_rect(bounds, DEBUG_GROUND_COLOR);
        }
        for pickup in self.sim.objectives().live_pickups() {
            world.outline_rect(pickup.bounds(), DEBUG_PICKUP_COLOR);
        }

        let metrics = world.loop_metrics();
        let player = &snapshot.player;
        world.push_debug_line(format!(
            "FPS {:.0} TPS {:.0} FT {:.1}",
            metrics.fps, metrics.tps, metrics.frame_time_ms
        ));
        world.push_debug_line(format!("Tick {} {:?}", snapshot.tick, snapshot.phase));
        world.push_debug_line(format!(
            "Pos {:.1} {:.1}",
            player.position.x, player.position.y
        ));
        world.push_debug_line(format!(
            "Vel {:.1} {:.1}",
            player.velocity.x, player.velocity.y
        ));
        world.push_debug_line(format!(
            "Grounded {} {:?}",
            player.grounded, player.animation
        ));
        world.push_debug_line(format!(
            "Coins {} Key {} Jumps {}",
            snapshot.coins_collected, snapshot.has_key, self.jump_cues
        ));
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, world: &mut SceneWorld) {
        if self.needs_reload {
            self.sim.reload();
            self.needs_reload = false;
        }
        self.dust.clear();
        world.set_clear_color(CLEAR_COLOR);
        world.camera_mut().set_zoom_clamped(self.camera_zoom);
        self.follow_player(world);
        info!(
            level = %self.sim.level().name,
            coins = self.sim.objectives().remaining(PickupKind::Coin),
            "platformer_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.pressed(InputAction::ToggleDebug) {
            self.debug_draw = !self.debug_draw;
            info!(debug_draw = self.debug_draw, "debug_draw_toggled");
        }

        let player_input = player_input_from(input);
        let snapshot = self.sim.tick(fixed_dt_seconds, &player_input).clone();
        self.handle_events(&snapshot);
        self.dust
            .update(fixed_dt_seconds, &snapshot.particles, snapshot.player.position);

        match snapshot.pending_restart {
            Some(RestartKind::Reload) => {
                info!(tick = snapshot.tick, "level_restart_requested");
                return SceneCommand::HardReset;
            }
            Some(RestartKind::Reposition) => {
                self.sim.apply_pending_restart();
                self.dust.clear();
            }
            None => {}
        }

        self.last_viewport = input.window_size();
        self.follow_player(world);
        SceneCommand::None
    }

    fn render(&mut self, world: &mut SceneWorld) {
        let snapshot = self.sim.snapshot().clone();
        self.draw_tiles(world);
        self.draw_pickups(world);
        self.draw_player(world, &snapshot);
        self.draw_overlays(world, &snapshot);
        if self.debug_draw {
            self.draw_debug(world, &snapshot);
        }
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.needs_reload = true;
        self.dust.clear();
        info!(level = %self.sim.level().name, "platformer_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        if !self.debug_draw {
            return None;
        }
        let snapshot = self.sim.snapshot();
        Some(format!(
            "{WINDOW_TITLE} | {} | tick {} | coins {}",
            self.sim.level().name,
            snapshot.tick,
            snapshot.coins_collected
        ))
    }
}

/// The debug toggle is host chrome and never counts as "any key".
fn player_input_from(input: &InputSnapshot) -> PlayerInput {
    PlayerInput {
        left: input.is_down(InputAction::MoveLeft),
        right: input.is_down(InputAction::MoveRight),
        up: input.is_down(InputAction::Jump),
        jump_pressed: input.pressed(InputAction::Jump),
        restart_pressed: input.pressed(InputAction::Restart),
        any_key_pressed: input.any_key_pressed() && !input.pressed(InputAction::ToggleDebug),
    }
}

fn centered(text: &str, line: i32, scale: i32, color: [u8; 4]) -> ScreenText {
    ScreenText {
        text: text.to_string(),
        anchor: ScreenAnchor::Center,
        line,
        scale,
        color,
    }
}

fn inset(bounds: Aabb, amount: f32) -> Aabb {
    let size = bounds.size();
    let shrunk = Vec2::new(
        (size.x - amount * 2.0).max(1.0),
        (size.y - amount * 2.0).max(1.0),
    );
    Aabb::from_center(bounds.center(), shrunk)
}
