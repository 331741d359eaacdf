use tracing::{debug, info, warn};

use super::body::KinematicBody;
use super::context::{PlayerInput, SimEvent, TickContext};
use super::game_state::{GameState, RestartKind, ScenePhase};
use super::math::{Aabb, Vec2};
use super::objectives::ObjectiveTracker;
use super::player::{AnimationState, Facing, ParticleCommand, PlayerController, PlayerTint};
use super::tile_world::TileWorld;
use super::tuning::PhysicsTuning;
use crate::level::{LevelDef, LevelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickStage {
    InputIntent,
    Physics,
    Hazards,
    Objectives,
    Snapshot,
}

pub const TICK_STAGE_ORDER: [TickStage; 5] = [
    TickStage::InputIntent,
    TickStage::Physics,
    TickStage::Hazards,
    TickStage::Objectives,
    TickStage::Snapshot,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub animation: AnimationState,
    pub grounded: bool,
    pub tint: PlayerTint,
}

impl PlayerView {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.size)
    }
}

/// Frozen end-of-tick view handed to the presentation layer.
///
/// `player.grounded` is the result of this tick's collision resolution,
/// while `player.animation` was picked in the input stage from the previous
/// one. On take-off and landing ticks the two can disagree for one
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub tick: u64,
    pub phase: ScenePhase,
    pub player: PlayerView,
    pub particles: ParticleCommand,
    pub has_key: bool,
    pub won: bool,
    pub coins_collected: u32,
    pub pending_restart: Option<RestartKind>,
    pub events: Vec<SimEvent>,
}

pub struct Simulation {
    level: LevelDef,
    tuning: PhysicsTuning,
    body: KinematicBody,
    controller: PlayerController,
    objectives: ObjectiveTracker,
    state: GameState,
    events: Vec<SimEvent>,
    tick: u64,
    last_tick_stages: Vec<TickStage>,
    snapshot: TickSnapshot,
}

impl Simulation {
    /// Validates everything up front; a failing level never produces a
    /// partially initialised simulation.
    pub fn new(level: LevelDef, tuning: PhysicsTuning) -> Result<Self, LevelError> {
        tuning.validate()?;
        level.validate()?;

        let body = spawn_body(&level);
        let objectives = ObjectiveTracker::from_placements(&level.placements);
        let controller = PlayerController::new();
        let state = GameState::new();
        let snapshot = build_snapshot(0, &body, &controller, &state, &tuning, Vec::new());

        info!(
            level = %level.name,
            width = level.tile_world.width(),
            height = level.tile_world.height(),
            pickups = level.placements.len(),
            spawn_x = level.spawn.x,
            spawn_y = level.spawn.y,
            "simulation_created"
        );

        Ok(Self {
            level,
            tuning,
            body,
            controller,
            objectives,
            state,
            events: Vec::new(),
            tick: 0,
            last_tick_stages: Vec::with_capacity(TICK_STAGE_ORDER.len()),
            snapshot,
        })
    }

    pub fn level(&self) -> &LevelDef {
        &self.level
    }

    pub fn tile_world(&self) -> &TileWorld {
        &self.level.tile_world
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn body(&self) -> &KinematicBody {
        &self.body
    }

    pub fn objectives(&self) -> &ObjectiveTracker {
        &self.objectives
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snapshot(&self) -> &TickSnapshot {
        &self.snapshot
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn last_tick_stages(&self) -> &[TickStage] {
        &self.last_tick_stages
    }

    pub fn tick(&mut self, dt: f32, input: &PlayerInput) -> &TickSnapshot {
        self.tick = self.tick.saturating_add(1);
        self.events.clear();
        self.last_tick_stages.clear();

        if input.restart_pressed || (self.state.won() && input.any_key_pressed) {
            self.state.request_restart(RestartKind::Reload);
            self.events
                .push(SimEvent::RestartRequested(RestartKind::Reload));
        }

        if !self.state.won() {
            for stage in &TICK_STAGE_ORDER[..TICK_STAGE_ORDER.len() - 1] {
                self.run_stage(*stage, dt, input);
                self.last_tick_stages.push(*stage);
            }
        }

        self.snapshot = build_snapshot(
            self.tick,
            &self.body,
            &self.controller,
            &self.state,
            &self.tuning,
            self.events.clone(),
        );
        self.last_tick_stages.push(TickStage::Snapshot);
        &self.snapshot
    }

    fn run_stage(&mut self, stage: TickStage, dt: f32, input: &PlayerInput) {
        let world = &*self.level.tile_world;
        let mut ctx = TickContext {
            world,
            tuning: &self.tuning,
            body: &mut self.body,
            state: &mut self.state,
            events: &mut self.events,
        };

        match stage {
            TickStage::InputIntent => {
                if input.any_key_pressed && ctx.state.begin_play() {
                    ctx.events.push(SimEvent::IntroDismissed);
                    info!(tick = self.tick, "intro_dismissed");
                }
                self.controller.apply_input(input, &mut ctx);
            }
            TickStage::Physics => {
                ctx.body.integrate(dt, ctx.world, ctx.tuning);
                if !ctx.body.is_finite() {
                    warn!(
                        tick = self.tick,
                        x = ctx.body.position().x,
                        y = ctx.body.position().y,
                        "body_state_non_finite_reset_to_spawn"
                    );
                    ctx.body.reset_to(self.level.spawn);
                    self.controller.reset_motion();
                    ctx.events.push(SimEvent::BodyRecovered);
                }
            }
            TickStage::Hazards => {
                if !ctx.body.grounded() {
                    return;
                }
                let hazard = ctx
                    .body
                    .contacts()
                    .ground_cells
                    .iter()
                    .copied()
                    .find(|cell| ctx.world.forces_restart(cell.x, cell.y));
                if let Some(cell) = hazard {
                    debug!(tick = self.tick, cell_x = cell.x, cell_y = cell.y, "hazard_touched");
                    ctx.events.push(SimEvent::HazardTouched { cell });
                    ctx.state.request_restart(RestartKind::Reposition);
                    ctx.events
                        .push(SimEvent::RestartRequested(RestartKind::Reposition));
                }
            }
            TickStage::Objectives => {
                if self.objectives.check_overlaps(&mut ctx) {
                    self.controller.finish(ctx.events);
                }
            }
            TickStage::Snapshot => {}
        }
    }

    /// Puts the player back at spawn at rest. Pickups, key, win, and coin
    /// count are untouched.
    pub fn restart(&mut self) {
        self.body.reset_to(self.level.spawn);
        self.controller.reset_motion();
        self.refresh_snapshot();
        debug!(tick = self.tick, "player_repositioned");
    }

    /// Rebuilds the level instance from its definition.
    pub fn reload(&mut self) {
        self.body = spawn_body(&self.level);
        self.controller = PlayerController::new();
        self.objectives = ObjectiveTracker::from_placements(&self.level.placements);
        self.state.reset();
        self.events.clear();
        self.last_tick_stages.clear();
        self.tick = 0;
        self.refresh_snapshot();
        info!(level = %self.level.name, "level_reloaded");
    }

    /// Consumes a pending request and carries it out.
    pub fn apply_pending_restart(&mut self) -> Option<RestartKind> {
        let request = self.state.take_restart_request()?;
        match request {
            RestartKind::Reposition => self.restart(),
            RestartKind::Reload => self.reload(),
        }
        Some(request)
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = build_snapshot(
            self.tick,
            &self.body,
            &self.controller,
            &self.state,
            &self.tuning,
            self.events.clone(),
        );
    }
}

fn spawn_body(level: &LevelDef) -> KinematicBody {
    let bounds = Aabb::from_top_left(Vec2::ZERO, level.tile_world.pixel_size());
    KinematicBody::new(level.spawn, level.player_size).with_world_bounds(bounds)
}

fn build_snapshot(
    tick: u64,
    body: &KinematicBody,
    controller: &PlayerController,
    state: &GameState,
    tuning: &PhysicsTuning,
    events: Vec<SimEvent>,
) -> TickSnapshot {
    TickSnapshot {
        tick,
        phase: state.phase(),
        player: PlayerView {
            position: body.position(),
            size: body.size(),
            velocity: body.velocity(),
            facing: controller.facing(),
            animation: controller.animation(),
            grounded: body.grounded(),
            tint: controller.tint(),
        },
        particles: controller.particle_command(body.size(), tuning.particle_velocity),
        has_key: state.has_key(),
        won: state.won(),
        coins_collected: state.coins_collected(),
        pending_restart: state.restart_request(),
        events,
    }
}
