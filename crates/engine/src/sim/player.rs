use super::context::{PlayerInput, SimEvent, TickContext};
use super::math::Vec2;

const PARTICLE_INSET: Vec2 = Vec2::new(10.0, 5.0);

/// Bookkeeping state driven by horizontal input only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlayerState {
    #[default]
    Idle,
    Walk,
}

/// What the presentation layer should show. `Jump` is never stored; it is
/// derived from being airborne.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    #[default]
    Idle,
    Walk,
    Jump,
}

impl From<PlayerState> for AnimationState {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::Idle => AnimationState::Idle,
            PlayerState::Walk => AnimationState::Walk,
        }
    }
}

/// The sprite art faces left, so facing right means flipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    Left,
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flip_x(self) -> bool {
        self == Facing::Right
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlayerTint {
    #[default]
    Normal,
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleCommand {
    pub active: bool,
    /// Offset from the body center the emitter follows.
    pub follow_offset: Vec2,
    pub speed: Vec2,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerController {
    state: PlayerState,
    facing: Facing,
    airborne: bool,
    particles_active: bool,
    finished: bool,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn particles_active(&self) -> bool {
        self.particles_active
    }

    pub fn animation(&self) -> AnimationState {
        if self.finished {
            AnimationState::Idle
        } else if self.airborne {
            AnimationState::Jump
        } else {
            self.state.into()
        }
    }

    pub fn tint(&self) -> PlayerTint {
        if self.finished {
            PlayerTint::Finished
        } else {
            PlayerTint::Normal
        }
    }

    pub fn particle_command(&self, body_size: Vec2, particle_velocity: f32) -> ParticleCommand {
        ParticleCommand {
            active: self.particles_active,
            follow_offset: Vec2::new(
                body_size.x * 0.5 - PARTICLE_INSET.x,
                body_size.y * 0.5 - PARTICLE_INSET.y,
            ),
            speed: Vec2::new(particle_velocity, 0.0),
        }
    }

    /// Input stage of a tick. Uses `grounded` as left by the previous
    /// collision resolution.
    pub fn apply_input(&mut self, input: &PlayerInput, ctx: &mut TickContext<'_>) {
        let grounded = ctx.body.grounded();
        let direction = if input.left {
            Some(Facing::Left)
        } else if input.right {
            Some(Facing::Right)
        } else {
            None
        };

        match direction {
            Some(facing) => {
                ctx.body
                    .apply_acceleration(facing.sign() * ctx.tuning.acceleration, 0.0);
                self.facing = facing;
                self.state = PlayerState::Walk;
                self.set_particles(grounded, ctx.events);
            }
            None => {
                ctx.body.apply_acceleration(0.0, 0.0);
                ctx.body.apply_drag(ctx.tuning.drag);
                self.state = PlayerState::Idle;
                self.set_particles(false, ctx.events);
            }
        }

        self.airborne = !grounded;

        if grounded && input.jump_pressed {
            ctx.body.set_velocity_y(ctx.tuning.jump_velocity);
            ctx.events.push(SimEvent::Jumped);
        }
    }

    /// Freezes presentation once the level is finished.
    pub fn finish(&mut self, events: &mut Vec<SimEvent>) {
        self.finished = true;
        self.state = PlayerState::Idle;
        self.set_particles(false, events);
    }

    /// Back to the spawn pose after a reposition. Facing is kept.
    pub fn reset_motion(&mut self) {
        self.state = PlayerState::Idle;
        self.airborne = false;
        self.particles_active = false;
    }

    fn set_particles(&mut self, active: bool, events: &mut Vec<SimEvent>) {
        if self.particles_active == active {
            return;
        }
        self.particles_active = active;
        events.push(if active {
            SimEvent::ParticlesStarted
        } else {
            SimEvent::ParticlesStopped
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::KinematicBody;
    use crate::sim::game_state::GameState;
    use crate::sim::tile_world::test_support::world_from_rows;
    use crate::sim::tile_world::TileWorld;
    use crate::sim::tuning::PhysicsTuning;

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        world: TileWorld,
        tuning: PhysicsTuning,
        body: KinematicBody,
        state: GameState,
        events: Vec<SimEvent>,
        controller: PlayerController,
    }

    impl Rig {
        fn on_floor() -> Self {
            let world = world_from_rows(&["......", "......", "######"], 18.0);
            let mut rig = Self {
                world,
                tuning: PhysicsTuning::default(),
                body: KinematicBody::new(Vec2::new(54.0, 24.0), Vec2::new(24.0, 24.0)),
                state: GameState::new(),
                events: Vec::new(),
                controller: PlayerController::new(),
            };
            rig.body.integrate(DT, &rig.world, &rig.tuning);
            assert!(rig.body.grounded());
            rig
        }

        fn in_air() -> Self {
            let world = world_from_rows(&["......", "......", "......"], 18.0);
            Self {
                world,
                tuning: PhysicsTuning::default(),
                body: KinematicBody::new(Vec2::new(54.0, 20.0), Vec2::new(24.0, 24.0)),
                state: GameState::new(),
                events: Vec::new(),
                controller: PlayerController::new(),
            }
        }

        fn input(&mut self, input: PlayerInput) {
            self.events.clear();
            let mut ctx = TickContext {
                world: &self.world,
                tuning: &self.tuning,
                body: &mut self.body,
                state: &mut self.state,
                events: &mut self.events,
            };
            self.controller.apply_input(&input, &mut ctx);
        }
    }

    #[test]
    fn grounded_walk_starts_particles_and_faces_direction() {
        let mut rig = Rig::on_floor();
        rig.input(PlayerInput {
            right: true,
            ..PlayerInput::default()
        });

        assert_eq!(rig.controller.state(), PlayerState::Walk);
        assert_eq!(rig.controller.animation(), AnimationState::Walk);
        assert_eq!(rig.controller.facing(), Facing::Right);
        assert!(rig.controller.facing().flip_x());
        assert_eq!(rig.body.acceleration().x, rig.tuning.acceleration);
        assert_eq!(rig.events, vec![SimEvent::ParticlesStarted]);

        rig.input(PlayerInput {
            right: true,
            ..PlayerInput::default()
        });
        assert!(rig.events.is_empty(), "no duplicate start while walking");
    }

    #[test]
    fn left_wins_when_both_directions_are_held() {
        let mut rig = Rig::on_floor();
        rig.input(PlayerInput {
            left: true,
            right: true,
            ..PlayerInput::default()
        });
        assert_eq!(rig.controller.facing(), Facing::Left);
        assert_eq!(rig.body.acceleration().x, -rig.tuning.acceleration);
    }

    #[test]
    fn release_applies_drag_and_stops_particles() {
        let mut rig = Rig::on_floor();
        rig.input(PlayerInput {
            left: true,
            ..PlayerInput::default()
        });
        rig.input(PlayerInput::default());

        assert_eq!(rig.controller.state(), PlayerState::Idle);
        assert_eq!(rig.controller.animation(), AnimationState::Idle);
        assert_eq!(rig.body.acceleration().x, 0.0);
        assert_eq!(rig.body.drag_x(), rig.tuning.drag);
        assert_eq!(rig.events, vec![SimEvent::ParticlesStopped]);
    }

    #[test]
    fn airborne_walk_shows_jump_without_particles() {
        let mut rig = Rig::in_air();
        rig.input(PlayerInput {
            left: true,
            ..PlayerInput::default()
        });

        assert_eq!(rig.controller.state(), PlayerState::Walk);
        assert_eq!(rig.controller.animation(), AnimationState::Jump);
        assert!(!rig.controller.particles_active());
        assert!(rig.events.is_empty());
    }

    #[test]
    fn jump_requires_ground_and_press_edge() {
        let mut rig = Rig::in_air();
        rig.input(PlayerInput {
            up: true,
            jump_pressed: true,
            ..PlayerInput::default()
        });
        assert_eq!(rig.body.velocity().y, 0.0);
        assert!(!rig.events.contains(&SimEvent::Jumped));

        let mut rig = Rig::on_floor();
        rig.input(PlayerInput {
            up: true,
            ..PlayerInput::default()
        });
        assert_eq!(rig.body.velocity().y, 0.0, "held without edge does nothing");

        rig.input(PlayerInput {
            up: true,
            jump_pressed: true,
            ..PlayerInput::default()
        });
        assert_eq!(rig.body.velocity().y, rig.tuning.jump_velocity);
        assert_eq!(rig.events, vec![SimEvent::Jumped]);
    }

    #[test]
    fn finish_forces_idle_and_tint() {
        let mut rig = Rig::on_floor();
        rig.input(PlayerInput {
            right: true,
            ..PlayerInput::default()
        });
        let mut events = Vec::new();
        rig.controller.finish(&mut events);

        assert_eq!(events, vec![SimEvent::ParticlesStopped]);
        assert_eq!(rig.controller.animation(), AnimationState::Idle);
        assert_eq!(rig.controller.tint(), PlayerTint::Finished);
    }

    #[test]
    fn particle_offset_derives_from_body_size() {
        let controller = PlayerController::new();
        let command = controller.particle_command(Vec2::new(24.0, 24.0), 20.0);
        assert_eq!(command.follow_offset, Vec2::new(2.0, 7.0));
        assert_eq!(command.speed, Vec2::new(20.0, 0.0));
        assert!(!command.active);
    }
}
