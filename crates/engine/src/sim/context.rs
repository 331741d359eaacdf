use super::body::KinematicBody;
use super::game_state::{GameState, RestartKind};
use super::objectives::PickupId;
use super::tile_world::{CellCoord, TileWorld};
use super::tuning::PhysicsTuning;

/// Logical button state for one tick. `*_pressed` fields are rising edges
/// computed by the input source; the held fields are plain levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub jump_pressed: bool,
    pub restart_pressed: bool,
    pub any_key_pressed: bool,
}

/// One-shot notifications handed to the presentation layer at the end of a
/// tick, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    IntroDismissed,
    Jumped,
    ParticlesStarted,
    ParticlesStopped,
    CoinCollected { pickup: PickupId },
    KeyCollected { pickup: PickupId },
    FlagReached { pickup: PickupId },
    HazardTouched { cell: CellCoord },
    BodyRecovered,
    RestartRequested(RestartKind),
}

/// Everything a tick stage may read or mutate, passed explicitly.
pub struct TickContext<'a> {
    pub world: &'a TileWorld,
    pub tuning: &'a PhysicsTuning,
    pub body: &'a mut KinematicBody,
    pub state: &'a mut GameState,
    pub events: &'a mut Vec<SimEvent>,
}
