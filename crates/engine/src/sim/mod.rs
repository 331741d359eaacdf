pub mod body;
pub mod context;
pub mod game_state;
pub mod math;
pub mod objectives;
pub mod player;
pub mod simulation;
pub mod tile_world;
pub mod tuning;

pub use body::{Blocked, Contacts, KinematicBody};
pub use context::{PlayerInput, SimEvent, TickContext};
pub use game_state::{GameState, RestartKind, ScenePhase};
pub use math::{Aabb, Vec2};
pub use objectives::{ObjectiveTracker, Pickup, PickupId, PickupKind};
pub use player::{
    AnimationState, Facing, ParticleCommand, PlayerController, PlayerState, PlayerTint,
};
pub use simulation::{PlayerView, Simulation, TickSnapshot, TickStage, TICK_STAGE_ORDER};
pub use tile_world::{
    CellCoord, PropertyValue, TileKind, TileKindId, TileProperties, TileWorld, TileWorldError,
    COLLIDES_PROPERTY, RESTART_PROPERTY,
};
pub use tuning::{PhysicsTuning, TuningError};
