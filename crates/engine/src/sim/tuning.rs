use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::Vec2;

pub const DEFAULT_ACCELERATION: f32 = 400.0;
// Must stay below acceleration so releasing input mid-run slides to a stop.
pub const DEFAULT_DRAG: f32 = 300.0;
pub const DEFAULT_GRAVITY: f32 = 1500.0;
pub const DEFAULT_JUMP_VELOCITY: f32 = -600.0;
pub const DEFAULT_PARTICLE_VELOCITY: f32 = 20.0;
pub const DEFAULT_MAX_VELOCITY: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsTuning {
    pub acceleration: f32,
    pub drag: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub particle_velocity: f32,
    pub max_velocity: Vec2,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            acceleration: DEFAULT_ACCELERATION,
            drag: DEFAULT_DRAG,
            gravity: DEFAULT_GRAVITY,
            jump_velocity: DEFAULT_JUMP_VELOCITY,
            particle_velocity: DEFAULT_PARTICLE_VELOCITY,
            max_velocity: Vec2::new(DEFAULT_MAX_VELOCITY, DEFAULT_MAX_VELOCITY),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TuningError {
    #[error("tuning field {field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    #[error("tuning field {field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("drag ({drag}) must be non-negative and below acceleration ({acceleration})")]
    DragNotBelowAcceleration { drag: f32, acceleration: f32 },
    #[error("jump_velocity must be negative (upward), got {0}")]
    JumpNotUpward(f32),
}

impl PhysicsTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        let fields = [
            ("acceleration", self.acceleration),
            ("drag", self.drag),
            ("gravity", self.gravity),
            ("jump_velocity", self.jump_velocity),
            ("particle_velocity", self.particle_velocity),
            ("max_velocity.x", self.max_velocity.x),
            ("max_velocity.y", self.max_velocity.y),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(TuningError::NonFinite { field, value });
            }
        }
        for (field, value) in [
            ("acceleration", self.acceleration),
            ("max_velocity.x", self.max_velocity.x),
            ("max_velocity.y", self.max_velocity.y),
        ] {
            if value <= 0.0 {
                return Err(TuningError::NotPositive { field, value });
            }
        }
        if self.gravity < 0.0 {
            return Err(TuningError::NotPositive {
                field: "gravity",
                value: self.gravity,
            });
        }
        if self.drag < 0.0 || self.drag >= self.acceleration {
            return Err(TuningError::DragNotBelowAcceleration {
                drag: self.drag,
                acceleration: self.acceleration,
            });
        }
        if self.jump_velocity >= 0.0 {
            return Err(TuningError::JumpNotUpward(self.jump_velocity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PhysicsTuning::default().validate().expect("defaults validate");
        let tuning = PhysicsTuning::default();
        assert!(tuning.drag < tuning.acceleration);
    }

    #[test]
    fn drag_at_or_above_acceleration_is_rejected() {
        let tuning = PhysicsTuning {
            drag: 500.0,
            ..PhysicsTuning::default()
        };
        assert_eq!(
            tuning.validate(),
            Err(TuningError::DragNotBelowAcceleration {
                drag: 500.0,
                acceleration: 400.0
            })
        );

        let equal = PhysicsTuning {
            drag: 400.0,
            ..PhysicsTuning::default()
        };
        assert!(equal.validate().is_err());
    }

    #[test]
    fn non_finite_and_downward_jump_are_rejected() {
        let nan = PhysicsTuning {
            gravity: f32::NAN,
            ..PhysicsTuning::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(TuningError::NonFinite {
                field: "gravity",
                ..
            })
        ));

        let downward = PhysicsTuning {
            jump_velocity: 600.0,
            ..PhysicsTuning::default()
        };
        assert_eq!(downward.validate(), Err(TuningError::JumpNotUpward(600.0)));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let tuning: PhysicsTuning =
            serde_json::from_str(r#"{ "acceleration": 900.0, "drag": 450.0 }"#).expect("parse");
        assert_eq!(tuning.acceleration, 900.0);
        assert_eq!(tuning.drag, 450.0);
        assert_eq!(tuning.gravity, DEFAULT_GRAVITY);
        tuning.validate().expect("valid");
    }
}
