use std::sync::Arc;

use thiserror::Error;

use crate::sim::{Aabb, CellCoord, TileWorld, TileWorldError, Vec2};

pub mod tmx;

pub use tmx::{
    load_tmx_level, TmxError, TmxErrorCode, TmxLoadOptions, DEFAULT_COLLISION_LAYER,
};

pub const DEFAULT_SPAWN: Vec2 = Vec2::new(30.0, 345.0);
pub const DEFAULT_PLAYER_SIZE: Vec2 = Vec2::new(24.0, 24.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectCategory {
    Coin,
    Key,
    Finish,
}

impl ObjectCategory {
    /// Matches Tiled object names, ignoring case.
    pub fn from_object_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("coin") {
            Some(ObjectCategory::Coin)
        } else if name.eq_ignore_ascii_case("key") {
            Some(ObjectCategory::Key)
        } else if name.eq_ignore_ascii_case("finish") {
            Some(ObjectCategory::Finish)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Coin => "coin",
            ObjectCategory::Key => "key",
            ObjectCategory::Finish => "finish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPlacement {
    pub category: ObjectCategory,
    pub bounds: Aabb,
}

/// A decoded level, ready to hand to `Simulation::new`.
#[derive(Debug, Clone)]
pub struct LevelDef {
    pub name: String,
    pub tile_world: Arc<TileWorld>,
    pub placements: Vec<ObjectPlacement>,
    /// Body center at spawn.
    pub spawn: Vec2,
    pub player_size: Vec2,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level '{level}' has no finish placement")]
    MissingFinish { level: String },
    #[error("level '{level}' spawn body at ({x}, {y}) does not fit the {width}x{height} px map")]
    SpawnOutsideMap {
        level: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    #[error("level '{level}' spawn body at ({x}, {y}) overlaps solid cell ({}, {})", cell.x, cell.y)]
    SpawnInsideSolid {
        level: String,
        x: f32,
        y: f32,
        cell: CellCoord,
    },
    #[error("level '{level}' player size {width}x{height} must be finite and positive")]
    InvalidPlayerSize {
        level: String,
        width: f32,
        height: f32,
    },
    #[error("level '{level}' {category} placement has invalid bounds")]
    InvalidPlacement {
        level: String,
        category: &'static str,
    },
    #[error("invalid physics tuning: {0}")]
    Tuning(#[from] crate::sim::TuningError),
    #[error("invalid tile grid: {0}")]
    TileWorld(#[from] TileWorldError),
}

impl LevelDef {
    pub fn validate(&self) -> Result<(), LevelError> {
        let size = self.player_size;
        if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(LevelError::InvalidPlayerSize {
                level: self.name.clone(),
                width: size.x,
                height: size.y,
            });
        }

        for placement in &self.placements {
            let bounds = placement.bounds;
            if !bounds.min.is_finite() || !bounds.max.is_finite() || bounds.width() < 0.0 {
                return Err(LevelError::InvalidPlacement {
                    level: self.name.clone(),
                    category: placement.category.as_str(),
                });
            }
        }

        if !self
            .placements
            .iter()
            .any(|placement| placement.category == ObjectCategory::Finish)
        {
            return Err(LevelError::MissingFinish {
                level: self.name.clone(),
            });
        }

        let pixels = self.tile_world.pixel_size();
        let body = Aabb::from_center(self.spawn, size);
        let inside_map = body.min.x >= 0.0
            && body.min.y >= 0.0
            && body.max.x <= pixels.x
            && body.max.y <= pixels.y;
        if !self.spawn.is_finite() || !inside_map {
            return Err(LevelError::SpawnOutsideMap {
                level: self.name.clone(),
                x: self.spawn.x,
                y: self.spawn.y,
                width: pixels.x,
                height: pixels.y,
            });
        }

        if let Some(cell) = first_solid_overlap(&self.tile_world, &body) {
            return Err(LevelError::SpawnInsideSolid {
                level: self.name.clone(),
                x: self.spawn.x,
                y: self.spawn.y,
                cell,
            });
        }

        Ok(())
    }

    pub fn count(&self, category: ObjectCategory) -> usize {
        self.placements
            .iter()
            .filter(|placement| placement.category == category)
            .count()
    }
}

/// Cells whose interiors the box covers; touching an edge does not count.
fn first_solid_overlap(world: &TileWorld, bounds: &Aabb) -> Option<CellCoord> {
    let tile = world.tile_size();
    let first_x = world.world_to_cell_x(bounds.min.x);
    let first_y = world.world_to_cell_y(bounds.min.y);
    let last_x = (bounds.max.x / tile).ceil() as i32 - 1;
    let last_y = (bounds.max.y / tile).ceil() as i32 - 1;
    (first_y..=last_y)
        .flat_map(|y| (first_x..=last_x).map(move |x| CellCoord::new(x, y)))
        .find(|cell| world.is_solid(cell.x, cell.y))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::sim::tile_world::test_support::world_from_rows;

    pub const TILE: f32 = 18.0;

    pub fn placement(category: ObjectCategory, cell_x: i32, cell_y: i32) -> ObjectPlacement {
        ObjectPlacement {
            category,
            bounds: Aabb::from_top_left(
                Vec2::new(cell_x as f32 * TILE, cell_y as f32 * TILE),
                Vec2::new(TILE, TILE),
            ),
        }
    }

    pub fn level_from_rows(
        rows: &[&str],
        spawn: Vec2,
        placements: Vec<ObjectPlacement>,
    ) -> LevelDef {
        LevelDef {
            name: "test".to_string(),
            tile_world: Arc::new(world_from_rows(rows, TILE)),
            placements,
            spawn,
            player_size: Vec2::new(12.0, 12.0),
        }
    }
}
