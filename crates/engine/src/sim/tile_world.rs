use std::collections::BTreeMap;

use thiserror::Error;

use super::math::Vec2;

pub const COLLIDES_PROPERTY: &str = "collides";
pub const RESTART_PROPERTY: &str = "restart";

static EMPTY_PROPERTIES: TileProperties = TileProperties {
    values: BTreeMap::new(),
};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileProperties {
    values: BTreeMap<String, PropertyValue>,
}

impl TileProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> &'static TileProperties {
        &EMPTY_PROPERTIES
    }

    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Truthiness used for marker properties. Tiled writes booleans, but
    /// hand-edited maps sometimes carry `1` or `"true"` instead.
    pub fn flag(&self, name: &str) -> bool {
        match self.values.get(name) {
            Some(PropertyValue::Bool(value)) => *value,
            Some(PropertyValue::Int(value)) => *value != 0,
            Some(PropertyValue::Float(value)) => *value != 0.0,
            Some(PropertyValue::Text(value)) => value.eq_ignore_ascii_case("true"),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileKind {
    pub solid: bool,
    pub properties: TileProperties,
}

impl TileKind {
    /// Collision comes from the `collides` property, mirroring how the level
    /// editor marks ground tiles.
    pub fn from_properties(properties: TileProperties) -> Self {
        Self {
            solid: properties.flag(COLLIDES_PROPERTY),
            properties,
        }
    }

    pub fn forces_restart(&self) -> bool {
        self.properties.flag(RESTART_PROPERTY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKindId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TileWorldError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be finite and positive, got {0}")]
    InvalidTileSize(f32),
    #[error("cell {index} references tile kind {kind} but only {kind_count} kinds exist")]
    UnknownKind {
        index: usize,
        kind: u16,
        kind_count: usize,
    },
}

/// Static collision grid. Cell (0,0) is the top-left tile; y grows downward
/// in both cell and world space, and `world_to_cell` is a plain floor
/// division by the tile size.
#[derive(Debug, Clone, PartialEq)]
pub struct TileWorld {
    width: u32,
    height: u32,
    tile_size: f32,
    cells: Vec<Option<TileKindId>>,
    kinds: Vec<TileKind>,
}

impl TileWorld {
    pub fn new(
        width: u32,
        height: u32,
        tile_size: f32,
        cells: Vec<Option<TileKindId>>,
        kinds: Vec<TileKind>,
    ) -> Result<Self, TileWorldError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(TileWorldError::InvalidTileSize(tile_size));
        }
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(TileWorldError::TileCountMismatch { expected, actual });
        }
        let unknown = cells.iter().enumerate().find_map(|(index, cell)| {
            cell.filter(|id| id.0 as usize >= kinds.len())
                .map(|id| (index, id))
        });
        if let Some((index, kind)) = unknown {
            return Err(TileWorldError::UnknownKind {
                index,
                kind: kind.0,
                kind_count: kinds.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tile_size,
            cells,
            kinds,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn kinds(&self) -> &[TileKind] {
        &self.kinds
    }

    pub fn in_bounds(&self, cell_x: i32, cell_y: i32) -> bool {
        cell_x >= 0 && cell_y >= 0 && (cell_x as u32) < self.width && (cell_y as u32) < self.height
    }

    fn index_of(&self, cell_x: i32, cell_y: i32) -> Option<usize> {
        if !self.in_bounds(cell_x, cell_y) {
            return None;
        }
        Some(cell_y as usize * self.width as usize + cell_x as usize)
    }

    pub fn kind_at(&self, cell_x: i32, cell_y: i32) -> Option<&TileKind> {
        let index = self.index_of(cell_x, cell_y)?;
        let id = self.cells.get(index).copied().flatten()?;
        self.kinds.get(id.0 as usize)
    }

    pub fn is_solid(&self, cell_x: i32, cell_y: i32) -> bool {
        self.kind_at(cell_x, cell_y).is_some_and(|kind| kind.solid)
    }

    pub fn properties_at(&self, cell_x: i32, cell_y: i32) -> &TileProperties {
        self.kind_at(cell_x, cell_y)
            .map(|kind| &kind.properties)
            .unwrap_or(TileProperties::empty())
    }

    pub fn forces_restart(&self, cell_x: i32, cell_y: i32) -> bool {
        self.kind_at(cell_x, cell_y)
            .is_some_and(TileKind::forces_restart)
    }

    pub fn world_to_cell(&self, x: f32, y: f32) -> CellCoord {
        CellCoord {
            x: self.world_to_cell_x(x),
            y: self.world_to_cell_y(y),
        }
    }

    pub fn world_to_cell_x(&self, x: f32) -> i32 {
        (x / self.tile_size).floor() as i32
    }

    pub fn world_to_cell_y(&self, y: f32) -> i32 {
        (y / self.tile_size).floor() as i32
    }

    pub fn cell_left(&self, cell_x: i32) -> f32 {
        cell_x as f32 * self.tile_size
    }

    pub fn cell_right(&self, cell_x: i32) -> f32 {
        (cell_x + 1) as f32 * self.tile_size
    }

    pub fn cell_top(&self, cell_y: i32) -> f32 {
        cell_y as f32 * self.tile_size
    }

    pub fn cell_bottom(&self, cell_y: i32) -> f32 {
        (cell_y + 1) as f32 * self.tile_size
    }

    /// Occupied cells in row-major order, for renderers and debug tools.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (CellCoord, &TileKind)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            let id = (*cell)?;
            let kind = self.kinds.get(id.0 as usize)?;
            let coord = CellCoord::new((index % width) as i32, (index / width) as i32);
            Some((coord, kind))
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) const SOLID: TileKindId = TileKindId(0);
    pub(crate) const HAZARD: TileKindId = TileKindId(1);
    pub(crate) const DECOR: TileKindId = TileKindId(2);

    pub(crate) fn standard_kinds() -> Vec<TileKind> {
        vec![
            TileKind::from_properties(
                TileProperties::new().with(COLLIDES_PROPERTY, PropertyValue::Bool(true)),
            ),
            TileKind::from_properties(
                TileProperties::new()
                    .with(COLLIDES_PROPERTY, PropertyValue::Bool(true))
                    .with(RESTART_PROPERTY, PropertyValue::Bool(true)),
            ),
            TileKind::from_properties(TileProperties::new()),
        ]
    }

    /// Builds a world from ASCII rows: `#` solid, `^` hazard, `~` decoration,
    /// anything else empty.
    pub(crate) fn world_from_rows(rows: &[&str], tile_size: f32) -> TileWorld {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.len()).unwrap_or(0) as u32;
        let cells = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|ch| match ch {
                '#' => Some(SOLID),
                '^' => Some(HAZARD),
                '~' => Some(DECOR),
                _ => None,
            })
            .collect();
        TileWorld::new(width, height, tile_size, cells, standard_kinds()).expect("test world")
    }
}
