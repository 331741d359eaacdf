use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use roxmltree::{Document, Node};
use tracing::{debug, info};

use super::{LevelDef, ObjectCategory, ObjectPlacement, DEFAULT_PLAYER_SIZE, DEFAULT_SPAWN};
use crate::sim::{Aabb, PropertyValue, TileKind, TileKindId, TileProperties, TileWorld, Vec2};

pub const DEFAULT_COLLISION_LAYER: &str = "Ground-n-Platforms";
const SPAWN_OBJECT_NAME: &str = "spawn";
// Tiled stores flip/rotation flags in the top four bits of a gid.
const GID_MASK: u32 = 0x0FFF_FFFF;

#[derive(Debug, Clone, PartialEq)]
pub struct TmxLoadOptions {
    pub collision_layer: String,
    /// Used when the map has no `spawn` object.
    pub fallback_spawn: Vec2,
    pub player_size: Vec2,
}

impl Default for TmxLoadOptions {
    fn default() -> Self {
        Self {
            collision_layer: DEFAULT_COLLISION_LAYER.to_string(),
            fallback_spawn: DEFAULT_SPAWN,
            player_size: DEFAULT_PLAYER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TmxErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnsupportedMap,
    MissingAttribute,
    InvalidValue,
    MissingLayer,
    UnsupportedEncoding,
    TileCountMismatch,
    UnknownGid,
    InvalidGrid,
}

#[derive(Debug, Clone)]
pub struct TmxError {
    pub code: TmxErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for TmxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for TmxError {}

pub fn load_tmx_level(path: &Path, options: &TmxLoadOptions) -> Result<LevelDef, TmxError> {
    let raw = read_source(path)?;
    let level = parse_tmx_level(path, &raw, options)?;
    info!(
        path = %path.display(),
        width = level.tile_world.width(),
        height = level.tile_world.height(),
        tile_size = level.tile_world.tile_size(),
        kinds = level.tile_world.kinds().len(),
        placements = level.placements.len(),
        "tmx_level_loaded"
    );
    Ok(level)
}

/// Parses map text already read from `path`; external tilesets are still
/// resolved relative to `path`.
pub fn parse_tmx_level(
    path: &Path,
    raw: &str,
    options: &TmxLoadOptions,
) -> Result<LevelDef, TmxError> {
    let doc = parse_document(path, raw)?;
    let source = XmlSource { path, doc: &doc };
    let map = doc.root_element();
    if map.tag_name().name() != "map" {
        return Err(source.error_at(
            TmxErrorCode::InvalidRoot,
            "root element must be <map>".to_string(),
            map,
        ));
    }

    let orientation = map.attribute("orientation").unwrap_or("orthogonal");
    if orientation != "orthogonal" {
        return Err(source.error_at(
            TmxErrorCode::UnsupportedMap,
            format!("unsupported orientation '{orientation}'; only orthogonal maps load"),
            map,
        ));
    }
    if map.attribute("infinite") == Some("1") {
        return Err(source.error_at(
            TmxErrorCode::UnsupportedMap,
            "infinite maps are not supported".to_string(),
            map,
        ));
    }

    let width: u32 = source.parse_attr(map, "width")?;
    let height: u32 = source.parse_attr(map, "height")?;
    let tile_width: u32 = source.parse_attr(map, "tilewidth")?;
    let tile_height: u32 = source.parse_attr(map, "tileheight")?;
    if tile_width != tile_height || tile_width == 0 {
        return Err(source.error_at(
            TmxErrorCode::UnsupportedMap,
            format!("tiles must be square and non-empty, got {tile_width}x{tile_height}"),
            map,
        ));
    }
    let tile_size = tile_width as f32;

    let mut tilesets = Vec::<TilesetRef>::new();
    for node in map.children().filter(|node| node.has_tag_name("tileset")) {
        tilesets.push(load_tileset(&source, node)?);
    }
    tilesets.sort_by_key(|tileset| tileset.first_gid);

    let layer = map
        .children()
        .find(|node| {
            node.has_tag_name("layer")
                && node.attribute("name") == Some(options.collision_layer.as_str())
        })
        .ok_or_else(|| {
            source.error_at(
                TmxErrorCode::MissingLayer,
                format!("no tile layer named '{}'", options.collision_layer),
                map,
            )
        })?;
    let gids = read_layer_gids(&source, layer, width, height)?;

    let mut kinds = Vec::<TileKind>::new();
    let mut kind_by_gid = BTreeMap::<u32, TileKindId>::new();
    let mut cells = Vec::with_capacity(gids.len());
    for gid in gids {
        if gid == 0 {
            cells.push(None);
            continue;
        }
        let id = match kind_by_gid.get(&gid) {
            Some(id) => *id,
            None => {
                let properties = resolve_gid(&source, layer, &tilesets, gid)?;
                let id = u16::try_from(kinds.len()).map_err(|_| {
                    source.error_at(
                        TmxErrorCode::InvalidGrid,
                        "layer uses more distinct tiles than supported".to_string(),
                        layer,
                    )
                })?;
                kinds.push(TileKind::from_properties(properties));
                kind_by_gid.insert(gid, TileKindId(id));
                TileKindId(id)
            }
        };
        cells.push(Some(id));
    }

    let tile_world = TileWorld::new(width, height, tile_size, cells, kinds).map_err(|error| {
        source.error_at(TmxErrorCode::InvalidGrid, error.to_string(), layer)
    })?;

    let mut placements = Vec::<ObjectPlacement>::new();
    let mut spawn = None;
    for group in map.children().filter(|node| node.has_tag_name("objectgroup")) {
        for object in group.children().filter(|node| node.has_tag_name("object")) {
            let name = object.attribute("name").unwrap_or_default();
            if name.trim().eq_ignore_ascii_case(SPAWN_OBJECT_NAME) {
                spawn = Some(read_spawn(&source, object)?);
                continue;
            }
            let Some(category) = ObjectCategory::from_object_name(name) else {
                debug!(object = name, "tmx_object_ignored");
                continue;
            };
            let bounds = read_object_bounds(&source, object, tile_size)?;
            placements.push(ObjectPlacement { category, bounds });
        }
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "level".to_string());

    Ok(LevelDef {
        name,
        tile_world: Arc::new(tile_world),
        placements,
        spawn: spawn.unwrap_or(options.fallback_spawn),
        player_size: options.player_size,
    })
}

struct TilesetRef {
    first_gid: u32,
    tile_count: Option<u32>,
    tiles: BTreeMap<u32, TileProperties>,
}

struct XmlSource<'a, 'input> {
    path: &'a Path,
    doc: &'a Document<'input>,
}

impl<'a, 'input> XmlSource<'a, 'input> {
    fn error_at(&self, code: TmxErrorCode, message: String, node: Node<'_, '_>) -> TmxError {
        let pos = self.doc.text_pos_at(node.range().start);
        TmxError {
            code,
            message,
            file_path: self.path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_attr<'n>(&self, node: Node<'n, '_>, name: &str) -> Result<&'n str, TmxError> {
        node.attribute(name).ok_or_else(|| {
            self.error_at(
                TmxErrorCode::MissingAttribute,
                format!("<{}> is missing attribute '{}'", node.tag_name().name(), name),
                node,
            )
        })
    }

    fn parse_attr<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, TmxError> {
        let raw = self.required_attr(node, name)?;
        self.parse_value(node, name, raw)
    }

    fn parse_optional_attr<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>, TmxError> {
        node.attribute(name)
            .map(|raw| self.parse_value(node, name, raw))
            .transpose()
    }

    fn parse_value<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
        raw: &str,
    ) -> Result<T, TmxError> {
        raw.trim().parse::<T>().map_err(|_| {
            self.error_at(
                TmxErrorCode::InvalidValue,
                format!(
                    "attribute '{}' on <{}> has invalid value '{}'",
                    name,
                    node.tag_name().name(),
                    raw
                ),
                node,
            )
        })
    }
}

fn read_source(path: &Path) -> Result<String, TmxError> {
    fs::read_to_string(path).map_err(|error| TmxError {
        code: TmxErrorCode::ReadFile,
        message: format!("failed to read file: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })
}

fn parse_document<'input>(path: &Path, raw: &'input str) -> Result<Document<'input>, TmxError> {
    Document::parse(raw).map_err(|error| TmxError {
        code: TmxErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })
}

fn load_tileset(source: &XmlSource<'_, '_>, node: Node<'_, '_>) -> Result<TilesetRef, TmxError> {
    let first_gid: u32 = source.parse_attr(node, "firstgid")?;
    if first_gid == 0 {
        return Err(source.error_at(
            TmxErrorCode::InvalidValue,
            "tileset firstgid must be at least 1".to_string(),
            node,
        ));
    }

    let Some(relative) = node.attribute("source") else {
        let (tile_count, tiles) = read_tileset_tiles(source, node)?;
        return Ok(TilesetRef {
            first_gid,
            tile_count,
            tiles,
        });
    };

    let tsx_path = source
        .path
        .parent()
        .map(|dir| dir.join(relative))
        .unwrap_or_else(|| PathBuf::from(relative));
    let raw = read_source(&tsx_path)?;
    let doc = parse_document(&tsx_path, &raw)?;
    let external = XmlSource {
        path: &tsx_path,
        doc: &doc,
    };
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(external.error_at(
            TmxErrorCode::InvalidRoot,
            "root element must be <tileset>".to_string(),
            root,
        ));
    }
    let (tile_count, tiles) = read_tileset_tiles(&external, root)?;
    debug!(path = %tsx_path.display(), first_gid, tiles = tiles.len(), "tsx_tileset_loaded");
    Ok(TilesetRef {
        first_gid,
        tile_count,
        tiles,
    })
}

fn read_tileset_tiles(
    source: &XmlSource<'_, '_>,
    tileset: Node<'_, '_>,
) -> Result<(Option<u32>, BTreeMap<u32, TileProperties>), TmxError> {
    let tile_count = source.parse_optional_attr(tileset, "tilecount")?;
    let mut tiles = BTreeMap::new();
    for tile in tileset.children().filter(|node| node.has_tag_name("tile")) {
        let id: u32 = source.parse_attr(tile, "id")?;
        let mut properties = TileProperties::new();
        if let Some(block) = tile.children().find(|node| node.has_tag_name("properties")) {
            read_properties(source, block, &mut properties)?;
        }
        tiles.insert(id, properties);
    }
    Ok((tile_count, tiles))
}

fn read_properties(
    source: &XmlSource<'_, '_>,
    block: Node<'_, '_>,
    properties: &mut TileProperties,
) -> Result<(), TmxError> {
    for property in block.children().filter(|node| node.has_tag_name("property")) {
        let name = source.required_attr(property, "name")?;
        // Multi-line strings are stored as element text instead of `value`.
        let raw = property
            .attribute("value")
            .or_else(|| property.text())
            .unwrap_or_default();
        let value = match property.attribute("type").unwrap_or("string") {
            "bool" => PropertyValue::Bool(source.parse_value(property, "value", raw)?),
            "int" => PropertyValue::Int(source.parse_value(property, "value", raw)?),
            "float" => PropertyValue::Float(source.parse_value(property, "value", raw)?),
            _ => PropertyValue::Text(raw.to_string()),
        };
        properties.insert(name, value);
    }
    Ok(())
}

fn read_layer_gids(
    source: &XmlSource<'_, '_>,
    layer: Node<'_, '_>,
    map_width: u32,
    map_height: u32,
) -> Result<Vec<u32>, TmxError> {
    let width = source
        .parse_optional_attr(layer, "width")?
        .unwrap_or(map_width);
    let height = source
        .parse_optional_attr(layer, "height")?
        .unwrap_or(map_height);
    if width != map_width || height != map_height {
        return Err(source.error_at(
            TmxErrorCode::UnsupportedMap,
            format!(
                "layer is {width}x{height} but the map is {map_width}x{map_height}; offset layers are not supported"
            ),
            layer,
        ));
    }

    let data = layer
        .children()
        .find(|node| node.has_tag_name("data"))
        .ok_or_else(|| {
            source.error_at(
                TmxErrorCode::InvalidGrid,
                "tile layer has no <data> element".to_string(),
                layer,
            )
        })?;
    if let Some(compression) = data.attribute("compression") {
        return Err(source.error_at(
            TmxErrorCode::UnsupportedEncoding,
            format!("compressed layer data ('{compression}') is not supported; save as CSV"),
            data,
        ));
    }

    let gids = match data.attribute("encoding") {
        Some("csv") => {
            let text = data.text().unwrap_or_default();
            text.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(|entry| source.parse_value::<u32>(data, "csv", entry))
                .collect::<Result<Vec<_>, _>>()?
        }
        None => data
            .children()
            .filter(|node| node.has_tag_name("tile"))
            .map(|tile| {
                source
                    .parse_optional_attr::<u32>(tile, "gid")
                    .map(|gid| gid.unwrap_or(0))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(source.error_at(
                TmxErrorCode::UnsupportedEncoding,
                format!("layer encoding '{other}' is not supported; save as CSV"),
                data,
            ))
        }
    };

    let expected = width as usize * height as usize;
    if gids.len() != expected {
        return Err(source.error_at(
            TmxErrorCode::TileCountMismatch,
            format!("layer holds {} tiles, expected {expected}", gids.len()),
            data,
        ));
    }

    Ok(gids.into_iter().map(|gid| gid & GID_MASK).collect())
}

fn resolve_gid(
    source: &XmlSource<'_, '_>,
    layer: Node<'_, '_>,
    tilesets: &[TilesetRef],
    gid: u32,
) -> Result<TileProperties, TmxError> {
    let tileset = tilesets
        .iter()
        .rev()
        .find(|tileset| tileset.first_gid <= gid);
    let Some(tileset) = tileset else {
        return Err(source.error_at(
            TmxErrorCode::UnknownGid,
            format!("gid {gid} is not covered by any tileset"),
            layer,
        ));
    };
    let local = gid - tileset.first_gid;
    if tileset.tile_count.is_some_and(|count| local >= count) {
        return Err(source.error_at(
            TmxErrorCode::UnknownGid,
            format!(
                "gid {gid} is past the end of the tileset starting at {}",
                tileset.first_gid
            ),
            layer,
        ));
    }
    Ok(tileset.tiles.get(&local).cloned().unwrap_or_default())
}

fn read_object_bounds(
    source: &XmlSource<'_, '_>,
    object: Node<'_, '_>,
    tile_size: f32,
) -> Result<Aabb, TmxError> {
    let x: f32 = source.parse_attr(object, "x")?;
    let y: f32 = source.parse_attr(object, "y")?;
    let width = source
        .parse_optional_attr::<f32>(object, "width")?
        .unwrap_or(tile_size);
    let height = source
        .parse_optional_attr::<f32>(object, "height")?
        .unwrap_or(tile_size);
    if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite())
        || width < 0.0
        || height < 0.0
    {
        return Err(source.error_at(
            TmxErrorCode::InvalidValue,
            "object position and size must be finite and non-negative".to_string(),
            object,
        ));
    }
    // Tile objects are anchored at their bottom-left corner.
    let top = if object.attribute("gid").is_some() {
        y - height
    } else {
        y
    };
    Ok(Aabb::from_top_left(
        Vec2::new(x, top),
        Vec2::new(width, height),
    ))
}

fn read_spawn(source: &XmlSource<'_, '_>, object: Node<'_, '_>) -> Result<Vec2, TmxError> {
    let is_point = object.children().any(|node| node.has_tag_name("point"))
        || (object.attribute("width").is_none() && object.attribute("height").is_none());
    if is_point {
        return Ok(Vec2::new(
            source.parse_attr(object, "x")?,
            source.parse_attr(object, "y")?,
        ));
    }
    Ok(read_object_bounds(source, object, 0.0)?.center())
}
