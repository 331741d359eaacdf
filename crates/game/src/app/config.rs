use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::level::DEFAULT_COLLISION_LAYER;
use engine::{LoopConfig, PhysicsTuning, TmxLoadOptions, Vec2, DEFAULT_PLAYER_SIZE, DEFAULT_SPAWN};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const CONFIG_FILE_NAME: &str = "game.json";
pub(crate) const DEFAULT_LEVEL_PATH: &str = "levels/platformer-level-1.tmx";
pub(crate) const DEFAULT_CAMERA_ZOOM: f32 = 2.0;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_tps: u32,
    pub max_render_fps: Option<u32>,
    pub simulated_slow_frame_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let loop_defaults = LoopConfig::default();
        Self {
            title: loop_defaults.window_title,
            width: loop_defaults.window_width,
            height: loop_defaults.window_height,
            target_tps: loop_defaults.target_tps,
            max_render_fps: loop_defaults.max_render_fps,
            simulated_slow_frame_ms: loop_defaults.simulated_slow_frame_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LevelConfig {
    /// Relative paths resolve against the assets directory.
    pub path: PathBuf,
    pub collision_layer: String,
    pub fallback_spawn: Vec2,
    pub player_size: Vec2,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LEVEL_PATH),
            collision_layer: DEFAULT_COLLISION_LAYER.to_string(),
            fallback_spawn: DEFAULT_SPAWN,
            player_size: DEFAULT_PLAYER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CameraConfig {
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_CAMERA_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub window: WindowConfig,
    pub level: LevelConfig,
    pub physics: PhysicsTuning,
    pub camera: CameraConfig,
}

impl GameConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            window_title: self.window.title.clone(),
            window_width: self.window.width,
            window_height: self.window.height,
            target_tps: self.window.target_tps,
            max_render_fps: self.window.max_render_fps,
            simulated_slow_frame_ms: self.window.simulated_slow_frame_ms,
            metrics_log_interval: Duration::from_secs(1),
            ..LoopConfig::default()
        }
    }

    pub(crate) fn tmx_options(&self) -> TmxLoadOptions {
        TmxLoadOptions {
            collision_layer: self.level.collision_layer.clone(),
            fallback_spawn: self.level.fallback_spawn,
            player_size: self.level.player_size,
        }
    }
}

/// A missing file yields the defaults; anything unreadable or malformed is
/// an error.
pub(crate) fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            return Ok(GameConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_game_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_game_config(raw: &str) -> Result<GameConfig, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(source.to_string())
            } else {
                Err(format!("at {path}: {source}"))
            }
        }
    }
}
