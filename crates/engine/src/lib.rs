use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod level;
pub mod sim;

pub use app::{
    run_app, AppError, Camera2D, InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot,
    Renderer, Scene, SceneCommand, SceneWorld, ScreenAnchor, ScreenText, Viewport,
    SLOW_FRAME_ENV_VAR,
};
pub use level::{
    load_tmx_level, LevelDef, LevelError, ObjectCategory, ObjectPlacement, TmxError,
    TmxErrorCode, TmxLoadOptions, DEFAULT_PLAYER_SIZE, DEFAULT_SPAWN,
};
pub use sim::{
    Aabb, GameState, PhysicsTuning, PlayerInput, RestartKind, ScenePhase, SimEvent, Simulation,
    TickSnapshot, TileWorld, Vec2,
};

pub const ROOT_ENV_VAR: &str = "NIJ_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        Self {
            config_dir: assets_dir.join("config"),
            assets_dir,
            root,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "{env_var} is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf, env_var: &'static str },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/nifty-ice-jumps\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(AppPaths::from_root(root))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: normalized,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_above(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();
    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("assets")).expect("assets dir");
        assert!(!is_repo_marker(temp.path()));

        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("manifest");
        fs::create_dir(temp.path().join("crates")).expect("crates dir");
        let nested = temp.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested dir");

        let found = find_root_above(&nested).expect("root");
        assert_eq!(found, normalize_path(temp.path()));
    }

    #[test]
    fn app_paths_hang_off_assets() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(paths.assets_dir, PathBuf::from("/game/assets"));
        assert_eq!(paths.config_dir, PathBuf::from("/game/assets/config"));
    }
}
