use std::env;
use std::path::{Path, PathBuf};

use engine::{
    load_tmx_level, resolve_app_paths, LevelError, LoopConfig, Scene, StartupError, TmxError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_game_config, ConfigError, CONFIG_FILE_NAME};
use super::platformer::PlatformerScene;

const LEVEL_ENV_VAR: &str = "NIJ_LEVEL";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to load level: {0}")]
    Tmx(#[from] TmxError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Nifty Ice Jumps Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_root_resolved");

    let config_path = paths.config_dir.join(CONFIG_FILE_NAME);
    let config = load_game_config(&config_path)?;
    info!(path = %config_path.display(), "config_loaded");

    let level_path = resolve_level_path(
        &paths.assets_dir,
        &config.level.path,
        env::var(LEVEL_ENV_VAR).ok(),
    );
    let level = load_tmx_level(&level_path, &config.tmx_options())?;
    let scene = PlatformerScene::new(level, config.physics, config.camera.zoom)?;

    Ok(AppWiring {
        config: config.loop_config(),
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// An env override wins over the configured path. Relative paths are taken
/// from the assets directory.
fn resolve_level_path(
    assets_dir: &Path,
    configured: &Path,
    env_override: Option<String>,
) -> PathBuf {
    let chosen = env_override
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| configured.to_path_buf());
    if chosen.is_absolute() {
        chosen
    } else {
        assets_dir.join(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_relative_to_assets() {
        let resolved = resolve_level_path(
            Path::new("/game/assets"),
            Path::new("levels/platformer-level-1.tmx"),
            None,
        );
        assert_eq!(
            resolved,
            PathBuf::from("/game/assets/levels/platformer-level-1.tmx")
        );
    }

    #[test]
    fn env_override_wins_and_blank_is_ignored() {
        let assets = Path::new("/game/assets");
        let configured = Path::new("levels/a.tmx");

        let resolved = resolve_level_path(assets, configured, Some(" levels/b.tmx ".to_string()));
        assert_eq!(resolved, PathBuf::from("/game/assets/levels/b.tmx"));

        let resolved = resolve_level_path(assets, configured, Some("   ".to_string()));
        assert_eq!(resolved, PathBuf::from("/game/assets/levels/a.tmx"));
    }

    #[test]
    fn absolute_override_is_kept() {
        let temp = tempfile::tempdir().expect("tempdir");
        let absolute = temp.path().join("custom.tmx");
        let resolved = resolve_level_path(
            Path::new("assets"),
            Path::new("levels/a.tmx"),
            Some(absolute.display().to_string()),
        );
        assert_eq!(resolved, absolute);
    }
}
