//! TOML run configuration for the binary.
//!
//! Every section has defaults; a missing or malformed file falls back to them.

use blockworld_render::RenderConfig;
use blockworld_world::LevelConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/blockworld.toml";

/// Everything a headless run reads from its config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub level: LevelConfig,
    pub render: RenderConfig,
    pub world: WorldSize,
    /// Wandering entities spawned on the surface.
    pub entities: usize,
    pub camera: CameraConfig,
}

/// Level dimensions in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorldSize {
    pub size_x: i32,
    pub size_y: i32,
    pub size_z: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub aspect: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            render: RenderConfig::default(),
            world: WorldSize::default(),
            entities: 16,
            camera: CameraConfig::default(),
        }
    }
}

impl Default for WorldSize {
    fn default() -> Self {
        Self {
            size_x: 64,
            size_y: 32,
            size_z: 64,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [32.0, 40.0, 88.0],
            target: [32.0, 16.0, 32.0],
            aspect: 16.0 / 9.0,
        }
    }
}

impl SimulationConfig {
    /// Load from `path`, falling back to defaults when the file is missing or malformed.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SimulationConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SimulationConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH) || err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                SimulationConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: SimulationConfig = toml::from_str(
            r#"
            entities = 3

            [level]
            seed = 42

            [render]
            max_chunk_updates_per_frame = 2

            [camera]
            position = [1.0, 2.0, 3.0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.entities, 3);
        assert_eq!(cfg.level.seed, 42);
        assert_eq!(cfg.level.random_tick_divisor, 200);
        assert_eq!(cfg.render.max_chunk_updates_per_frame, 2);
        assert_eq!(cfg.render.resort_distance, 8.0);
        assert_eq!(cfg.camera.position, [1.0, 2.0, 3.0]);
        assert_eq!(cfg.camera.target, CameraConfig::default().target);
        assert_eq!(cfg.world, WorldSize::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("blockworld-config-malformed.toml");
        fs::write(&path, "entities = \"many\"").unwrap();
        assert_eq!(SimulationConfig::load_from_path(&path), SimulationConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("blockworld-config-does-not-exist.toml");
        assert_eq!(SimulationConfig::load_from_path(&path), SimulationConfig::default());
    }
}
