use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every tuning knob in the game.
///
/// Sizes, speeds and offsets are fractions of the playfield width or height
/// (see `Playfield`), so the same numbers work at any resolution. Times are
/// in seconds.
///
/// Each section has #[serde(default)], so a config file only needs the
/// fields it wants to override. Anything missing keeps its default value.
#[derive(Resource, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Logical playfield size. The window opens at this size and the camera
    /// always shows exactly this area.
    pub width: u32,
    pub height: u32,
    /// Downward acceleration as a fraction of the playfield width per second².
    pub gravity: f32,
    pub bat: BatConfig,
    pub food: FoodConfig,
    pub sheep: SheepConfig,
    pub fish: FishConfig,
    pub frog: FrogConfig,
    pub game_over: GameOverConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            gravity: 1.0,
            bat: BatConfig::default(),
            food: FoodConfig::default(),
            sheep: SheepConfig::default(),
            fish: FishConfig::default(),
            frog: FrogConfig::default(),
            game_over: GameOverConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BatConfig {
    pub base_speed: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    /// Time between the end of one dash and the next one becoming available.
    pub dash_cooldown: f32,
    pub energy_per_food: f32,
    pub max_energy: f32,
    pub energy_loss_per_second: f32,
    pub scale: f32,
    /// Food closer than this (fraction of width) makes the bat open its mouth.
    pub proximity: f32,
    pub eating_duration: f32,
    /// Below this share of max energy the bat looks tired.
    pub tired_fraction: f32,
}

impl Default for BatConfig {
    fn default() -> Self {
        Self {
            base_speed: 0.3,
            dash_speed: 0.6,
            dash_duration: 0.5,
            dash_cooldown: 3.0,
            energy_per_food: 150.0,
            max_energy: 1000.0,
            energy_loss_per_second: 100.0,
            scale: 0.1,
            proximity: 0.2,
            eating_duration: 0.4,
            tired_fraction: 0.25,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FoodConfig {
    pub scale: f32,
    pub hover_speed: f32,
    /// Spawn area half-extents around the centre, as fractions of width/height.
    pub spawn_range_x: f32,
    pub spawn_range_y: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            scale: 0.05,
            hover_speed: 0.0002,
            spawn_range_x: 0.4,
            spawn_range_y: 0.35,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SheepConfig {
    pub scale: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub spawn_interval: f32,
    pub damage: f32,
    pub bounce: f32,
}

impl Default for SheepConfig {
    fn default() -> Self {
        Self {
            scale: 0.1,
            min_speed: 0.2,
            max_speed: 0.7,
            spawn_interval: 1.5,
            damage: 50.0,
            bounce: 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FishConfig {
    pub scale: f32,
    pub spawn_interval: f32,
    pub up_time: f32,
    pub stay_time: f32,
    pub down_time: f32,
    /// How far the fish rises out of the water (fraction of height).
    pub rise: f32,
    /// Spawn line below the screen centre (fraction of height).
    pub spawn_depth: f32,
    pub spit_scale: f32,
    pub spit_speed: f32,
    pub spit_damage: f32,
}

impl Default for FishConfig {
    fn default() -> Self {
        Self {
            scale: 0.1,
            spawn_interval: 2.0,
            up_time: 2.0,
            stay_time: 0.1,
            down_time: 2.0,
            rise: 0.1,
            spawn_depth: 0.54,
            spit_scale: 0.04,
            spit_speed: 0.35,
            spit_damage: 25.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FrogConfig {
    pub scale: f32,
    /// Height of the frog below the screen centre (fraction of height).
    pub depth: f32,
    /// Width of the ping-pong track (fraction of width).
    pub track_width: f32,
    /// Seconds for a full left-right-left trip.
    pub track_period: f32,
    pub bob_speed: f32,
    pub tongue_interval: f32,
    pub croak_interval: f32,
}

impl Default for FrogConfig {
    fn default() -> Self {
        Self {
            scale: 0.07,
            depth: 0.39,
            track_width: 0.8,
            track_period: 12.0,
            bob_speed: 0.0003,
            tongue_interval: 5.0,
            croak_interval: 5.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameOverConfig {
    /// Pause after running out of energy before the screen starts fading.
    pub delay: f32,
    pub fade: f32,
    /// Extra pause after the fade before "Game Over" and "Play Again" show
    /// up. Zero shows them as soon as the screen is black.
    pub text_delay: f32,
}

impl Default for GameOverConfig {
    fn default() -> Self {
        Self {
            delay: 2.0,
            fade: 2.0,
            text_delay: 0.0,
        }
    }
}

const CONFIG_FILE: &str = "babs.ron";

/// Parses a RON config. Missing fields fall back to their defaults.
pub fn parse(contents: &str) -> Result<GameConfig, ron::error::SpannedError> {
    ron::from_str::<GameConfig>(contents)
}

/// Where the running config came from. Logged once the log plugin is up,
/// since the config itself is read before the app is built.
#[derive(Resource, Debug, Clone, PartialEq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// The file exists but could not be used; defaults are in effect.
    Rejected { path: PathBuf, reason: String },
}

#[cfg(not(target_arch = "wasm32"))]
mod storage {
    use super::{ConfigSource, GameConfig, CONFIG_FILE};
    use std::path::PathBuf;

    /// The working directory wins over the per-user config directory.
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("babs-the-bat").join(CONFIG_FILE));
        }
        paths
    }

    pub fn load() -> (GameConfig, ConfigSource) {
        let Some(path) = candidate_paths().into_iter().find(|path| path.exists()) else {
            return (GameConfig::default(), ConfigSource::Defaults);
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match super::parse(&contents) {
                Ok(config) => (config, ConfigSource::File(path)),
                Err(e) => (
                    GameConfig::default(),
                    ConfigSource::Rejected {
                        path,
                        reason: e.to_string(),
                    },
                ),
            },
            Err(e) => (
                GameConfig::default(),
                ConfigSource::Rejected {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod storage {
    use super::{ConfigSource, GameConfig};

    pub fn load() -> (GameConfig, ConfigSource) {
        (GameConfig::default(), ConfigSource::Defaults)
    }
}

/// Loads the config file if there is one, otherwise the defaults.
///
/// Called before the app is built because the window size comes from it.
pub fn load() -> (GameConfig, ConfigSource) {
    storage::load()
}

pub fn log_config_source_system(source: Res<ConfigSource>) {
    match source.as_ref() {
        ConfigSource::Defaults => info!("No config file found. Using default tuning."),
        ConfigSource::File(path) => info!("Loaded config from {:?}", path),
        ConfigSource::Rejected { path, reason } => {
            error!("Failed to load {:?}: {}. Using defaults.", path, reason)
        }
    }
}
