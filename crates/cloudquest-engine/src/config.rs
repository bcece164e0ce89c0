//! Engine configuration.
//!
//! Run length, seeding, save location, logging and gameplay tuning.
//! Configuration can be loaded from and saved to a TOML file.

use cloudquest_gameplay::GameSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "cloudquest.toml";

/// Save directory name under the platform data dir.
const SAVE_DIR: &str = "saves";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Display ===
    /// Camera viewport width in pixels
    pub screen_width: u32,
    /// Camera viewport height in pixels
    pub screen_height: u32,
    /// Target frames per second
    pub target_fps: u32,

    // === Run ===
    /// Frames to run before exiting (0 = until the script finishes)
    pub max_frames: u64,
    /// Pace frames against the wall clock instead of running flat out
    pub realtime: bool,
    /// RNG seed (None = random)
    pub seed: Option<u64>,

    // === Persistence ===
    /// Save directory (None = platform data dir)
    pub save_dir: Option<PathBuf>,
    /// Save slot name
    pub save_slot: String,
    /// Auto-save interval in seconds (0 = disabled)
    pub auto_save_interval: u32,

    // === Logging ===
    /// Emit JSON log lines
    pub log_json: bool,

    // === Gameplay ===
    /// Gameplay tuning
    pub game: GameSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_width: 1024,
            screen_height: 768,
            target_fps: 60,

            max_frames: 36_000, // 10 minutes at 60 FPS
            realtime: false,
            seed: None,

            save_dir: None,
            save_slot: "progress".to_string(),
            auto_save_interval: 60,

            log_json: false,

            game: GameSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Default configuration file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join("cloudquest").join(CONFIG_FILE),
        )
    }

    /// Directory saves are written to.
    #[must_use]
    pub fn save_path(&self) -> PathBuf {
        if let Some(dir) = &self.save_dir {
            return dir.clone();
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from(SAVE_DIR),
            |dir| dir.join("cloudquest").join(SAVE_DIR),
        )
    }

    /// Gameplay settings with the viewport taken from the display section.
    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            screen_width: self.screen_width as f32,
            screen_height: self.screen_height as f32,
            ..self.game.clone()
        }
    }

    /// Seconds per frame at the target rate.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.screen_width = self.screen_width.clamp(320, 7680);
        self.screen_height = self.screen_height.clamp(240, 4320);
        self.target_fps = self.target_fps.clamp(10, 240);
        if self.save_slot.trim().is_empty() {
            self.save_slot = "progress".to_string();
        }
        self.game.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.screen_width, 1024);
        assert_eq!(config.screen_height, 768);
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.save_slot, "progress");
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.screen_width = 100;
        config.target_fps = 1000;
        config.save_slot = "  ".into();
        config.game.flee_chance = 3.0;

        config.validate();

        assert_eq!(config.screen_width, 320);
        assert_eq!(config.target_fps, 240);
        assert_eq!(config.save_slot, "progress");
        assert!((config.game.flee_chance - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = EngineConfig::default();
        config.seed = Some(12345);
        config.max_frames = 600;
        config.save_dir = Some(temp_dir.path().join("saves"));
        config.game.flee_chance = 0.5;

        config.save_to(&config_path).expect("Failed to save config");
        let loaded = EngineConfig::load_from(&config_path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "seed = 7\n[game]\nplayer_speed = 150.0\n").expect("write");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.seed, Some(7));
        assert_eq!(loaded.target_fps, 60);
        assert!((loaded.game.player_speed - 150.0).abs() < f32::EPSILON);
        assert!((loaded.game.station_radius - 48.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "target_fps = \"fast\"").expect("write");
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let loaded = EngineConfig::load_from("/nonexistent/cloudquest.toml");
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_game_settings_take_viewport() {
        let mut config = EngineConfig::default();
        config.screen_width = 800;
        config.screen_height = 600;
        let settings = config.game_settings();
        assert!((settings.screen_width - 800.0).abs() < f32::EPSILON);
        assert!((settings.screen_height - 600.0).abs() < f32::EPSILON);
    }
}
