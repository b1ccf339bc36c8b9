//! The `config.ron` schema and its load/save cycle.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "starwatch";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Starfield scene settings.
    pub starfield: StarfieldConfig,
    /// Near-Earth object feed settings.
    pub feed: FeedConfig,
    /// Diagnostics.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Initial width, logical pixels.
    pub width: u32,
    /// Initial height, logical pixels.
    pub height: u32,
    /// Present with vsync.
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// How a particle layer animates its twinkle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TwinkleStrategy {
    /// Per-point opacity evaluated in the vertex shader.
    #[default]
    Shader,
    /// Per-point opacity evaluated on the host, averaged into one layer opacity.
    HostAveraged,
}

impl std::str::FromStr for TwinkleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shader" | "gpu" => Ok(Self::Shader),
            "host" | "host-averaged" | "averaged" => Ok(Self::HostAveraged),
            other => Err(format!("unknown twinkle strategy '{other}'")),
        }
    }
}

/// One density tier of the starfield.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayerConfig {
    /// Layer name, used for GPU labels and logs.
    pub name: String,
    /// Number of points in the layer.
    pub count: u32,
    /// Packed `0xRRGGBB` color.
    pub color: u32,
    /// Base point size.
    pub point_size: f32,
    /// Side length of the cube the points are scattered in.
    pub spread: f32,
    /// Lower bound of the per-point twinkle speed.
    pub twinkle_speed_min: f32,
    /// Upper bound of the per-point twinkle speed.
    pub twinkle_speed_max: f32,
    /// Twinkle amplitude shared by every point of the layer.
    pub amplitude: f32,
    /// Twinkle strategy, fixed for the lifetime of the layer.
    pub twinkle: TwinkleStrategy,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            name: "layer".to_string(),
            count: 1000,
            color: 0xffffff,
            point_size: 0.5,
            spread: 1000.0,
            twinkle_speed_min: 0.001,
            twinkle_speed_max: 0.01,
            amplitude: 0.1,
            twinkle: TwinkleStrategy::Shader,
        }
    }
}

impl LayerConfig {
    /// Background tier: many small, distant stars.
    pub fn small() -> Self {
        Self {
            name: "small".to_string(),
            count: 1500,
            color: 0xffffff,
            point_size: 0.6,
            spread: 2000.0,
            twinkle_speed_min: 0.001,
            twinkle_speed_max: 0.005,
            amplitude: 0.05,
            twinkle: TwinkleStrategy::Shader,
        }
    }

    /// Middle tier with a slight blue tint.
    pub fn medium() -> Self {
        Self {
            name: "medium".to_string(),
            count: 750,
            color: 0xeeeeff,
            point_size: 0.8,
            spread: 1500.0,
            twinkle_speed_min: 0.01,
            twinkle_speed_max: 0.05,
            amplitude: 0.03,
            twinkle: TwinkleStrategy::Shader,
        }
    }

    /// Nearest tier: densest, strongest twinkle.
    pub fn large() -> Self {
        Self {
            name: "large".to_string(),
            count: 3000,
            color: 0xffffff,
            point_size: 0.15,
            spread: 1000.0,
            twinkle_speed_min: 0.005,
            twinkle_speed_max: 0.01,
            amplitude: 0.2,
            twinkle: TwinkleStrategy::Shader,
        }
    }
}

/// Starfield scene configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StarfieldConfig {
    /// Seed for all procedural sampling. `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Particle layers, drawn in order.
    pub layers: Vec<LayerConfig>,
    /// Per-frame rotation increment about the X axis (radians).
    pub rotation_step_x: f32,
    /// Per-frame rotation increment about the Y axis (radians).
    pub rotation_step_y: f32,
    /// Shooting-star spawn interval range in seconds, `[min, max)`.
    pub spawn_interval: (f64, f64),
    /// Shooting-star lifetime range in seconds, `[min, max)`.
    pub shooting_star_lifetime: (f64, f64),
    /// Optional cap on concurrently active shooting stars.
    pub max_active_shooting_stars: Option<usize>,
    /// Side length of the circular point sprite in texels.
    pub sprite_size: u32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            layers: vec![
                LayerConfig::small(),
                LayerConfig::medium(),
                LayerConfig::large(),
            ],
            rotation_step_x: 0.0001,
            rotation_step_y: 0.0002,
            spawn_interval: (1.0, 6.0),
            shooting_star_lifetime: (0.5, 2.0),
            max_active_shooting_stars: None,
            sprite_size: 64,
        }
    }
}

impl StarfieldConfig {
    /// Force every layer onto one twinkle strategy.
    pub fn set_twinkle_strategy(&mut self, strategy: TwinkleStrategy) {
        for layer in &mut self.layers {
            layer.twinkle = strategy;
        }
    }
}

/// Near-Earth object feed and local page server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Serve the page and `/api/neo-data` proxy.
    pub enabled: bool,
    /// Address the local server binds to.
    pub listen_address: String,
    /// Port the local server binds to (0 = OS assigned).
    pub port: u16,
    /// Upstream NeoWs base URL.
    pub base_url: String,
    /// Upstream API key. Empty falls back to `NASA_API_KEY`, then `DEMO_KEY`.
    pub api_key: String,
    /// Upstream request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "https://api.nasa.gov".to_string(),
            api_key: String::new(),
            timeout_seconds: 15,
        }
    }
}

impl FeedConfig {
    /// Resolve the API key: config value, then `NASA_API_KEY`, then `DEMO_KEY`.
    pub fn resolved_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var("NASA_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| "DEMO_KEY".to_string())
    }
}

/// Diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Filter directive such as `"debug"` or `"info,starwatch_feed=trace"`.
    pub log_level: String,
}


impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Asteroid Tracker".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Platform config directory for the application, if the OS exposes one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Read `config.ron` from `config_dir`, writing the defaults there first if it is missing.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Write `config.ron` into `config_dir`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join("config.ron");
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Re-read `config.ron`; `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join("config.ron"))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("port: 3000"));
        assert!(ron_str.contains("name: \"medium\""));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.starfield.seed = Some(7);
        config.starfield.max_active_shooting_stars = Some(4);
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_default_layers_match_three_tiers() {
        let starfield = StarfieldConfig::default();
        let counts: Vec<u32> = starfield.layers.iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![1500, 750, 3000]);
        assert_eq!(starfield.spawn_interval, (1.0, 6.0));
        assert_eq!(starfield.shooting_star_lifetime, (0.5, 2.0));
        assert!(starfield.max_active_shooting_stars.is_none());
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.starfield, StarfieldConfig::default());
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "(window: (width: ").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.ron"));
    }

    #[test]
    fn test_extra_field_ignored() {
        let ron_str = "(future_setting: true)";
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_ok());
    }

    #[test]
    fn test_partial_layer_fills_defaults() {
        let ron_str = "(starfield: (layers: [(name: \"dust\", count: 12)]))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.starfield.layers.len(), 1);
        let layer = &config.starfield.layers[0];
        assert_eq!(layer.name, "dust");
        assert_eq!(layer.count, 12);
        assert_eq!(layer.twinkle, TwinkleStrategy::Shader);
    }

    #[test]
    fn test_set_twinkle_strategy_applies_to_all_layers() {
        let mut starfield = StarfieldConfig::default();
        starfield.set_twinkle_strategy(TwinkleStrategy::HostAveraged);
        assert!(
            starfield
                .layers
                .iter()
                .all(|l| l.twinkle == TwinkleStrategy::HostAveraged)
        );
    }

    #[test]
    fn test_twinkle_strategy_parses() {
        assert_eq!("shader".parse::<TwinkleStrategy>(), Ok(TwinkleStrategy::Shader));
        assert_eq!("HOST".parse::<TwinkleStrategy>(), Ok(TwinkleStrategy::HostAveraged));
        assert!("sparkle".parse::<TwinkleStrategy>().is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let feed = FeedConfig {
            api_key: "abc123".to_string(),
            ..FeedConfig::default()
        };
        assert_eq!(feed.resolved_api_key(), "abc123");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.feed.port = 8080;
        config.starfield.seed = Some(99);

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.starfield.rotation_step_y = 0.001;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().starfield.rotation_step_y, 0.001);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
