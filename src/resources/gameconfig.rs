//! Simulation configuration resource.
//!
//! Tunables loaded from an INI file. Every key is optional; missing keys and
//! a missing file keep the defaults below.
//!
//! # Configuration File Format
//!
//! ```ini
//! [physics]
//! gravity = 9.81
//! time_tick = 0.2
//! force_constant = 50
//! inverse_law = 1
//! proximity_radius = 200
//! proximity_accel = 3
//!
//! [terrain]
//! tile_width = 420
//! tile_height = 322
//! origin_y = 124
//! splash_radius = 30
//!
//! [world]
//! screen_width = 1024
//! screen_height = 768
//! bounding_shrink = 0.7
//! ```

use std::path::{Path, PathBuf};

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};

use crate::error::{Result, SimError};

const DEFAULT_GRAVITY: f32 = 9.81;
const DEFAULT_TIME_TICK: f32 = 0.2;
const DEFAULT_FORCE_CONSTANT: f32 = 50.0;
const DEFAULT_INVERSE_LAW: f32 = 1.0;
const DEFAULT_PROXIMITY_RADIUS: f32 = 200.0;
const DEFAULT_PROXIMITY_ACCEL: f32 = 3.0;
const DEFAULT_TILE_WIDTH: u32 = 420;
const DEFAULT_TILE_HEIGHT: u32 = 322;
const DEFAULT_ORIGIN_Y: f32 = 124.0;
const DEFAULT_SPLASH_RADIUS: f32 = 30.0;
const DEFAULT_SCREEN_WIDTH: u32 = 1024;
const DEFAULT_SCREEN_HEIGHT: u32 = 768;
const DEFAULT_BOUNDING_SHRINK: f32 = 0.7;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Downward acceleration.
    pub gravity: f32,
    /// Fixed physics step per integration.
    pub time_tick: f32,
    /// Field constant `k`.
    pub force_constant: f32,
    /// Distance exponent `p` (2 for inverse square).
    pub inverse_law: f32,
    /// Distance under which a force source is told about a body.
    pub proximity_radius: f32,
    /// Acceleration magnitude above which a force source is told about a body.
    pub proximity_accel: f32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Screen y of the top edge of the first tile row.
    pub origin_y: f32,
    pub splash_radius: f32,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Collider half-extents are sprite size times this, halved.
    pub bounding_shrink: f32,
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            time_tick: DEFAULT_TIME_TICK,
            force_constant: DEFAULT_FORCE_CONSTANT,
            inverse_law: DEFAULT_INVERSE_LAW,
            proximity_radius: DEFAULT_PROXIMITY_RADIUS,
            proximity_accel: DEFAULT_PROXIMITY_ACCEL,
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            origin_y: DEFAULT_ORIGIN_Y,
            splash_radius: DEFAULT_SPLASH_RADIUS,
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            bounding_shrink: DEFAULT_BOUNDING_SHRINK,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load from `config_path`. A missing file keeps the defaults; an
    /// unreadable one is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::with_path(path);
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(config);
        }
        let text = std::fs::read_to_string(path)?;
        config.apply_ini(&text)?;
        Ok(config)
    }

    /// Apply INI text on top of the current values.
    pub fn apply_ini(&mut self, text: &str) -> Result<()> {
        let mut ini = Ini::new();
        ini.read(text.to_string())
            .map_err(|e| SimError::Config(format!("Failed to parse config: {}", e)))?;

        let float = |section: &str, key: &str| ini.getfloat(section, key).ok().flatten();
        let uint = |section: &str, key: &str| ini.getuint(section, key).ok().flatten();

        // [physics] section
        if let Some(v) = float("physics", "gravity") {
            self.gravity = v as f32;
        }
        if let Some(v) = float("physics", "time_tick") {
            self.time_tick = positive_or("physics.time_tick", v as f32, DEFAULT_TIME_TICK);
        }
        if let Some(v) = float("physics", "force_constant") {
            self.force_constant = v as f32;
        }
        if let Some(v) = float("physics", "inverse_law") {
            self.inverse_law = positive_or("physics.inverse_law", v as f32, DEFAULT_INVERSE_LAW);
        }
        if let Some(v) = float("physics", "proximity_radius") {
            self.proximity_radius = v as f32;
        }
        if let Some(v) = float("physics", "proximity_accel") {
            self.proximity_accel = v as f32;
        }

        // [terrain] section
        if let Some(v) = uint("terrain", "tile_width") {
            self.tile_width = positive_u32_or("terrain.tile_width", v, DEFAULT_TILE_WIDTH);
        }
        if let Some(v) = uint("terrain", "tile_height") {
            self.tile_height = positive_u32_or("terrain.tile_height", v, DEFAULT_TILE_HEIGHT);
        }
        if let Some(v) = float("terrain", "origin_y") {
            self.origin_y = v as f32;
        }
        if let Some(v) = float("terrain", "splash_radius") {
            self.splash_radius =
                positive_or("terrain.splash_radius", v as f32, DEFAULT_SPLASH_RADIUS);
        }

        // [world] section
        if let Some(v) = uint("world", "screen_width") {
            self.screen_width = positive_u32_or("world.screen_width", v, DEFAULT_SCREEN_WIDTH);
        }
        if let Some(v) = uint("world", "screen_height") {
            self.screen_height = positive_u32_or("world.screen_height", v, DEFAULT_SCREEN_HEIGHT);
        }
        if let Some(v) = float("world", "bounding_shrink") {
            self.bounding_shrink =
                positive_or("world.bounding_shrink", v as f32, DEFAULT_BOUNDING_SHRINK);
        }

        info!(
            "Loaded config: g={} dt={} k={} p={}, tiles {}x{} at y={}, screen {}x{}",
            self.gravity,
            self.time_tick,
            self.force_constant,
            self.inverse_law,
            self.tile_width,
            self.tile_height,
            self.origin_y,
            self.screen_width,
            self.screen_height
        );
        Ok(())
    }

    /// Save to `config_path`.
    pub fn save_to_file(&self) -> Result<()> {
        let mut ini = Ini::new();
        let mut put = |section: &str, key: &str, value: String| {
            ini.set(section, key, Some(value));
        };
        put("physics", "gravity", self.gravity.to_string());
        put("physics", "time_tick", self.time_tick.to_string());
        put("physics", "force_constant", self.force_constant.to_string());
        put("physics", "inverse_law", self.inverse_law.to_string());
        put("physics", "proximity_radius", self.proximity_radius.to_string());
        put("physics", "proximity_accel", self.proximity_accel.to_string());
        put("terrain", "tile_width", self.tile_width.to_string());
        put("terrain", "tile_height", self.tile_height.to_string());
        put("terrain", "origin_y", self.origin_y.to_string());
        put("terrain", "splash_radius", self.splash_radius.to_string());
        put("world", "screen_width", self.screen_width.to_string());
        put("world", "screen_height", self.screen_height.to_string());
        put("world", "bounding_shrink", self.bounding_shrink.to_string());
        ini.write(&self.config_path)?;
        info!("Saved config to {}", self.config_path.display());
        Ok(())
    }
}

fn positive_or(key: &str, value: f32, default: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        warn!("{} must be positive, got {}; using {}", key, value, default);
        default
    }
}

fn positive_u32_or(key: &str, value: u64, default: u32) -> u32 {
    match u32::try_from(value) {
        Ok(v) if v > 0 => v,
        _ => {
            warn!("{} must be a positive integer, got {}; using {}", key, value, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_game() {
        let c = GameConfig::new();
        assert_eq!(c.gravity, 9.81);
        assert_eq!(c.time_tick, 0.2);
        assert_eq!(c.force_constant, 50.0);
        assert_eq!((c.tile_width, c.tile_height), (420, 322));
        assert_eq!(c.origin_y, 124.0);
        assert_eq!(c.splash_radius, 30.0);
    }

    #[test]
    fn ini_overrides_and_rejects_non_positive() {
        let mut c = GameConfig::new();
        c.apply_ini("[physics]\ngravity = 3.5\ntime_tick = -1\n[terrain]\ntile_width = 100\n")
            .unwrap();
        assert_eq!(c.gravity, 3.5);
        assert_eq!(c.time_tick, 0.2);
        assert_eq!(c.tile_width, 100);
        assert_eq!(c.tile_height, 322);
    }

    #[test]
    fn missing_file_keeps_defaults() {
        let c = GameConfig::load("/definitely/not/here.ini").unwrap();
        assert_eq!(c.screen_width, 1024);
    }
}
