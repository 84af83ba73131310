use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

fn default_speed() -> f32 {
    // Notches are coarse; 0.05 rad per notch gives a full turn in ~125 ticks
    0.05
}

fn default_enabled() -> bool {
    true
}

/// Valid sensitivity range accepted by the menu.
pub const SPEED_MIN: f32 = 0.01;
pub const SPEED_MAX: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,

    // Radians per wheel notch, per axis
    #[serde(default = "default_speed")]
    pub speed_yaw: f32,
    #[serde(default = "default_speed")]
    pub speed_pitch: f32,

    #[serde(default)]
    pub invert_yaw: bool,
    #[serde(default)]
    pub invert_pitch: bool,

    // Master switch; the hook stays installed so diagnostics keep working
    #[serde(default = "default_enabled")]
    pub scroll_camera_enabled: bool,

    #[serde(default)]
    pub first_run_done: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            speed_yaw: default_speed(),
            speed_pitch: default_speed(),
            invert_yaw: false,
            invert_pitch: false,
            scroll_camera_enabled: true,
            first_run_done: false,
        }
    }
}

impl Config {
    pub fn load_or_create(config_path: &str) -> Self {
        if Path::new(config_path).exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(mut config) => {
                        config.clamp_speeds();
                        info!("[CONFIG] ✓ Loaded configuration from {}", config_path);
                        return config;
                    }
                    Err(e) => {
                        info!("[CONFIG] ✗ Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    info!("[CONFIG] ✗ Failed to read config file: {}", e);
                }
            }
        }

        // Create default config
        let config = Config::default();
        if let Err(e) = config.save(config_path) {
            info!("[CONFIG] ✗ Failed to save default config: {}", e);
        } else {
            info!("[CONFIG] ✓ Created default configuration at {}", config_path);
        }
        config
    }

    pub fn save(&self, config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(config_path, toml_string)?;
        Ok(())
    }

    /// Hand-edited files may carry speeds outside what the menu allows
    pub fn clamp_speeds(&mut self) {
        self.speed_yaw = self.speed_yaw.clamp(SPEED_MIN, SPEED_MAX);
        self.speed_pitch = self.speed_pitch.clamp(SPEED_MIN, SPEED_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.speed_yaw, 0.05);
        assert_eq!(config.speed_pitch, 0.05);
        assert!(!config.invert_yaw);
        assert!(!config.invert_pitch);
        assert!(config.scroll_camera_enabled);
        assert!(!config.first_run_done);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: Config = toml::from_str("version = 1").unwrap();
        assert_eq!(config.speed_yaw, 0.05);
        assert!(config.scroll_camera_enabled);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.speed_pitch = 0.2;
        config.invert_pitch = true;
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.speed_pitch, 0.2);
        assert!(back.invert_pitch);
        assert!(!back.invert_yaw);
    }

    #[test]
    fn test_clamp_speeds() {
        let mut config = Config::default();
        config.speed_yaw = 7.5;
        config.speed_pitch = 0.0;
        config.clamp_speeds();
        assert_eq!(config.speed_yaw, SPEED_MAX);
        assert_eq!(config.speed_pitch, SPEED_MIN);
    }
}
