//! Configuration file handling for snapbooth.
//!
//! Loads configuration from `~/.config/snapbooth/config.toml` or a custom
//! path. Every field has a default, so a missing file means a usable booth.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geometry::Size;
use crate::session::SessionSettings;

/// Configuration file structure for snapbooth.
/// Loaded from ~/.config/snapbooth/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub booth: BoothConfig,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Capture device index.
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Sensor gain, best-effort on UVC cameras.
    #[serde(default = "default_iso")]
    pub iso: u32,
    /// Mounting rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub rotation: u16,
    /// Mirror captures horizontally, same axis as the preview.
    #[serde(default)]
    pub flip: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: default_width(),
            height: default_height(),
            iso: default_iso(),
            rotation: 0,
            flip: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OverlayConfig {
    /// Text opacity, 0-255.
    #[serde(default = "default_alpha")]
    pub alpha: u8,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BoothConfig {
    /// Language code for on-screen prompts.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_iso() -> u32 {
    200
}

fn default_alpha() -> u8 {
    80
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            Ok(config)
        } else {
            log::debug!("No config file at '{}', using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Session settings derived from the `[camera]` and `[booth]` sections.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            device_index: self.camera.device,
            resolution: Size::new(self.camera.width, self.camera.height),
            iso: self.camera.iso,
            rotation: self.camera.rotation,
            capture_hflip: self.camera.flip,
            language: self.booth.language.clone(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    directories::ProjectDirs::from("com", "snapbooth", "snapbooth")
        .map(|d| d.config_dir().to_path_buf().join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/snapbooth/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_booth_expectations() {
        let config = Config::default();
        assert_eq!(config.camera.device, 0);
        assert_eq!(config.camera.width, 1920);
        assert_eq!(config.camera.height, 1080);
        assert_eq!(config.camera.iso, 200);
        assert_eq!(config.camera.rotation, 0);
        assert!(!config.camera.flip);
        assert_eq!(config.overlay.alpha, 80);
        assert_eq!(config.booth.language, "en");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/snapbooth.toml"))).unwrap();
        assert_eq!(config.camera.width, 1920);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\nwidth = 1280\nheight = 720\nflip = true").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 720);
        assert!(config.camera.flip);
        // Untouched sections keep their defaults
        assert_eq!(config.camera.iso, 200);
        assert_eq!(config.overlay.alpha, 80);
        assert_eq!(config.booth.language, "en");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera\nwidth = ").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_session_settings_mapping() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[camera]\ndevice = 2\nwidth = 800\nheight = 600\nrotation = 90\n\n[booth]\nlanguage = \"fr\""
        )
        .unwrap();

        let settings = Config::load(Some(file.path())).unwrap().session_settings();
        assert_eq!(settings.device_index, 2);
        assert_eq!(settings.resolution, Size::new(800, 600));
        assert_eq!(settings.rotation, 90);
        assert_eq!(settings.language, "fr");
    }
}
