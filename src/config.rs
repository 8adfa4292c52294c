//! # Configuration Management
//!
//! This module loads and saves the tide-config.toml file: which station to
//! predict, where the station snapshot lives, and the prediction window and
//! grid spacing.

use crate::predictor::PredictionSettings;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Station selection
    pub station: StationConfig,
    /// Prediction window and sampling
    pub prediction: PredictionConfig,
}

/// Station selection and data source
#[derive(Debug, Deserialize, Serialize)]
pub struct StationConfig {
    /// Station ID (e.g., "8418150" for Portland, ME)
    pub id: String,
    /// JSON snapshot of station records
    pub stations_file: PathBuf,
}

/// Prediction window and grid spacing
#[derive(Debug, Deserialize, Serialize)]
pub struct PredictionConfig {
    /// Time window in hours (predicts -window to +window around now)
    pub window_hours: i64,
    /// Spacing of height samples in minutes
    pub sample_minutes: i64,
    /// Spacing of rate samples during extremum search, at most 15 minutes
    pub search_step_minutes: i64,
}

impl PredictionConfig {
    /// Grid spacing for a [`crate::predictor::TidePredictor`].
    ///
    /// Values too large for a `Duration` saturate, so an oversized search step
    /// surfaces as [`crate::TideError::InvalidStep`] from the predictor.
    pub fn settings(&self) -> PredictionSettings {
        PredictionSettings {
            search_step: saturating_minutes(self.search_step_minutes),
            sample_interval: saturating_minutes(self.sample_minutes),
        }
    }

    /// Half-width of the prediction window, or `None` when `window_hours`
    /// does not fit in a `Duration`.
    pub fn window(&self) -> Option<Duration> {
        Duration::try_hours(self.window_hours)
    }
}

fn saturating_minutes(minutes: i64) -> Duration {
    Duration::try_minutes(minutes).unwrap_or(if minutes < 0 {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                id: "8418150".to_string(),
                stations_file: PathBuf::from("data/stations.json"),
            },
            prediction: PredictionConfig {
                window_hours: 12,
                sample_minutes: 10,
                search_step_minutes: 10,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(station = %config.station.id, path = %path.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file format, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Save current configuration to tide-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration to the specified path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.station.id, "8418150");
        assert_eq!(config.station.stations_file, PathBuf::from("data/stations.json"));
        assert_eq!(config.prediction.window_hours, 12);
        assert_eq!(config.prediction.sample_minutes, 10);
        assert_eq!(config.prediction.search_step_minutes, 10);
    }

    #[test]
    fn test_settings_conversion() {
        let config = Config::default();
        let settings = config.prediction.settings();
        assert_eq!(settings.search_step, Duration::minutes(10));
        assert_eq!(settings.sample_interval, Duration::minutes(10));
        assert_eq!(config.prediction.window(), Some(Duration::hours(12)));
    }

    #[test]
    fn test_oversized_values_do_not_panic() {
        let mut config = Config::default();
        config.prediction.window_hours = 9_999_999_999_999_999;
        config.prediction.search_step_minutes = i64::MAX;
        config.prediction.sample_minutes = i64::MIN;
        assert_eq!(config.prediction.window(), None);
        let settings = config.prediction.settings();
        assert_eq!(settings.search_step, Duration::MAX);
        assert_eq!(settings.sample_interval, Duration::MIN);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.station.id, "8418150");
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[station]\nid = 42").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.station.id, "8418150");
    }

    #[test]
    fn test_load_custom_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[station]
id = "9414290"
stations_file = "/srv/tides/stations.json"

[prediction]
window_hours = 24
sample_minutes = 5
search_step_minutes = 6
"#
        )
        .unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.station.id, "9414290");
        assert_eq!(config.prediction.window_hours, 24);
        assert_eq!(config.prediction.settings().search_step, Duration::minutes(6));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tide-config.toml");
        let mut config = Config::default();
        config.station.id = "8443970".to_string();
        config.prediction.window_hours = 36;
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path);
        assert_eq!(reloaded.station.id, "8443970");
        assert_eq!(reloaded.prediction.window_hours, 36);
    }
}
