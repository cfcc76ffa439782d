use crate::global;
use crate::session::{Genre, Meter, MrType, DEFAULT_MAX_DURATION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub take: TakeDefaults,
    pub audio: AudioConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the beat-transcription backend.
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Defaults applied to a take when the API or CLI request leaves a field out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TakeDefaults {
    pub tempo_bpm: u32,
    pub meter: Meter,
    pub genre: Option<Genre>,
    pub slow_mode: bool,
    pub mr_type: MrType,
    /// Forced-stop bound in seconds.
    pub max_duration_seconds: u64,
}

impl Default for TakeDefaults {
    fn default() -> Self {
        Self {
            tempo_bpm: 120,
            meter: Meter::default(),
            genre: None,
            slow_mode: false,
            mr_type: MrType::default(),
            max_duration_seconds: DEFAULT_MAX_DURATION.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Loopback port for the control API.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 3842 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.take.tempo_bpm, 120);
        assert_eq!(parsed.take.meter, Meter::FourFour);
        assert_eq!(parsed.take.max_duration_seconds, 60);
        assert_eq!(parsed.audio.sample_rate, 16_000);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [take]
            tempo_bpm = 90
            meter = "3/4"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.take.tempo_bpm, 90);
        assert_eq!(parsed.take.meter, Meter::ThreeFour);
        assert_eq!(parsed.api.port, 3842);
        assert_eq!(parsed.backend.base_url, "http://127.0.0.1:8000");
    }
}
