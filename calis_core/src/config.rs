//! Configuration file support for Calis.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/calis/config.toml`.

use crate::cue::CueSettings;
use crate::{Error, Result, SkillLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub cues: CueConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Session clock configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of one countdown tick
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

/// Spoken countdown configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CueConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_rate")]
    pub rate: f32,

    /// External text-to-speech program; cues are printed when unset
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments for `command`, with `{text}`, `{locale}` and `{rate}` placeholders
    #[serde(default = "default_cue_args")]
    pub args: Vec<String>,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: default_locale(),
            rate: default_rate(),
            command: None,
            args: default_cue_args(),
        }
    }
}

impl CueConfig {
    pub fn settings(&self) -> CueSettings {
        CueSettings {
            locale: self.locale.clone(),
            rate: self.rate,
        }
    }
}

/// Defaults for `calis recommend`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default)]
    pub level: SkillLevel,

    #[serde(default = "default_minutes")]
    pub minutes: u32,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            level: SkillLevel::default(),
            minutes: default_minutes(),
        }
    }
}

/// Built-in administrator account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_email")]
    pub email: String,

    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            password: default_admin_password(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("calis")
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    CueSettings::default().locale
}

fn default_rate() -> f32 {
    CueSettings::default().rate
}

fn default_cue_args() -> Vec<String> {
    vec!["{text}".into()]
}

fn default_minutes() -> u32 {
    20
}

fn default_admin_email() -> String {
    "admin@admin.com".into()
}

fn default_admin_password() -> String {
    "admin123".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("calis").join("config.toml")
    }

    /// Reject values that would make the planner misbehave
    pub fn validate(&self) -> Result<()> {
        if !(1..=60).contains(&self.recommendation.minutes) {
            return Err(Error::Config(format!(
                "recommendation.minutes must be between 1 and 60, got {}",
                self.recommendation.minutes
            )));
        }
        if self.cues.rate <= 0.0 {
            return Err(Error::Config(format!(
                "cues.rate must be positive, got {}",
                self.cues.rate
            )));
        }
        if self.admin.email.trim().is_empty() {
            return Err(Error::Config("admin.email must not be empty".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.tick_millis, 1000);
        assert_eq!(config.cues.locale, "ko-KR");
        assert_eq!(config.recommendation.level, SkillLevel::Intermediate);
        assert_eq!(config.recommendation.minutes, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.cues.command = Some("spd-say".into());
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.cues.command.as_deref(), Some("spd-say"));
        assert_eq!(parsed.admin.email, config.admin.email);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[recommendation]
level = "advanced"

[session]
tick_millis = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.recommendation.level, SkillLevel::Advanced);
        assert_eq!(config.recommendation.minutes, 20);
        assert_eq!(config.session.tick_millis, 10);
        assert!(config.cues.enabled);
    }

    #[test]
    fn test_invalid_minutes_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[recommendation]\nminutes = 90\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
