//! Emulator settings and preset files
//!
//! A preset file is TOML:
//!
//! ```toml
//! name = "Shooter"
//!
//! [emulator]
//! scroll_release_ms = 20
//!
//! [mouse]
//! mouse_controls = 1
//! sensitivity = 20
//!
//! [[bindings]]
//! code = "Space"
//! button = 0
//!
//! [[bindings]]
//! code = "KeyW"
//! axis = 1
//! direction = "negative"
//! ```

use crate::mapping::{ConfigError, GamepadConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CONFIG_DIR: &str = ".padbridge";
pub const PRESET_FILE: &str = "preset.toml";

/// Timing and identity settings for the emulator
///
/// The timing defaults are empirically tuned values; all of them can be overridden
/// per preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorSettings {
    /// Time after the last wheel event before the scroll "button" is released
    pub scroll_release_ms: u64,

    /// Interval over which pointer deltas are coalesced before updating the stick
    ///
    /// 40ms keeps bursts together while staying within a 60fps input budget.
    pub motion_flush_ms: u64,

    /// Time without motion after which the stick is recentered
    pub motion_idle_ms: u64,

    /// `id` string reported by the virtual gamepad
    pub gamepad_id: String,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            scroll_release_ms: 20,
            motion_flush_ms: 40,
            motion_idle_ms: 50,
            gamepad_id: "padbridge virtual controller (STANDARD GAMEPAD)".to_string(),
        }
    }
}

impl EmulatorSettings {
    pub fn scroll_release(&self) -> Duration {
        Duration::from_millis(self.scroll_release_ms)
    }

    pub fn motion_flush(&self) -> Duration {
        Duration::from_millis(self.motion_flush_ms)
    }

    pub fn motion_idle(&self) -> Duration {
        Duration::from_millis(self.motion_idle_ms)
    }
}

/// Named gamepad configuration plus optional emulator overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,

    #[serde(default)]
    pub emulator: EmulatorSettings,

    #[serde(flatten)]
    pub config: GamepadConfig,
}

impl Preset {
    pub fn default_preset() -> Self {
        Self {
            name: "Default".to_string(),
            emulator: EmulatorSettings::default(),
            config: GamepadConfig::default_config(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let preset: Preset = toml::from_str(content)?;
        preset.config.validate()?;
        Ok(preset)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading preset from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let preset = Self::from_toml(&content)?;
        info!(
            "Loaded preset '{}' with {} bindings",
            preset.name,
            preset.config.key_config.len()
        );
        Ok(preset)
    }

    /// Loads `path`, or the preset in the config directory, or the built-in default
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        let default_path = default_preset_path();
        if tokio::fs::try_exists(&default_path).await? {
            Self::load(&default_path).await
        } else {
            warn!(
                "No preset at {}, using built-in default",
                default_path.display()
            );
            Ok(Self::default_preset())
        }
    }
}

pub fn default_preset_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(PRESET_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{Binding, Stick};

    #[test]
    fn preset_overrides_only_given_timings() {
        let preset = Preset::from_toml(
            r#"
            name = "Racing"

            [emulator]
            scroll_release_ms = 35

            [mouse]
            mouse_controls = 0

            [[bindings]]
            code = "KeyW"
            button = 7
            "#,
        )
        .unwrap();

        assert_eq!(preset.name, "Racing");
        assert_eq!(preset.emulator.scroll_release(), Duration::from_millis(35));
        assert_eq!(preset.emulator.motion_flush(), Duration::from_millis(40));
        assert_eq!(preset.emulator.motion_idle(), Duration::from_millis(50));
        assert_eq!(preset.config.mouse_config.mouse_controls, Some(Stick::Left));
        assert_eq!(
            preset.config.key_config.get("KeyW"),
            Some(&Binding::Button { button: 7 })
        );
    }

    #[test]
    fn rejects_non_positive_sensitivity() {
        let result = Preset::from_toml(
            r#"
            name = "Broken"

            [mouse]
            mouse_controls = 1
            sensitivity = -4
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidSensitivity(_))));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let result = Preset::load(Path::new("/nonexistent/padbridge/preset.toml")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
