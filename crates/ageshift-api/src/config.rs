//! Process settings and game data.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ageshift_audio::{CrossfadeConfig, StageTable};
use ageshift_core::error::DomainError;
use ageshift_core::profile::{AgeProfile, AgeSet};
use ageshift_haptics::HapticConfig;
use ageshift_input::{ActionMap, InputSwitchConfig};
use ageshift_transition::GateRule;
use serde::Deserialize;

use crate::error::AppError;

/// Settings read from `AGESHIFT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Bind host. Defaults to `0.0.0.0`.
    pub host: String,
    /// Bind port. Defaults to `3000`.
    pub port: u16,
    /// Path of the YAML game file. Required.
    pub game_config: PathBuf,
    /// Root directory for visual assets. Defaults to `assets`.
    pub assets_dir: PathBuf,
    /// Path of the progress file. Defaults to `saves/progress.json`.
    pub save_path: PathBuf,
    /// Coordinator tick interval in milliseconds. Defaults to `16`.
    pub tick_ms: u64,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the game file is not set or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns a variable's value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the game file is not set or a numeric
    /// variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let game_config = lookup("AGESHIFT_GAME_CONFIG").ok_or_else(|| {
            AppError::Config("AGESHIFT_GAME_CONFIG environment variable must be set".into())
        })?;
        let port = var("AGESHIFT_PORT", "3000")
            .parse()
            .map_err(|e| AppError::Config(format!("AGESHIFT_PORT must be a valid u16: {e}")))?;
        let tick_ms = var("AGESHIFT_TICK_MS", "16")
            .parse()
            .map_err(|e| AppError::Config(format!("AGESHIFT_TICK_MS must be a valid u64: {e}")))?;
        if tick_ms == 0 {
            return Err(AppError::Config("AGESHIFT_TICK_MS must be positive".into()));
        }

        Ok(Self {
            host: var("AGESHIFT_HOST", "0.0.0.0"),
            port,
            game_config: PathBuf::from(game_config),
            assets_dir: PathBuf::from(var("AGESHIFT_ASSETS_DIR", "assets")),
            save_path: PathBuf::from(var("AGESHIFT_SAVE_PATH", "saves/progress.json")),
            tick_ms,
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid host:port combination: {e}")))
    }

    /// The coordinator tick interval.
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Music settings and stage table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    /// Crossfade tuning.
    #[serde(flatten)]
    pub crossfade: CrossfadeConfig,
    /// Stages in lookup order.
    pub stages: StageTable,
}

/// Input switching settings and the action layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Group names, threshold and always-on actions.
    #[serde(flatten)]
    pub switch: InputSwitchConfig,
    /// Action groups and their actions. An empty layout means no action
    /// asset is installed.
    pub groups: BTreeMap<String, Vec<String>>,
}

impl InputSection {
    /// The action asset described by `groups`, if any.
    #[must_use]
    pub fn action_map(&self) -> Option<ActionMap> {
        (!self.groups.is_empty()).then(|| ActionMap::from_layout(&self.groups))
    }
}

/// Game data loaded from the YAML game file.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Ordered age profiles.
    pub ages: Vec<AgeProfile>,
    /// Age used when no progress was saved.
    #[serde(default)]
    pub initial_index: usize,
    /// Music.
    #[serde(default)]
    pub audio: AudioSection,
    /// Input switching.
    #[serde(default)]
    pub input: InputSection,
    /// Rumble.
    #[serde(default)]
    pub haptics: HapticConfig,
    /// Age-restricted scene content.
    #[serde(default)]
    pub scene_gates: Vec<GateRule>,
}

impl GameConfig {
    /// Parses a game file.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the YAML does not parse.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("invalid game config: {e}")))
    }

    /// Reads and parses the game file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, or
    /// `AppError::Domain` if it does not parse.
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(Self::from_yaml_str(&yaml)?)
    }

    /// Validates the age profiles into an `AgeSet`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any profile is invalid.
    pub fn age_set(&self) -> Result<AgeSet, DomainError> {
        AgeSet::new(self.ages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const GAME_YAML: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../config/game.yaml"
    ));

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_settings_apply_defaults() {
        // Arrange
        let env = lookup(&[("AGESHIFT_GAME_CONFIG", "game.yaml")]);

        // Act
        let settings = Settings::from_lookup(env).unwrap();

        // Assert
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.assets_dir, PathBuf::from("assets"));
        assert_eq!(settings.save_path, PathBuf::from("saves/progress.json"));
        assert_eq!(settings.tick(), Duration::from_millis(16));
        assert_eq!(settings.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_settings_require_game_config() {
        let result = Settings::from_lookup(lookup(&[]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_settings_reject_bad_port_and_zero_tick() {
        let bad_port = Settings::from_lookup(lookup(&[
            ("AGESHIFT_GAME_CONFIG", "game.yaml"),
            ("AGESHIFT_PORT", "http"),
        ]));
        let zero_tick = Settings::from_lookup(lookup(&[
            ("AGESHIFT_GAME_CONFIG", "game.yaml"),
            ("AGESHIFT_TICK_MS", "0"),
        ]));

        assert!(matches!(bad_port, Err(AppError::Config(_))));
        assert!(matches!(zero_tick, Err(AppError::Config(_))));
    }

    #[test]
    fn test_bundled_game_file_parses() {
        let game = GameConfig::from_yaml_str(GAME_YAML).unwrap();

        let ages = game.age_set().unwrap();
        assert_eq!(ages.len(), 3);
        assert_eq!(game.audio.crossfade.channel, "music");
        assert_eq!(game.audio.stages.select(13).unwrap().id, "teen");
        assert_eq!(game.input.switch.child_threshold, 11);
        assert!(game.input.action_map().unwrap().has_group("child"));
        assert!(game.haptics.enabled);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let yaml = r"
ages:
  - display_name: Only
    age_years: 30
    movement: { max_speed: 5.0, acceleration: 20.0, deceleration: 20.0, jump_force: 8.0 }
    visual_key: sprites/only
";

        let game = GameConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(game.initial_index, 0);
        assert!(game.audio.stages.is_empty());
        assert!(game.input.action_map().is_none());
        assert_eq!(game.haptics, HapticConfig::default());
        assert!(game.scene_gates.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_a_validation_error() {
        let result = GameConfig::from_yaml_str("ages: [");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
