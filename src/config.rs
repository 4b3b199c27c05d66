//! Application-level configuration loading, including the avatar catalog and
//! the default settings applied to freshly created rooms.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "LYRICS_SYNC_CONFIG_PATH";
/// Number of avatars shipped in the built-in catalog.
const DEFAULT_AVATAR_COUNT: usize = 15;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    avatars: Vec<String>,
    default_max_rounds: u32,
    default_max_players: u32,
    default_collections: Vec<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        avatars = config.avatars.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Pick a random avatar id that is not already listed in `used`.
    ///
    /// Once every catalog entry is taken we fall back to random reuse so
    /// callers always receive a value.
    pub fn random_unused_avatar(&self, used: &[&str]) -> String {
        let mut rng = rand::rng();
        let available: Vec<&String> = self
            .avatars
            .iter()
            .filter(|candidate| !used.contains(&candidate.as_str()))
            .collect();

        match available.choose(&mut rng) {
            Some(avatar) => (*avatar).clone(),
            None => self
                .avatars
                .choose(&mut rng)
                .cloned()
                .unwrap_or_else(|| "av_1".into()),
        }
    }

    /// Maximum rounds applied to a freshly created room.
    pub fn default_max_rounds(&self) -> u32 {
        self.default_max_rounds
    }

    /// Player cap applied to a freshly created room.
    pub fn default_max_players(&self) -> u32 {
        self.default_max_players
    }

    /// Song collections pre-selected in a freshly created room.
    pub fn default_collections(&self) -> &[String] {
        &self.default_collections
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            avatars: default_avatars(),
            default_max_rounds: 10,
            default_max_players: 8,
            default_collections: vec!["kpop-classics".into()],
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default = "default_avatars")]
    avatars: Vec<String>,
    #[serde(default = "default_max_rounds")]
    default_max_rounds: u32,
    #[serde(default = "default_max_players")]
    default_max_players: u32,
    #[serde(default)]
    default_collections: Vec<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            avatars: if value.avatars.is_empty() {
                defaults.avatars
            } else {
                value.avatars
            },
            default_max_rounds: value.default_max_rounds.max(1),
            default_max_players: value.default_max_players.max(1),
            default_collections: if value.default_collections.is_empty() {
                defaults.default_collections
            } else {
                value.default_collections
            },
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in avatar catalog shipped with the binary.
fn default_avatars() -> Vec<String> {
    (1..=DEFAULT_AVATAR_COUNT)
        .map(|index| format!("av_{index}"))
        .collect()
}

fn default_max_rounds() -> u32 {
    10
}

fn default_max_players() -> u32 {
    8
}
