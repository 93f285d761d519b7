//! Configuration for the relay.
//!
//! Loads from a TOML file and falls back to runtime defaults. The defaults
//! mirror the constants the relay was tuned with: a 500 ms poll, a tail
//! window of 10 messages, and a 5000-entry seen-set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// URL of the chat conversation to bridge.
    #[serde(default = "default_chat_url")]
    pub url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: default_chat_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between detection cycles in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// How many trailing messages each cycle samples.
    #[serde(default = "default_tail_window")]
    pub tail_window: usize,

    /// Upper bound on remembered message identities.
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            tail_window: default_tail_window(),
            seen_capacity: default_seen_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Operator line that requests termination instead of being sent.
    #[serde(default = "default_exit_sentinel")]
    pub exit_sentinel: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            exit_sentinel: default_exit_sentinel(),
        }
    }
}

// Default value functions for serde
fn default_chat_url() -> String {
    "https://web.telegram.org/k/".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_tail_window() -> usize {
    10
}

fn default_seen_capacity() -> usize {
    5000
}

fn default_exit_sentinel() -> String {
    "/exit".to_string()
}

impl RelayConfig {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chat-relay")
            .join("config.toml")
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: PathBuf) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        std::fs::write(&path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.timing.poll_interval_ms, 500);
        assert_eq!(config.detection.tail_window, 10);
        assert_eq!(config.detection.seen_capacity, 5000);
        assert_eq!(config.console.exit_sentinel, "/exit");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[chat]
url = "https://chat.example.com/room/7"

[timing]
poll_interval_ms = 250

[detection]
tail_window = 25
"#;

        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.url, "https://chat.example.com/room/7");
        assert_eq!(config.timing.poll_interval_ms, 250);
        assert_eq!(config.detection.tail_window, 25);
        // Unspecified sections keep their defaults.
        assert_eq!(config.detection.seen_capacity, 5000);
        assert_eq!(config.console.exit_sentinel, "/exit");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = RelayConfig::default();
        config.timing.poll_interval_ms = 125;
        config.save_to_path(path.clone()).unwrap();

        let reloaded = RelayConfig::load_from_path(path);
        assert_eq!(reloaded.timing.poll_interval_ms, 125);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = RelayConfig::load_from_path(PathBuf::from("/nonexistent/config.toml"));
        assert_eq!(config.detection.tail_window, 10);
    }
}
