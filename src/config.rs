use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::game::{default_words, AssignmentKind};

/// Server configuration persisted as TOML.
///
/// Fields:
/// - bind: address the HTTP/websocket listener binds to
/// - reconnect_grace_secs: how long a dropped player keeps their seat
/// - room_idle_secs: how long an empty room is kept before it is removed
/// - sweep_interval_secs: cadence of the idle-room sweeper
/// - assignment: word assignment policy (`uniform` or `split`)
/// - words: word pool used when a round is started without one
/// - static_dir: optional directory with a Display Client bundle served at `/`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub bind: SocketAddr,
    pub reconnect_grace_secs: u64,
    pub room_idle_secs: u64,
    pub sweep_interval_secs: u64,
    pub assignment: AssignmentKind,
    pub words: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            reconnect_grace_secs: 30,
            room_idle_secs: 60,
            sweep_interval_secs: 5,
            assignment: AssignmentKind::Uniform,
            words: default_words(),
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`. If the file does not exist, create it
    /// with defaults and return the default config.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            let cfg: Config = toml::from_str(&s)
                .with_context(|| format!("parsing TOML config '{}'", path.display()))?;
            Ok(cfg)
        } else {
            let cfg = Config::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Save the current config back to `path` (overwrites).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("creating config directory '{}'", parent.display())
                })?;
            }
        }
        let toml_text =
            toml::to_string_pretty(&self).with_context(|| "serializing config to TOML")?;
        fs::write(path, toml_text)
            .with_context(|| format!("writing config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_secs(self.reconnect_grace_secs)
    }

    pub fn room_idle(&self) -> Duration {
        Duration::from_secs(self.room_idle_secs)
    }

    /// Never zero; `tokio::time::interval` panics on a zero period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "castlefall-config-{}-{}.toml",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = temp_path("create");
        let _ = fs::remove_file(&path);
        let cfg = Config::load_or_create(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
        let reread = Config::load_or_create(&path).unwrap();
        assert_eq!(reread, cfg);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "reconnect_grace_secs = 5\nassignment = \"split\"\n").unwrap();
        let cfg = Config::load_or_create(&path).unwrap();
        assert_eq!(cfg.reconnect_grace(), Duration::from_secs(5));
        assert_eq!(cfg.assignment, AssignmentKind::Split);
        assert_eq!(cfg.words.len(), 18);
        assert_eq!(cfg.room_idle_secs, 60);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn garbage_is_an_error() {
        let path = temp_path("garbage");
        fs::write(&path, "bind = [[[").unwrap();
        assert!(Config::load_or_create(&path).is_err());
        let _ = fs::remove_file(&path);
    }
}
