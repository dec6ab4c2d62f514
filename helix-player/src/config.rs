//! helix-player bootstrap configuration
//!
//! Loaded from TOML. Resolution order: `--config` argument,
//! `HELIX_PLAYER_CONFIG`, `<config dir>/helix/player.toml`,
//! `/etc/helix/player.toml`, then built-in defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use helix_common::config::{load_toml, resolve_config_path};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "HELIX_PLAYER_CONFIG";

/// Config file name looked up in the user and system config directories
pub const CONFIG_FILE_NAME: &str = "player.toml";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5750;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Buffer depth of the event bus and the sink command channel
    pub event_bus_capacity: usize,
    pub logging: LoggingConfig,
    pub sinks: SinkConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: Option<String>,
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
}

/// Mimetypes the browser sinks accept until the page reports its own
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub audio: Vec<String>,
    pub video: Vec<String>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            event_bus_capacity: 1000,
            logging: LoggingConfig::default(),
            sinks: SinkConfig::default(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|m| m.to_string()).collect() };
        Self {
            audio: owned(&[
                "audio/mpeg",
                "audio/flac",
                "audio/ogg",
                "audio/wav",
                "audio/aac",
                "audio/mp4",
            ]),
            video: owned(&["video/mp4", "video/webm", "video/ogg"]),
        }
    }
}

impl TomlConfig {
    /// Resolve and load the config file, falling back to defaults when
    /// no file is found
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config = match resolve_config_path(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME) {
            Some(path) => {
                let config: TomlConfig = load_toml(&path)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => {
                info!("No configuration file found, using defaults");
                TomlConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be non-zero".to_string()));
        }
        self.bind_ip()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.bind_ip()?, self.port))
    }

    fn bind_ip(&self) -> Result<IpAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind_addr '{}': {}", self.bind_addr, e)))
    }
}
