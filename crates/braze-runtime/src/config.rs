//! Configuration loading.
//!
//! Sources are layered with figment, lowest to highest priority:
//!
//! 1. Built-in defaults
//! 2. `braze.toml` in the working directory (or an explicit file)
//! 3. Environment variables, `BRAZE_` prefix with `__` as separator
//!    (`BRAZE_BRIDGE__PORT=9000` → `bridge.port = 9000`)
//!
//! # Example
//!
//! ```toml
//! [bridge]
//! host = "0.0.0.0"
//! port = 6700
//! path = "/"
//! access_token = "s3cret"
//!
//! [sync]
//! enabled = true
//! port = 6701
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::path::Path;

use figment::Figment;
use figment::providers::{Data, Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use braze_bridge::{BridgeConfig, SyncGatewayConfig};

use crate::error::{ConfigError, ConfigResult};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "braze.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrazeConfig {
    /// WebSocket bridge settings.
    #[serde(default)]
    pub bridge: BridgeSection,

    /// Synchronous gateway settings.
    #[serde(default)]
    pub sync: SyncSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// WebSocket bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_bridge_port")]
    pub port: u16,

    /// URL path subscribers connect to.
    #[serde(default = "default_path")]
    pub path: String,

    /// Pre-shared handshake secret. Unset or empty disables authentication.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_bridge_port(),
            path: default_path(),
            access_token: None,
        }
    }
}

impl BridgeSection {
    /// Converts to the bridge crate's config type.
    pub fn to_bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            host: self.host.clone(),
            port: self.port,
            path: self.path.clone(),
            access_token: self.access_token.clone().filter(|t| !t.is_empty()),
        }
    }
}

/// Synchronous gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    /// Whether the gateway runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_sync_port")]
    pub port: u16,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_sync_port(),
        }
    }
}

impl SyncSection {
    /// Converts to the bridge crate's config type.
    pub fn to_gateway_config(&self) -> SyncGatewayConfig {
        SyncGatewayConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Base level directive (trace, debug, info, warn, error), overridden by
    /// `RUST_LOG` when set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output.
    #[default]
    Compact,
    /// Default formatter output.
    Full,
    /// Multi-line human-readable output.
    Pretty,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bridge_port() -> u16 {
    6700
}

fn default_path() -> String {
    "/".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_sync_port() -> u16 {
    6701
}

fn default_level() -> String {
    "info".to_string()
}

/// Loads configuration from `braze.toml` (if present) and the environment.
pub fn load() -> ConfigResult<BrazeConfig> {
    let config = figment(Toml::file(CONFIG_FILE)).extract()?;
    debug!("configuration loaded");
    Ok(config)
}

/// Loads configuration from a specific file and the environment.
///
/// Unlike [`load`], the file must exist.
pub fn load_from<P: AsRef<Path>>(path: P) -> ConfigResult<BrazeConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    let config = figment(Toml::file(path)).extract()?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn figment(file: Data<Toml>) -> Figment {
    Figment::from(Serialized::defaults(BrazeConfig::default()))
        .merge(file)
        .merge(Env::prefixed("BRAZE_").split("__"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = BrazeConfig::default();
        assert_eq!(config.bridge.port, 6700);
        assert_eq!(config.bridge.path, "/");
        assert!(config.bridge.access_token.is_none());
        assert!(config.sync.enabled);
        assert_eq!(config.sync.port, 6701);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn empty_token_disables_authentication() {
        let section = BridgeSection {
            access_token: Some(String::new()),
            ..BridgeSection::default()
        };
        assert!(section.to_bridge_config().access_token.is_none());
    }

    #[test]
    fn file_and_env_layer_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                [bridge]
                port = 9000
                access_token = "s3cret"

                [logging]
                format = "pretty"
                "#,
            )?;
            jail.set_env("BRAZE_SYNC__ENABLED", "false");
            jail.set_env("BRAZE_BRIDGE__HOST", "0.0.0.0");

            let config = load().expect("config loads");
            assert_eq!(config.bridge.host, "0.0.0.0");
            assert_eq!(config.bridge.port, 9000);
            assert_eq!(config.bridge.access_token.as_deref(), Some("s3cret"));
            assert!(!config.sync.enabled);
            assert_eq!(config.logging.format, LogFormat::Pretty);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_from("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
