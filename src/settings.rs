//! Gateway settings: bind address and engine command, loaded from an
//! optional `gateway.toml` overlaid with `OCR_GATEWAY_*` environment
//! variables. Fixed request policy lives in [`crate::policy`], not here.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub engine: EngineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Command used to start the engine process.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            engine: EngineSettings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            command: "paddleocr-json".to_string(),
            args: vec![],
        }
    }
}

impl Settings {
    /// Load `gateway.toml` (if present) and environment overrides, e.g.
    /// `OCR_GATEWAY_PORT=9000` or `OCR_GATEWAY_ENGINE__COMMAND=...`.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("gateway").required(false))
            .add_source(Environment::with_prefix("OCR_GATEWAY").separator("__"))
            .build()?
            .try_deserialize()
    }
}
