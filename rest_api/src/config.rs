// rest_api/src/config.rs

use anyhow::{Context, Result, anyhow};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use models::medical::{Ambulance, Hospital};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
pub const DEFAULT_PREDICTOR_TIMEOUT_SECS: u64 = 10;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_predictor_timeout_secs() -> u64 {
    DEFAULT_PREDICTOR_TIMEOUT_SECS
}

/// Service configuration, read from an optional file layered under the
/// process environment (`DATABASE_URL`, `JWT_SECRET`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub database_key: Option<String>,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default)]
    pub frontend_url: String,
    #[serde(default)]
    pub ml_resource_endpoint: String,
    #[serde(default)]
    pub ml_anomaly_endpoint: String,
    #[serde(default)]
    pub ml_risk_endpoint: String,
    #[serde(default)]
    pub ml_key: String,
    #[serde(default = "default_predictor_timeout_secs")]
    pub predictor_timeout_secs: u64,
    #[serde(default)]
    pub comms_connection_string: String,
    // Reserved for the device feed.
    #[serde(default)]
    pub iot_connection_string: String,
    #[serde(default)]
    pub responders_file: Option<PathBuf>,
}

impl AppConfig {
    /// Fails on the first required key that is missing or blank.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("DATABASE_URL", &self.database_url),
            ("JWT_SECRET", &self.jwt_secret),
            ("FRONTEND_URL", &self.frontend_url),
            ("ML_KEY", &self.ml_key),
            ("COMMS_CONNECTION_STRING", &self.comms_connection_string),
            ("IOT_CONNECTION_STRING", &self.iot_connection_string),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(anyhow!("Missing required configuration key: {}", name));
            }
        }
        Ok(())
    }
}

/// Loads the configuration from `config_file` (if given) and the environment.
/// The caller is expected to have loaded `.env` already.
pub fn load_app_config(config_file: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(Environment::default().try_parsing(true));
    build_app_config(builder)
}

fn build_app_config(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
    let config: AppConfig = builder
        .build()
        .context("Failed to assemble configuration sources")?
        .try_deserialize()
        .context("Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}

/// Hospitals and ambulances known to the service, loaded from YAML:
///
/// ```yaml
/// hospitals:
///   - id: h-1
///     name: City Hospital
/// ambulances:
///   - id: a-1
///     name: Unit 1
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct RespondersFile {
    #[serde(default)]
    pub hospitals: Vec<Hospital>,
    #[serde(default)]
    pub ambulances: Vec<Ambulance>,
}

pub fn parse_responders(content: &str) -> Result<RespondersFile> {
    serde_yaml2::from_str(content).map_err(|e| anyhow!("Failed to parse responders file: {}", e))
}

pub fn load_responders(path: &Path) -> Result<RespondersFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read responders file {}: {}", path.display(), e))?;
    parse_responders(&content).with_context(|| format!("In {}", path.display()))
}
