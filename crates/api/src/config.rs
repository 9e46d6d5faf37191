//! Service configuration

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use fallback::OverridePolicy;
use inference_engine::BundlePaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "PUMP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/service.toml";

/// Location of one artifact bundle
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundleLocation {
    pub dir: PathBuf,
    #[serde(default)]
    pub prefix: String,
}

impl BundleLocation {
    pub fn paths(&self, name: &str) -> BundlePaths {
        BundlePaths::new(name, self.dir.clone(), self.prefix.clone())
    }
}

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Where annotated files are written
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Results retained before the oldest is evicted
    pub max_results: usize,
    pub override_policy: OverridePolicy,
    pub log_json: bool,
    pub production_bundle: BundleLocation,
    pub simulator_bundle: BundleLocation,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            output_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            max_results: 32,
            override_policy: OverridePolicy::PerBatch,
            log_json: false,
            production_bundle: BundleLocation {
                dir: PathBuf::from("models"),
                prefix: String::new(),
            },
            simulator_bundle: BundleLocation {
                dir: PathBuf::from("models"),
                prefix: "sim_".to_string(),
            },
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from the config file (if present) and `PUMP__*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(Path::new(&path))
    }

    /// Load from `path` (optional) layered under the environment
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("PUMP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
