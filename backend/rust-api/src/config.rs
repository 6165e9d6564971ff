use serde::Deserialize;
use std::{env, str::FromStr};

const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = config::ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(config::ConfigError::Message(format!(
                "unknown quiz storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub bind_addr: String,
    pub storage: StorageBackend,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    /// `user:password` expected on `/metrics`. Unset refuses every scrape.
    pub metrics_auth: Option<String>,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Self::from_settings(&settings, &app_env)
    }

    fn from_settings(settings: &config::Config, app_env: &str) -> Result<Self, config::ConfigError> {
        let storage = match setting(settings, "storage.backend", "QUIZ_STORAGE") {
            Some(value) => value.parse()?,
            None => StorageBackend::Mongo,
        };

        let mongo_uri = match setting(settings, "database.mongo_uri", "MONGO_URI") {
            Some(uri) => uri,
            None if storage == StorageBackend::Mongo && app_env == "prod" => {
                return Err(config::ConfigError::Message(
                    "MONGO_URI must be set in production".to_string(),
                ));
            }
            None => {
                if storage == StorageBackend::Mongo {
                    eprintln!("WARNING: MONGO_URI not set, using {}", DEFAULT_MONGO_URI);
                }
                DEFAULT_MONGO_URI.to_string()
            }
        };

        let mongo_database = setting(settings, "database.mongo_database", "MONGO_DATABASE")
            .unwrap_or_else(|| "quizzes".to_string());

        let bind_addr = setting(settings, "server.bind_addr", "BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:4040".to_string());

        let cors_origins = setting(settings, "server.cors_origins", "CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let metrics_auth = setting(settings, "metrics.auth", "METRICS_AUTH");

        let otlp_endpoint = setting(
            settings,
            "telemetry.otlp_endpoint",
            "OTEL_EXPORTER_OTLP_ENDPOINT",
        );

        Ok(Config {
            mongo_uri,
            mongo_database,
            bind_addr,
            storage,
            cors_origins,
            metrics_auth,
            otlp_endpoint,
        })
    }

    /// Configuration for running without MongoDB (tests, local demos).
    pub fn in_memory() -> Self {
        Config {
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            mongo_database: "quizzes".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            storage: StorageBackend::Memory,
            cors_origins: Vec::new(),
            metrics_auth: None,
            otlp_endpoint: None,
        }
    }
}

/// Config file / `APP__*` value first, then the plain environment variable.
/// Blank values count as unset.
fn setting(settings: &config::Config, key: &str, env_var: &str) -> Option<String> {
    settings
        .get_string(key)
        .or_else(|_| env::var(env_var))
        .ok()
        .filter(|value| !value.trim().is_empty())
}
