use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub workflow: WorkflowPolicyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size: usize,
    pub timeout_seconds: u64,
}

/// Tunable workflow policy. The return-friction thresholds are deliberately
/// configuration, not invariants: the minimum lengths came from the
/// original intake UI and may change with product guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPolicyConfig {
    /// Minimum character length for the reason on any transition request.
    pub min_reason_len: usize,
    /// Minimum character length for observations on backward transitions.
    pub min_observations_len: usize,
    /// Default window for the recent-returns (thrashing) query.
    pub recent_returns_window_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Start with default values
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with EXPROPIA prefix
            .add_source(Environment::with_prefix("EXPROPIA").separator("__"));

        config.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8085,
                max_request_size: 1024 * 1024, // 1MB
                timeout_seconds: 30,
            },
            workflow: WorkflowPolicyConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
                file_path: None,
            },
        }
    }
}

impl Default for WorkflowPolicyConfig {
    fn default() -> Self {
        Self {
            min_reason_len: 10,
            min_observations_len: 20,
            recent_returns_window_days: 30,
        }
    }
}
