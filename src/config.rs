use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Planboard
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanboardConfig {
    /// Observability settings
    pub observability: ObservabilityConfig,
    /// Board core tuning
    pub board: BoardTuning,
    /// Snapshot feed settings
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Enable tracing output
    pub tracing_enabled: bool,
    /// Log level for the EnvFilter default directive
    pub log_level: String,
    /// Emit logs as JSON instead of human-readable lines
    pub json_output: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardTuning {
    /// Capacity of the change-notification channel
    pub event_capacity: usize,
    /// Maximum retained transition-history entries per board
    pub history_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Buffered board commands in the runtime loop
    pub command_capacity: usize,
}

impl Default for PlanboardConfig {
    fn default() -> Self {
        Self {
            observability: ObservabilityConfig {
                tracing_enabled: true,
                log_level: "info".to_string(),
                json_output: false,
            },
            board: BoardTuning::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
        }
    }
}

impl Default for BoardTuning {
    fn default() -> Self {
        Self {
            event_capacity: 64,
            history_limit: 256,
        }
    }
}

impl PlanboardConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (planboard.toml)
    /// 3. Environment variables (prefixed with PLANBOARD_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("planboard.toml").exists() {
            builder = builder.add_source(File::with_name("planboard"));
        }

        builder = builder.add_source(
            Environment::with_prefix("PLANBOARD")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<PlanboardConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = PlanboardConfig::load_env_file();
        PlanboardConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static PlanboardConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
