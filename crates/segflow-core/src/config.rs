use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for segflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub slurm: SlurmConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            slurm: SlurmConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self, crate::Error> {
        use crate::Error;

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self, crate::Error> {
        // Try to load from SEGFLOW_CONFIG env var first
        if let Ok(config_path) = std::env::var("SEGFLOW_CONFIG") {
            return Self::load(&config_path);
        }

        let default_paths = ["./config/default.toml", "/etc/segflow/config.toml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::load(path);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env_parse("SERVER_PORT") {
            self.server.port = v;
        }
        if let Ok(v) = std::env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = env_parse("DB_PORT") {
            self.database.port = v;
        }
        if let Ok(v) = std::env::var("DB_NAME") {
            self.database.database = v;
        }
        if let Ok(v) = std::env::var("DB_USER") {
            self.database.username = v;
        }
        if let Ok(v) = std::env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = env_parse("DB_MAX_CONNECTIONS") {
            self.database.max_connections = v;
        }
        if let Some(v) = env_parse("DB_STALE_TIMEOUT") {
            self.database.stale_timeout_secs = v;
        }
        if let Some(v) = env_parse("DB_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs = v;
        }
        if let Some(v) = env_parse("SLURM_POLL_INTERVAL") {
            self.slurm.poll_interval_secs = v;
        }
        if let Some(v) = env_parse("SLURM_COMMAND_TIMEOUT") {
            self.slurm.command_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("MODELS_BASE_PATH") {
            self.storage.models_base_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TEMPLATES_DIR") {
            self.storage.templates_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            self.logging.format = v;
        }
        if let Ok(v) = std::env::var("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        use crate::Error;

        if self.server.port == 0 {
            return Err(Error::Config("Invalid server port".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "Database pool size must be > 0".to_string(),
            ));
        }

        if self.database.database.is_empty() || self.database.username.is_empty() {
            return Err(Error::Config(
                "Database name and user are required".to_string(),
            ));
        }

        if self.slurm.poll_interval_secs == 0 {
            return Err(Error::Config(
                "Poll interval must be > 0 seconds".to_string(),
            ));
        }

        match self.logging.format.as_str() {
            "standard" | "json" => {}
            other => {
                return Err(Error::Config(format!(
                    "Unknown log format '{}' (expected 'standard' or 'json')",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Fail fast when any bundled job-script template is missing.
    pub fn validate_templates(&self) -> Result<(), crate::Error> {
        for path in [
            self.storage.training_template(),
            self.storage.prediction_template(),
            self.storage.evaluation_template(),
        ] {
            if !path.is_file() {
                return Err(crate::Error::Config(format!(
                    "Template file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_graceful_shutdown")]
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            graceful_shutdown_timeout_secs: default_graceful_shutdown(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_graceful_shutdown() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub database: String,

    #[serde(default = "default_db_user")]
    pub username: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Idle connections older than this are recycled.
    #[serde(default = "default_stale_timeout")]
    pub stale_timeout_secs: u64,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            database: default_db_name(),
            username: default_db_user(),
            password: default_db_password(),
            max_connections: default_max_connections(),
            stale_timeout_secs: default_stale_timeout(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "segflow_db".to_string()
}

fn default_db_user() -> String {
    "segflow_user".to_string()
}

fn default_db_password() -> String {
    "segflow_password".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_stale_timeout() -> u64 {
    300
}

fn default_connection_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlurmConfig {
    /// Reconciliation tick interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Bounded timeout for sbatch/scontrol invocations.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_submit_command")]
    pub submit_command: String,

    #[serde(default = "default_query_command")]
    pub query_command: String,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            command_timeout_secs: default_command_timeout(),
            submit_command: default_submit_command(),
            query_command: default_query_command(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    30
}

fn default_submit_command() -> String {
    "sbatch".to_string()
}

fn default_query_command() -> String {
    "scontrol".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory under which model outputs are written.
    #[serde(default = "default_models_base_path")]
    pub models_base_path: PathBuf,

    /// Directory holding the bundled sbatch templates.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            models_base_path: default_models_base_path(),
            templates_dir: default_templates_dir(),
        }
    }
}

impl StorageConfig {
    pub fn training_template(&self) -> PathBuf {
        self.templates_dir.join("train.sbatch")
    }

    pub fn prediction_template(&self) -> PathBuf {
        self.templates_dir.join("predict.sbatch")
    }

    pub fn evaluation_template(&self) -> PathBuf {
        self.templates_dir.join("evaluate.sbatch")
    }
}

fn default_models_base_path() -> PathBuf {
    PathBuf::from("/data/models")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("./templates")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "standard" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "standard".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.stale_timeout_secs, 300);
        assert_eq!(config.slurm.poll_interval_secs, 30);
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let mut config = Config::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_template_paths_derive_from_dir() {
        let storage = StorageConfig {
            templates_dir: PathBuf::from("/opt/segflow/templates"),
            ..StorageConfig::default()
        };
        assert_eq!(
            storage.training_template(),
            PathBuf::from("/opt/segflow/templates/train.sbatch")
        );
        assert_eq!(
            storage.evaluation_template(),
            PathBuf::from("/opt/segflow/templates/evaluate.sbatch")
        );
    }

    #[test]
    fn test_missing_templates_fail_validation() {
        let mut config = Config::default();
        config.storage.templates_dir = PathBuf::from("/nonexistent/templates");
        assert!(config.validate_templates().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let toml_str = r#"
            [server]
            port = 9090

            [database]
            host = "db.internal"
            max_connections = 8

            [slurm]
            poll_interval_secs = 5
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.slurm.poll_interval_secs, 5);
        // Untouched sections fall back to defaults
        assert_eq!(config.logging.level, "info");
    }
}
