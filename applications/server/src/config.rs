/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_database")]
    pub database: DatabaseSettings,

    #[serde(default = "default_log")]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// How long in-flight requests get to finish, and pools get to close, on shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseSettings {
    /// Database the reader queries; opened read-only
    #[serde(default = "default_database_url")]
    pub reader_url: String,

    /// Primary database; owns the schema
    #[serde(default = "default_database_url")]
    pub writer_url: String,

    /// Per pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl ServerSettings {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `config.toml` is read if present.
    /// Environment variables prefixed with `ISENG_` override both, using `__`
    /// between section and key (`ISENG_SERVER__PORT=9090`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("ISENG")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.reader_url.trim().is_empty() {
            return Err(ServerError::Config(
                "database.reader_url is required (set ISENG_DATABASE__READER_URL)".to_string(),
            ));
        }

        if self.database.writer_url.trim().is_empty() {
            return Err(ServerError::Config(
                "database.writer_url is required (set ISENG_DATABASE__WRITER_URL)".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ServerError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if self.server.shutdown_timeout_secs == 0 {
            return Err(ServerError::Config(
                "server.shutdown_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
        shutdown_timeout_secs: default_shutdown_timeout_secs(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

fn default_database() -> DatabaseSettings {
    DatabaseSettings {
        reader_url: default_database_url(),
        writer_url: default_database_url(),
        max_connections: default_max_connections(),
        run_migrations: default_run_migrations(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/iseng.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_run_migrations() -> bool {
    true
}

fn default_log() -> LogSettings {
    LogSettings {
        filter: default_log_filter(),
    }
}

fn default_log_filter() -> String {
    "iseng_server=info,iseng_core=info,iseng_storage=info,tower_http=info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            database: default_database(),
            log: default_log(),
        }
    }
}
