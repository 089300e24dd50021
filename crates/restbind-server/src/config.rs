//! Server configuration

use restbind::binder::DEFAULT_BODY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (HTTP)
    pub port: u16,

    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,

    /// Log output format: "text" or "json"
    pub log_format: String,

    /// Largest request body buffered by the binder
    pub body_limit_bytes: usize,

    /// Collection path the notes resource is mounted at
    pub resource_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            resource_path: "/notes".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config file
    ///
    /// A missing or unusable `config/server.*` falls back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        match Self::sources(Path::new("config/server")).build() {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e)),
            Err(e) => {
                tracing::info!("No usable config found ({}), using default configuration", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from `path` (any format the `config` crate knows,
    /// extension optional) layered under `RESTBIND_*` environment variables.
    ///
    /// A missing file yields defaults; a file that fails to parse is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let cfg = Self::sources(path)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        cfg.try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))
    }

    fn sources(path: &Path) -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix("RESTBIND"))
    }

    /// Whether logs are emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Item path derived from the collection path, e.g. `/notes/:id`
    pub fn item_path(&self) -> String {
        format!("{}/:id", self.resource_path.trim_end_matches('/'))
    }
}
