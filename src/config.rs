use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image shown for services without an `imageUrl`
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str =
    "https://placehold.co/100x100/1e293b/d1d5db?text=?";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Service store configuration
    pub store: StoreConfig,
    /// Dashboard client configuration
    pub dashboard: DashboardConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Per-IP rate limit applied to `POST /api/services`
    pub add_rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Seconds between token refills
    pub per_second: u64,
    /// Requests allowed before throttling kicks in
    pub burst_size: u32,
}

/// Service store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON file holding the service collection
    pub path: PathBuf,
    /// Create the file with an empty collection on startup if it is missing
    pub create_if_missing: bool,
}

/// Dashboard client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the homedash API (e.g., http://localhost:3001)
    pub backend_url: String,
    /// Reachability probe timeout in seconds
    pub probe_timeout_seconds: u64,
    /// Timeout for calls to the homedash API in seconds
    pub request_timeout_seconds: u64,
    /// Image used when a service has no image of its own
    pub placeholder_image_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            add_rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 10,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("services.json"),
            create_if_missing: true,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3001".to_string(),
            probe_timeout_seconds: 5,
            request_timeout_seconds: 10,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file layered over the built-in defaults
    ///
    /// When `path` is `None`, `config.yaml` in the working directory is used
    /// if present. Environment overrides:
    /// - `HOMEDASH__<SECTION>__<KEY>` - any key, e.g. `HOMEDASH__SERVER__PORT`
    /// - `HOMEDASH_BACKEND_URL` - dashboard backend URL
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - an explicitly given file is not found
    /// - Configuration is invalid (malformed YAML, wrong types)
    /// - URL or timeout validation fails
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new("config.yaml")).required(false),
        };

        let config = config::Config::builder()
            // Start with default values
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(file.format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("HOMEDASH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option(
                "dashboard.backend_url",
                std::env::var("HOMEDASH_BACKEND_URL").ok(),
            )?
            .build()?;

        let cfg: Config = config.try_deserialize()?;

        cfg.validate()?;

        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        validate_url(&self.dashboard.backend_url, "Dashboard backend")
            .map_err(config::ConfigError::Message)?;

        if self.dashboard.probe_timeout_seconds == 0 {
            return Err(config::ConfigError::Message(
                "dashboard.probe_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.dashboard.request_timeout_seconds == 0 {
            return Err(config::ConfigError::Message(
                "dashboard.request_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.server.add_rate_limit.per_second == 0
            || self.server.add_rate_limit.burst_size == 0
        {
            return Err(config::ConfigError::Message(
                "server.add_rate_limit values must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Check that `url` is an absolute http(s) URL with a host
pub fn validate_url(url: &str, context: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err(format!("{} URL cannot be empty", context));
    }

    match url.parse::<url::Url>() {
        Ok(parsed_url) => {
            if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
                return Err(format!(
                    "{} URL must use http:// or https:// scheme",
                    context
                ));
            }

            if parsed_url.host_str().is_none() {
                return Err(format!("{} URL must have a valid host", context));
            }

            Ok(())
        }
        Err(e) => Err(format!("{} URL is invalid: {}", context, e)),
    }
}
