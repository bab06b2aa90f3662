use std::env;
use std::fmt;
use std::time::Duration;

use auth::WorkFactor;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use tower_http::cors::AllowHeaders;
use tower_http::cors::AllowMethods;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::cors::ExposeHeaders;

use crate::domain::identity::models::Role;
use crate::domain::identity::service::AuthPolicy;
use crate::inbound::http::router::HttpOptions;

/// Environment variables must start with `IDENTITY_`, e.g. `IDENTITY_TOKEN__SECRET`.
pub const ENV_PREFIX: &str = "IDENTITY";

/// Longest accepted access token lifetime (one year).
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 366;

const WILDCARD: &str = "*";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub token: TokenConfig,
    pub hashing: HashingConfig,
    pub timeouts: TimeoutConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    /// Grace period for in-flight requests once shutdown starts
    pub shutdown_deadline_secs: u64,
}

impl ServerConfig {
    pub fn shutdown_deadline(&self) -> Duration {
        Duration::from_secs(self.shutdown_deadline_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiration_hours: i64,
    pub default_roles: Vec<Role>,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_hours", &self.expiration_hours)
            .field("default_roles", &self.default_roles)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&HashingConfig> for WorkFactor {
    fn from(config: &HashingConfig) -> Self {
        WorkFactor {
            memory_kib: config.memory_kib,
            iterations: config.iterations,
            parallelism: config.parallelism,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub store_ms: u64,
    pub hashing_ms: u64,
}

/// Cross-origin policy. `"*"` in a list allows anything.
#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    /// Build the CORS layer.
    ///
    /// # Errors
    /// * `Message` - An entry does not parse, or credentials are combined with a wildcard
    pub fn layer(&self) -> Result<CorsLayer, ConfigError> {
        let lists = [
            &self.allowed_origins,
            &self.allowed_methods,
            &self.allowed_headers,
            &self.exposed_headers,
        ];
        if self.allow_credentials && lists.iter().any(|list| is_wildcard(list)) {
            return Err(ConfigError::Message(
                "cors.allow_credentials cannot be combined with \"*\"".to_string(),
            ));
        }

        let origins = if is_wildcard(&self.allowed_origins) {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parse_all(&self.allowed_origins, "cors.allowed_origins", |v| {
                HeaderValue::from_str(v).ok()
            })?)
        };

        let methods = if is_wildcard(&self.allowed_methods) {
            AllowMethods::any()
        } else {
            AllowMethods::list(parse_all(&self.allowed_methods, "cors.allowed_methods", |v| {
                Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
            })?)
        };

        let headers = if is_wildcard(&self.allowed_headers) {
            AllowHeaders::any()
        } else {
            AllowHeaders::list(parse_all(&self.allowed_headers, "cors.allowed_headers", |v| {
                HeaderName::from_bytes(v.as_bytes()).ok()
            })?)
        };

        let exposed = if is_wildcard(&self.exposed_headers) {
            ExposeHeaders::any()
        } else {
            ExposeHeaders::list(parse_all(&self.exposed_headers, "cors.exposed_headers", |v| {
                HeaderName::from_bytes(v.as_bytes()).ok()
            })?)
        };

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .expose_headers(exposed)
            .allow_credentials(self.allow_credentials))
    }
}

fn is_wildcard(list: &[String]) -> bool {
    list.iter().any(|entry| entry.trim() == WILDCARD)
}

fn parse_all<T>(
    list: &[String],
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    list.iter()
        .map(|entry| {
            parse(entry.trim())
                .ok_or_else(|| ConfigError::Message(format!("{} has invalid entry {:?}", key, entry)))
        })
        .collect()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (IDENTITY_TOKEN__SECRET, IDENTITY_DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// List settings (roles, CORS entries) take comma separated values from
    /// the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: IDENTITY_TOKEN__SECRET=... overrides token.secret
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("token.default_roles")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("cors.allowed_methods")
                    .with_list_parse_key("cors.allowed_headers")
                    .with_list_parse_key("cors.exposed_headers"),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.secret.is_empty() {
            return Err(ConfigError::Message(
                "token.secret must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_EXPIRATION_HOURS).contains(&self.token.expiration_hours) {
            return Err(ConfigError::Message(format!(
                "token.expiration_hours must be between 1 and {}",
                MAX_EXPIRATION_HOURS
            )));
        }

        self.cors.layer()?;

        Ok(())
    }

    /// Router transport settings derived from server and CORS sections.
    pub fn http_options(&self) -> Result<HttpOptions, ConfigError> {
        Ok(HttpOptions {
            cors: self.cors.layer()?,
            read_timeout: Duration::from_secs(self.server.read_timeout_secs),
            write_timeout: Duration::from_secs(self.server.write_timeout_secs),
        })
    }

    /// Request policy derived from token and timeout settings.
    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            default_roles: self.token.default_roles.clone(),
            token_lifetime: chrono::Duration::hours(self.token.expiration_hours),
            store_timeout: Duration::from_millis(self.timeouts.store_ms),
            hashing_timeout: Duration::from_millis(self.timeouts.hashing_ms),
        }
    }
}
