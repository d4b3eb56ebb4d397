//! Server configuration
//!
//! Values are layered, later sources winning:
//! 1. Defaults set in [`Config::load`]
//! 2. `config/<environment>.toml`
//! 3. `SARA__SECTION__KEY` environment variables, e.g. `SARA__JWT__SECRET`

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable selecting the config file
const ENVIRONMENT_VAR: &str = "SARA_ENVIRONMENT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// `development` runs migrations at startup and logs human-readable text
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Superuser created at startup when the user table is empty
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret
    pub secret: String,
    /// Lifetime of issued access tokens, in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub email: String,
    pub fullname: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".into());

        let config: Config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 86400)?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("SARA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::Message("jwt.access_token_expiry must be positive".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        Ok(())
    }
}
