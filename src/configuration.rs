use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Origin echoed in `Access-Control-Allow-Origin`
    pub allowed_origin: String,
    #[serde(default)]
    pub repository: RepositoryKind,
}

/// Which `StoreRepository` implementation the binary wires in
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub max_connections: u32,
    /// Upper bound for a single repository round trip
    pub timeout_seconds: u64,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level URL, used to create databases
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

/// JWT authentication settings
#[derive(Deserialize, Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    /// Issuer and audience of every token
    pub domain: String,
    pub access_token_expiry: i64,   // seconds (900 = 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (86400 = 24 hours)
    /// A refresh token is only exchanged once its remaining lifetime drops to this
    pub refresh_window: i64,
    #[serde(default)]
    pub refresh_delivery: RefreshDelivery,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.domain.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.domain".to_string()));
        }
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.refresh_window < 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.refresh_window must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Channel that carries the refresh token back to the client
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefreshDelivery {
    /// JSON body only, for API clients
    #[default]
    Body,
    /// `__Host-refresh_token` cookie only, for browsers
    Cookie,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let settings = settings
        .try_deserialize::<Settings>()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;
    settings.jwt.validate()?;
    Ok(settings)
}
