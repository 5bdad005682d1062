use serde::Deserialize;

use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// Directory holding the built single-page frontend, served when present
    pub static_dir: Option<String>,
    /// Frontend origin allowed to call the API with credentials (CORS)
    pub allowed_origin: Option<String>,
}

/// Deployment environment; production turns on `Secure` cookies
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub backend: StoreBackend,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token and password settings for the session core
#[derive(Deserialize, Clone, Debug)]
pub struct AuthSettings {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,           // seconds (600 = 10 minutes)
    pub refreshed_access_token_expiry: i64, // seconds, for tokens minted by /auth/refresh
    pub refresh_token_expiry: i64,          // seconds (604800 = 7 days)
    pub issuer: String,
    pub password_hash_cost: u32,
    /// Hand the rotated refresh token back as a cookie on refresh.
    /// Off by default: refresh only returns the new access token.
    pub reissue_refresh_cookie: bool,
    /// Derived from `application.environment`, not read from config
    #[serde(skip)]
    pub secure_cookies: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let auth = &self.auth;

        for (name, secret) in [
            ("auth.access_token_secret", &auth.access_token_secret),
            ("auth.refresh_token_secret", &auth.refresh_token_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be at least {} bytes",
                    name, MIN_SECRET_LENGTH
                )));
            }
        }

        if auth.access_token_secret == auth.refresh_token_secret {
            return Err(ConfigError::InvalidValue(
                "access and refresh token secrets must differ".to_string(),
            ));
        }

        for (name, expiry) in [
            ("auth.access_token_expiry", auth.access_token_expiry),
            (
                "auth.refreshed_access_token_expiry",
                auth.refreshed_access_token_expiry,
            ),
            ("auth.refresh_token_expiry", auth.refresh_token_expiry),
        ] {
            if expiry <= 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be positive",
                    name
                )));
            }
        }

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&auth.password_hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password_hash_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        if auth.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.issuer".to_string()));
        }

        if let Some(origin) = &self.application.allowed_origin {
            let has_scheme = origin.starts_with("http://") || origin.starts_with("https://");
            if !has_scheme || origin.ends_with('/') {
                return Err(ConfigError::InvalidValue(
                    "application.allowed_origin must look like https://host[:port]".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP_*` env vars.
///
/// Env vars use `__` between sections, e.g. `APP_AUTH__ACCESS_TOKEN_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let mut settings = settings.try_deserialize::<Settings>()?;
    settings.auth.secure_cookies = settings.application.environment.is_production();
    settings.validate()?;
    Ok(settings)
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

fn with_defaults(builder: Builder) -> Result<Builder, config::ConfigError> {
    builder
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("application.environment", "local")?
        .set_default("database.backend", "memory")?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "password")?
        .set_default("database.host", "127.0.0.1")?
        .set_default("database.port", 5432)?
        .set_default("database.database_name", "food_order")?
        .set_default("database.max_connections", 5)?
        .set_default("auth.access_token_expiry", 600)?
        .set_default("auth.refreshed_access_token_expiry", 120)?
        .set_default("auth.refresh_token_expiry", 604_800)?
        .set_default("auth.issuer", "food-order")?
        .set_default("auth.password_hash_cost", DEFAULT_BCRYPT_COST as i64)?
        .set_default("auth.reissue_refresh_cookie", false)
}
