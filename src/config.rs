/*
 * Responsibility
 * - Read the demo server settings from the environment (.env allowed)
 * - Validate them up front: a bad value fails start-up, never a request
 */
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::identity::DEFAULT_CLAIMS_KEY;
use crate::middleware::Exclusions;
use crate::services::verifier::Secret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub secret: Secret,
    pub state_key: String,
    pub cookie: Option<String>,
    pub audience: Vec<String>,
    pub issuer: Vec<String>,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
    pub passthrough: bool,
    pub debug: bool,

    pub exclusions: Exclusions,
    // None = in-process denylist
    pub valkey_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key -> value source (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset and blank are the same thing.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match var("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let secret = match (var("JWT_SECRET"), var("JWT_PUBLIC_KEY_PEM")) {
            (Some(_), Some(_)) => return Err(ConfigError::Invalid("JWT_SECRET")),
            (Some(shared), None) => Secret::shared(shared),
            (None, Some(pem)) => Secret::public_pem(pem.replace("\\n", "\n"))
                .map_err(|_| ConfigError::Invalid("JWT_PUBLIC_KEY_PEM"))?,
            (None, None) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let state_key = var("JWT_STATE_KEY").unwrap_or_else(|| DEFAULT_CLAIMS_KEY.to_string());
        let cookie = var("JWT_COOKIE");

        let audience = list(var("JWT_AUDIENCE"));
        let issuer = list(var("JWT_ISSUER"));

        let algorithms = list(var("JWT_ALGORITHMS"))
            .iter()
            .map(|name| Algorithm::from_str(name))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ConfigError::Invalid("JWT_ALGORITHMS"))?;

        let leeway_seconds = match var("JWT_LEEWAY_SECONDS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            None => 0,
        };

        let passthrough = flag(var("JWT_PASSTHROUGH"), "JWT_PASSTHROUGH")?;
        let debug = flag(var("JWT_DEBUG"), "JWT_DEBUG")?;

        let exclude_paths = match var("AUTH_EXCLUDE_PATHS") {
            Some(v) => list(Some(v)),
            None => vec!["/health".to_string()],
        };
        let exclusions = exclude_paths
            .iter()
            .try_fold(Exclusions::new(), |rules, path| rules.glob(path))
            .map_err(|_| ConfigError::Invalid("AUTH_EXCLUDE_PATHS"))?;

        let valkey_url = var("VALKEY_URL");

        Ok(Self {
            addr,
            app_env,
            secret,
            state_key,
            cookie,
            audience,
            issuer,
            algorithms,
            leeway_seconds,
            passthrough,
            debug,
            exclusions,
            valkey_url,
        })
    }
}

fn list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn flag(value: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(false),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}
