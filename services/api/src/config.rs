//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use documind_core::prompt::DEFAULT_SYSTEM_INSTRUCTION;
use documind_core::quota::{QuotaPolicy, DEFAULT_DAILY_LIMIT, DEFAULT_WINDOW_HOURS};
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_COMPLETION_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How session tokens from the identity provider are verified.
#[derive(Clone, Debug)]
pub enum IdentityKey {
    /// PEM-encoded RSA public key (RS256).
    RsaPem(String),
    /// Shared secret (HS256).
    Secret(String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub redis_url: Option<String>,
    pub identity_key: IdentityKey,
    pub identity_issuer: Option<String>,
    pub llm_api_base: String,
    pub llm_api_key: String,
    pub completion_model: String,
    pub system_instruction: String,
    pub max_upload_bytes: usize,
    pub quota: QuotaPolicy,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server, Database and Counter Settings ---
        let bind_address = parse_or("BIND_ADDRESS", "0.0.0.0:3000".parse::<SocketAddr>())?;
        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", Ok(5u32))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let redis_url = optional("REDIS_URL");

        // --- Identity Provider ---
        let identity_key = match (
            optional("IDENTITY_JWT_PUBLIC_KEY"),
            optional("IDENTITY_JWT_SECRET"),
        ) {
            (Some(pem), _) => IdentityKey::RsaPem(pem.replace("\\n", "\n")),
            (None, Some(secret)) => IdentityKey::Secret(secret),
            (None, None) => {
                return Err(ConfigError::MissingVar(
                    "IDENTITY_JWT_PUBLIC_KEY or IDENTITY_JWT_SECRET".to_string(),
                ))
            }
        };
        let identity_issuer = optional("IDENTITY_ISSUER");

        // --- Generation Endpoint ---
        let llm_api_base =
            optional("LLM_API_BASE").unwrap_or_else(|| DEFAULT_LLM_API_BASE.to_string());
        let llm_api_key = optional("GEMINI_API_KEY")
            .or_else(|| optional("OPENAI_API_KEY"))
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
        let completion_model =
            optional("COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string());
        let system_instruction = optional("SYSTEM_INSTRUCTION")
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string());

        // --- Limits ---
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", Ok(DEFAULT_MAX_UPLOAD_BYTES))?;
        let daily_limit = parse_or("DAILY_GENERATION_LIMIT", Ok(DEFAULT_DAILY_LIMIT))?;
        let window_hours = parse_or("USAGE_WINDOW_HOURS", Ok(DEFAULT_WINDOW_HOURS))?;
        if window_hours <= 0 {
            return Err(ConfigError::InvalidValue(
                "USAGE_WINDOW_HOURS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let quota = QuotaPolicy::new(daily_limit, chrono::Duration::hours(window_hours));

        let cors_origin =
            optional("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            redis_url,
            identity_key,
            identity_issuer,
            llm_api_base,
            llm_api_key,
            completion_model,
            system_instruction,
            max_upload_bytes,
            quota,
            cors_origin,
        })
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

/// Parses `name` if set, otherwise falls back to `default`.
fn parse_or<T>(name: &str, default: Result<T, T::Err>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = match optional(name) {
        Some(raw) => raw.trim().parse::<T>(),
        None => default,
    };
    parsed.map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
