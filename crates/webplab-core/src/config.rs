//! Server configuration
//!
//! Process-wide settings read once at startup. Batch limits live in [`crate::limits`]
//! because they are re-resolved for every request.

use std::env;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HOST: &str = "0.0.0.0";
const HTTP_BODY_LIMIT_MB: usize = 512;
const HTTP_CONCURRENCY_LIMIT: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Upper bound for a whole multipart request body
    pub http_body_limit_bytes: usize,
    /// Concurrent in-flight HTTP requests
    pub http_concurrency_limit: usize,
    /// `json` for structured log lines, anything else for human-readable output
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            http_body_limit_bytes: HTTP_BODY_LIMIT_MB * 1024 * 1024,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let body_limit_mb = env::var("HTTP_BODY_LIMIT_MB")
            .unwrap_or_else(|_| HTTP_BODY_LIMIT_MB.to_string())
            .parse::<usize>()
            .unwrap_or(HTTP_BODY_LIMIT_MB);

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            http_body_limit_bytes: body_limit_mb.saturating_mul(1024 * 1024),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        if self.http_body_limit_bytes == 0 {
            return Err(anyhow::anyhow!("HTTP_BODY_LIMIT_MB must be greater than 0"));
        }
        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be greater than 0"));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
