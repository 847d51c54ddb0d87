//! Configuration management for Tidyhome Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Base URL for links embedded in emails (e.g., "https://app.tidyhome.example")
    pub app_base_url: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Outbound SMTP configuration (absent = email disabled)
    pub smtp: Option<SmtpConfig>,
    /// Push gateway configuration (absent = push disabled)
    pub push: Option<PushConfig>,
    /// Guest-not-left sweep configuration
    pub guest_not_left: GuestNotLeftConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: Option<String>,
}

/// Push delivery goes through a JSON gateway (the mobile apps register
/// device tokens with it; this service only addresses users).
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub gateway_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GuestNotLeftConfig {
    /// Interval between expiry sweeps, in seconds
    pub sweep_interval_secs: u64,
}

impl Default for GuestNotLeftConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "https://tidyhome.example".to_string()),
                access_token_ttl_secs: env::var("JWT_ACCESS_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()
                    .unwrap_or(86400),
            },
            smtp: match env::var("SMTP_HOST") {
                Ok(host) => Some(SmtpConfig {
                    host,
                    port: env::var("SMTP_PORT")
                        .unwrap_or_else(|_| "587".to_string())
                        .parse()
                        .unwrap_or(587),
                    username: env::var("SMTP_USERNAME").ok(),
                    password: env::var("SMTP_PASSWORD").ok(),
                    use_tls: env::var("SMTP_USE_TLS")
                        .map(|s| s.to_lowercase() != "false")
                        .unwrap_or(true),
                    from_email: env::var("SMTP_FROM_EMAIL")
                        .unwrap_or_else(|_| "no-reply@tidyhome.example".to_string()),
                    from_name: env::var("SMTP_FROM_NAME").ok(),
                }),
                Err(_) => None,
            },
            push: match env::var("PUSH_GATEWAY_URL") {
                Ok(gateway_url) => Some(PushConfig {
                    gateway_url,
                    api_key: env::var("PUSH_GATEWAY_API_KEY").ok(),
                }),
                Err(_) => None,
            },
            guest_not_left: GuestNotLeftConfig {
                sweep_interval_secs: env::var("GUEST_NOT_LEFT_SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_addr() {
        let config = Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 9000,
            app_base_url: "http://localhost:3000".to_string(),
            database: DatabaseConfig {
                url: "mysql://localhost/tidyhome".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            jwt: JwtConfig {
                secret: "secret".to_string(),
                issuer: "test".to_string(),
                access_token_ttl_secs: 3600,
            },
            smtp: None,
            push: None,
            guest_not_left: GuestNotLeftConfig::default(),
        };

        assert_eq!(config.http_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_guest_not_left_default_interval() {
        assert_eq!(GuestNotLeftConfig::default().sweep_interval_secs, 300);
    }
}
