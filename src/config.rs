use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;
use serde::Deserialize;

pub const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the `access_token` cookie handed out on signin.
#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub ttl_minutes: i64,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub client_origin: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "countries-auth".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "countries-users".into()),
            ttl_minutes: minutes_from_env("JWT_TTL_MINUTES", 60),
        };
        anyhow::ensure!(!jwt.secret.is_empty(), "JWT_SECRET must not be empty");

        let production = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        let cookie = CookieConfig {
            ttl_minutes: minutes_from_env("COOKIE_TTL_MINUTES", 60),
            secure: production,
        };

        let client_origin =
            std::env::var("CLIENT_ORIGIN").unwrap_or_else(|_| DEFAULT_CLIENT_ORIGIN.into());
        HeaderValue::from_str(&client_origin)
            .map_err(|_| anyhow::anyhow!("CLIENT_ORIGIN is not a valid header value"))?;

        let bind_addr = bind_addr(
            &std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            &std::env::var("APP_PORT").unwrap_or_else(|_| "3000".into()),
        )?;

        Ok(Self {
            database_url,
            jwt,
            cookie,
            client_origin,
            bind_addr,
        })
    }
}

fn minutes_from_env(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn bind_addr(host: &str, port: &str) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid APP_HOST/APP_PORT: {host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_parses_host_and_port() {
        let addr = bind_addr("127.0.0.1", "8080").unwrap();
        assert_eq!(addr.port(), 8080);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn bind_addr_rejects_bad_port() {
        assert!(bind_addr("0.0.0.0", "not-a-port").is_err());
        assert!(bind_addr("0.0.0.0", "70000").is_err());
    }
}
