use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3/MinIO bucket used for uploaded recipe images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: Option<StorageConfig>,
    pub host: String,
    pub port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "recipeshare"),
            audience: env_or("JWT_AUDIENCE", "recipeshare-users"),
            ttl_minutes: env_parsed("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parsed("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        // Object storage is opt-in; without it embedded images stay inline.
        let storage = match std::env::var("STORAGE_ENDPOINT") {
            Ok(endpoint) => Some(StorageConfig {
                endpoint,
                bucket: env_or("STORAGE_BUCKET", "recipeshare"),
                access_key: std::env::var("STORAGE_ACCESS_KEY")
                    .context("STORAGE_ACCESS_KEY must be set with STORAGE_ENDPOINT")?,
                secret_key: std::env::var("STORAGE_SECRET_KEY")
                    .context("STORAGE_SECRET_KEY must be set with STORAGE_ENDPOINT")?,
                region: env_or("STORAGE_REGION", "us-east-1"),
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url: env_or("DATABASE_URL", "sqlite://recipeshare.db?mode=rwc"),
            jwt,
            storage,
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parsed("APP_PORT", 3001),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

/// Settings for the HTTP client SDK.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let state_dir = match std::env::var("RECIPESHARE_STATE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_local_dir()
                .context("cannot determine local data directory")?
                .join("recipeshare"),
        };
        Ok(Self {
            base_url: env_or("API_BASE_URL", "http://localhost:3001"),
            state_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "s".into(),
                issuer: "i".into(),
                audience: "a".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            storage: None,
            host: host.into(),
            port,
        }
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let addr = config("127.0.0.1", 3001).bind_addr().unwrap();
        assert_eq!(addr.port(), 3001);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn bind_addr_rejects_garbage_host() {
        assert!(config("not a host", 80).bind_addr().is_err());
    }
}
