use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;
use crate::storage::{S3Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Option<Arc<dyn StorageClient>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .with_context(|| format!("parse DATABASE_URL {}", config.database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("open database")?;

        migrate(&db).await?;

        let storage = match &config.storage {
            Some(cfg) => {
                info!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "object storage enabled");
                Some(Arc::new(S3Storage::connect(cfg).await?) as Arc<dyn StorageClient>)
            }
            None => {
                info!("object storage disabled; images stay inline");
                None
            }
        };

        Ok(Self::from_parts(db, Arc::new(config), storage))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Option<Arc<dyn StorageClient>>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }

    /// Fresh in-memory database with migrations applied and no object storage.
    #[cfg(test)]
    pub async fn in_memory() -> anyhow::Result<Self> {
        use crate::config::JwtConfig;

        // Each connection to `sqlite::memory:` is its own database, so pin the pool to one.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        migrate(&db).await?;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            storage: None,
            host: "127.0.0.1".into(),
            port: 0,
        });

        Ok(Self::from_parts(db, config, None))
    }
}

async fn migrate(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}
