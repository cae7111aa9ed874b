use notifier_core::{
    config::{DatabaseConfig, PollerConfig},
    traits::{ArchiveWriter, BatchReader},
    NotifierError, NotifierResult,
};
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::postgres::PostgresLaunchRepository;
use super::sqlite::SqliteLaunchRepository;

/// Database type detection
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            DatabaseType::PostgreSQL
        } else {
            DatabaseType::SQLite
        }
    }
}

/// Database connection pool enum
pub enum DatabasePool {
    PostgreSQL(sqlx::PgPool),
    SQLite(sqlx::SqlitePool),
}

impl DatabasePool {
    /// Create pool from config with automatic type detection
    pub async fn connect(config: &DatabaseConfig) -> NotifierResult<Self> {
        let acquire_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let idle_timeout = Duration::from_secs(config.idle_timeout_seconds);

        match DatabaseType::from_url(&config.url) {
            DatabaseType::PostgreSQL => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .max_lifetime(Duration::from_secs(1800)) // 30分钟默认生命周期
                    .connect(&config.url)
                    .await?;
                Ok(DatabasePool::PostgreSQL(pool))
            }
            DatabaseType::SQLite => {
                let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
                // 每个内存库连接都是独立的数据库
                let max_connections = if config.url.contains(":memory:") {
                    1
                } else {
                    config.max_connections
                };
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(config.min_connections.min(max_connections))
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>)
                    .connect_with(options)
                    .await?;
                Ok(DatabasePool::SQLite(pool))
            }
        }
    }

    pub fn database_type(&self) -> DatabaseType {
        match self {
            DatabasePool::PostgreSQL(_) => DatabaseType::PostgreSQL,
            DatabasePool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    pub async fn health_check(&self) -> NotifierResult<()> {
        match self {
            DatabasePool::PostgreSQL(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::SQLite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::PostgreSQL(pool) => pool.close().await,
            DatabasePool::SQLite(pool) => pool.close().await,
        }
    }
}

/// Unified database manager
pub struct DatabaseManager {
    pool: DatabasePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> NotifierResult<Self> {
        let pool = DatabasePool::connect(config).await?;
        info!("数据库连接池已创建 (类型: {:?})", pool.database_type());
        Ok(Self { pool })
    }

    pub fn database_type(&self) -> DatabaseType {
        self.pool.database_type()
    }

    pub async fn health_check(&self) -> NotifierResult<()> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await
    }

    /// 创建暂存表与归档表（已存在时跳过）
    pub async fn ensure_schema(&self) -> NotifierResult<()> {
        let result = match &self.pool {
            DatabasePool::PostgreSQL(pool) => {
                PostgresLaunchRepository::new(pool.clone())
                    .ensure_schema()
                    .await
            }
            DatabasePool::SQLite(pool) => {
                SqliteLaunchRepository::new(pool.clone())
                    .ensure_schema()
                    .await
            }
        };
        result.map_err(|e| NotifierError::DatabaseOperation(format!("初始化表结构失败: {e}")))
    }

    /// Factory method for the batch reader
    pub fn batch_reader(&self, poller: &PollerConfig) -> Arc<dyn BatchReader> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(
                PostgresLaunchRepository::new(pool.clone())
                    .with_storage_timeout(poller.storage_timeout())
                    .with_recent_window(poller.recent_window_minutes),
            ),
            DatabasePool::SQLite(pool) => Arc::new(
                SqliteLaunchRepository::new(pool.clone())
                    .with_storage_timeout(poller.storage_timeout())
                    .with_recent_window(poller.recent_window_minutes),
            ),
        }
    }

    /// Factory method for the archive writer
    pub fn archive_writer(&self, poller: &PollerConfig) -> Arc<dyn ArchiveWriter> {
        match &self.pool {
            DatabasePool::PostgreSQL(pool) => Arc::new(
                PostgresLaunchRepository::new(pool.clone())
                    .with_storage_timeout(poller.storage_timeout()),
            ),
            DatabasePool::SQLite(pool) => Arc::new(
                SqliteLaunchRepository::new(pool.clone())
                    .with_storage_timeout(poller.storage_timeout()),
            ),
        }
    }
}
