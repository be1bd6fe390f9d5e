use async_trait::async_trait;
use seithi_core::{ArticleStorage, Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStorage + Sized {
    type Config: Send + Sync;

    fn get_error_message() -> &'static str;
    async fn connect(config: &Self::Config) -> Result<Self>;
}

/// Connection settings for the production Postgres store.
#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5433,
            user: "admin".to_string(),
            password: "123456".to_string(),
            database: "seithi".to_string(),
            max_connections: 10,
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("seithi.db"),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Postgres(PostgresConfig),
    Sqlite(SqliteConfig),
    Memory,
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Sqlite(_) => "sqlite",
            Self::Memory => "memory",
        }
    }
}

/// Open the configured backend and hand it out as a shared trait object.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match config {
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres(cfg) => Arc::new(open::<PostgresStorage>(cfg).await?),
        #[cfg(feature = "sqlite")]
        StorageConfig::Sqlite(cfg) => Arc::new(open::<SQLiteStorage>(cfg).await?),
        StorageConfig::Memory => Arc::new(open::<InMemoryStorage>(&()).await?),
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::Config(format!(
                "storage backend '{}' is not enabled in this build",
                other.kind()
            )))
        }
    };
    info!("💾 Storage backend ready (using {})", config.kind());
    Ok(storage)
}

async fn open<T: StorageBackend>(config: &T::Config) -> Result<T> {
    T::connect(config).await.map_err(|e| {
        error!("{}: {}", T::get_error_message(), e);
        e
    })
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, PostgresConfig, SqliteConfig, StorageBackend, StorageConfig};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_debug_hides_password() {
        let rendered = format!("{:?}", PostgresConfig::default());
        assert!(!rendered.contains("123456"));
        assert!(rendered.contains("localhost"));
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage(&StorageConfig::Memory).await.unwrap();
        let stats = storage.get_stats().await.unwrap();
        assert_eq!(stats.total_articles, 0);
    }
}
