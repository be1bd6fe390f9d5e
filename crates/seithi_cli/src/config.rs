use clap::{Args, Parser, Subcommand, ValueEnum};
use seithi_storage::{PostgresConfig, SqliteConfig, StorageConfig};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve scored news articles over HTTP", long_about = None)]
pub struct Cli {
    /// Where articles and feedback live
    #[arg(long, value_enum, env = "SEITHI_STORAGE", default_value_t = StorageKind::Postgres)]
    pub storage: StorageKind,

    #[command(flatten)]
    pub postgres: PostgresArgs,

    /// Database file for the sqlite backend
    #[arg(long, env = "SEITHI_SQLITE_PATH", default_value = "seithi.db")]
    pub sqlite_path: PathBuf,

    /// Upper bound on pooled store connections
    #[arg(long, env = "SEITHI_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// HTTP listening port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    Postgres,
    Sqlite,
    Memory,
}

#[derive(Args, Debug)]
pub struct PostgresArgs {
    #[arg(id = "postgres_host", long = "postgres-host", env = "POSTGRES_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(id = "postgres_port", long = "postgres-port", env = "POSTGRES_PORT", default_value_t = 5433)]
    pub port: u16,

    #[arg(id = "postgres_user", long = "postgres-user", env = "POSTGRES_USER", default_value = "admin")]
    pub user: String,

    #[arg(
        id = "postgres_password",
        long = "postgres-password",
        env = "POSTGRES_PASSWORD",
        default_value = "123456",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub password: String,

    #[arg(id = "postgres_db", long = "postgres-db", env = "POSTGRES_DB", default_value = "seithi")]
    pub database: String,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Connect to the store, print summary statistics and exit
    Check,
}

impl Cli {
    pub fn storage_config(&self) -> StorageConfig {
        match self.storage {
            StorageKind::Postgres => StorageConfig::Postgres(PostgresConfig {
                host: self.postgres.host.clone(),
                port: self.postgres.port,
                user: self.postgres.user.clone(),
                password: self.postgres.password.clone(),
                database: self.postgres.database.clone(),
                max_connections: self.max_connections,
            }),
            StorageKind::Sqlite => StorageConfig::Sqlite(SqliteConfig {
                path: self.sqlite_path.clone(),
                max_connections: self.max_connections,
            }),
            StorageKind::Memory => StorageConfig::Memory,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn selected_command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}
