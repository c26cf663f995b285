//! HTTP server and event store configuration parsing from environment variables.

use anyhow::{Result, bail};
use std::env;
use std::str::FromStr;

/// Event store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Sqlite,
    Memory,
}

impl FromStr for StorageMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageMode::Sqlite),
            "memory" => Ok(StorageMode::Memory),
            _ => bail!("Invalid MODE: {}. Must be 'sqlite' or 'memory'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    pub database_url: String,
    pub mode: StorageMode,
}

impl ServerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "sqlite".to_string());

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .unwrap_or(8000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://logs/predictions.db".to_string()),
            mode: StorageMode::from_str(&mode_str)?,
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
