use crate::countries::{CountryTable, TableError};
use clap::Parser;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read country table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("country table {path}: {source}")]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

/// HTTP service for extracting contact records from calendar events
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// JSON file replacing the built-in country table
    #[arg(long, env = "COUNTRY_TABLE")]
    pub country_table: Option<PathBuf>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Loads the country table once at startup: the file at `path` if given,
/// the built-in table otherwise.
pub fn load_country_table(path: Option<&Path>) -> Result<CountryTable, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => return Ok(CountryTable::builtin()),
    };

    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CountryTable::from_json(&json).map_err(|source| ConfigError::Table {
        path: path.to_path_buf(),
        source,
    })
}
