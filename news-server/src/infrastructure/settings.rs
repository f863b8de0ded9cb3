use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct Settings {
    pub http_addr: String,
    pub storage: StorageSettings,
    pub log_level: String,
    pub http_request_body_limit_bytes: usize,
    pub http_read_header_timeout_secs: u64,
    pub http_idle_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    Postgres {
        conn_string: String,
        max_connections: u32,
    },
    Mongo {
        conn_string: String,
        database: String,
        collection: String,
    },
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Mongo,
    Memory,
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "memdb" => Ok(Self::Memory),
            other => Err(anyhow!(
                "unknown STORAGE_BACKEND '{other}', expecting postgres, mongo or memory"
            )),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_addr = get_required(&lookup, "SERVER_LISTEN_SOCKET")
            .map(normalize_listen_addr)
            .context("SERVER_LISTEN_SOCKET is required")?;

        let kind: StorageKind = lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .parse()?;

        let storage = match kind {
            StorageKind::Postgres => StorageSettings::Postgres {
                conn_string: get_required(&lookup, "POSTGRES_CONN_STRING")
                    .context("POSTGRES_CONN_STRING is required for the postgres backend")?,
                max_connections: parse_positive(&lookup, "POSTGRES_MAX_CONNECTIONS", 10)?,
            },
            StorageKind::Mongo => StorageSettings::Mongo {
                conn_string: get_required(&lookup, "MONGO_CONN_STRING")
                    .context("MONGO_CONN_STRING is required for the mongo backend")?,
                database: lookup("MONGO_DATABASE").unwrap_or_else(|| "news".to_string()),
                collection: lookup("MONGO_COLLECTION").unwrap_or_else(|| "posts".to_string()),
            },
            StorageKind::Memory => StorageSettings::Memory,
        };

        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        let http_request_body_limit_bytes =
            parse_positive(&lookup, "HTTP_REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let http_read_header_timeout_secs =
            parse_positive(&lookup, "HTTP_READ_HEADER_TIMEOUT_SECS", 60)?;
        let http_idle_timeout_secs = parse_positive(&lookup, "HTTP_IDLE_TIMEOUT_SECS", 180)?;

        Ok(Self {
            http_addr,
            storage,
            log_level,
            http_request_body_limit_bytes,
            http_read_header_timeout_secs,
            http_idle_timeout_secs,
        })
    }
}

/// `:8080` means every interface, as it does for most HTTP servers.
fn normalize_listen_addr(addr: String) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr
    }
}

fn get_required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

fn parse_positive<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialEq + Default + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
