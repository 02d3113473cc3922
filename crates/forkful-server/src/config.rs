use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};

/// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

const PLACEHOLDER_SECRETS: &[&str] = &["", "changeme", "change-me", "secret", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub reader_pool_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("FORKFUL_JWT_SECRET")
            .ok_or_else(|| anyhow!("FORKFUL_JWT_SECRET must be set"))?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.trim()) {
            bail!("FORKFUL_JWT_SECRET is a placeholder; set a real signing secret");
        }

        let token_ttl_hours = parse_or(&lookup, "FORKFUL_TOKEN_TTL_HOURS", 720)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            bail!(
                "FORKFUL_TOKEN_TTL_HOURS must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                token_ttl_hours
            );
        }

        Ok(Self {
            db_path: PathBuf::from(lookup("FORKFUL_DB_PATH").unwrap_or_else(|| "forkful.db".into())),
            host: lookup("FORKFUL_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "FORKFUL_PORT", 3000)?,
            jwt_secret,
            token_ttl_hours,
            reader_pool_size: parse_or(&lookup, "FORKFUL_READER_POOL_SIZE", 4)?,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
        None => Ok(default),
    }
}
