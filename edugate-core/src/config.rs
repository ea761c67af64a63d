// edugate-core/src/config.rs

use std::fmt;
use std::net::SocketAddr;

use chrono::Duration;

use crate::auth::{DEFAULT_TOKEN_TTL_DAYS, TokenCodec};
use crate::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Validated runtime settings for the HTTP server.
#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub token_ttl: Duration,
    token_codec: TokenCodec,
}

impl ServerConfig {
    pub fn new(
        bind_addr: &str,
        database_url: &str,
        token_key_base64: &str,
        db_max_connections: u32,
        token_ttl_days: Option<i64>,
    ) -> Result<Self, Error> {
        let bind_addr: SocketAddr = bind_addr.parse()?;
        if database_url.trim().is_empty() {
            return Err(Error::invalid("database_url", "database URL is required"));
        }
        if db_max_connections == 0 {
            return Err(Error::invalid("db_max_connections", "must be at least 1"));
        }
        let ttl_days = token_ttl_days.unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        if ttl_days <= 0 {
            return Err(Error::invalid("token_ttl_days", "must be positive"));
        }
        let token_ttl = Duration::days(ttl_days);
        let token_codec = TokenCodec::from_base64_key(token_key_base64)?.with_ttl(token_ttl);

        Ok(Self {
            bind_addr,
            database_url: database_url.to_string(),
            db_max_connections,
            token_ttl,
            token_codec,
        })
    }

    pub fn token_codec(&self) -> TokenCodec {
        self.token_codec.clone()
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_max_connections", &self.db_max_connections)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}
