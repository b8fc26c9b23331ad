use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub seed_fixtures: bool,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://schedule.db".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::BadRequest(format!("BIND_ADDR is invalid: {}", e)))?;

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse::<u32>()
                .map_err(|e| AppError::BadRequest(format!("DB_MAX_CONNECTIONS is invalid: {}", e)))?,
            Err(_) => 5,
        };

        let seed_fixtures = match env::var("SEED_FIXTURES") {
            Ok(v) => parse_bool(&v)
                .ok_or_else(|| AppError::BadRequest(format!("SEED_FIXTURES is invalid: {}", v)))?,
            Err(_) => false,
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            seed_fixtures,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
