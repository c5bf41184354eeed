use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use maintrack_core::AppError;
use tracing_subscriber::EnvFilter;

/// Secret used when JWT_SECRET is unset outside of production.
const DEV_JWT_SECRET: &str = "maintrack-dev-secret-do-not-use-in-production";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub audit_queue_capacity: usize,
    pub db_max_conns: u32,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_owned());
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if app_env == "production" => {
                return Err(AppError::Validation(
                    "JWT_SECRET is required when APP_ENV=production".to_owned(),
                ));
            }
            _ => {
                tracing::warn!("JWT_SECRET is not set, using the development fallback secret");
                DEV_JWT_SECRET.to_owned()
            }
        };

        let access_ttl_secs = positive_env("JWT_ACCESS_TTL_SECS", 900)?;
        let refresh_ttl_secs = positive_env("JWT_REFRESH_TTL_SECS", 604_800)?;

        let audit_queue_capacity = env::var("AUDIT_QUEUE_CAPACITY")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(1024);
        let db_max_conns = env::var("DB_MAX_CONNS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|conns| *conns > 0)
            .unwrap_or(25);

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            jwt_secret,
            access_ttl_secs,
            refresh_ttl_secs,
            audit_queue_capacity,
            db_max_conns,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn positive_env(name: &str, default: i64) -> Result<i64, AppError> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };
    let parsed = value
        .parse::<i64>()
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))?;
    if parsed <= 0 {
        return Err(AppError::Validation(format!("{name} must be positive")));
    }
    Ok(parsed)
}
