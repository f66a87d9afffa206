use std::env;

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub version: String,
    pub environment: String,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parsed("PORT", 5000),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".into())
                .to_lowercase(),
            version: env::var("APP_VERSION").unwrap_or_else(|_| "1.0.0".into()),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "production".into()),
            cors_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into())),
            max_upload_bytes: env_parsed("MAX_UPLOAD_BYTES", 16 * 1024 * 1024),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Option<Vec<String>> {
    if raw.trim() == "*" {
        return None;
    }
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();
    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}
