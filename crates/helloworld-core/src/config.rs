//! Configuration module
//!
//! Settings are read from the process environment (after loading a `.env` file when present).
//! Every knob has a default so a bare `from_env()` gives a working development setup backed by
//! in-memory stores.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_IMAGE_PATH;

const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const MAX_FILE_SIZE_MB: usize = 10;
const UPLOAD_MAX_BYTES: usize = 20 * 1024 * 1024;
const FILESTORE_TIMEOUT_SECS: u64 = 30;
const NOTIFY_TIMEOUT_SECS: u64 = 10;
const SMTP_PORT: u16 = 587;
const DEFAULT_EXTENSIONS: &str = "bmp,gif,jpg,jpeg,png,webp";
const DEFAULT_CONTENT_TYPES: &str = "image/jpeg,image/gif,image/png,image/bmp,image/webp";

/// SMTP settings for administrator notifications.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub tls: bool,
}

/// Service configuration.
#[derive(Clone, Debug)]
pub struct HelloworldConfig {
    pub environment: String,
    pub server_port: u16,
    /// When unset the service runs on in-memory stores
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Filesystem root that relative media paths are resolved against
    pub media_root: PathBuf,
    /// Directory under `media_root` receiving uploaded images
    pub image_path: String,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Hard cap on a single file part; larger parts are flagged with upload code 1
    pub upload_max_bytes: usize,
    /// Id of the user notified about new greetings
    pub user_to_email: Option<i64>,
    pub allow_guest_submissions: bool,
    pub csrf_secret: String,
    pub filestore_timeout: Duration,
    pub notify_timeout: Duration,
    pub smtp: Option<SmtpConfig>,
}

impl Default for HelloworldConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server_port: SERVER_PORT,
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            media_root: PathBuf::from("."),
            image_path: DEFAULT_IMAGE_PATH.to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: split_list(DEFAULT_EXTENSIONS),
            allowed_content_types: split_list(DEFAULT_CONTENT_TYPES),
            upload_max_bytes: UPLOAD_MAX_BYTES,
            user_to_email: None,
            allow_guest_submissions: true,
            csrf_secret: "default-csrf-secret-change-in-production".to_string(),
            filestore_timeout: Duration::from_secs(FILESTORE_TIMEOUT_SECS),
            notify_timeout: Duration::from_secs(NOTIFY_TIMEOUT_SECS),
            smtp: None,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.trim().to_lowercase())
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl HelloworldConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = HelloworldConfig::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or(defaults.environment);

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        // A non-positive or unparsable id disables notifications.
        let user_to_email = env::var("USER_TO_EMAIL")
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|id| *id > 0);

        let smtp = if env_bool("EMAIL_ENABLED", false) {
            match (env::var("SMTP_HOST").ok(), env::var("SMTP_FROM").ok()) {
                (Some(host), Some(from)) => Some(SmtpConfig {
                    host,
                    port: env::var("SMTP_PORT")
                        .ok()
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(SMTP_PORT),
                    user: env::var("SMTP_USER").ok(),
                    password: env::var("SMTP_PASSWORD").ok(),
                    from,
                    tls: env_bool("SMTP_TLS", true),
                }),
                _ => {
                    tracing::warn!("EMAIL_ENABLED is set but SMTP_HOST or SMTP_FROM is missing");
                    None
                }
            }
        } else {
            None
        };

        let csrf_secret = env::var("CSRF_SECRET").unwrap_or(defaults.csrf_secret);

        let config = HelloworldConfig {
            environment,
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            image_path: env::var("IMAGE_PATH").unwrap_or(defaults.image_path),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_extensions),
            allowed_content_types: env::var("ALLOWED_CONTENT_TYPES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_content_types),
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(UPLOAD_MAX_BYTES),
            user_to_email,
            allow_guest_submissions: env_bool("ALLOW_GUEST_SUBMISSIONS", true),
            csrf_secret,
            filestore_timeout: Duration::from_secs(
                env::var("FILESTORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(FILESTORE_TIMEOUT_SECS),
            ),
            notify_timeout: Duration::from_secs(
                env::var("NOTIFY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(NOTIFY_TIMEOUT_SECS),
            ),
            smtp,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_path.trim().is_empty() {
            return Err(anyhow::anyhow!("IMAGE_PATH must not be empty"));
        }
        if self.image_path.split(['/', '\\']).any(|part| part == "..") {
            return Err(anyhow::anyhow!("IMAGE_PATH must stay inside MEDIA_ROOT"));
        }
        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must list at least one extension"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }
        if self.is_production() && self.csrf_secret == HelloworldConfig::default().csrf_secret {
            return Err(anyhow::anyhow!(
                "CSRF_SECRET must be set in production. Refusing to start with the default secret."
            ));
        }
        if self.csrf_secret.len() < 16 {
            tracing::warn!("CSRF_SECRET is shorter than 16 characters");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HelloworldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_path, "images");
        assert!(config.allowed_extensions.contains(&"png".to_string()));
        assert!(config.user_to_email.is_none());
    }

    #[test]
    fn test_validate_rejects_traversal_in_image_path() {
        let config = HelloworldConfig {
            image_path: "images/../../etc".to_string(),
            ..HelloworldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_default_secret_in_production() {
        let config = HelloworldConfig {
            environment: "production".to_string(),
            ..HelloworldConfig::default()
        };
        assert!(config.validate().is_err());

        let config = HelloworldConfig {
            environment: "production".to_string(),
            csrf_secret: "a-real-secret-value-for-prod".to_string(),
            ..HelloworldConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_list_normalizes() {
        assert_eq!(split_list(" PNG, jpg ,,gif"), vec!["png", "jpg", "gif"]);
    }
}
