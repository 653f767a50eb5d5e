//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. The defaults for the admin account
//! and the token secrets are for development only.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use gallery_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_PAGE_SIZE, MAX_UPLOAD_SIZE};

/// Deployment mode. Production enables secure-only cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    Dev,
    Prod,
    Test,
}

impl ReleaseMode {
    pub fn is_prod(&self) -> bool {
        *self == Self::Prod
    }
}

impl FromStr for ReleaseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown release mode {other:?}")),
        }
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./gallery.db`
    pub database_path: PathBuf,

    /// Root of the asset tree; every image gets its own sub-directory.
    /// Env: `IMAGE_DIRECTORY`
    /// Default: `/var/gallery/images`
    pub image_directory: PathBuf,

    /// Public URL prefix under which the asset tree is served.
    /// Env: `GALLERY_ENDPOINT`
    /// Default: `/gallery/images`
    pub gallery_endpoint: String,

    /// Administrator account provisioned at startup.
    /// Env: `ADMIN_USERNAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD`
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,

    /// Session token signing secret and salt.
    /// Env: `AUTH_SECRET_TOKEN`, `AUTH_SALT`
    pub auth_secret: String,
    pub auth_salt: String,

    /// Optional pepper mixed into every password hash.
    /// Env: `PASSWORD_PEPPER`
    /// Default: unset.
    pub password_pepper: Option<String>,

    /// Env: `RELEASE_MODE` (dev/prod/test)
    /// Default: `dev`
    pub mode: ReleaseMode,

    /// Images per gallery page when the client does not ask for a size.
    /// Env: `PAGE_SIZE`
    /// Default: `10`
    pub page_size: usize,

    /// Maximum accepted request body for uploads, in bytes (50 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// Login attempts allowed per client IP per minute.
    /// Env: `LOGIN_ATTEMPTS_PER_MINUTE`
    /// Default: `5`
    pub login_attempts_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./gallery.db"),
            image_directory: PathBuf::from("/var/gallery/images"),
            gallery_endpoint: "/gallery/images".to_string(),
            admin_username: "admin".to_string(),
            admin_email: "admin@localhost".to_string(),
            admin_password: "password".to_string(),
            auth_secret: "mysecret".to_string(),
            auth_salt: "mysalt".to_string(),
            password_pepper: None,
            mode: ReleaseMode::Dev,
            page_size: DEFAULT_PAGE_SIZE,
            max_upload_size: MAX_UPLOAD_SIZE,
            login_attempts_per_minute: 5,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("IMAGE_DIRECTORY") {
            config.image_directory = PathBuf::from(path);
        }

        if let Some(endpoint) = lookup("GALLERY_ENDPOINT") {
            config.gallery_endpoint = endpoint;
        }

        // -- Admin account --

        if let Some(username) = lookup("ADMIN_USERNAME") {
            config.admin_username = username;
        }
        if let Some(email) = lookup("ADMIN_EMAIL") {
            config.admin_email = email;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            config.admin_password = password;
        }

        // -- Secrets --

        if let Some(secret) = lookup("AUTH_SECRET_TOKEN") {
            config.auth_secret = secret;
        }
        if let Some(salt) = lookup("AUTH_SALT") {
            config.auth_salt = salt;
        }
        if let Some(pepper) = lookup("PASSWORD_PEPPER") {
            if !pepper.is_empty() {
                config.password_pepper = Some(pepper);
            }
        }

        if let Some(mode) = lookup("RELEASE_MODE") {
            match mode.parse() {
                Ok(parsed) => config.mode = parsed,
                Err(e) => tracing::warn!(error = %e, "Invalid RELEASE_MODE, using default"),
            }
        }

        if let Some(val) = lookup("PAGE_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.page_size = n,
                _ => tracing::warn!(value = %val, "Invalid PAGE_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_size = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("LOGIN_ATTEMPTS_PER_MINUTE") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.login_attempts_per_minute = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid LOGIN_ATTEMPTS_PER_MINUTE, using default"
                ),
            }
        }

        if !config.mode.is_prod() {
            return config;
        }

        if config.auth_secret == Self::default().auth_secret {
            tracing::warn!("AUTH_SECRET_TOKEN is the development default in production mode");
        }
        if config.admin_password == Self::default().admin_password {
            tracing::warn!("ADMIN_PASSWORD is the development default in production mode");
        }

        config
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("image_directory", &self.image_directory)
            .field("gallery_endpoint", &self.gallery_endpoint)
            .field("admin_username", &self.admin_username)
            .field("admin_email", &self.admin_email)
            .field("mode", &self.mode)
            .field("page_size", &self.page_size)
            .field("max_upload_size", &self.max_upload_size)
            .field("login_attempts_per_minute", &self.login_attempts_per_minute)
            .field("password_peppered", &self.password_pepper.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8000).into());
        assert_eq!(config.gallery_endpoint, "/gallery/images");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.mode, ReleaseMode::Dev);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("IMAGE_DIRECTORY", "/srv/images"),
            ("GALLERY_ENDPOINT", "/media"),
            ("RELEASE_MODE", "PROD"),
            ("PAGE_SIZE", "24"),
            ("PASSWORD_PEPPER", "pep"),
        ]);
        assert_eq!(config.image_directory, PathBuf::from("/srv/images"));
        assert_eq!(config.gallery_endpoint, "/media");
        assert!(config.mode.is_prod());
        assert_eq!(config.page_size, 24);
        assert_eq!(config.password_pepper.as_deref(), Some("pep"));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("RELEASE_MODE", "staging"),
            ("PAGE_SIZE", "0"),
            ("PASSWORD_PEPPER", ""),
        ]);
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.mode, ReleaseMode::Dev);
        assert_eq!(config.page_size, 10);
        assert!(config.password_pepper.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = from_pairs(&[("AUTH_SECRET_TOKEN", "s3cr3t"), ("ADMIN_PASSWORD", "hunter2")]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("s3cr3t"));
        assert!(!printed.contains("hunter2"));
    }
}
