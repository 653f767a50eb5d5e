/// Application name
pub const APP_NAME: &str = "Gallery";

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "gallery";

/// Session token lifetime in seconds (2 hours)
pub const TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// File name of the derived thumbnail inside each asset directory
pub const THUMBNAIL_FILE_NAME: &str = "thumbnail.jpg";

/// Thumbnails are this many times smaller than the original on each axis
pub const THUMBNAIL_DIVISOR: u32 = 10;

/// Default number of images per gallery page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Maximum upload size in bytes (50 MiB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Key derivation context for the session token MAC key (BLAKE3)
pub const KDF_CONTEXT_SESSION_KEY: &str = "gallery-session-token-v1";
