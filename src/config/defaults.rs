pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: i64 = 3000;
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 2;

pub const DEFAULT_ACCESS_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_CONFIRMATION_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const DEFAULT_RESET_TTL_SECS: i64 = 24 * 60 * 60;

pub const DEFAULT_MAIL_FROM: &str = "no-reply@contacts.local";
pub const DEFAULT_MAIL_QUEUE_CAPACITY: i64 = 64;

pub const DEFAULT_RATE_LIMIT_ENABLED: bool = true;
pub const DEFAULT_READ_REQUESTS: i64 = 2;
pub const DEFAULT_READ_WINDOW_SECS: i64 = 5;
pub const DEFAULT_WRITE_REQUESTS: i64 = 1;
pub const DEFAULT_WRITE_WINDOW_SECS: i64 = 5;
