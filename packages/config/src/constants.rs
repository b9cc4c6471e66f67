// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across RFP Desk

// Port Configuration
pub const RFPDESK_API_PORT: &str = "RFPDESK_API_PORT";
pub const PORT: &str = "PORT"; // Legacy

// Bind address
pub const RFPDESK_API_HOST: &str = "RFPDESK_API_HOST";

// Database
pub const RFPDESK_DATABASE_URL: &str = "RFPDESK_DATABASE_URL";
pub const RFPDESK_DB_MAX_CONNECTIONS: &str = "RFPDESK_DB_MAX_CONNECTIONS";

// CORS Configuration
pub const RFPDESK_CORS_ORIGIN: &str = "RFPDESK_CORS_ORIGIN";

// Snapshot cache
pub const RFPDESK_SNAPSHOT_TTL_SECS: &str = "RFPDESK_SNAPSHOT_TTL_SECS";

// Sessions
pub const RFPDESK_SESSION_TTL_HOURS: &str = "RFPDESK_SESSION_TTL_HOURS";

// Defaults
pub const DEFAULT_API_PORT: u16 = 4100;
pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 300;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;
