// ABOUTME: Filesystem locations for RFP Desk data
// ABOUTME: Resolves the per-user data directory and the default database file

use std::env;
use std::path::PathBuf;

/// Name of the per-user data directory
pub const DATA_DIR_NAME: &str = ".rfpdesk";

/// File name of the default SQLite database
pub const DATABASE_FILE_NAME: &str = "rfpdesk.db";

/// Get the path to the RFP Desk directory (~/.rfpdesk)
pub fn data_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(DATA_DIR_NAME)
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DATA_DIR_NAME)
    }
}

/// Get the path to the default database file (~/.rfpdesk/rfpdesk.db)
pub fn default_database_path() -> PathBuf {
    data_dir().join(DATABASE_FILE_NAME)
}
