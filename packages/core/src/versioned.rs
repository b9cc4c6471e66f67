// ABOUTME: Helpers for JSON records tagged with a schemaVersion field
// ABOUTME: Untagged legacy rows read as version 1; unknown versions are rejected

use serde_json::Value;
use thiserror::Error;

/// Field that carries the record's schema version
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

#[derive(Debug, Error)]
pub enum VersionedError {
    #[error("Unsupported {record} schema version {version}")]
    Unsupported { record: &'static str, version: u64 },

    #[error("Invalid {record} schema version: {value}")]
    InvalidVersion { record: &'static str, value: String },

    #[error("Malformed {record}: {source}")]
    Malformed {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the schema version of a stored record. Records written before
/// versioning was introduced have no tag and count as version 1.
pub fn schema_version(record: &'static str, value: &Value) -> Result<u64, VersionedError> {
    match value.get(SCHEMA_VERSION_KEY) {
        None | Some(Value::Null) => Ok(1),
        Some(v) => v.as_u64().ok_or_else(|| VersionedError::InvalidVersion {
            record,
            value: v.to_string(),
        }),
    }
}

/// Deserialize a record body, mapping serde failures to `Malformed`
pub fn decode<T: serde::de::DeserializeOwned>(
    record: &'static str,
    value: Value,
) -> Result<T, VersionedError> {
    serde_json::from_value(value).map_err(|source| VersionedError::Malformed { record, source })
}
