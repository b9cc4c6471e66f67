// ABOUTME: Shared utility functions for RFP Desk
// ABOUTME: Prefixed ID generation and title normalization

/// Generate a prefixed unique ID, e.g. `rfp-V1StGXR8_Z5jdHi6B-myT`
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

/// Normalize a checklist title for duplicate detection (trimmed, lowercased,
/// inner whitespace collapsed)
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
