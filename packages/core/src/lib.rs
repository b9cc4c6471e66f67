// ABOUTME: Core types, traits, and utilities for RFP Desk
// ABOUTME: Foundational package providing shared domain enums, clock, and validation

pub mod clock;
pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;
pub mod versioned;

// Re-export main types
pub use types::{ParseEnumError, RfpStatus, Role, SlaStatus, Stage};

// Re-export clock
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};

// Re-export constants
pub use constants::{data_dir, default_database_path};

// Re-export utilities
pub use utils::{generate_id, normalize_title};

// Re-export validation
pub use validation::{validate_percentage, validate_required_text, ValidationError};

// Re-export versioned record helpers
pub use versioned::{schema_version, VersionedError, SCHEMA_VERSION_KEY};
