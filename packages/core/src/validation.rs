// ABOUTME: Input validation utilities shared by storage and API layers
// ABOUTME: Text field sanitization and numeric range checks

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(String),

    #[error("{field} exceeds maximum size of {max} characters (got {actual} characters)")]
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("{0} contains invalid null bytes")]
    NullBytes(String),

    #[error("{field} must be between 0 and 100 (got {value})")]
    OutOfRange { field: String, value: f64 },

    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

/// Trim and validate a required text field
pub fn validate_required_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let len = trimmed.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: max_len,
            actual: len,
        });
    }

    if trimmed.contains('\0') {
        return Err(ValidationError::NullBytes(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validate a 0-100 percentage
pub fn validate_percentage(value: f64, field: &str) -> Result<f64, ValidationError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_validate_required_text_trims() {
        assert_eq!(
            validate_required_text("  Cloud hosting RFP ", "Title", 200).unwrap(),
            "Cloud hosting RFP"
        );
    }

    #[test]
    fn test_validate_required_text_rejects_empty_and_null() {
        assert_eq!(
            validate_required_text("   ", "Title", 200),
            Err(ValidationError::Empty("Title".to_string()))
        );
        assert!(matches!(
            validate_required_text("a\0b", "Title", 200),
            Err(ValidationError::NullBytes(_))
        ));
    }

    #[test]
    fn test_validate_required_text_too_long() {
        let long = "x".repeat(11);
        assert!(matches!(
            validate_required_text(&long, "Title", 10),
            Err(ValidationError::TooLong { max: 10, actual: 11, .. })
        ));
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(100.0, true)]
    #[case(57.5, true)]
    #[case(-0.1, false)]
    #[case(100.5, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_validate_percentage(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(validate_percentage(value, "coverage").is_ok(), ok);
    }
}
