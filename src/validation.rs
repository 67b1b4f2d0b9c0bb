// Validation utilities module
// Provides custom validation functions for request DTOs

use validator::ValidationError;

/// Maximum accepted length for a staff display name
pub const MAX_STAFF_NAME_LEN: usize = 100;

/// Validates that a free-text field contains something other than whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("must_not_be_blank"))
    } else {
        Ok(())
    }
}

/// Validates a staff display name used for attribution
pub fn validate_staff_name(name: &str) -> Result<(), ValidationError> {
    validate_not_blank(name)?;
    if name.chars().count() > MAX_STAFF_NAME_LEN {
        return Err(ValidationError::new("staff_name_too_long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Unit 4B").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn test_staff_name_length() {
        assert!(validate_staff_name("Jordan").is_ok());
        assert!(validate_staff_name(&"x".repeat(MAX_STAFF_NAME_LEN)).is_ok());
        assert!(validate_staff_name(&"x".repeat(MAX_STAFF_NAME_LEN + 1)).is_err());
    }
}
