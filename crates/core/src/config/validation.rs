use crate::{ValidatorError, ValidatorResult};

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ValidatorResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ValidatorResult<()> {
        if value.trim().is_empty() {
            return Err(ValidatorError::config_error(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that an interval is greater than zero and below the upper bound
    pub fn validate_seconds(value: u64, field_name: &str, max: u64) -> ValidatorResult<()> {
        if value == 0 {
            return Err(ValidatorError::config_error(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if value > max {
            return Err(ValidatorError::config_error(format!(
                "{field_name} must be less than or equal to {max}"
            )));
        }
        Ok(())
    }

    /// Validate that a command template contains the given placeholder
    pub fn validate_placeholder(
        template: &str,
        placeholder: &str,
        field_name: &str,
    ) -> ValidatorResult<()> {
        Self::validate_not_empty(template, field_name)?;
        if !template.contains(placeholder) {
            return Err(ValidatorError::config_error(format!(
                "{field_name} must contain the {placeholder} placeholder"
            )));
        }
        Ok(())
    }
}
