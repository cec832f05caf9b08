// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// True when the error chain contains a storage failure rather than bad input
pub fn is_internal_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<rusqlite::Error>().is_some()
            || matches!(
                cause.downcast_ref::<crate::pipeline::ServiceError>(),
                Some(crate::pipeline::ServiceError::Storage(_))
            )
    })
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate project name format (alphanumeric, dots, underscores, hyphens)
pub fn validate_project_name(name: &str) -> Result<(), String> {
    validate_non_empty(name, "Project name")?;

    if name.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(format!("Invalid project name: '{}'. Project names can only contain letters, numbers, dots, underscores, and hyphens.", name))
    }
}

/// Validate a lead score (0-100)
pub fn validate_score(score: u8) -> Result<u8, String> {
    if score <= 100 {
        Ok(score)
    } else {
        Err(format!("Invalid score: {}. Score must be between 0 and 100.", score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ServiceError;

    #[test]
    fn test_validate_non_empty() {
        assert!(validate_non_empty("test", "field").is_ok());
        assert!(validate_non_empty("", "field").is_err());
        assert!(validate_non_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("skyline").is_ok());
        assert!(validate_project_name("skyline.phase-2").is_ok());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name("sky line").is_err());
    }

    #[test]
    fn test_validate_score() {
        assert_eq!(validate_score(0), Ok(0));
        assert_eq!(validate_score(100), Ok(100));
        assert!(validate_score(101).is_err());
    }

    #[test]
    fn test_internal_error_classification() {
        let storage = anyhow::Error::new(ServiceError::Storage("disk full".to_string()));
        assert!(is_internal_error(&storage));

        let rejected = anyhow::Error::new(ServiceError::Rejected("locked".to_string()));
        assert!(!is_internal_error(&rejected));

        let plain = anyhow::anyhow!("Lead 'abc' not found");
        assert!(!is_internal_error(&plain));
    }
}
