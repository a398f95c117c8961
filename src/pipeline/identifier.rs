// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 batchflow contributors

//! Task and process name validation

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{BatchflowError, BatchflowResult};

/// Longest name the workflow engine accepts for a task or process
pub const MAX_NAME_LEN: usize = 30;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

/// Check that `name` can be used as a task or process name.
///
/// A valid name is a bare identifier (ASCII letters, digits and underscores,
/// not starting with a digit) of at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> BatchflowResult<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(BatchflowError::invalid_name(
            name,
            format!("longer than {} characters", MAX_NAME_LEN),
        ));
    }

    if name.is_empty() {
        return Err(BatchflowError::invalid_name(name, "name is empty"));
    }

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(BatchflowError::invalid_name(name, "starts with a digit"));
    }

    if !is_identifier(name) {
        return Err(BatchflowError::invalid_name(
            name,
            "only letters, digits and underscores are allowed",
        ));
    }

    Ok(())
}

/// Whether `name` is identifier shaped, with no length limit
pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// Whether `name` passes [`validate_name`]
pub fn is_valid_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "_", "setupVisits", "run_phosim_2", "A1_b2", &"x".repeat(30)] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_too_long() {
        let name = "x".repeat(31);
        let err = validate_name(&name).unwrap_err();
        assert!(matches!(err, BatchflowError::InvalidName { .. }));
        assert!(err.to_string().contains("longer than 30"));
    }

    #[test]
    fn test_not_identifier_shaped() {
        for name in ["", "1abc", "has space", "dash-ed", "dot.ted", "semi;", "tab\t", "ünï"] {
            assert!(
                matches!(validate_name(name), Err(BatchflowError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_leading_digit_reason() {
        let err = validate_name("9lives").unwrap_err();
        assert!(err.to_string().contains("starts with a digit"));
    }

    #[test]
    fn test_identifier_shape_has_no_length_limit() {
        assert!(is_identifier("NERSC_OUTPUT_DATA_DIR_FOR_LONG_RUNNING_JOBS"));
        assert!(!is_identifier("A<B"));
        assert!(!is_valid_name("NERSC_OUTPUT_DATA_DIR_FOR_LONG_RUNNING_JOBS"));
    }
}
