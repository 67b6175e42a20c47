//! National identity numbers and other input normalisation shared by the
//! people records.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::NATIONAL_ID_LENGTH;
use crate::errors::{AppError, AppResult};

static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[0-9]{{{}}}$", NATIONAL_ID_LENGTH)).expect("static regex is valid")
});

/// Trim and check a 16-digit national identity (NIK) or family card (NoKK)
/// number. `field` names the input in the error message.
pub fn normalize_national_id(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if NATIONAL_ID.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::validation(format!(
            "{} must be exactly {} digits",
            field, NATIONAL_ID_LENGTH
        )))
    }
}

/// Upper-case relationship labels such as `father` -> `FATHER`.
pub fn normalize_relationship(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_uppercase())
}

/// Reject blank required text.
pub fn require_text(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_id_accepts_sixteen_digits() {
        assert_eq!(
            normalize_national_id("nik", " 3201010101010001 ").unwrap(),
            "3201010101010001"
        );
    }

    #[test]
    fn test_national_id_rejects_other_shapes() {
        assert!(normalize_national_id("nik", "320101010101000").is_err());
        assert!(normalize_national_id("nik", "32010101010100011").is_err());
        assert!(normalize_national_id("nik", "32010101010100a1").is_err());
        assert!(normalize_national_id("nik", "").is_err());
    }

    #[test]
    fn test_relationship_is_upper_cased() {
        assert_eq!(normalize_relationship("relationship_type", " father ").unwrap(), "FATHER");
        assert!(normalize_relationship("relationship_type", "  ").is_err());
    }
}
