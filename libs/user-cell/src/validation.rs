// libs/user-cell/src/validation.rs
use std::sync::LazyLock;

use regex::Regex;

use crate::models::UserError;

pub const MAX_USERNAME_LENGTH: usize = 15;
pub const MAX_NAME_LENGTH: usize = 30;

static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._-]+$").ok());

/// Names that would shadow routes, system accounts or staff identities.
const RESERVED_USERNAMES: &[&str] = &[
    "about", "account", "admin", "administrator", "api", "auth", "billing", "clinic", "config",
    "contact", "dashboard", "doctor", "doctors", "help", "info", "login", "logout", "mail",
    "me", "null", "owner", "patient", "patients", "register", "root", "security", "settings",
    "signin", "signup", "staff", "static", "superuser", "support", "system", "undefined",
    "user", "users", "webmaster", "www",
];

pub fn validate_username(username: &str) -> Result<(), UserError> {
    if username.is_empty() {
        return Err(UserError::Validation("Username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UserError::Validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    let well_formed = USERNAME_PATTERN
        .as_ref()
        .map(|pattern| pattern.is_match(username))
        .unwrap_or(false);
    if !well_formed {
        return Err(UserError::Validation(
            "Username may contain only lowercase letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    if RESERVED_USERNAMES.contains(&username) {
        return Err(UserError::Validation(format!("Username '{}' is reserved", username)));
    }
    Ok(())
}

/// First and last names: letters only, any script.
pub fn validate_name(field: &str, value: &str) -> Result<(), UserError> {
    if value.is_empty() {
        return Err(UserError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(UserError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    if !value.chars().all(char::is_alphabetic) {
        return Err(UserError::Validation(format!("{} must contain only letters", field)));
    }
    Ok(())
}

pub fn validate_specialization(value: &str) -> Result<(), UserError> {
    if value.is_empty() || !value.chars().all(char::is_alphabetic) {
        return Err(UserError::Validation(
            "Specialization must contain only letters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("jdoe").is_ok());
        assert!(validate_username("j.doe_2-x").is_ok());
        assert_matches!(validate_username(""), Err(UserError::Validation(_)));
        assert_matches!(validate_username("JDoe"), Err(UserError::Validation(_)));
        assert_matches!(validate_username("j doe"), Err(UserError::Validation(_)));
        assert_matches!(validate_username("admin"), Err(UserError::Validation(_)));
        assert_matches!(validate_username("abcdefghijklmnop"), Err(UserError::Validation(_)));
        assert!(validate_username("abcdefghijklmno").is_ok());
    }

    #[test]
    fn test_names_accept_any_alphabet() {
        assert!(validate_name("First name", "Anna").is_ok());
        assert!(validate_name("First name", "Анна").is_ok());
        assert!(validate_name("Last name", "O'Neil").is_err());
        assert!(validate_name("Last name", "").is_err());
        assert!(validate_name("Last name", &"a".repeat(31)).is_err());
    }

    #[test]
    fn test_specialization_is_letters_only() {
        assert!(validate_specialization("Cardiology").is_ok());
        assert!(validate_specialization("Cardio logy").is_err());
        assert!(validate_specialization("").is_err());
    }
}
