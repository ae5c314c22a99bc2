//! Name normalization policy.
//!
//! Incoming directory names pass through here before touching the store:
//! casing per the configured policy, then validity checks whose failures are
//! recorded per entity rather than aborting the batch.

use thiserror::Error;

use crate::config::CasePolicy;

pub use corral_directory::attrs::{strip_domain, truncate_chars, NAME_MAX_CHARS};

/// Maximum length of a stored username, in characters.
pub const USERNAME_MAX_CHARS: usize = 150;

/// Why a directory name cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidName {
    #[error("username is required")]
    Empty,

    #[error("username must be at most {USERNAME_MAX_CHARS} characters")]
    UsernameTooLong,

    #[error("username must not contain whitespace")]
    Whitespace,

    #[error("username must not contain ':' or ';'")]
    ForbiddenCharacter,

    #[error("first name must be at most {NAME_MAX_CHARS} characters")]
    FirstNameTooLong,

    #[error("last name must be at most {NAME_MAX_CHARS} characters")]
    LastNameTooLong,
}

/// Apply the configured casing policy to an incoming username.
pub fn apply_case(username: &str, policy: CasePolicy) -> String {
    match policy {
        CasePolicy::Uppercase => username.to_uppercase(),
        CasePolicy::Lowercase => username.to_lowercase(),
        CasePolicy::Preserve => username.to_string(),
    }
}

/// Check that a normalized username satisfies the store constraints.
pub fn validate_username(username: &str) -> Result<(), InvalidName> {
    if username.is_empty() {
        return Err(InvalidName::Empty);
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(InvalidName::UsernameTooLong);
    }
    if username.chars().any(char::is_whitespace) {
        return Err(InvalidName::Whitespace);
    }
    if username.contains(':') || username.contains(';') {
        return Err(InvalidName::ForbiddenCharacter);
    }
    Ok(())
}

/// Check first/last name lengths for a record that bypassed the client-side
/// truncation (e.g. a non-LDAP directory implementation).
pub fn validate_person_names(
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Result<(), InvalidName> {
    if first_name.is_some_and(|name| name.chars().count() > NAME_MAX_CHARS) {
        return Err(InvalidName::FirstNameTooLong);
    }
    if last_name.is_some_and(|name| name.chars().count() > NAME_MAX_CHARS) {
        return Err(InvalidName::LastNameTooLong);
    }
    Ok(())
}
