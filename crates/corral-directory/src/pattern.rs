//! Name-pattern translation.
//!
//! Sync requests carry either a literal name or a glob where `*` matches any
//! run of characters. The same glob is evaluated two ways: as an anchored
//! case-insensitive regex (in-memory matching, tests) and as an LDAP filter
//! expression (the wire client).

use regex::Regex;

use crate::error::{DirectoryError, DirectoryResult};

/// Translate a name glob into an anchored, case-insensitive regex.
///
/// `*` becomes `.*`, `.` is matched literally, and every other regex
/// metacharacter is escaped; the result is anchored `^...$`.
pub fn glob_to_regex(pattern: &str) -> DirectoryResult<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            _ => translated.push_str(&regex::escape(&ch.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated)
        .map_err(|e| DirectoryError::invalid_pattern(pattern, e.to_string()))
}

/// Escape a literal value for embedding in an LDAP filter (RFC 4515).
///
/// Characters that must be escaped: `\` `*` `(` `)` NUL.
pub fn ldap_filter_escape(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Translate a name glob into an LDAP filter value: `*` passes through as
/// the LDAP wildcard, everything else is escaped per RFC 4515.
pub fn glob_to_ldap_value(pattern: &str) -> String {
    pattern
        .split('*')
        .map(ldap_filter_escape)
        .collect::<Vec<_>>()
        .join("*")
}
