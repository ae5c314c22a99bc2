//! Attribute cleanup applied as records leave the directory client.

/// Maximum length of a stored first/last name, in characters.
pub const NAME_MAX_CHARS: usize = 30;

/// Clip a string to `max` characters, never splitting a multi-byte character.
///
/// Lengths are measured in characters, not bytes; already-short input is
/// returned unchanged.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Strip a trailing `@domain` qualifier from a username attribute value.
///
/// Directories that hand back `user@EXAMPLE.COM` style identities store the
/// bare user part locally; the original spelling stays on the record for
/// later directory lookups.
pub fn strip_domain(value: &str) -> &str {
    match value.split_once('@') {
        Some((user, _domain)) if !user.is_empty() => user,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        let long = "Firstnamehasmorethanthirtycharacters";
        let clipped = truncate_chars(long, NAME_MAX_CHARS);
        assert_eq!(clipped, "Firstnamehasmorethanthirtychar");
        assert_eq!(clipped.chars().count(), 30);
    }

    #[test]
    fn truncate_short_is_noop() {
        assert_eq!(truncate_chars("Moe", NAME_MAX_CHARS), "Moe");
        assert_eq!(truncate_chars("", NAME_MAX_CHARS), "");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        // Thai: 32 characters, multi-byte throughout.
        let last = "ชมหรือด่า อย่าไปรับ ให้กลับคืนไป";
        assert!(last.chars().count() > NAME_MAX_CHARS);
        let clipped = truncate_chars(last, NAME_MAX_CHARS);
        assert_eq!(clipped.chars().count(), 30);
        assert!(last.starts_with(&clipped));

        // 28 characters fits untouched.
        let first = "ดีหรือแย่ อย่าไปแคร์ คนนินทา";
        assert_eq!(truncate_chars(first, NAME_MAX_CHARS), first);
    }

    #[test]
    fn strip_domain_suffix() {
        assert_eq!(strip_domain("curly@example.com"), "curly");
        assert_eq!(strip_domain("curly"), "curly");
        // A leading @ is not a domain qualifier.
        assert_eq!(strip_domain("@odd"), "@odd");
    }
}
