/// Comparison form of a distribution name (PEP 503 style).
pub fn canonicalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.push(ch.to_ascii_lowercase());
            last_was_separator = false;
        }
    }
    normalized
}

/// Length of the opaque names some lockfile generators write for direct-URL
/// dependencies.
const GENERATED_NAME_LEN: usize = 7;

/// Returns `true` when `name` looks like a generated placeholder rather than a
/// real package name: exactly seven lowercase hexadecimal characters.
///
/// Such names are replaced by the name recovered from the dependency's link.
pub fn is_likely_generated_name(name: &str) -> bool {
    name.len() == GENERATED_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_collapse_separators() {
        assert_eq!(canonicalize_package_name("Django_REST.framework"), "django-rest-framework");
        assert_eq!(canonicalize_package_name("zope..interface"), "zope-interface");
        assert_eq!(canonicalize_package_name(" requests "), "requests");
    }

    #[test]
    fn generated_names_are_seven_lowercase_hex() {
        assert!(is_likely_generated_name("a1b2c3d"));
        assert!(is_likely_generated_name("0000000"));
        assert!(is_likely_generated_name("deadbee"));
    }

    #[test]
    fn generated_name_rejects_near_misses() {
        assert!(!is_likely_generated_name("A1B2C3D"));
        assert!(!is_likely_generated_name("a1b2c3"));
        assert!(!is_likely_generated_name("a1b2c3d4"));
        assert!(!is_likely_generated_name("a1b2c3g"));
        assert!(!is_likely_generated_name("requests"));
        assert!(!is_likely_generated_name(""));
    }
}
