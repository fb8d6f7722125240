use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for person name fields (first/last name)
    /// Letters, spaces, hyphens and apostrophes; must start with a letter
    /// - Valid: "Ana", "Jean-Pierre", "O'Brien", "Maria Luisa"
    /// - Invalid: "", " Ana", "-Ana", "Ana2"
    pub static ref PERSON_NAME_REGEX: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z' -]*$").unwrap();

    /// Regex for organization labels
    /// Letters, digits, spaces and common punctuation; must start alphanumeric
    pub static ref ORGANIZATION_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 .,&'-]*$").unwrap();
}

/// Keep object keys predictable: path separators and whitespace in a
/// client-supplied filename become underscores.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' | '\t' | '\n' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_person_name_regex_valid() {
        assert!(PERSON_NAME_REGEX.is_match("Ana"));
        assert!(PERSON_NAME_REGEX.is_match("Jean-Pierre"));
        assert!(PERSON_NAME_REGEX.is_match("O'Brien"));
        assert!(PERSON_NAME_REGEX.is_match("Maria Luisa"));
    }

    #[test]
    fn test_person_name_regex_invalid() {
        assert!(!PERSON_NAME_REGEX.is_match("")); // empty
        assert!(!PERSON_NAME_REGEX.is_match(" Ana")); // leading space
        assert!(!PERSON_NAME_REGEX.is_match("-Ana")); // leading hyphen
        assert!(!PERSON_NAME_REGEX.is_match("Ana2")); // digit
        assert!(!PERSON_NAME_REGEX.is_match("Ana_B")); // underscore
    }

    #[test]
    fn test_organization_regex() {
        assert!(ORGANIZATION_REGEX.is_match("City Works Dept."));
        assert!(ORGANIZATION_REGEX.is_match("Ward 5"));
        assert!(!ORGANIZATION_REGEX.is_match(" leading space"));
        assert!(!ORGANIZATION_REGEX.is_match(""));
    }
}
