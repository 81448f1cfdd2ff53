//! Registration request checks.

use std::sync::LazyLock;

use regex_lite::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]{2,}$")
        .unwrap_or_else(|err| panic!("email pattern does not compile: {err}"))
});

/// Reasons a registration request is rejected before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("all fields are required")]
    MissingField,
    #[error("invalid email format")]
    InvalidEmailFormat,
}

/// Check that every field is present and that `email` looks like one.
///
/// The missing-field check wins over the email check.
pub fn validate(
    email: Option<&str>,
    password: Option<&str>,
    display_name: Option<&str>,
) -> Result<(), ValidationError> {
    let present = |field: Option<&str>| field.is_some_and(|f| !f.is_empty());

    if !(present(email) && present(password) && present(display_name)) {
        return Err(ValidationError::MissingField);
    }

    if !is_email(email.unwrap_or_default()) {
        return Err(ValidationError::InvalidEmailFormat);
    }

    Ok(())
}

/// Whether `email` has the `local@domain.tld` shape, the TLD having at
/// least two characters.
pub fn is_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        assert_eq!(validate(Some("a@b.com"), Some("secret123"), Some("alice")), Ok(()));
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            (None, Some("secret123"), Some("alice")),
            (Some("a@b.com"), None, Some("alice")),
            (Some("a@b.com"), Some("secret123"), None),
            (Some(""), Some("secret123"), Some("alice")),
            (Some("a@b.com"), Some(""), Some("alice")),
            (Some("a@b.com"), Some("secret123"), Some("")),
            (None, None, None),
        ];

        for (email, password, name) in cases {
            assert_eq!(
                validate(email, password, name),
                Err(ValidationError::MissingField),
                "{email:?} {password:?} {name:?}"
            );
        }
    }

    #[test]
    fn test_missing_field_wins_over_bad_email() {
        assert_eq!(
            validate(Some("not-an-email"), None, Some("bob")),
            Err(ValidationError::MissingField)
        );
    }

    #[test]
    fn test_invalid_emails() {
        for email in [
            "foo",
            "foo@bar",
            "@bar.com",
            "not-an-email",
            "foo@bar.c",
            "foo bar@baz.com",
            "foo@@bar.com",
            "foo@bar. com",
        ] {
            assert!(!is_email(email), "{email} should be rejected");
            assert_eq!(
                validate(Some(email), Some("x"), Some("bob")),
                Err(ValidationError::InvalidEmailFormat)
            );
        }
    }

    #[test]
    fn test_valid_emails() {
        for email in [
            "a@b.com",
            "A@B.COM",
            "first.last+tag@sub.example.org",
            "user@host.co",
        ] {
            assert!(is_email(email), "{email} should be accepted");
        }
    }
}
