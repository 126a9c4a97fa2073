//! Email address type and format validation.

use core::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Pattern accepted by [`EmailValidator::default`].
///
/// Local part of letters, digits and `._%+-`, an `@`, a domain of letters,
/// digits, dots and hyphens, then a 2-6 letter top-level label. Matched
/// case-insensitively.
///
/// This is a conservative filter, not RFC 5322: quoted local parts, IP literals,
/// internationalized domains and top-level labels longer than six letters
/// (`.photography`) are all rejected.
pub const DEFAULT_EMAIL_PATTERN: &str = r"^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,6}$";

static DEFAULT_VALIDATOR: LazyLock<EmailValidator> = LazyLock::new(EmailValidator::default);

/// Pure predicate deciding whether a string looks like an email address.
///
/// The pattern is fixed at construction so that callers can swap it through
/// configuration instead of relying on a process-wide constant.
///
/// ```
/// use enlist_core::EmailValidator;
///
/// let validator = EmailValidator::default();
/// assert!(validator.validate(Some("user.name+tag@example.co")));
/// assert!(!validator.validate(Some("a@b.toolongtld")));
/// assert!(!validator.validate(None));
/// ```
#[derive(Debug, Clone)]
pub struct EmailValidator {
    pattern: Regex,
}

impl EmailValidator {
    /// Build a validator from a custom pattern.
    ///
    /// The pattern is compiled case-insensitively. It should be anchored with
    /// `^...$`; an unanchored pattern accepts any input containing a match.
    ///
    /// # Errors
    ///
    /// Returns `regex::Error` if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern })
    }

    /// Returns `true` if the candidate is present and matches the pattern.
    #[must_use]
    pub fn validate(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|email| self.pattern.is_match(email))
    }

    /// The source text of the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new(DEFAULT_EMAIL_PATTERN).expect("default email pattern compiles")
    }
}

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not match the accepted address format.
    #[error("email is not a valid address")]
    Malformed,
}

/// An email address, the natural key of a user account.
///
/// Parsing runs the default [`EmailValidator`] and enforces the RFC 5321
/// length cap. Deserialization goes through the same checks.
///
/// ```
/// use enlist_core::Email;
///
/// assert!(Email::parse("ann@x.com").is_ok());
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-sign").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` using the default validator.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters, or
    /// rejected by [`DEFAULT_EMAIL_PATTERN`].
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        Self::parse_with(s, &DEFAULT_VALIDATOR)
    }

    /// Parse an `Email` using a caller-supplied validator.
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`], with `validator` deciding the format check.
    pub fn parse_with(s: &str, validator: &EmailValidator) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if !validator.validate(Some(s)) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Stored addresses passed validation on the way in; a later pattern
        // override must not make existing rows unreadable.
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_accepts_tagged_address() {
        let validator = EmailValidator::default();
        assert!(validator.validate(Some("user.name+tag@example.co")));
    }

    #[test]
    fn test_validator_accepts_common_addresses() {
        let validator = EmailValidator::default();
        assert!(validator.validate(Some("ann@x.com")));
        assert!(validator.validate(Some("first_last%dept@mail.example.org")));
        assert!(validator.validate(Some("a-b@sub-domain.example.museum")));
    }

    #[test]
    fn test_validator_is_case_insensitive() {
        let validator = EmailValidator::default();
        assert!(validator.validate(Some("USER@EXAMPLE.COM")));
        assert!(validator.validate(Some("Mixed.Case@Example.Io")));
    }

    #[test]
    fn test_validator_rejects_absent_and_empty() {
        let validator = EmailValidator::default();
        assert!(!validator.validate(None));
        assert!(!validator.validate(Some("")));
    }

    #[test]
    fn test_validator_rejects_missing_at() {
        let validator = EmailValidator::default();
        assert!(!validator.validate(Some("no-at-sign")));
    }

    #[test]
    fn test_validator_rejects_long_tld() {
        let validator = EmailValidator::default();
        assert!(!validator.validate(Some("a@b.toolongtld")));
    }

    #[test]
    fn test_validator_rejects_short_tld_and_missing_dot() {
        let validator = EmailValidator::default();
        assert!(!validator.validate(Some("a@b.c")));
        assert!(!validator.validate(Some("a@localhost")));
    }

    #[test]
    fn test_validator_rejects_surrounding_text() {
        let validator = EmailValidator::default();
        assert!(!validator.validate(Some(" ann@x.com")));
        assert!(!validator.validate(Some("ann@x.com trailing")));
    }

    #[test]
    fn test_custom_pattern() {
        let validator = EmailValidator::new(r"^[a-z]+@corp\.internal$").unwrap();
        assert!(validator.validate(Some("ann@corp.internal")));
        assert!(validator.validate(Some("ANN@CORP.INTERNAL")));
        assert!(!validator.validate(Some("ann@x.com")));
    }

    #[test]
    fn test_invalid_custom_pattern() {
        assert!(EmailValidator::new("([unclosed").is_err());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(Email::parse("no-at-sign"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("user@"), Err(EmailError::Malformed));
    }

    #[test]
    fn test_parse_with_custom_validator() {
        let validator = EmailValidator::new(r"^.+@corp\.internal$").unwrap();
        assert!(Email::parse_with("ann@corp.internal", &validator).is_ok());
        assert_eq!(
            Email::parse_with("ann@x.com", &validator),
            Err(EmailError::Malformed)
        );
    }

    #[test]
    fn test_display() {
        let email = Email::parse("ann@x.com").unwrap();
        assert_eq!(format!("{email}"), "ann@x.com");
    }

    #[test]
    fn test_deserialize_validates() {
        let parsed: Email = serde_json::from_str("\"ann@x.com\"").unwrap();
        assert_eq!(parsed.as_str(), "ann@x.com");

        assert!(serde_json::from_str::<Email>("\"not an email\"").is_err());
    }
}
