//! Confirmation token identifier.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`TokenId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenIdError {
    /// The input string is empty or whitespace.
    #[error("token cannot be empty")]
    Empty,
    /// The input string is too long to be a token we issued.
    #[error("token must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Opaque confirmation token embedded in the confirmation link.
///
/// Freshly issued tokens are random v4 UUIDs in hyphenated form. Parsing
/// accepts any short non-empty string so that a mangled link is reported as
/// an unknown token rather than a malformed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Upper bound on accepted token length.
    pub const MAX_LENGTH: usize = 128;

    /// Issue a new random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a token received from a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or longer than
    /// [`TokenId::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, TokenIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TokenIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TokenIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TokenId {
    type Err = TokenIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for TokenId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TokenId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for TokenId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
