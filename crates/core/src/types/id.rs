//! Newtype IDs for type-safe entity references.
//!
//! Cart IDs are opaque caller-supplied strings (a session or user identifier)
//! and double as the key-value store key. Article IDs are UUIDs assigned by the
//! article repository on insert. Keeping them as distinct types prevents a
//! cart key from ever reaching the article table and vice versa.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or whitespace.
    #[error("{kind} id cannot be empty")]
    Empty {
        /// Entity kind, for the error message.
        kind: &'static str,
    },
    /// The input string is longer than the allowed maximum.
    #[error("{kind} id must be at most {max} characters")]
    TooLong {
        /// Entity kind, for the error message.
        kind: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not a valid store identifier.
    #[error("cannot decode {kind} id {value:?}: not a valid identifier")]
    Malformed {
        /// Entity kind, for the error message.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Macro to define an opaque string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string, rejecting empty values on
///   deserialization
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()`, `as_str()`, `into_inner()`, `Display`, `FromStr`, `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use catalog_core::define_string_id;
/// define_string_id!(SessionKey, "session");
///
/// let key = SessionKey::parse("abc").unwrap();
/// assert_eq!(key.as_str(), "abc");
/// assert!(SessionKey::parse("").is_err());
/// ```
#[macro_export]
macro_rules! define_string_id {
    ($name:ident, $kind:literal) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Maximum length of the identifier in bytes.
            pub const MAX_LENGTH: usize = 512;

            /// Parse an ID from a string.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty, only whitespace, or
            /// longer than [`Self::MAX_LENGTH`].
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                if s.trim().is_empty() {
                    return Err($crate::IdError::Empty { kind: $kind });
                }
                if s.len() > Self::MAX_LENGTH {
                    return Err($crate::IdError::TooLong {
                        kind: $kind,
                        max: Self::MAX_LENGTH,
                    });
                }
                Ok(Self(s.to_owned()))
            }

            /// Returns the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(CartId, "cart");

/// Identifier of an article, assigned by the repository on insert.
///
/// Serialized as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(Uuid);

impl ArticleId {
    /// Generate a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an article ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns `IdError::Malformed` if the input is not a UUID.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        Uuid::parse_str(s).map(Self).map_err(|_| IdError::Malformed {
            kind: "article",
            value: s.to_owned(),
        })
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for ArticleId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ArticleId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Uuid as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ArticleId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <Uuid as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(id))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ArticleId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Uuid as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
