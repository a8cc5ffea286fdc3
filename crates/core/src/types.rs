use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(ShareCode, "A short, human-shareable code addressing one session.");
newtype_string!(SessionId, "Identity of one stored session record.");

/// Longest code accepted from callers. Generated codes are far shorter.
const MAX_CODE_LEN: usize = 64;

impl ShareCode {
    /// Parse a caller-supplied code.
    ///
    /// The match is exact: only lowercase ASCII letters and digits, with no
    /// surrounding whitespace. Anything else can never have been issued, so
    /// callers treat it as not found.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty()
            || raw.len() > MAX_CODE_LEN
            || !raw
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return None;
        }
        Some(Self(raw.to_owned()))
    }
}

impl SessionId {
    /// Generate a fresh, time-ordered session identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}
