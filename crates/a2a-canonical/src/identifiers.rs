use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    SessionId,
    "Trace session identifier, also used as the local trace file name (pattern: `[A-Za-z0-9][A-Za-z0-9._:-]{0,127}`).",
    r"^[A-Za-z0-9][A-Za-z0-9._:-]{0,127}$"
);
newtype!(
    ContentId,
    "Identifier returned by a content-addressed store (CIDv0 base58, CIDv1 base32 or base64url).",
    r"^[A-Za-z0-9_-]{8,256}$"
);
newtype!(
    TxRef,
    "Ledger transaction reference: 64 hex characters.",
    r"^[A-Fa-f0-9]{64}$"
);
newtype!(
    Timestamp,
    "RFC3339 timestamp with `Z` or numeric offset suffix.",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?(Z|[+-]\d{2}:\d{2})$"
);

impl Timestamp {
    /// Current UTC time in RFC3339 form with microsecond precision.
    pub fn now() -> Self {
        Self(
            chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Micros, false),
        )
    }
}
