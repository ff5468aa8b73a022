//! Opaque entity identifiers.
//!
//! Every entity in the store carries an id of this shape: a UUID-backed
//! newtype that serializes as a bare string. Keeping them distinct types
//! (rather than passing `String` around) stops a `SubtitleId` finding its
//! way into a function expecting a `VideoId`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap an existing string (e.g. a value read back from the store).
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(VideoId);
entity_id!(SubtitleId);
entity_id!(ReelId);
entity_id!(JobId);
entity_id!(CategoryId);

/// A video's short, globally-unique, human-facing identifier (`code`).
///
/// Unlike [`VideoId`] this is not a UUID: it is the handle used in blob-store
/// paths (`videos/<code>/...`) and is chosen to be short and URL-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoCode(pub String);

impl VideoCode {
    /// Generate a new random code: 8 lowercase-alphanumeric characters.
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(uuid[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(VideoId::new(), VideoId::new());
        assert_ne!(VideoCode::generate(), VideoCode::generate());
    }

    #[test]
    fn video_code_is_eight_chars() {
        assert_eq!(VideoCode::generate().as_str().len(), 8);
    }
}
