//! Typed IDs for document-store references.
//!
//! The document store hands out opaque string keys. Wrapping them keeps a
//! `ModuleId` from being passed where an `ItemId` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers around document-store keys.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Creates an ID from a document-store key.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner key.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_string())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(ModuleId, "Unique identifier for a dashboard module.");
typed_id!(
    ItemId,
    "Unique identifier for a collection item (account, card, deposit, ...)."
);
