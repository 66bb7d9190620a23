//! NewType wrappers for the identifiers that flow through the adapter.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a group id where an invitation id is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sanitize::sanitize;

/// Declares a string-backed identifier type.
///
/// Identifiers taken from requests go through `sanitized`, so a value that
/// reaches the Vortex API is never empty and never carries markup characters.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Wrap untrusted input, or `None` when nothing survives sanitization.
            pub fn sanitized(raw: &str) -> Option<Self> {
                sanitize(Some(raw)).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
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

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype_string!(
    /// Identifier of an invitation as issued by the Vortex API.
    ///
    /// Values arriving from path segments or request bodies are sanitized
    /// before being wrapped.
    InvitationId
);

newtype_string!(
    /// Kind of group an invitation is scoped to (e.g., "organization", "team").
    GroupType
);

newtype_string!(
    /// Customer-defined group identifier, unique within its `GroupType`.
    GroupId
);

newtype_string!(
    /// Application user identifier returned by the `authenticate_user` hook.
    ///
    /// This is the customer's own id for the user; it becomes the `userId`
    /// claim of generated JWTs.
    UserId
);
