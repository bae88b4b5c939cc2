//! Identifier newtype macros.
//!
//! Used by `value_objects::ids` to generate strong-typed identifiers so that a
//! `KnowledgeBaseId` and a `KnowledgeItemId` can never be confused at a call site.

/// Define a strong-typed UUID identifier.
///
/// Generates a newtype wrapping `uuid::Uuid` with `Display`, `FromStr`-free string
/// parsing (via `from_string`), and deterministic v5 derivation (`from_name`) so the
/// same external id always maps to the same internal id across a process restart.
#[macro_export]
macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            derive_more::Display,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[display("{_0}")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Derive a deterministic identifier from an external, caller-supplied id.
            ///
            /// Scoped per type so `KnowledgeBaseId::from_name("x")` and
            /// `KnowledgeItemId::from_name("x")` never collide.
            #[must_use]
            pub fn from_name(name: &str) -> Self {
                let ns =
                    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, stringify!($name).as_bytes());
                Self(uuid::Uuid::new_v5(&ns, name.as_bytes()))
            }

            /// Parse from a string: tries UUID first, falls back to `from_name`.
            #[must_use]
            pub fn from_string(s: &str) -> Self {
                match uuid::Uuid::parse_str(s) {
                    Ok(u) => Self(u),
                    Err(_) => Self::from_name(s),
                }
            }

            /// Hyphenated UUID string.
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn inner(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
