//! Strong-typed identifiers.

define_id!(KnowledgeBaseId, "Strong typed identifier for a knowledge base");

/// Caller-supplied identifier for a knowledge item.
///
/// Unlike [`KnowledgeBaseId`] this is not generated internally: items are owned by an
/// external catalog (out of scope, per the engine's purpose and scope) and this type
/// exists only to prevent a bare `String` from being passed where an item id is
/// expected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct KnowledgeItemId(String);

impl KnowledgeItemId {
    /// Wrap a caller-supplied id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KnowledgeItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for KnowledgeItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for KnowledgeItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
