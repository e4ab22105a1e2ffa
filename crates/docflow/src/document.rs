//! Documents tracked through the approval workflow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Owner;
use crate::stage::Stage;

/// Opaque document identifier, assigned by the store at creation.
///
/// # Example
///
/// ```
/// use docflow::DocumentId;
///
/// let id = DocumentId::new("doc-123");
/// assert_eq!(id.as_str(), "doc-123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A business document (invoice or expense record) and its workflow position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Caller-supplied human identifier, unique across all documents.
    pub document_number: String,
    /// Category label from the document-type catalog.
    pub document_type: String,
    pub description: String,
    pub current_status: Stage,
    pub created_by: String,
    /// Locale-formatted creation timestamp, see [`crate::temporal`].
    pub created_at: String,
    pub owner: Owner,
}

/// Input for creating a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub document_number: String,
    pub document_type: String,
    pub description: String,
    pub created_by: String,
}

impl NewDocument {
    pub fn new(
        document_number: impl Into<String>,
        document_type: impl Into<String>,
        description: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            document_number: document_number.into(),
            document_type: document_type.into(),
            description: description.into(),
            created_by: created_by.into(),
        }
    }

    /// Materialize the document in its initial state: Draft, owned by the requester.
    pub fn into_document(self, id: DocumentId, created_at: impl Into<String>) -> Document {
        Document {
            id,
            document_number: self.document_number,
            document_type: self.document_type,
            description: self.description,
            current_status: Stage::Draft,
            created_by: self.created_by,
            created_at: created_at.into(),
            owner: Owner::Requester,
        }
    }
}
