//! Error types for docflow.

use thiserror::Error;

use crate::document::DocumentId;
use crate::role::Role;
use crate::stage::Stage;

/// A `Result` alias with [`enum@Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docflow operations.
///
/// None of these are fatal to the process. Each one describes a single failed
/// request with enough context for the caller to correct the input or retry.
#[derive(Debug, Error)]
pub enum Error {
    /// The acting role may not move a document from `from` to `to`.
    ///
    /// Recoverable by choosing one of the legal actions for the current state.
    #[error("{role} may not move a document from {from} to {to}")]
    IllegalTransition {
        /// Role that attempted the move.
        role: Role,
        /// Status the document was in when validated.
        from: Stage,
        /// Requested target status.
        to: Stage,
    },

    /// The document changed between validation and write.
    ///
    /// Recoverable by re-fetching the document and retrying.
    #[error("document {document_id} is {actual}, expected {expected}")]
    Conflict {
        /// The contended document.
        document_id: DocumentId,
        /// Status the caller validated against.
        expected: Stage,
        /// Status found at write time.
        actual: Stage,
    },

    /// A document with the same number already exists (case-sensitive match).
    #[error("document number already in use: {0}")]
    DuplicateDocumentNumber(String),

    /// A creation timestamp did not match the strict `DD-MM-YYYY HH:mm` shape.
    #[error("unparseable timestamp: {raw:?}")]
    Unparseable {
        /// The raw timestamp as stored.
        raw: String,
    },

    /// An audit entry was missing required fields or broke the history chain.
    #[error("malformed audit entry for document {document_id:?}: {reason}")]
    MalformedAuditEntry {
        /// Document the entry claimed to belong to (may be empty).
        document_id: String,
        /// What was wrong with the entry.
        reason: &'static str,
    },

    /// No document exists with the given id.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// A status label that does not name a known stage.
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    /// A role label that does not name one of the four roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An owner label that does not name a known department.
    #[error("unknown owner: {0}")]
    UnknownOwner(String),

    /// A stage catalog that cannot back a registry.
    #[error("invalid stage catalog: {0}")]
    InvalidCatalog(String),

    /// PostgreSQL storage error.
    ///
    /// Preserves the full `sqlx::Error` for matching on specific database
    /// error conditions (connection timeout, constraint violation, etc.).
    #[cfg(feature = "postgres")]
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
}

impl Error {
    /// Create an illegal transition error.
    pub fn illegal_transition(role: Role, from: Stage, to: Stage) -> Self {
        Error::IllegalTransition { role, from, to }
    }

    /// Create an optimistic-concurrency conflict error.
    pub fn conflict(document_id: DocumentId, expected: Stage, actual: Stage) -> Self {
        Error::Conflict {
            document_id,
            expected,
            actual,
        }
    }

    /// Create a malformed audit entry error.
    pub fn malformed_entry(document_id: impl Into<String>, reason: &'static str) -> Self {
        Error::MalformedAuditEntry {
            document_id: document_id.into(),
            reason,
        }
    }

    /// Whether re-fetching and retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
