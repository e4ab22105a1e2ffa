//! Storage abstraction for documents, their history and the catalogs.
//!
//! This module provides the [`DocumentStore`], [`AuditStore`] and [`Catalog`]
//! traits that abstract over different storage backends. Two implementations
//! are provided:
//!
//! - [`InMemoryStore`] for tests and single-process embedding
//! - [`PgStore`] for production (requires the `postgres` feature)

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::future::Future;

use async_trait::async_trait;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

use crate::audit::HistoryEntry;
use crate::document::{Document, DocumentId};
use crate::error::Result;
use crate::stage::StageRegistry;
use crate::transition::Transition;

/// A transition as written: the updated document and its recorded history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub document: Document,
    pub entry: HistoryEntry,
}

/// Storage backend for documents.
///
/// Users typically don't interact with this trait directly. Use
/// [`DocumentService`](crate::DocumentService), which validates transitions
/// before handing them to the store.
///
/// # Implementations
///
/// - [`InMemoryStore`] guarded by a single async lock
/// - [`PgStore`] with row-level locking (requires `postgres` feature)
pub trait DocumentStore: Send + Sync + Clone + 'static {
    /// Insert a new document.
    ///
    /// Fails with [`Error::DuplicateDocumentNumber`](crate::Error::DuplicateDocumentNumber)
    /// if the number is already taken. Nothing is written in that case.
    fn create_document(&self, document: Document) -> impl Future<Output = Result<Document>> + Send;

    /// Fetch a document by id.
    fn get_document(
        &self,
        id: &DocumentId,
    ) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// All documents, in creation order.
    fn list_documents(&self) -> impl Future<Output = Result<Vec<Document>>> + Send;

    /// Apply an accepted transition.
    ///
    /// The status/owner update and the history append happen as one atomic
    /// unit, and only if the document is still in `transition.expected_status`.
    /// Otherwise fails with [`Error::Conflict`](crate::Error::Conflict) and
    /// writes nothing.
    fn apply_transition(
        &self,
        transition: Transition,
    ) -> impl Future<Output = Result<AppliedTransition>> + Send;
}

/// Read access to the audit trail.
pub trait AuditStore: Send + Sync + Clone + 'static {
    /// History entries for a document, oldest first.
    fn list_history(
        &self,
        id: &DocumentId,
    ) -> impl Future<Output = Result<Vec<HistoryEntry>>> + Send;
}

/// Read-only administrative catalogs.
///
/// Mutating the catalogs is a separate administrative surface.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// The ordered stage catalog with display metadata.
    async fn stage_registry(&self) -> Result<StageRegistry>;

    /// Document-type labels offered at creation.
    async fn document_types(&self) -> Result<Vec<String>>;
}
