//! In-process store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AppliedTransition, AuditStore, Catalog, DocumentStore};
use crate::audit::{AuditLog, HistoryEntry};
use crate::document::{Document, DocumentId};
use crate::error::{Error, Result};
use crate::stage::StageRegistry;
use crate::transition::Transition;

/// Store that keeps documents and history in memory.
///
/// Clones share the same data. All writes take one exclusive lock, so a
/// status update and its history entry become visible together.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    registry: Arc<StageRegistry>,
    document_types: Arc<[String]>,
}

#[derive(Debug, Default)]
struct State {
    /// Creation order.
    documents: Vec<Document>,
    audit: AuditLog,
}

impl State {
    fn position(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|document| &document.id == id)
    }
}

impl InMemoryStore {
    /// Empty store backed by the standard stage catalog and no document types.
    pub fn new() -> Self {
        Self::with_catalogs(StageRegistry::standard(), Vec::new())
    }

    pub fn with_catalogs(registry: StageRegistry, document_types: Vec<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            registry: Arc::new(registry),
            document_types: document_types.into(),
        }
    }

    /// Number of recorded history entries across all documents.
    pub async fn history_len(&self) -> usize {
        self.state.read().await.audit.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryStore {
    async fn create_document(&self, document: Document) -> Result<Document> {
        let mut state = self.state.write().await;

        if state
            .documents
            .iter()
            .any(|existing| existing.document_number == document.document_number)
        {
            return Err(Error::DuplicateDocumentNumber(document.document_number));
        }

        state.documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: &DocumentId) -> Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.position(id).map(|i| state.documents[i].clone()))
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.state.read().await.documents.clone())
    }

    async fn apply_transition(&self, transition: Transition) -> Result<AppliedTransition> {
        transition.check_entry()?;
        let mut state = self.state.write().await;
        let state = &mut *state;

        let Some(i) = state.position(&transition.document_id) else {
            return Err(Error::DocumentNotFound(transition.document_id));
        };

        let actual = state.documents[i].current_status;
        if actual != transition.expected_status {
            debug!(
                document_id = %transition.document_id,
                expected = %transition.expected_status,
                actual = %actual,
                "Status changed before write"
            );
            return Err(Error::conflict(
                transition.document_id,
                transition.expected_status,
                actual,
            ));
        }

        // Append first: a malformed entry leaves the document untouched.
        let entry = state.audit.append(transition.entry)?.clone();

        let document = &mut state.documents[i];
        document.current_status = transition.new_status;
        document.owner = transition.new_owner;

        Ok(AppliedTransition {
            document: document.clone(),
            entry,
        })
    }
}

impl AuditStore for InMemoryStore {
    async fn list_history(&self, id: &DocumentId) -> Result<Vec<HistoryEntry>> {
        let state = self.state.read().await;
        Ok(state.audit.chain(id).cloned().collect())
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn stage_registry(&self) -> Result<StageRegistry> {
        Ok(StageRegistry::clone(&self.registry))
    }

    async fn document_types(&self) -> Result<Vec<String>> {
        Ok(self.document_types.to_vec())
    }
}
