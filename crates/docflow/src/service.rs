//! Document service entrypoint.

use tracing::{debug, info, warn};

use crate::audit::{AuditLog, HistoryEntry};
use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::document::{Document, DocumentId, NewDocument};
use crate::error::{Error, Result};
use crate::query::{DashboardState, DashboardStats, Page, QueryEngine};
use crate::role::Role;
use crate::stage::{MilestoneProgress, StageRegistry};
use crate::store::{AppliedTransition, AuditStore, Catalog, DocumentStore};
use crate::transition::{TransitionEngine, TransitionOption, TransitionRequest};

/// Summary cards plus the requested page of matching documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub page: Page<Document>,
}

/// App-facing document service.
///
/// This is the single entrypoint for creating documents and moving them
/// through the workflow. Every transition is validated by the
/// [`TransitionEngine`] against the document as read, then handed to the
/// store, which re-checks the status under its own lock.
#[derive(Debug, Clone)]
pub struct DocumentService<S, C> {
    store: S,
    clock: C,
    config: ServiceConfig,
    engine: TransitionEngine,
    query: QueryEngine,
}

impl<S, C> DocumentService<S, C>
where
    S: DocumentStore + AuditStore + Catalog,
    C: Clock,
{
    /// Create a service, loading the stage catalog from the store.
    pub async fn new(store: S, clock: C, config: ServiceConfig) -> Result<Self> {
        let registry = store.stage_registry().await?;
        Ok(Self::with_registry(store, clock, config, registry))
    }

    /// Create a service with an explicit stage catalog.
    pub fn with_registry(store: S, clock: C, config: ServiceConfig, registry: StageRegistry) -> Self {
        let classifier = config.classifier();
        Self {
            engine: TransitionEngine::new(registry, classifier),
            query: QueryEngine::new(classifier, config.page_size),
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &StageRegistry {
        self.engine.registry()
    }

    /// Document-type labels offered at creation.
    pub async fn document_types(&self) -> Result<Vec<String>> {
        self.store.document_types().await
    }

    /// Create a document in Draft, owned by its requester.
    ///
    /// Fails with [`Error::DuplicateDocumentNumber`] if the number is taken.
    pub async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let created_at = self.timestamp_now();
        let document = new.into_document(DocumentId::generate(), created_at);

        match self.store.create_document(document).await {
            Ok(document) => {
                info!(
                    document_id = %document.id,
                    document_number = %document.document_number,
                    "Document created"
                );
                Ok(document)
            }
            Err(err) => {
                warn!(error = %err, "Document creation rejected");
                Err(err)
            }
        }
    }

    /// Fetch a document, failing with [`Error::DocumentNotFound`] if absent.
    pub async fn get_document(&self, id: &DocumentId) -> Result<Document> {
        debug!(document_id = %id, "Loading document");
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| Error::DocumentNotFound(id.clone()))
    }

    /// Actions `role` may take on the document right now.
    pub async fn available_actions(&self, id: &DocumentId, role: Role) -> Result<Vec<TransitionOption>> {
        let document = self.get_document(id).await?;
        Ok(self.engine.options(&document, role))
    }

    /// Progress bar state for a document.
    pub async fn progress(&self, id: &DocumentId) -> Result<Vec<MilestoneProgress>> {
        let document = self.get_document(id).await?;
        Ok(self.registry().progress(document.current_status))
    }

    /// Attempt a transition.
    ///
    /// Returns the updated document and its new history entry. Fails with
    /// [`Error::IllegalTransition`] if the role may not make the move, or
    /// [`Error::Conflict`] if the document is no longer in the request's
    /// expected status, whether it moved before this read or before the write.
    pub async fn transition(&self, request: TransitionRequest) -> Result<AppliedTransition> {
        let document = self.get_document(&request.document_id).await?;
        let now = self.clock.now();

        let transition = match self.engine.decide(&document, &request, now) {
            Ok(transition) => transition,
            Err(err) => {
                warn!(
                    document_id = %request.document_id,
                    role = %request.role,
                    from = %document.current_status,
                    to = %request.target,
                    "Transition refused"
                );
                return Err(err);
            }
        };

        match self.store.apply_transition(transition).await {
            Ok(applied) => {
                info!(
                    document_id = %applied.document.id,
                    role = %request.role,
                    from = %applied.entry.from_status,
                    to = %applied.entry.to_status,
                    owner = %applied.document.owner,
                    "Transition applied"
                );
                Ok(applied)
            }
            Err(err) => {
                warn!(
                    document_id = %request.document_id,
                    role = %request.role,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Transition not written"
                );
                Err(err)
            }
        }
    }

    /// History of a document, newest first.
    pub async fn history(&self, id: &DocumentId) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.store.list_history(id).await?;
        entries.reverse();
        Ok(entries)
    }

    /// Check that a document's recorded history replays to its stored status.
    pub async fn verify_history(&self, id: &DocumentId) -> Result<()> {
        let document = self.get_document(id).await?;
        let log = AuditLog::from_entries(self.store.list_history(id).await?);
        log.verify(&document)
    }

    /// Summary cards and one page of filtered documents, evaluated at the
    /// clock's current instant.
    pub async fn dashboard(&self, state: &DashboardState) -> Result<Dashboard> {
        let documents = self.store.list_documents().await?;
        let now = self.clock.now();

        let stats = self.query.aggregate(&documents, now);
        let matched = self.query.query(&documents, state.query(), now);
        let page = self.query.paginate(&matched, state.page()).map(Document::clone);

        debug!(
            total = stats.total,
            matched = page.total_items,
            page = page.page,
            "Dashboard evaluated"
        );
        Ok(Dashboard { stats, page })
    }

    fn timestamp_now(&self) -> String {
        self.query.classifier().format(self.clock.now())
    }
}
