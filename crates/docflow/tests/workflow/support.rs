use std::sync::Arc;

use docflow::{
    Document, DocumentService, FixedClock, InMemoryStore, NewDocument, Role, ServiceConfig,
    Stage, StageRegistry, TransitionRequest,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub type TestService = DocumentService<InMemoryStore, Arc<FixedClock>>;

/// 14-10-2567 09:30 in the document locale.
pub const T0: OffsetDateTime = datetime!(2024-10-14 09:30 +7);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("docflow=debug")
        .with_test_writer()
        .try_init();
}

pub fn service_at(now: OffsetDateTime) -> (TestService, Arc<FixedClock>) {
    init_test_tracing();
    let clock = Arc::new(FixedClock::new(now));
    let store = InMemoryStore::with_catalogs(
        StageRegistry::standard(),
        vec!["Invoice".into(), "Expense".into()],
    );
    let service = DocumentService::with_registry(
        store,
        Arc::clone(&clock),
        ServiceConfig::default(),
        StageRegistry::standard(),
    );
    (service, clock)
}

pub fn invoice(number: &str, description: &str) -> NewDocument {
    NewDocument::new(number, "Invoice", description, "John Doe")
}

/// Apply `moves` in order, each as `(role, target)`.
pub async fn drive(
    service: &TestService,
    document: &Document,
    moves: &[(Role, Stage)],
) -> anyhow::Result<Document> {
    let mut current = service.get_document(&document.id).await?;
    for &(role, target) in moves {
        let request =
            TransitionRequest::new(document.id.clone(), current.current_status, role, target);
        current = service.transition(request).await?.document;
    }
    Ok(current)
}
