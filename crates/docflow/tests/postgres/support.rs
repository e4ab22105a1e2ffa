use docflow::{
    Document, DocumentId, NewDocument, PgStore, Role, Stage, Transition, TransitionEngine,
    TransitionRequest,
};
use time::OffsetDateTime;
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2024-10-14 02:30 UTC);

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("docflow=debug")
        .with_test_writer()
        .try_init();
}

pub fn draft(number: &str) -> Document {
    NewDocument::new(number, "Invoice", "Printer toner", "John Doe")
        .into_document(DocumentId::generate(), "14-10-2567 09:30")
}

pub fn decide(document: &Document, role: Role, target: Stage) -> docflow::Result<Transition> {
    let request =
        TransitionRequest::new(document.id.clone(), document.current_status, role, target);
    TransitionEngine::default().decide(document, &request, NOW)
}

pub async fn count_history(store: &PgStore) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM docflow.history")
        .fetch_one(store.pool())
        .await?;
    Ok(count)
}
