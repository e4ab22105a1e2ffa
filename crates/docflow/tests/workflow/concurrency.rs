//! Contended transitions on the same document.

use docflow::{
    DocumentStore, Error, InMemoryStore, Role, Stage, TransitionEngine, TransitionRequest,
};

use crate::support::{T0, drive, invoice, service_at};

#[tokio::test]
async fn same_snapshot_yields_one_winner_and_one_conflict() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-900", "Server rack")).await?;
    let doc = drive(&service, &doc, &[(Role::Requester, Stage::Submitted)]).await?;

    // Two finance actors both read the document while it is Submitted.
    let engine = TransitionEngine::default();
    let snapshot = service.get_document(&doc.id).await?;
    let review =
        TransitionRequest::new(doc.id.clone(), Stage::Submitted, Role::FinanceActor, Stage::Review);
    let reject = TransitionRequest::new(
        doc.id.clone(),
        Stage::Submitted,
        Role::FinanceActor,
        Stage::Rejected,
    );
    let first = engine.decide(&snapshot, &review, T0)?;
    let second = engine.decide(&snapshot, &reject, T0)?;

    let store: &InMemoryStore = service.store();
    store.apply_transition(first).await?;
    let err = store.apply_transition(second).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        Error::Conflict { expected: Stage::Submitted, actual: Stage::Review, .. }
    ));

    let history = service.history(&doc.id).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].to_status, Stage::Review);
    assert_eq!(service.get_document(&doc.id).await?.current_status, Stage::Review);
    service.verify_history(&doc.id).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reviewers_advance_document_once() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-901", "Projector")).await?;
    drive(&service, &doc, &[(Role::Requester, Stage::Submitted)]).await?;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let request = TransitionRequest::new(
                doc.id.clone(),
                Stage::Submitted,
                Role::FinanceActor,
                Stage::Review,
            );
            tokio::spawn(async move { service.transition(request).await })
        })
        .collect();

    let mut accepted = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => accepted += 1,
            Err(Error::Conflict { expected: Stage::Submitted, actual: Stage::Review, .. }) => {
                conflicts += 1
            }
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!((accepted, conflicts), (1, 7));
    let history = service.history(&doc.id).await?;
    assert_eq!(history.len(), 2);
    service.verify_history(&doc.id).await?;
    Ok(())
}
