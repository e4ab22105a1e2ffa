//! Document lifecycle through the service facade.

use docflow::{
    AuditLog, Connector, DocumentStore, Error, Owner, Role, Stage, TransitionEngine,
    TransitionRequest,
};

use crate::support::{T0, drive, invoice, service_at};

// =============================================================================
// Submit / reject / resubmit
// =============================================================================

#[tokio::test]
async fn submit_reject_resubmit_records_three_entries() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let d1 = service.create_document(invoice("D1", "Office chairs")).await?;
    assert_eq!((d1.current_status, d1.owner), (Stage::Draft, Owner::Requester));

    let submitted = service
        .transition(TransitionRequest::new(
            d1.id.clone(),
            Stage::Draft,
            Role::Requester,
            Stage::Submitted,
        ))
        .await?;
    assert_eq!(submitted.document.current_status, Stage::Submitted);
    assert_eq!(submitted.document.owner, Owner::FinanceDepartment);
    assert_eq!(service.history(&d1.id).await?.len(), 1);

    let rejected = service
        .transition(
            TransitionRequest::new(d1.id.clone(), Stage::Submitted, Role::FinanceActor, Stage::Rejected)
                .with_comment("Missing receipt"),
        )
        .await?;
    assert_eq!(rejected.document.current_status, Stage::Rejected);
    assert_eq!(rejected.document.owner, Owner::Requester);
    assert_eq!(rejected.entry.comment.as_deref(), Some("Missing receipt"));

    let resubmitted = service
        .transition(TransitionRequest::new(
            d1.id.clone(),
            Stage::Rejected,
            Role::Requester,
            Stage::Submitted,
        ))
        .await?;
    assert_eq!(resubmitted.document.current_status, Stage::Submitted);

    let history = service.history(&d1.id).await?;
    let moves: Vec<_> = history.iter().map(|e| (e.from_status, e.to_status)).collect();
    assert_eq!(
        moves,
        vec![
            (Stage::Rejected, Stage::Submitted),
            (Stage::Submitted, Stage::Rejected),
            (Stage::Draft, Stage::Submitted),
        ]
    );
    assert!(history.windows(2).all(|w| w[0].id > w[1].id));

    assert_eq!(history[1].acted_by, "Accountant User");
    assert_eq!(history[1].action_label, "Changed status to Rejected");
    assert_eq!(history[2].acted_at, "14-10-2567 09:30");

    service.verify_history(&d1.id).await?;
    Ok(())
}

#[tokio::test]
async fn full_forward_path_reaches_completed() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-100", "Laptop")).await?;

    let done = drive(
        &service,
        &doc,
        &[
            (Role::Requester, Stage::Submitted),
            (Role::FinanceActor, Stage::Review),
            (Role::FinanceActor, Stage::Verified),
            (Role::FinanceActor, Stage::Approval),
            (Role::ApprovingManager, Stage::Approved),
            (Role::FinanceActor, Stage::Accounting),
            (Role::FinanceActor, Stage::Posted),
            (Role::FinanceActor, Stage::Payment),
            (Role::FinanceActor, Stage::Paid),
            (Role::FinanceActor, Stage::Completed),
        ],
    )
    .await?;

    assert_eq!(done.current_status, Stage::Completed);
    assert_eq!(done.owner, Owner::Archive);

    for role in Role::ALL {
        assert!(service.available_actions(&doc.id, role).await?.is_empty());
    }

    let err = service
        .transition(TransitionRequest::new(
            doc.id.clone(),
            Stage::Completed,
            Role::FinanceActor,
            Stage::Rejected,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IllegalTransition { from: Stage::Completed, .. }));

    let progress = service.progress(&doc.id).await?;
    assert!(progress.iter().all(|milestone| milestone.reached));
    assert!(progress[..5].iter().all(|m| m.connector == Some(Connector::Full)));

    service.verify_history(&doc.id).await?;
    Ok(())
}

#[tokio::test]
async fn only_the_manager_approves() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-200", "Team lunch")).await?;

    let pending = drive(
        &service,
        &doc,
        &[
            (Role::Requester, Stage::Submitted),
            (Role::FinanceActor, Stage::Review),
            (Role::FinanceActor, Stage::Verified),
            (Role::FinanceActor, Stage::Approval),
        ],
    )
    .await?;
    assert_eq!(pending.owner, Owner::Management);

    // finance cannot approve on the manager's behalf
    let err = service
        .transition(TransitionRequest::new(
            doc.id.clone(),
            Stage::Approval,
            Role::FinanceActor,
            Stage::Approved,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IllegalTransition { .. }));

    let approved = drive(&service, &doc, &[(Role::ApprovingManager, Stage::Approved)]).await?;
    assert_eq!(approved.current_status, Stage::Approved);
    assert_eq!(approved.owner, Owner::Management);

    let progress = service.progress(&doc.id).await?;
    let reached: Vec<_> = progress.iter().filter(|m| m.reached).map(|m| m.stage).collect();
    assert_eq!(reached, vec![Stage::Draft, Stage::Review, Stage::Approval]);
    assert_eq!(progress[2].connector, Some(Connector::Half));
    Ok(())
}

#[tokio::test]
async fn administrator_cannot_move_documents() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-300", "Taxi fare")).await?;

    for target in Stage::ALL {
        let err = service
            .transition(TransitionRequest::new(
                doc.id.clone(),
                Stage::Draft,
                Role::Administrator,
                target,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IllegalTransition { role: Role::Administrator, .. }));
    }
    assert!(service.history(&doc.id).await?.is_empty());
    Ok(())
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn duplicate_document_number_creates_nothing() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    service.create_document(invoice("INV-001", "Printer toner")).await?;

    let err = service
        .create_document(invoice("INV-001", "Another toner"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateDocumentNumber(ref n) if n == "INV-001"));

    let documents = service.store().list_documents().await?;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].description, "Printer toner");
    assert_eq!(service.store().history_len().await, 0);
    Ok(())
}

#[tokio::test]
async fn document_types_come_from_catalog() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    assert_eq!(service.document_types().await?, vec!["Invoice", "Expense"]);
    Ok(())
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn replaying_history_reproduces_status() -> anyhow::Result<()> {
    let (service, _) = service_at(T0);
    let doc = service.create_document(invoice("INV-400", "Desk")).await?;

    let current = drive(
        &service,
        &doc,
        &[
            (Role::Requester, Stage::Submitted),
            (Role::FinanceActor, Stage::Review),
            (Role::ApprovingManager, Stage::Rejected),
            (Role::Requester, Stage::Submitted),
            (Role::FinanceActor, Stage::Review),
        ],
    )
    .await?;

    let mut chain = service.history(&doc.id).await?;
    chain.reverse();

    assert_eq!(TransitionEngine::replay(Stage::Draft, &chain), current.current_status);

    let rebuilt = chain.iter().fold(doc.clone(), TransitionEngine::evolve);
    assert_eq!(rebuilt, current);

    let log = AuditLog::from_entries(chain);
    assert_eq!(log.replay(&doc.id, Stage::Draft), Stage::Review);
    log.verify(&current)?;
    Ok(())
}
