//! DocumentService over PgStore.

use std::sync::Arc;

use docflow::{
    CardFilter, DashboardState, DocumentService, FixedClock, NewDocument, Owner, PgStore, Role,
    ServiceConfig, Stage, TransitionRequest,
};
use test_utils::db_test;
use time::Duration;

use crate::support::{NOW, init_test_tracing};

db_test!(submit_reject_resubmit_scenario, |pool| {
    init_test_tracing();
    let service = DocumentService::new(
        PgStore::new(pool.clone()),
        FixedClock::new(NOW),
        ServiceConfig::default(),
    )
    .await?;

    let d1 = service
        .create_document(NewDocument::new("D1", "Invoice", "Office chairs", "John Doe"))
        .await?;

    for (expected, role, target) in [
        (Stage::Draft, Role::Requester, Stage::Submitted),
        (Stage::Submitted, Role::FinanceActor, Stage::Rejected),
        (Stage::Rejected, Role::Requester, Stage::Submitted),
    ] {
        service
            .transition(TransitionRequest::new(d1.id.clone(), expected, role, target))
            .await?;
    }

    let doc = service.get_document(&d1.id).await?;
    assert_eq!(doc.current_status, Stage::Submitted);
    assert_eq!(doc.owner, Owner::FinanceDepartment);

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
    service.verify_history(&d1.id).await?;
    Ok(())
});

db_test!(dashboard_reads_from_postgres, |pool| {
    let clock = Arc::new(FixedClock::new(NOW));
    let service = DocumentService::new(
        PgStore::new(pool.clone()),
        Arc::clone(&clock),
        ServiceConfig::default(),
    )
    .await?;

    service
        .create_document(NewDocument::new("INV-1", "Invoice", "Printer toner", "John Doe"))
        .await?;
    clock.advance(Duration::days(3));

    let mut state = DashboardState::new();
    state.toggle_card(CardFilter::Over3);
    let dashboard = service.dashboard(&state).await?;

    assert_eq!(dashboard.stats.over3, 1);
    assert_eq!(dashboard.page.items.len(), 1);
    assert_eq!(service.registry().label(Stage::Review), "In Review");
    Ok(())
});
