//! Integration tests for PgStore.

use docflow::{
    AuditStore, Catalog, DocumentStore, Error, Owner, PgStore, Role, Stage, StageRegistry,
};
use test_utils::db_test;

use crate::support::{count_history, decide, draft, init_test_tracing};

// =============================================================================
// Documents
// =============================================================================

db_test!(create_and_fetch_round_trip, |pool| {
    init_test_tracing();
    let store = PgStore::new(pool.clone());

    let doc = store.create_document(draft("INV-1")).await?;
    let fetched = store.get_document(&doc.id).await?;
    assert_eq!(fetched.as_ref(), Some(&doc));

    let listed = store.list_documents().await?;
    assert_eq!(listed, vec![doc]);
    Ok(())
});

db_test!(duplicate_document_number_is_rejected, |pool| {
    let store = PgStore::new(pool.clone());
    store.create_document(draft("INV-1")).await?;

    let err = store.create_document(draft("INV-1")).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateDocumentNumber(ref n) if n == "INV-1"));
    assert_eq!(store.list_documents().await?.len(), 1);

    // numbers are compared case-sensitively
    store.create_document(draft("inv-1")).await?;
    Ok(())
});

// =============================================================================
// Transitions
// =============================================================================

db_test!(apply_transition_updates_status_and_history, |pool| {
    let store = PgStore::new(pool.clone());
    let doc = store.create_document(draft("INV-1")).await?;

    let applied = store
        .apply_transition(decide(&doc, Role::Requester, Stage::Submitted)?)
        .await?;
    assert_eq!(applied.document.current_status, Stage::Submitted);
    assert_eq!(applied.document.owner, Owner::FinanceDepartment);
    assert_eq!(applied.entry.from_status, Stage::Draft);
    assert_eq!(applied.entry.acted_by, "User User");

    let applied = store
        .apply_transition(decide(&applied.document, Role::FinanceActor, Stage::Review)?)
        .await?;

    let history = store.list_history(&doc.id).await?;
    assert_eq!(history.len(), 2);
    assert!(history[0].id < history[1].id);
    assert_eq!(history[1], applied.entry);
    Ok(())
});

db_test!(stale_transition_conflicts, |pool| {
    let store = PgStore::new(pool.clone());
    let doc = store.create_document(draft("INV-1")).await?;

    let first = decide(&doc, Role::Requester, Stage::Submitted)?;
    let second = decide(&doc, Role::Requester, Stage::Submitted)?;
    store.apply_transition(first).await?;

    let err = store.apply_transition(second).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Conflict { expected: Stage::Draft, actual: Stage::Submitted, .. }
    ));
    assert_eq!(count_history(&store).await?, 1);
    Ok(())
});

db_test!(concurrent_writers_produce_one_entry, |pool| {
    let store = PgStore::new(pool.clone());
    let doc = store.create_document(draft("INV-1")).await?;
    let doc = store
        .apply_transition(decide(&doc, Role::Requester, Stage::Submitted)?)
        .await?
        .document;

    let review = decide(&doc, Role::FinanceActor, Stage::Review)?;
    let reject = decide(&doc, Role::FinanceActor, Stage::Rejected)?;

    let (a, b) = tokio::join!(
        tokio::spawn({
            let store = store.clone();
            async move { store.apply_transition(review).await }
        }),
        tokio::spawn({
            let store = store.clone();
            async move { store.apply_transition(reject).await }
        }),
    );
    let results = [a?, b?];

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict { .. })))
        .count();
    assert_eq!((accepted, conflicts), (1, 1));
    assert_eq!(count_history(&store).await?, 2);
    Ok(())
});

db_test!(mismatched_entry_writes_nothing, |pool| {
    let store = PgStore::new(pool.clone());
    let a = store.create_document(draft("INV-1")).await?;
    let b = store.create_document(draft("INV-2")).await?;

    let mut transition = decide(&a, Role::Requester, Stage::Submitted)?;
    transition.entry.document_id = b.id.clone();
    let err = store.apply_transition(transition).await.unwrap_err();
    assert!(matches!(err, Error::MalformedAuditEntry { .. }));

    let stored = store.get_document(&a.id).await?;
    assert_eq!(stored.map(|d| d.current_status), Some(Stage::Draft));
    assert_eq!(count_history(&store).await?, 0);
    Ok(())
});

db_test!(missing_document_is_not_found, |pool| {
    let store = PgStore::new(pool.clone());
    let orphan = draft("INV-404");

    let err = store
        .apply_transition(decide(&orphan, Role::Requester, Stage::Submitted)?)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(_)));
    assert!(store.get_document(&orphan.id).await?.is_none());
    Ok(())
});

// =============================================================================
// Catalogs
// =============================================================================

db_test!(stage_catalog_matches_standard_registry, |pool| {
    let store = PgStore::new(pool.clone());
    assert_eq!(store.stage_registry().await?, StageRegistry::standard());
    Ok(())
});

db_test!(document_types_are_ordered, |pool| {
    sqlx::query(
        "INSERT INTO docflow.document_types (name, position) VALUES ('Receipt', 2), ('Invoice', 1)",
    )
    .execute(pool)
    .await?;

    let store = PgStore::new(pool.clone());
    assert_eq!(store.document_types().await?, vec!["Invoice", "Receipt"]);
    Ok(())
});
