#![allow(unused_imports)]

use anyhow::Context;
use sled::open;
use std::sync::Arc;

use petty_cash::{
    error::WorkflowError,
    request::{RequestDraft, Role, Stage, Status},
    service::WorkflowService,
    store::{COLLECTION_KEY, RequestStore},
};

use tempfile::tempdir; // Use for test db cleanup.

fn draft(requester: &str, concept: &str, amount: &str) -> RequestDraft {
    RequestDraft::new()
        .set_requester(requester)
        .set_venue("Head office")
        .set_cost_center("CC-100")
        .set_concept(concept)
        .set_approver_name("Ana Gomez")
        .set_amount(amount)
}

#[test]
fn create_and_disburse_request() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_create_and_disburse.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    let request = service
        .create(draft("Juan Perez", "Office supplies", "150.50"))
        .context("Request failed on creation: ")?;

    assert_eq!(request.status, Status::Pending);
    assert_eq!(request.history.len(), 1);
    let number = request.number.clone();

    // walk the full pipeline one stage at a time

    let request = service
        .approve(&number, Role::Liaison, "Luis Mora")
        .context("Request failed at liaison approval: ")?;
    assert_eq!(request.status, Status::Management);

    let request = service
        .approve(&number, Role::Manager, "Ana Gomez")
        .context("Request failed at management approval: ")?;
    assert_eq!(request.status, Status::WithCashier);

    let request = service
        .approve(&number, Role::Cashier, "Carla Diaz")
        .context("Request failed at cashier approval: ")?;
    assert_eq!(request.status, Status::CashierApproved);

    let request = service
        .disburse(&number, "Carla Diaz")
        .context("Request failed at disbursement: ")?;

    assert_eq!(request.status, Status::Disbursed);
    assert_eq!(request.rejection_reason, None);
    assert_eq!(request.history.len(), 5);

    // every event carries the status it moved the request into
    let last = request.history.last().unwrap();
    assert_eq!(last.status, Status::Disbursed);
    assert_eq!(last.actor, "Carla Diaz");

    // the persisted copy matches what the service returned
    let stored = service.get(&number)?;
    assert_eq!(stored, request);

    Ok(())
}

#[test]
fn rejection_records_stage_and_reason() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_rejection_stage.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    // one request rejected at each stage of the pipeline
    let at_liaison = service.create(draft("Juan Perez", "Taxi fares", "45"))?;
    let at_management = service.create(draft("Maria Lopez", "Stationery", "60"))?;
    let at_cashier = service.create(draft("Pedro Ruiz", "Coffee supplies", "30"))?;

    let rejected = service.reject(
        &at_liaison.number,
        Role::Liaison,
        "Luis Mora",
        "Wrong cost center",
    )?;
    assert_eq!(rejected.status, Status::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Wrong cost center"));
    assert_eq!(rejected.current_stage(), Stage::Liaison);

    service.approve(&at_management.number, Role::Liaison, "Luis Mora")?;
    let rejected = service.reject(
        &at_management.number,
        Role::Manager,
        "Ana Gomez",
        "Over budget",
    )?;
    assert_eq!(rejected.current_stage(), Stage::Management);

    service.approve(&at_cashier.number, Role::Liaison, "Luis Mora")?;
    service.approve(&at_cashier.number, Role::Manager, "Ana Gomez")?;
    service.approve(&at_cashier.number, Role::Cashier, "Carla Diaz")?;
    // the cashier can still back out after their own approval
    let rejected = service.reject(
        &at_cashier.number,
        Role::Cashier,
        "Carla Diaz",
        "No cash on hand",
    )?;
    assert_eq!(rejected.current_stage(), Stage::Cashier);

    // the rejection event carries the reason as well
    let last = rejected.history.last().unwrap();
    assert_eq!(last.reason.as_deref(), Some("No cash on hand"));

    Ok(())
}

#[test]
fn invalid_transition_leaves_request_untouched() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_invalid_transition.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    let request = service.create(draft("Juan Perez", "Office supplies", "80"))?;
    let number = request.number.clone();

    // a pending request cannot be disbursed
    let err = service.disburse(&number, "Carla Diaz").unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidTransition {
            current: Status::Pending,
            attempted: Status::Disbursed,
        }
    ));

    // a manager cannot act before the liaison
    let err = service.approve(&number, Role::Manager, "Ana Gomez").unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    // requesters hold no transitions at all
    let err = service
        .approve(&number, Role::Requester, "Juan Perez")
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::RoleNotAllowed {
            role: Role::Requester
        }
    ));

    // nothing above may have persisted a change
    let stored = service.get(&number)?;
    assert_eq!(stored.status, Status::Pending);
    assert_eq!(stored.history.len(), 1);

    Ok(())
}

#[test]
fn rejected_requests_are_terminal() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_rejected_terminal.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    let request = service.create(draft("Juan Perez", "Office supplies", "80"))?;
    service.reject(&request.number, Role::Liaison, "Luis Mora", "Duplicate")?;

    for role in [Role::Liaison, Role::Manager, Role::Cashier] {
        let err = service.approve(&request.number, role, "Somebody").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    Ok(())
}

#[test]
fn unknown_number_is_reported() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_unknown_number.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    let err = service.get("CM-2025-0000").unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { .. }));

    let err = service
        .approve("CM-2025-0000", Role::Liaison, "Luis Mora")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { .. }));

    Ok(())
}

#[test]
fn collection_survives_reload_and_erase() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_reload_and_erase.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    let service = WorkflowService::new(RequestStore::new(db));

    service.create(draft("Juan Perez", "Office supplies", "80"))?;
    service.create(draft("Maria Lopez", "Taxi fares", "45.25"))?;

    let loaded = service.store().load()?;
    assert_eq!(loaded.len(), 2);
    // newest requests sit at the front of the collection
    assert_eq!(loaded[0].requester, "Maria Lopez");

    // a load/save cycle is lossless
    service.store().save(&loaded)?;
    assert_eq!(service.store().load()?, loaded);

    service.store().erase()?;
    assert!(service.store().load()?.is_empty());

    Ok(())
}

#[test]
fn corrupt_collection_heals_to_empty() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test_corrupt_collection.db");
    let db = open(db_path)?;
    let db = Arc::new(db);

    // reset the db for each test run
    db.clear()?;

    // plant bytes that are not a valid collection encoding
    db.insert(COLLECTION_KEY, &b"garbage"[..])?;

    let store = RequestStore::new(db.clone());
    assert!(store.load()?.is_empty());

    // the bad value is dropped, not left to fail every later load
    assert!(db.get(COLLECTION_KEY)?.is_none());

    // the store is usable again afterwards
    let service = WorkflowService::new(store);
    service.create(draft("Juan Perez", "Office supplies", "80"))?;
    assert_eq!(service.store().load()?.len(), 1);

    Ok(())
}

#[test]
fn exported_document_restores_into_fresh_store() -> anyhow::Result<()> {
    // Sled uses file-based locking to prevent concurrent access, so only one test
    // can hold the lock at a time. As is good practice in testing create separate
    // databases for each test. The db is created on temp for simplified cleanup.
    let temp_dir = tempdir()?;
    let source_path = temp_dir.path().join("test_export_source.db");
    let target_path = temp_dir.path().join("test_export_target.db");

    let source_db = Arc::new(open(source_path)?);
    source_db.clear()?;
    let source = WorkflowService::new(RequestStore::new(source_db));

    let request = source.create(draft("Juan Perez", "Office supplies", "150.50"))?;
    source.approve(&request.number, Role::Liaison, "Luis Mora")?;

    let document = RequestStore::export(&source.store().load()?)?;

    let target_db = Arc::new(open(target_path)?);
    target_db.clear()?;
    let target = RequestStore::new(target_db);

    target.save(&RequestStore::import(&document)?)?;

    assert_eq!(target.load()?, source.store().load()?);

    Ok(())
}
