// ABOUTME: Integration tests for supplier responses and readiness persistence
// ABOUTME: Tests invitation, draft editing, submission, readiness recompute, and archived rejection

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rfpdesk_activity::{ActivityLogStorage, DbActivitySink};
use rfpdesk_core::{FixedClock, Stage};
use rfpdesk_rfps::{Rfp, RfpCreateInput, RfpStorage, RfpTimeline, StageChange};
use rfpdesk_scoring::{
    ContactInviteInput, ContactStatus, ContactStorage, ExtractedPricing, ResponseInput,
    ResponseService, ResponseStatus, ResponseStorage, ScoringError,
};
use rfpdesk_storage::{in_memory_pool, StorageError};
use sqlx::SqlitePool;

struct Fixture {
    pool: SqlitePool,
    rfps: RfpStorage,
    service: ResponseService,
    clock: FixedClock,
}

async fn setup() -> Fixture {
    let pool = in_memory_pool().await.unwrap();
    let now = Utc::now();

    for (id, name) in [("co-buyer", "Buyer Co"), ("co-supplier", "Supplier Co")] {
        sqlx::query("INSERT INTO companies (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(now)
            .execute(&pool)
            .await
            .unwrap();
    }
    sqlx::query(
        "INSERT INTO users (id, email, name, role, company_id, created_at) VALUES ('user-1', 'b@buyer.test', 'Buyer', 'buyer', 'co-buyer', ?)",
    )
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap());
    let rfps = RfpStorage::new(pool.clone());
    let service = ResponseService::new(
        rfps.clone(),
        ContactStorage::new(pool.clone()),
        ResponseStorage::new(pool.clone()),
        Arc::new(DbActivitySink::new(ActivityLogStorage::new(pool.clone()))),
        Arc::new(clock.clone()),
    );

    Fixture {
        pool,
        rfps,
        service,
        clock,
    }
}

async fn create_rfp(f: &Fixture) -> Rfp {
    f.rfps
        .create_rfp(
            "co-buyer",
            "user-1",
            RfpCreateInput {
                title: "Payroll outsourcing".to_string(),
                timeline: RfpTimeline {
                    submission_end: Some(Utc.with_ymd_and_hms(2026, 7, 10, 17, 0, 0).unwrap()),
                    ..Default::default()
                },
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap()
}

fn invite(email: &str) -> ContactInviteInput {
    ContactInviteInput {
        email: email.to_string(),
        name: Some("Sam Supplier".to_string()),
        supplier_company_id: Some("co-supplier".to_string()),
    }
}

#[tokio::test]
async fn test_invite_normalizes_email_and_rejects_duplicates() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;

    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("  Sam@Supplier.TEST "), Some("user-1"))
        .await
        .unwrap();
    assert_eq!(contact.email, "sam@supplier.test");
    assert_eq!(contact.status, ContactStatus::Invited);

    let err = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), Some("user-1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Storage(StorageError::Duplicate { .. })
    ));

    let err = f
        .service
        .invite_supplier(&rfp.id, invite("not-an-email"), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Storage(StorageError::Validation(_))
    ));
}

#[tokio::test]
async fn test_submit_computes_and_persists_readiness() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();

    let draft = f
        .service
        .create_response(
            &rfp.id,
            &contact.id,
            ResponseInput {
                answers_total: Some(20),
                answers_completed: Some(15),
                compliance_coverage: Some(80.0),
                extracted_pricing: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(draft.status, ResponseStatus::Draft);
    assert!(draft.readiness_score.is_none());

    let accepted = f.service.contacts().get_contact(&contact.id).await.unwrap();
    assert_eq!(accepted.status, ContactStatus::Accepted);

    f.service
        .update_response(
            &draft.id,
            ResponseInput {
                answers_completed: Some(20),
                extracted_pricing: Some(ExtractedPricing {
                    currency: Some("USD".to_string()),
                    total: Some(48_000.0),
                    line_items: vec![],
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let submitted = f.service.submit_response(&draft.id, None).await.unwrap();

    assert_eq!(submitted.status, ResponseStatus::Submitted);
    assert_eq!(submitted.submitted_at, Some(f.now()));
    // 80*0.35 + 100*0.30 + 100*0.20 + 100*0.15
    assert_eq!(submitted.readiness_score, Some(93.0));
    assert!(submitted.compliance_flags.is_empty());
    let breakdown = submitted.readiness_breakdown.clone().unwrap();
    assert_eq!(breakdown.factors.len(), 4);
    assert_eq!(submitted.readiness_updated_at, Some(f.now()));

    let contact = f.service.contacts().get_contact(&contact.id).await.unwrap();
    assert_eq!(contact.status, ContactStatus::Submitted);

    // Stored breakdown carries its schema version
    let raw: String = sqlx::query_scalar("SELECT readiness_breakdown FROM supplier_responses WHERE id = ?")
        .bind(&draft.id)
        .fetch_one(&f.pool)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["schemaVersion"], serde_json::json!(1));
}

#[tokio::test]
async fn test_readiness_recompute_is_idempotent() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();
    let response = f
        .service
        .create_response(
            &rfp.id,
            &contact.id,
            ResponseInput {
                answers_total: Some(10),
                answers_completed: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let first = f
        .service
        .update_response_readiness(&response.id)
        .await
        .unwrap();
    let second = f
        .service
        .update_response_readiness(&response.id)
        .await
        .unwrap();

    assert_eq!(first.readiness_score, second.readiness_score);
    assert_eq!(first.readiness_breakdown, second.readiness_breakdown);
    assert_eq!(
        first.compliance_flags,
        vec!["LOW_COMPLIANCE_COVERAGE", "INCOMPLETE_ANSWERS", "MISSING_PRICING"]
    );
    // Inputs untouched
    assert_eq!(second.answers_completed, 3);
    assert_eq!(second.status, ResponseStatus::Draft);
}

#[tokio::test]
async fn test_late_submission_is_flagged() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();
    let response = f
        .service
        .create_response(&rfp.id, &contact.id, ResponseInput::default())
        .await
        .unwrap();

    f.clock.advance(Duration::days(30));
    let submitted = f.service.submit_response(&response.id, None).await.unwrap();

    assert!(submitted
        .compliance_flags
        .contains(&"LATE_SUBMISSION".to_string()));
}

#[tokio::test]
async fn test_submitted_response_is_frozen() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();
    let response = f
        .service
        .create_response(&rfp.id, &contact.id, ResponseInput::default())
        .await
        .unwrap();
    f.service.submit_response(&response.id, None).await.unwrap();

    let err = f
        .service
        .update_response(
            &response.id,
            ResponseInput {
                answers_total: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Storage(StorageError::Validation(_))
    ));

    let err = f
        .service
        .submit_response(&response.id, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Storage(StorageError::Validation(_))
    ));
}

#[tokio::test]
async fn test_archived_rfp_rejects_response_edits() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();
    let response = f
        .service
        .create_response(&rfp.id, &contact.id, ResponseInput::default())
        .await
        .unwrap();

    f.rfps
        .update_stage(
            &rfp.id,
            StageChange {
                expected_version: rfp.version,
                stage: Stage::Archived,
                entered_at: Utc::now(),
                archived_by: None,
            },
        )
        .await
        .unwrap();

    let err = f
        .service
        .update_response(&response.id, ResponseInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScoringError::ArchivedReadOnly(_)));

    let err = f
        .service
        .submit_response(&response.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScoringError::ArchivedReadOnly(_)));

    let err = f
        .service
        .invite_supplier(&rfp.id, invite("other@supplier.test"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScoringError::ArchivedReadOnly(_)));
}

#[tokio::test]
async fn test_answers_cannot_exceed_total() {
    let f = setup().await;
    let rfp = create_rfp(&f).await;
    let contact = f
        .service
        .invite_supplier(&rfp.id, invite("sam@supplier.test"), None)
        .await
        .unwrap();

    let err = f
        .service
        .create_response(
            &rfp.id,
            &contact.id,
            ResponseInput {
                answers_total: Some(5),
                answers_completed: Some(6),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoringError::Storage(StorageError::Validation(_))
    ));
}

impl Fixture {
    fn now(&self) -> chrono::DateTime<Utc> {
        use rfpdesk_core::Clock;
        self.clock.now()
    }
}
