// ABOUTME: Integration tests for RFP storage
// ABOUTME: Tests create/update validation, optimistic versioning, archiving, and supplier visibility

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rfpdesk_core::{RfpStatus, Stage};
use rfpdesk_rfps::{
    ClearableField, RfpCreateInput, RfpStorage, RfpTimeline, RfpUpdateInput, StageChange,
};
use rfpdesk_storage::{in_memory_pool, StorageError};
use sqlx::SqlitePool;

async fn create_test_db() -> SqlitePool {
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

    pool
}

fn input(title: &str) -> RfpCreateInput {
    RfpCreateInput {
        title: title.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_rfp_defaults() {
    let storage = RfpStorage::new(create_test_db().await);
    let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();

    let rfp = storage
        .create_rfp("co-buyer", "user-1", input("  Cloud hosting  "), now)
        .await
        .unwrap();

    assert!(rfp.id.starts_with("rfp-"));
    assert_eq!(rfp.title, "Cloud hosting");
    assert_eq!(rfp.stage, Stage::Intake);
    assert_eq!(rfp.status, RfpStatus::Draft);
    assert_eq!(rfp.stage_entered_at, Some(now));
    assert_eq!(rfp.version, 1);
    assert!(!rfp.is_archived);
    assert!(rfp.timeline_state.is_none());
}

#[tokio::test]
async fn test_create_rfp_rejects_blank_title() {
    let storage = RfpStorage::new(create_test_db().await);

    let err = storage
        .create_rfp("co-buyer", "user-1", input("   "), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_get_missing_rfp_is_not_found() {
    let storage = RfpStorage::new(create_test_db().await);
    let err = storage.get_rfp("rfp-nope").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "rfp", .. }));
}

#[tokio::test]
async fn test_update_bumps_version_and_rejects_stale_writes() {
    let storage = RfpStorage::new(create_test_db().await);
    let rfp = storage
        .create_rfp("co-buyer", "user-1", input("Hosting"), Utc::now())
        .await
        .unwrap();

    let deadline = Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap();
    let edited_at = Utc.with_ymd_and_hms(2026, 6, 1, 8, 30, 0).unwrap();
    let updated = storage
        .update_rfp(
            &rfp.id,
            rfp.version,
            RfpUpdateInput {
                status: Some(RfpStatus::Published),
                stage_sla_days: Some(9),
                timeline: RfpTimeline {
                    submission_end: Some(deadline),
                    ..Default::default()
                },
                ..Default::default()
            },
            edited_at,
        )
        .await
        .unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.updated_at, edited_at);
    assert_eq!(updated.status, RfpStatus::Published);
    assert_eq!(updated.stage_sla_days, Some(9));
    assert_eq!(updated.timeline.submission_end, Some(deadline));

    // Same stale version again
    let err = storage
        .update_rfp(
            &rfp.id,
            rfp.version,
            RfpUpdateInput {
                title: Some("Other".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));
}

#[tokio::test]
async fn test_update_clears_optional_fields() {
    let storage = RfpStorage::new(create_test_db().await);
    let deadline = Utc.with_ymd_and_hms(2026, 6, 30, 17, 0, 0).unwrap();
    let rfp = storage
        .create_rfp(
            "co-buyer",
            "user-1",
            RfpCreateInput {
                title: "Hosting".to_string(),
                description: Some("Three regions".to_string()),
                stage_sla_days: Some(9),
                timeline: RfpTimeline {
                    submission_end: Some(deadline),
                    award_date: Some(deadline + Duration::days(7)),
                    ..Default::default()
                },
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let input: RfpUpdateInput = serde_json::from_value(serde_json::json!({
        "clear": ["stageSlaDays", "submissionEnd", "description"]
    }))
    .unwrap();
    let cleared = storage
        .update_rfp(&rfp.id, rfp.version, input, Utc::now())
        .await
        .unwrap();

    assert_eq!(cleared.version, rfp.version + 1);
    assert_eq!(cleared.stage_sla_days, None);
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.timeline.submission_end, None);
    assert_eq!(cleared.timeline.award_date, rfp.timeline.award_date);

    // Setting and clearing the same field is rejected
    let err = storage
        .update_rfp(
            &rfp.id,
            cleared.version,
            RfpUpdateInput {
                stage_sla_days: Some(4),
                clear: vec![ClearableField::StageSlaDays],
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Validation(_)));
}

#[tokio::test]
async fn test_update_stage_to_archived_sets_metadata_and_freezes_row() {
    let storage = RfpStorage::new(create_test_db().await);
    let rfp = storage
        .create_rfp("co-buyer", "user-1", input("Hosting"), Utc::now())
        .await
        .unwrap();

    let at = Utc::now() + Duration::hours(1);
    let archived = storage
        .update_stage(
            &rfp.id,
            StageChange {
                expected_version: rfp.version,
                stage: Stage::Archived,
                entered_at: at,
                archived_by: Some("user-1".to_string()),
            },
        )
        .await
        .unwrap();

    assert!(archived.is_archived);
    assert!(archived.is_read_only());
    assert_eq!(archived.archived_at, Some(at));
    assert_eq!(archived.archived_by.as_deref(), Some("user-1"));

    // Archived rows never match the guarded UPDATE
    let err = storage
        .update_rfp(
            &rfp.id,
            archived.version,
            RfpUpdateInput {
                title: Some("Changed".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));
}

#[tokio::test]
async fn test_list_rfps_hides_archived_by_default() {
    let storage = RfpStorage::new(create_test_db().await);
    let keep = storage
        .create_rfp("co-buyer", "user-1", input("Keep"), Utc::now())
        .await
        .unwrap();
    let gone = storage
        .create_rfp("co-buyer", "user-1", input("Gone"), Utc::now())
        .await
        .unwrap();
    storage
        .update_stage(
            &gone.id,
            StageChange {
                expected_version: gone.version,
                stage: Stage::Archived,
                entered_at: Utc::now(),
                archived_by: None,
            },
        )
        .await
        .unwrap();

    let (active, total) = storage
        .list_rfps_paginated("co-buyer", false, None, None)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(active[0].id, keep.id);

    let (all, total) = storage
        .list_rfps_paginated("co-buyer", true, Some(10), Some(0))
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_supplier_sees_only_invited_rfps() {
    let pool = create_test_db().await;
    let storage = RfpStorage::new(pool.clone());
    let invited = storage
        .create_rfp("co-buyer", "user-1", input("Invited"), Utc::now())
        .await
        .unwrap();
    storage
        .create_rfp("co-buyer", "user-1", input("Private"), Utc::now())
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO supplier_contacts (id, rfp_id, supplier_company_id, email, status, invited_at) VALUES ('sc-1', ?, 'co-supplier', 's@supplier.test', 'invited', ?)",
    )
    .bind(&invited.id)
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let (visible, total) = storage
        .list_invited_rfps_paginated("co-supplier", None, None)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(visible[0].id, invited.id);
}

#[tokio::test]
async fn test_write_timeline_state_with_auto_advance() {
    let storage = RfpStorage::new(create_test_db().await);
    let rfp = storage
        .create_rfp("co-buyer", "user-1", input("Hosting"), Utc::now())
        .await
        .unwrap();

    let now = Utc::now();
    let state = serde_json::json!({"schemaVersion": 1, "appliedActions": []});
    let mut tx = storage.pool().begin().await.unwrap();
    RfpStorage::write_timeline_state(&mut *tx, &rfp.id, rfp.version, &state, Some(Stage::Debrief), now)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let after = storage.get_rfp(&rfp.id).await.unwrap();
    assert_eq!(after.stage, Stage::Debrief);
    assert_eq!(after.stage_entered_at, Some(now));
    assert_eq!(after.version, rfp.version + 1);
    assert_eq!(after.timeline_state, Some(state.to_string()));

    // Stale version is a conflict
    let err = RfpStorage::write_timeline_state(
        storage.pool(),
        &rfp.id,
        rfp.version,
        &serde_json::json!({}),
        None,
        now,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { .. }));
}
