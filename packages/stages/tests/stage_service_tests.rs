// ABOUTME: Integration tests for the stage service
// ABOUTME: Tests guarded transitions, archive read-only rule, checklist idempotency, and task editing

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rfpdesk_activity::{ActivityKind, ActivitySink, NewActivity};
use rfpdesk_core::{FixedClock, Stage};
use rfpdesk_rfps::{RfpCreateInput, RfpStorage, RfpTimeline, RfpUpdateInput};
use rfpdesk_stages::{
    stage_checklist, run_stage_automations, StageError, StageService, StageTaskCreateInput,
    StageTaskStorage, StageTaskUpdateInput,
};
use rfpdesk_storage::{in_memory_pool, StorageError};
use sqlx::SqlitePool;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ActivityKind>>,
}

impl RecordingSink {
    fn kinds(&self) -> Vec<ActivityKind> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySink for RecordingSink {
    async fn record(&self, event: NewActivity) {
        self.events.lock().unwrap().push(event.event_type);
    }
}

struct Fixture {
    pool: SqlitePool,
    rfps: RfpStorage,
    service: StageService,
    sink: Arc<RecordingSink>,
    clock: FixedClock,
}

async fn setup() -> Fixture {
    let pool = in_memory_pool().await.unwrap();
    let now = Utc::now();

    sqlx::query("INSERT INTO companies (id, name, created_at) VALUES ('co-1', 'Buyer Co', ?)")
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO users (id, email, name, role, company_id, created_at) VALUES ('user-1', 'b@buyer.test', 'Buyer', 'buyer', 'co-1', ?)",
    )
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap());
    let sink = Arc::new(RecordingSink::default());
    let rfps = RfpStorage::new(pool.clone());
    let service = StageService::new(
        rfps.clone(),
        StageTaskStorage::new(pool.clone()),
        sink.clone(),
        Arc::new(clock.clone()),
    );

    Fixture {
        pool,
        rfps,
        service,
        sink,
        clock,
    }
}

async fn create_rfp(f: &Fixture) -> String {
    f.rfps
        .create_rfp(
            "co-1",
            "user-1",
            RfpCreateInput {
                title: "Managed print services".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_forward_transition_creates_checklist_and_logs() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    let outcome = f
        .service
        .transition(&rfp_id, Stage::Qualification, Some("user-1"))
        .await
        .unwrap();

    assert_eq!(outcome.rfp.stage, Stage::Qualification);
    assert_eq!(outcome.rfp.stage_entered_at, Some(f.clock_now()));
    assert_eq!(outcome.rfp.version, 2);
    assert_eq!(
        outcome.tasks_created.len(),
        stage_checklist(Stage::Qualification).len()
    );
    assert!(outcome.tasks_created.iter().all(|t| t.auto_created));
    assert_eq!(f.sink.kinds(), vec![ActivityKind::StageChanged]);
}

#[tokio::test]
async fn test_created_rfp_gets_intake_checklist() {
    let f = setup().await;

    let outcome = f
        .service
        .create_rfp(
            "co-1",
            "user-1",
            RfpCreateInput {
                title: "Office cleaning".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.rfp.stage, Stage::Intake);
    assert_eq!(outcome.rfp.stage_entered_at, Some(f.clock_now()));

    let tasks = f
        .service
        .list_tasks(&outcome.rfp.id, Some(Stage::Intake))
        .await
        .unwrap();
    let mut titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
    titles.sort_unstable();
    let mut expected = stage_checklist(Stage::Intake).to_vec();
    expected.sort_unstable();
    assert_eq!(titles, expected);
    assert!(tasks.iter().all(|t| t.auto_created && !t.completed));
    assert_eq!(outcome.tasks_created.len(), tasks.len());
    assert_eq!(f.sink.kinds(), vec![ActivityKind::RfpCreated]);

    // Rework back into INTAKE later does not duplicate the checklist
    f.service
        .transition(&outcome.rfp.id, Stage::Qualification, Some("user-1"))
        .await
        .unwrap();
    let rework = f
        .service
        .transition(&outcome.rfp.id, Stage::Intake, Some("user-1"))
        .await
        .unwrap();
    assert!(rework.tasks_created.is_empty());
}

#[tokio::test]
async fn test_invalid_transition_is_rejected_without_changes() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    let err = f
        .service
        .transition(&rfp_id, Stage::Drafting, Some("user-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, StageError::InvalidTransition(_)));
    let rfp = f.rfps.get_rfp(&rfp_id).await.unwrap();
    assert_eq!(rfp.stage, Stage::Intake);
    assert_eq!(rfp.version, 1);
    assert!(f.sink.kinds().is_empty());
}

#[tokio::test]
async fn test_reentering_stage_does_not_duplicate_checklist() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    f.service
        .transition(&rfp_id, Stage::Qualification, None)
        .await
        .unwrap();
    f.service.transition(&rfp_id, Stage::Intake, None).await.unwrap();
    let again = f
        .service
        .transition(&rfp_id, Stage::Qualification, None)
        .await
        .unwrap();

    assert!(again.tasks_created.is_empty());
    let tasks = f
        .service
        .list_tasks(&rfp_id, Some(Stage::Qualification))
        .await
        .unwrap();
    assert_eq!(tasks.len(), stage_checklist(Stage::Qualification).len());
}

#[tokio::test]
async fn test_automation_skips_manually_created_equivalent_title() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;
    let storage = StageTaskStorage::new(f.pool.clone());

    storage
        .create_task(
            &rfp_id,
            Stage::Qualification,
            "  complete GO/NO-GO   assessment ",
            Some("user-1"),
            Utc::now(),
        )
        .await
        .unwrap();

    let created = run_stage_automations(&storage, &rfp_id, Stage::Qualification, Utc::now())
        .await
        .unwrap();

    assert_eq!(
        created.len(),
        stage_checklist(Stage::Qualification).len() - 1
    );
}

#[tokio::test]
async fn test_archive_sets_metadata_and_blocks_further_changes() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    let outcome = f
        .service
        .transition(&rfp_id, Stage::Archived, Some("user-1"))
        .await
        .unwrap();

    assert!(outcome.rfp.is_archived);
    assert_eq!(outcome.rfp.archived_by.as_deref(), Some("user-1"));
    assert!(outcome.tasks_created.is_empty());
    assert_eq!(
        f.sink.kinds(),
        vec![ActivityKind::StageChanged, ActivityKind::RfpArchived]
    );

    let err = f
        .service
        .transition(&rfp_id, Stage::Intake, Some("user-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::ArchivedReadOnly(_)));

    let err = f
        .service
        .create_task(
            &rfp_id,
            StageTaskCreateInput {
                title: "Late task".to_string(),
                stage: None,
            },
            Some("user-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::ArchivedReadOnly(_)));
}

#[tokio::test]
async fn test_submission_requires_window_and_debrief_requires_deadline() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    for stage in [
        Stage::Qualification,
        Stage::Discovery,
        Stage::Drafting,
        Stage::PricingLegalReview,
        Stage::ExecReview,
    ] {
        f.service.transition(&rfp_id, stage, None).await.unwrap();
    }

    let err = f
        .service
        .transition(&rfp_id, Stage::Submission, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::InvalidTransition(_)));

    let deadline = f.clock_now() + Duration::days(2);
    let rfp = f.rfps.get_rfp(&rfp_id).await.unwrap();
    f.rfps
        .update_rfp(
            &rfp_id,
            rfp.version,
            RfpUpdateInput {
                timeline: RfpTimeline {
                    submission_end: Some(deadline),
                    ..Default::default()
                },
                ..Default::default()
            },
            f.clock_now(),
        )
        .await
        .unwrap();

    f.service
        .transition(&rfp_id, Stage::Submission, None)
        .await
        .unwrap();

    let decision = f
        .service
        .validate_transition(&rfp_id, Stage::Debrief)
        .await
        .unwrap();
    assert!(!decision.valid);

    f.clock.set(deadline);
    let outcome = f
        .service
        .transition(&rfp_id, Stage::Debrief, None)
        .await
        .unwrap();
    assert_eq!(outcome.rfp.stage, Stage::Debrief);
}

#[tokio::test]
async fn test_task_completion_and_duplicate_titles() {
    let f = setup().await;
    let rfp_id = create_rfp(&f).await;

    let task = f
        .service
        .create_task(
            &rfp_id,
            StageTaskCreateInput {
                title: "Call the incumbent".to_string(),
                stage: None,
            },
            Some("user-1"),
        )
        .await
        .unwrap();
    assert_eq!(task.stage, Stage::Intake);
    assert!(!task.auto_created);

    let err = f
        .service
        .create_task(
            &rfp_id,
            StageTaskCreateInput {
                title: "call the INCUMBENT".to_string(),
                stage: None,
            },
            Some("user-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StageError::Storage(StorageError::Duplicate { .. })
    ));

    let done = f
        .service
        .update_task(
            &rfp_id,
            &task.id,
            StageTaskUpdateInput {
                completed: Some(true),
                ..Default::default()
            },
            Some("user-1"),
        )
        .await
        .unwrap();
    assert!(done.completed);
    assert_eq!(done.completed_at, Some(f.clock_now()));

    let reopened = f
        .service
        .update_task(
            &rfp_id,
            &task.id,
            StageTaskUpdateInput {
                completed: Some(false),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, None);
}

#[tokio::test]
async fn test_update_task_of_other_rfp_is_not_found() {
    let f = setup().await;
    let rfp_a = create_rfp(&f).await;
    let rfp_b = create_rfp(&f).await;

    let task = f
        .service
        .create_task(
            &rfp_a,
            StageTaskCreateInput {
                title: "Only on A".to_string(),
                stage: None,
            },
            None,
        )
        .await
        .unwrap();

    let err = f
        .service
        .update_task(&rfp_b, &task.id, StageTaskUpdateInput::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StageError::Storage(StorageError::NotFound { .. })
    ));
}

impl Fixture {
    fn clock_now(&self) -> chrono::DateTime<Utc> {
        use rfpdesk_core::Clock;
        self.clock.now()
    }
}
