// ABOUTME: Shared application state handed to every handler
// ABOUTME: Builds storages and services over one SQLite pool and one clock

use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;

use rfpdesk_activity::{ActivityLogStorage, ActivitySink, DbActivitySink, NotificationStorage};
use rfpdesk_auth::{SessionStorage, UserStorage};
use rfpdesk_core::SharedClock;
use rfpdesk_rfps::RfpStorage;
use rfpdesk_scoring::{ContactStorage, ResponseService, ResponseStorage};
use rfpdesk_snapshots::SnapshotService;
use rfpdesk_stages::{StageService, StageTaskStorage};
use rfpdesk_timeline::{TimelineEngine, TimelineEventStorage};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub rfps: RfpStorage,
    pub stages: StageService,
    pub timeline: TimelineEngine,
    pub responses: ResponseService,
    pub snapshots: SnapshotService,
    pub activity_log: ActivityLogStorage,
    pub activity: Arc<dyn ActivitySink>,
    pub notifications: NotificationStorage,
    pub sessions: SessionStorage,
    pub users: UserStorage,
    pub clock: SharedClock,
}

impl AppState {
    pub fn new(pool: SqlitePool, snapshot_ttl: Duration, clock: SharedClock) -> Self {
        let rfps = RfpStorage::new(pool.clone());
        let tasks = StageTaskStorage::new(pool.clone());
        let contacts = ContactStorage::new(pool.clone());
        let responses = ResponseStorage::new(pool.clone());
        let activity_log = ActivityLogStorage::new(pool.clone());
        let notifications = NotificationStorage::new(pool.clone());
        let activity: Arc<dyn ActivitySink> = Arc::new(DbActivitySink::new(activity_log.clone()));

        Self {
            stages: StageService::new(rfps.clone(), tasks.clone(), activity.clone(), clock.clone()),
            timeline: TimelineEngine::new(
                rfps.clone(),
                TimelineEventStorage::new(pool.clone()),
                tasks,
                notifications.clone(),
                activity.clone(),
                clock.clone(),
            ),
            responses: ResponseService::new(
                rfps.clone(),
                contacts.clone(),
                responses.clone(),
                activity.clone(),
                clock.clone(),
            ),
            snapshots: SnapshotService::new(
                rfps.clone(),
                contacts,
                responses,
                snapshot_ttl,
                clock.clone(),
            ),
            sessions: SessionStorage::new(pool.clone()),
            users: UserStorage::new(pool.clone()),
            rfps,
            activity_log,
            activity,
            notifications,
            clock,
            pool,
        }
    }

    pub fn contacts(&self) -> &ContactStorage {
        self.responses.contacts()
    }
}
