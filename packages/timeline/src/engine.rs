// ABOUTME: Timeline tick engine
// ABOUTME: Evaluates due milestone actions and applies them transactionally with optimistic versioning

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::error::{TimelineError, TimelineResult};
use super::normalize::{compute_due_actions, detect_issues, milestone_states, DueAction};
use super::storage::TimelineEventStorage;
use super::types::{
    AppliedAction, TickOptions, TickOutcome, TimelineAction, TimelineEvent, TimelineIssue,
    TimelineIssueCode, TimelineStateSnapshot,
};
use rfpdesk_activity::{ActivityKind, ActivitySink, NewActivity, NewNotification, NotificationStorage};
use rfpdesk_core::{SharedClock, Stage, VersionedError};
use rfpdesk_rfps::{Rfp, RfpStorage};
use rfpdesk_stages::{
    run_stage_automations, validate_stage_transition, StageTaskStorage, TransitionContext,
};

/// Result of evaluating an RFP's timeline at one instant
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub snapshot: TimelineStateSnapshot,
    pub due: Vec<DueAction>,
    pub advance_to: Option<Stage>,
}

/// Actions recorded in the RFP's stored snapshot. An RFP that was never
/// ticked has none.
pub fn stored_applied_actions(
    rfp: &Rfp,
    now: DateTime<Utc>,
) -> Result<Vec<AppliedAction>, VersionedError> {
    match rfp.timeline_state.as_deref() {
        None => Ok(Vec::new()),
        Some(raw) => TimelineStateSnapshot::parse_stored(raw, rfp.stage, now)
            .map(|snapshot| snapshot.applied_actions),
    }
}

/// Evaluate `rfp` at `now` without touching storage.
///
/// An unreadable stored snapshot is reported as an issue. The applied set
/// then comes from `recovered`, which the caller rebuilds from the event log.
pub fn evaluate(rfp: &Rfp, now: DateTime<Utc>, recovered: &[AppliedAction]) -> Evaluation {
    let mut issues = detect_issues(&rfp.timeline);

    let previous = match stored_applied_actions(rfp, now) {
        Ok(applied) => applied,
        Err(e) => {
            warn!(rfp_id = %rfp.id, error = %e, "Unreadable timeline state, using event log");
            issues.push(TimelineIssue {
                code: TimelineIssueCode::StoredStateUnreadable,
                message: format!(
                    "{}; {} applied action(s) recovered from timeline events",
                    e,
                    recovered.len()
                ),
                suppressed: Vec::new(),
            });
            recovered.to_vec()
        }
    };

    let already: BTreeSet<TimelineAction> = previous.iter().map(|a| a.action).collect();
    let due = compute_due_actions(&rfp.timeline, &already, &issues, now);

    let advance_to = due
        .iter()
        .any(|d| d.action == TimelineAction::SubmissionClosed)
        .then_some(Stage::Debrief)
        .filter(|target| {
            rfp.stage == Stage::Submission
                && validate_stage_transition(
                    rfp.stage,
                    *target,
                    &TransitionContext::for_rfp(rfp, now),
                )
                .valid
        });

    let mut applied_actions = previous;
    applied_actions.extend(due.iter().map(|d| d.applied_at(now)));

    let applied_set: BTreeSet<TimelineAction> = applied_actions.iter().map(|a| a.action).collect();
    let milestones = milestone_states(&rfp.timeline, &applied_set, &issues);

    Evaluation {
        snapshot: TimelineStateSnapshot {
            schema_version: TimelineStateSnapshot::SCHEMA_VERSION,
            evaluated_at: now,
            stage: advance_to.unwrap_or(rfp.stage),
            milestones,
            issues,
            applied_actions,
        },
        due,
        advance_to,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickFailure {
    pub rfp_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickAllReport {
    pub rfps_ticked: usize,
    pub actions_applied: usize,
    pub stages_advanced: usize,
    pub failures: Vec<TickFailure>,
}

#[derive(Clone)]
pub struct TimelineEngine {
    rfps: RfpStorage,
    events: TimelineEventStorage,
    tasks: StageTaskStorage,
    notifications: NotificationStorage,
    activity: Arc<dyn ActivitySink>,
    clock: SharedClock,
}

impl TimelineEngine {
    pub fn new(
        rfps: RfpStorage,
        events: TimelineEventStorage,
        tasks: StageTaskStorage,
        notifications: NotificationStorage,
        activity: Arc<dyn ActivitySink>,
        clock: SharedClock,
    ) -> Self {
        Self {
            rfps,
            events,
            tasks,
            notifications,
            activity,
            clock,
        }
    }

    /// Evaluate one RFP and, unless `dry_run`, apply the due actions.
    ///
    /// Both modes compute the same actions for the same stored state and
    /// clock. A persisting tick on an archived RFP fails with
    /// `ArchivedReadOnly`; a concurrent write surfaces as a storage conflict.
    pub async fn run_rfp_timeline_tick(
        &self,
        rfp_id: &str,
        options: TickOptions,
    ) -> TimelineResult<TickOutcome> {
        let rfp = self.rfps.get_rfp(rfp_id).await?;
        if !options.dry_run && rfp.is_read_only() {
            return Err(TimelineError::ArchivedReadOnly(rfp.id));
        }

        let now = self.clock.now();
        let recovered = match stored_applied_actions(&rfp, now) {
            Ok(_) => Vec::new(),
            Err(_) => self.events.applied_actions(&rfp.id).await?,
        };
        let evaluation = evaluate(&rfp, now, &recovered);
        let actions_applied: Vec<AppliedAction> =
            evaluation.due.iter().map(|d| d.applied_at(now)).collect();

        let outcome = TickOutcome {
            rfp_id: rfp.id.clone(),
            dry_run: options.dry_run,
            snapshot: evaluation.snapshot,
            actions_applied,
            advanced_to: evaluation.advance_to,
        };

        if options.dry_run {
            debug!(
                "Dry-run tick for rfp {}: {} action(s) due",
                rfp.id,
                outcome.actions_applied.len()
            );
            return Ok(outcome);
        }

        let state = outcome.snapshot.to_value()?;
        let triggered_by = options.triggered_by_user_id.as_deref();

        let mut tx = self.rfps.pool().begin().await?;
        RfpStorage::write_timeline_state(
            &mut *tx,
            &rfp.id,
            rfp.version,
            &state,
            outcome.advanced_to,
            now,
        )
        .await?;
        for applied in &outcome.actions_applied {
            let advanced_to = if applied.action == TimelineAction::SubmissionClosed {
                outcome.advanced_to
            } else {
                None
            };
            let payload = json!({ "stage": rfp.stage, "advancedTo": advanced_to });
            TimelineEventStorage::insert(&mut *tx, &rfp.id, applied, triggered_by, Some(&payload))
                .await?;
        }
        tx.commit().await?;

        info!(
            rfp_id = %rfp.id,
            actions = outcome.actions_applied.len(),
            advanced_to = ?outcome.advanced_to,
            "Timeline tick applied"
        );

        self.after_commit(&rfp, &outcome, triggered_by, now).await;

        Ok(outcome)
    }

    /// Best-effort side effects of a committed tick
    async fn after_commit(
        &self,
        rfp: &Rfp,
        outcome: &TickOutcome,
        triggered_by: Option<&str>,
        now: DateTime<Utc>,
    ) {
        for applied in &outcome.actions_applied {
            let notification = NewNotification {
                user_id: rfp.user_id.clone(),
                rfp_id: Some(rfp.id.clone()),
                kind: applied.action.as_str().to_string(),
                message: format!("{}: {}", rfp.title, applied.action.describe()),
            };
            if let Err(e) = self.notifications.create(notification).await {
                warn!(error = %e, rfp_id = %rfp.id, action = %applied.action, "Failed to emit timeline notification");
            }

            self.activity
                .record(
                    NewActivity::for_rfp(&rfp.id, triggered_by, ActivityKind::TimelineAction)
                        .with_payload(json!({
                            "action": applied.action,
                            "milestoneAt": applied.milestone_at,
                        })),
                )
                .await;
        }

        if let Some(to) = outcome.advanced_to {
            self.activity
                .record(
                    NewActivity::for_rfp(&rfp.id, triggered_by, ActivityKind::StageChanged)
                        .with_payload(json!({
                            "from": rfp.stage,
                            "to": to,
                            "automatic": true,
                        })),
                )
                .await;

            if let Err(e) = run_stage_automations(&self.tasks, &rfp.id, to, now).await {
                warn!(error = %e, rfp_id = %rfp.id, stage = %to, "Stage automation failed after auto-advance");
            }
        }
    }

    /// Persisting tick for every active RFP with a configured milestone.
    /// Per-RFP failures are logged and collected, not returned.
    pub async fn tick_all(&self) -> TimelineResult<TickAllReport> {
        let candidates = self.rfps.list_timeline_candidates().await?;
        info!("Running timeline tick for {} rfp(s)", candidates.len());

        let mut report = TickAllReport::default();
        for rfp in candidates {
            match self
                .run_rfp_timeline_tick(&rfp.id, TickOptions::default())
                .await
            {
                Ok(outcome) => {
                    report.rfps_ticked += 1;
                    report.actions_applied += outcome.actions_applied.len();
                    if outcome.advanced_to.is_some() {
                        report.stages_advanced += 1;
                    }
                }
                Err(e) => {
                    warn!(rfp_id = %rfp.id, error = %e, "Timeline tick failed");
                    report.failures.push(TickFailure {
                        rfp_id: rfp.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    pub async fn list_events(
        &self,
        rfp_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> TimelineResult<(Vec<TimelineEvent>, i64)> {
        self.rfps.get_rfp(rfp_id).await?;
        Ok(self
            .events
            .list_for_rfp_paginated(rfp_id, limit, offset)
            .await?)
    }
}
