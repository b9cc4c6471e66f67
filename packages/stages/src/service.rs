// ABOUTME: Stage service combining validation, persistence, automation, and activity
// ABOUTME: Single entry point for manual stage moves and checklist edits

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::automation::run_stage_automations;
use super::error::{StageError, StageResult};
use super::storage::StageTaskStorage;
use super::transitions::{validate_stage_transition, TransitionContext, TransitionDecision};
use super::types::{StageTask, StageTaskCreateInput, StageTaskUpdateInput};
use rfpdesk_activity::{ActivityKind, ActivitySink, NewActivity};
use rfpdesk_core::{SharedClock, Stage};
use rfpdesk_rfps::{Rfp, RfpCreateInput, RfpStorage, StageChange};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub rfp: Rfp,
    pub tasks_created: Vec<StageTask>,
}

#[derive(Clone)]
pub struct StageService {
    rfps: RfpStorage,
    tasks: StageTaskStorage,
    activity: Arc<dyn ActivitySink>,
    clock: SharedClock,
}

impl StageService {
    pub fn new(
        rfps: RfpStorage,
        tasks: StageTaskStorage,
        activity: Arc<dyn ActivitySink>,
        clock: SharedClock,
    ) -> Self {
        Self {
            rfps,
            tasks,
            activity,
            clock,
        }
    }

    /// Create an RFP in INTAKE and seed the INTAKE checklist. The checklist
    /// and activity entry are best-effort.
    pub async fn create_rfp(
        &self,
        company_id: &str,
        user_id: &str,
        input: RfpCreateInput,
    ) -> StageResult<TransitionOutcome> {
        let now = self.clock.now();
        let rfp = self.rfps.create_rfp(company_id, user_id, input, now).await?;
        info!("Created rfp: {} for company: {}", rfp.id, rfp.company_id);

        let tasks_created = match run_stage_automations(&self.tasks, &rfp.id, rfp.stage, now).await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, rfp_id = %rfp.id, stage = %rfp.stage, "Stage automation failed");
                Vec::new()
            }
        };

        self.activity
            .record(
                NewActivity::for_rfp(&rfp.id, Some(user_id), ActivityKind::RfpCreated)
                    .with_payload(json!({
                        "title": rfp.title,
                        "tasksCreated": tasks_created.len(),
                    })),
            )
            .await;

        Ok(TransitionOutcome { rfp, tasks_created })
    }

    /// Validate a move without performing it
    pub async fn validate_transition(
        &self,
        rfp_id: &str,
        requested: Stage,
    ) -> StageResult<TransitionDecision> {
        let rfp = self.rfps.get_rfp(rfp_id).await?;
        let now = self.clock.now();
        Ok(validate_stage_transition(
            rfp.stage,
            requested,
            &TransitionContext::for_rfp(&rfp, now),
        ))
    }

    /// Move an RFP to `requested`, run the stage-entry checklist, and log it.
    ///
    /// Automation and activity run after the stage write has committed; a
    /// failure there does not undo the move.
    pub async fn transition(
        &self,
        rfp_id: &str,
        requested: Stage,
        actor: Option<&str>,
    ) -> StageResult<TransitionOutcome> {
        let rfp = self.rfps.get_rfp(rfp_id).await?;
        if rfp.is_read_only() {
            return Err(StageError::ArchivedReadOnly(rfp.id));
        }

        let now = self.clock.now();
        let decision =
            validate_stage_transition(rfp.stage, requested, &TransitionContext::for_rfp(&rfp, now));
        if !decision.valid {
            return Err(StageError::InvalidTransition(
                decision.reason.unwrap_or_else(|| "Transition not allowed".to_string()),
            ));
        }

        let from = rfp.stage;
        let updated = self
            .rfps
            .update_stage(
                rfp_id,
                StageChange {
                    expected_version: rfp.version,
                    stage: requested,
                    entered_at: now,
                    archived_by: actor
                        .filter(|_| requested == Stage::Archived)
                        .map(str::to_string),
                },
            )
            .await?;

        info!(rfp_id = %rfp_id, from = %from, to = %requested, "RFP stage changed");

        let tasks_created = if requested.is_terminal() {
            Vec::new()
        } else {
            match run_stage_automations(&self.tasks, rfp_id, requested, now).await {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(error = %e, rfp_id = %rfp_id, stage = %requested, "Stage automation failed");
                    Vec::new()
                }
            }
        };

        self.activity
            .record(
                NewActivity::for_rfp(rfp_id, actor, ActivityKind::StageChanged).with_payload(
                    json!({
                        "from": from,
                        "to": requested,
                        "tasksCreated": tasks_created.len(),
                    }),
                ),
            )
            .await;

        if requested == Stage::Archived {
            self.activity
                .record(NewActivity::for_rfp(rfp_id, actor, ActivityKind::RfpArchived))
                .await;
        }

        Ok(TransitionOutcome {
            rfp: updated,
            tasks_created,
        })
    }

    pub async fn list_tasks(&self, rfp_id: &str, stage: Option<Stage>) -> StageResult<Vec<StageTask>> {
        // Surfaces NotFound for unknown RFPs instead of an empty list
        self.rfps.get_rfp(rfp_id).await?;
        Ok(self.tasks.list_tasks(rfp_id, stage).await?)
    }

    pub async fn create_task(
        &self,
        rfp_id: &str,
        input: StageTaskCreateInput,
        actor: Option<&str>,
    ) -> StageResult<StageTask> {
        let rfp = self.writable_rfp(rfp_id).await?;
        let stage = input.stage.unwrap_or(rfp.stage);

        let task = self
            .tasks
            .create_task(rfp_id, stage, &input.title, actor, self.clock.now())
            .await?;

        self.activity
            .record(
                NewActivity::for_rfp(rfp_id, actor, ActivityKind::TaskCreated)
                    .with_payload(json!({ "taskId": task.id, "stage": stage })),
            )
            .await;

        Ok(task)
    }

    pub async fn update_task(
        &self,
        rfp_id: &str,
        task_id: &str,
        input: StageTaskUpdateInput,
        actor: Option<&str>,
    ) -> StageResult<StageTask> {
        self.writable_rfp(rfp_id).await?;

        let existing = self.tasks.get_task(task_id).await?;
        if existing.rfp_id != rfp_id {
            return Err(rfpdesk_storage::StorageError::not_found("stage task", task_id).into());
        }

        let task = self
            .tasks
            .update_task(task_id, input, self.clock.now())
            .await?;

        self.activity
            .record(
                NewActivity::for_rfp(rfp_id, actor, ActivityKind::TaskUpdated)
                    .with_payload(json!({ "taskId": task.id, "completed": task.completed })),
            )
            .await;

        Ok(task)
    }

    async fn writable_rfp(&self, rfp_id: &str) -> StageResult<Rfp> {
        let rfp = self.rfps.get_rfp(rfp_id).await?;
        if rfp.is_read_only() {
            return Err(StageError::ArchivedReadOnly(rfp.id));
        }
        Ok(rfp)
    }
}
