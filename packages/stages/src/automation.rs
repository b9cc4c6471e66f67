// ABOUTME: Stage-entry automation
// ABOUTME: Creates each stage's default checklist once, no matter how often the stage is entered

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::storage::StageTaskStorage;
use super::types::StageTask;
use rfpdesk_core::{normalize_title, Stage};
use rfpdesk_storage::StorageResult;

/// Default checklist titles created when an RFP enters `stage`
pub fn stage_checklist(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Intake => &[
            "Log RFP source and due date",
            "Assign RFP owner",
            "Confirm document set received",
        ],
        Stage::Qualification => &[
            "Complete go/no-go assessment",
            "Confirm budget and decision makers",
            "Review incumbent position",
        ],
        Stage::Discovery => &[
            "Schedule discovery call",
            "Submit clarification questions",
            "Map requirements to capabilities",
        ],
        Stage::Drafting => &[
            "Build response outline",
            "Assign section owners",
            "Draft executive summary",
        ],
        Stage::PricingLegalReview => &[
            "Finalize pricing model",
            "Complete legal terms review",
            "Confirm insurance and compliance certificates",
        ],
        Stage::ExecReview => &["Executive sign-off on pricing", "Final win-theme review"],
        Stage::Submission => &[
            "Package and format final response",
            "Submit response before deadline",
            "Confirm receipt with buyer",
        ],
        Stage::Debrief => &["Request buyer debrief", "Record win/loss reasons"],
        Stage::Archived => &[],
    }
}

/// Create the checklist for `stage`, skipping titles that already exist in
/// that stage. Returns only the tasks created by this call.
pub async fn run_stage_automations(
    tasks: &StageTaskStorage,
    rfp_id: &str,
    stage: Stage,
    now: DateTime<Utc>,
) -> StorageResult<Vec<StageTask>> {
    let checklist = stage_checklist(stage);
    if checklist.is_empty() {
        return Ok(Vec::new());
    }

    let existing = tasks.normalized_titles(rfp_id, stage).await?;

    let mut created = Vec::new();
    for title in checklist {
        if existing.contains(&normalize_title(title)) {
            continue;
        }
        // A concurrent run may have inserted it since the read above
        if let Some(task) = tasks.insert_if_absent(rfp_id, stage, title, now).await? {
            created.push(task);
        }
    }

    if created.is_empty() {
        debug!("Stage checklist for {} on rfp {} already present", stage, rfp_id);
    } else {
        info!(
            rfp_id = %rfp_id,
            stage = %stage,
            count = created.len(),
            "Created stage checklist tasks"
        );
    }

    Ok(created)
}
