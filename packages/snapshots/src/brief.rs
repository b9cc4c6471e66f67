// ABOUTME: Per-RFP decision brief composer
// ABOUTME: SLA, timeline issues, ranked supplier responses, and the recommended next stage

use chrono::{DateTime, Utc};
use serde::Serialize;

use rfpdesk_core::Stage;
use rfpdesk_rfps::Rfp;
use rfpdesk_scoring::{ResponseStatus, SupplierContact, SupplierResponse};
use rfpdesk_stages::{sla_report_for, validate_stage_transition, SlaReport, TransitionContext};
use rfpdesk_timeline::{detect_issues, TimelineIssue};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResponse {
    pub rank: usize,
    pub response_id: String,
    pub contact_id: String,
    pub supplier_email: Option<String>,
    pub status: ResponseStatus,
    pub readiness_score: Option<f64>,
    pub compliance_flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBrief {
    pub rfp_id: String,
    pub title: String,
    pub stage: Stage,
    pub sla: SlaReport,
    pub timeline_issues: Vec<TimelineIssue>,
    pub responses: Vec<RankedResponse>,
    pub recommended_next_stage: Option<Stage>,
    /// Why the pipeline's next stage is not recommended yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_stage_blocker: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// Compose the decision brief for one RFP from already-fetched records.
///
/// Responses are ranked by readiness, highest first, with unscored responses
/// last. The recommended next stage is the pipeline successor when the
/// transition policy currently allows it.
pub fn compose_brief(
    rfp: &Rfp,
    contacts: &[SupplierContact],
    responses: &[SupplierResponse],
    now: DateTime<Utc>,
) -> DecisionBrief {
    let mut ordered: Vec<&SupplierResponse> =
        responses.iter().filter(|r| r.rfp_id == rfp.id).collect();
    ordered.sort_by(|a, b| match (a.readiness_score, b.readiness_score) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });

    let ranked = ordered
        .into_iter()
        .enumerate()
        .map(|(i, response)| RankedResponse {
            rank: i + 1,
            response_id: response.id.clone(),
            contact_id: response.supplier_contact_id.clone(),
            supplier_email: contacts
                .iter()
                .find(|c| c.id == response.supplier_contact_id)
                .map(|c| c.email.clone()),
            status: response.status,
            readiness_score: response.readiness_score,
            compliance_flags: response.compliance_flags.clone(),
        })
        .collect();

    let (recommended_next_stage, next_stage_blocker) = match rfp.stage.next() {
        Some(next) if !rfp.is_read_only() => {
            let decision =
                validate_stage_transition(rfp.stage, next, &TransitionContext::for_rfp(rfp, now));
            if decision.valid {
                (Some(next), None)
            } else {
                (None, decision.reason)
            }
        }
        _ => (None, None),
    };

    DecisionBrief {
        rfp_id: rfp.id.clone(),
        title: rfp.title.clone(),
        stage: rfp.stage,
        sla: sla_report_for(rfp, now),
        timeline_issues: detect_issues(&rfp.timeline),
        responses: ranked,
        recommended_next_stage,
        next_stage_blocker,
        generated_at: now,
    }
}
