// ABOUTME: RFP opportunity scoring used by the portfolio view
// ABOUTME: Stage progress, SLA health, supplier engagement, and timeline health

use super::error::ScoringError;
use super::scorecard::{percent, FactorSpec, ScoreResult, Scorecard};
use rfpdesk_core::{SlaStatus, Stage};

pub const STAGE_PROGRESS: &str = "stageProgress";
pub const SLA_HEALTH: &str = "slaHealth";
pub const SUPPLIER_ENGAGEMENT: &str = "supplierEngagement";
pub const TIMELINE_HEALTH: &str = "timelineHealth";

pub const OPPORTUNITY: Scorecard = Scorecard {
    name: "opportunity",
    factors: &[
        FactorSpec::new(STAGE_PROGRESS, 0.30),
        FactorSpec::flagged(SLA_HEALTH, 0.25, "SLA_BREACHED", 50.0),
        FactorSpec::flagged(SUPPLIER_ENGAGEMENT, 0.25, "LOW_SUPPLIER_ENGAGEMENT", 50.0),
        FactorSpec::flagged(TIMELINE_HEALTH, 0.20, "TIMELINE_ISSUES", 100.0),
    ],
};

#[derive(Debug, Clone, Copy)]
pub struct OpportunityInputs {
    pub stage: Stage,
    pub sla_status: SlaStatus,
    pub contacts_invited: i64,
    pub contacts_engaged: i64,
    pub timeline_issues: usize,
}

/// Pipeline position as a percentage: INTAKE is 0, DEBRIEF is 100.
/// Archived RFPs have no progress left to make and score 0.
pub fn stage_progress(stage: Stage) -> f64 {
    if stage.is_terminal() {
        return 0.0;
    }
    let last = Stage::Debrief.position() as f64;
    stage.position() as f64 / last * 100.0
}

pub fn sla_health(status: SlaStatus) -> f64 {
    match status {
        SlaStatus::Ok => 100.0,
        SlaStatus::Warning => 50.0,
        SlaStatus::Breached => 0.0,
    }
}

pub fn timeline_health(issues: usize) -> f64 {
    (100.0 - 25.0 * issues as f64).max(0.0)
}

pub fn calculate_opportunity(inputs: &OpportunityInputs) -> Result<ScoreResult, ScoringError> {
    OPPORTUNITY.evaluate(&[
        (STAGE_PROGRESS, stage_progress(inputs.stage)),
        (SLA_HEALTH, sla_health(inputs.sla_status)),
        (
            SUPPLIER_ENGAGEMENT,
            percent(inputs.contacts_engaged, inputs.contacts_invited),
        ),
        (TIMELINE_HEALTH, timeline_health(inputs.timeline_issues)),
    ])
}
