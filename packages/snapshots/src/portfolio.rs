// ABOUTME: Company-wide portfolio composer
// ABOUTME: Folds a company's active RFPs, contacts, and responses into one dashboard snapshot

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use rfpdesk_core::{SlaStatus, Stage};
use rfpdesk_rfps::Rfp;
use rfpdesk_scoring::{
    calculate_opportunity, round1, OpportunityInputs, ResponseStatus, ScoringError,
    SupplierContact, SupplierResponse,
};
use rfpdesk_stages::sla_report_for;
use rfpdesk_timeline::{detect_issues, TimelineAction};

/// Milestones due within this window appear in `upcoming_milestones`
pub const UPCOMING_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingMilestone {
    pub rfp_id: String,
    pub rfp_title: String,
    pub action: TimelineAction,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpOpportunity {
    pub rfp_id: String,
    pub title: String,
    pub stage: Stage,
    pub sla_status: SlaStatus,
    pub score: f64,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub company_id: String,
    pub total_rfps: usize,
    pub by_stage: BTreeMap<Stage, usize>,
    pub sla_breaches: usize,
    pub sla_warnings: usize,
    pub upcoming_milestones: Vec<UpcomingMilestone>,
    /// Mean readiness over submitted responses that have been scored
    pub average_readiness: Option<f64>,
    pub scored_responses: usize,
    /// Highest score first
    pub opportunities: Vec<RfpOpportunity>,
    pub generated_at: DateTime<Utc>,
}

/// Compose the portfolio for `company_id` from already-fetched records.
/// Archived RFPs are skipped.
pub fn compose_portfolio(
    company_id: &str,
    rfps: &[Rfp],
    contacts: &[SupplierContact],
    responses: &[SupplierResponse],
    now: DateTime<Utc>,
) -> Result<PortfolioSnapshot, ScoringError> {
    let active: Vec<&Rfp> = rfps.iter().filter(|rfp| !rfp.is_read_only()).collect();

    let mut engagement: HashMap<&str, (i64, i64)> = HashMap::new();
    for contact in contacts {
        let counts = engagement.entry(contact.rfp_id.as_str()).or_default();
        counts.0 += 1;
        if contact.status.is_engaged() {
            counts.1 += 1;
        }
    }

    let mut by_stage = BTreeMap::new();
    let mut sla_breaches = 0;
    let mut sla_warnings = 0;
    let mut upcoming_milestones = Vec::new();
    let mut opportunities = Vec::with_capacity(active.len());
    let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);

    for rfp in &active {
        *by_stage.entry(rfp.stage).or_insert(0) += 1;

        let sla = sla_report_for(rfp, now);
        match sla.status {
            SlaStatus::Breached => sla_breaches += 1,
            SlaStatus::Warning => sla_warnings += 1,
            SlaStatus::Ok => {}
        }

        for action in TimelineAction::ALL {
            if let Some(at) = action.milestone_at(&rfp.timeline) {
                if at > now && at <= horizon {
                    upcoming_milestones.push(UpcomingMilestone {
                        rfp_id: rfp.id.clone(),
                        rfp_title: rfp.title.clone(),
                        action,
                        at,
                    });
                }
            }
        }

        let (invited, engaged) = engagement.get(rfp.id.as_str()).copied().unwrap_or((0, 0));
        let result = calculate_opportunity(&OpportunityInputs {
            stage: rfp.stage,
            sla_status: sla.status,
            contacts_invited: invited,
            contacts_engaged: engaged,
            timeline_issues: detect_issues(&rfp.timeline).len(),
        })?;
        opportunities.push(RfpOpportunity {
            rfp_id: rfp.id.clone(),
            title: rfp.title.clone(),
            stage: rfp.stage,
            sla_status: sla.status,
            score: result.score,
            flags: result.flags,
        });
    }

    upcoming_milestones.sort_by(|a, b| a.at.cmp(&b.at).then(a.action.cmp(&b.action)));
    opportunities.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.rfp_id.cmp(&b.rfp_id))
    });

    let scored: Vec<f64> = responses
        .iter()
        .filter(|r| r.status == ResponseStatus::Submitted)
        .filter(|r| active.iter().any(|rfp| rfp.id == r.rfp_id))
        .filter_map(|r| r.readiness_score)
        .collect();
    let average_readiness = if scored.is_empty() {
        None
    } else {
        Some(round1(scored.iter().sum::<f64>() / scored.len() as f64))
    };

    Ok(PortfolioSnapshot {
        company_id: company_id.to_string(),
        total_rfps: active.len(),
        by_stage,
        sla_breaches,
        sla_warnings,
        upcoming_milestones,
        average_readiness,
        scored_responses: scored.len(),
        opportunities,
        generated_at: now,
    })
}
