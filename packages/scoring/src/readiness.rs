// ABOUTME: Supplier response readiness calculator
// ABOUTME: Scores compliance coverage, answer completeness, pricing, and timeliness

use chrono::{DateTime, Utc};

use super::error::ScoringError;
use super::scorecard::{percent, FactorSpec, ScoreResult, Scorecard};
use super::types::SupplierResponse;

pub const COMPLIANCE_COVERAGE: &str = "complianceCoverage";
pub const ANSWER_COMPLETENESS: &str = "answerCompleteness";
pub const PRICING_PROVIDED: &str = "pricingProvided";
pub const TIMELINESS: &str = "timeliness";

pub const READINESS: Scorecard = Scorecard {
    name: "readiness",
    factors: &[
        FactorSpec::flagged(COMPLIANCE_COVERAGE, 0.35, "LOW_COMPLIANCE_COVERAGE", 60.0),
        FactorSpec::flagged(ANSWER_COMPLETENESS, 0.30, "INCOMPLETE_ANSWERS", 80.0),
        FactorSpec::flagged(PRICING_PROVIDED, 0.20, "MISSING_PRICING", 50.0),
        FactorSpec::flagged(TIMELINESS, 0.15, "LATE_SUBMISSION", 50.0),
    ],
};

/// 100 when submitted on or before the deadline (or there is none), 0 when
/// late, 50 while not yet submitted
pub fn timeliness(
    submitted_at: Option<DateTime<Utc>>,
    submission_end: Option<DateTime<Utc>>,
) -> f64 {
    match (submitted_at, submission_end) {
        (None, _) => 50.0,
        (Some(_), None) => 100.0,
        (Some(at), Some(deadline)) if at <= deadline => 100.0,
        (Some(_), Some(_)) => 0.0,
    }
}

/// Compute readiness from a response's stored inputs. Does not touch the
/// response's derived fields.
pub fn calculate_readiness(
    response: &SupplierResponse,
    submission_end: Option<DateTime<Utc>>,
) -> Result<ScoreResult, ScoringError> {
    let coverage = response.compliance_coverage.unwrap_or(0.0);
    let completeness = percent(response.answers_completed, response.answers_total);
    let pricing = response
        .extracted_pricing
        .as_ref()
        .map(|p| p.completeness())
        .unwrap_or(0.0);

    READINESS.evaluate(&[
        (COMPLIANCE_COVERAGE, coverage),
        (ANSWER_COMPLETENESS, completeness),
        (PRICING_PROVIDED, pricing),
        (TIMELINESS, timeliness(response.submitted_at, submission_end)),
    ])
}
