// ABOUTME: Stage SLA calculator
// ABOUTME: Days in stage against per-stage defaults or an RFP-level override

use chrono::{DateTime, Utc};
use serde::Serialize;

use rfpdesk_core::{SlaStatus, Stage};
use rfpdesk_rfps::Rfp;

/// Fraction of the SLA after which a stage is flagged as `warning`
pub const WARNING_RATIO: f64 = 0.75;

const SECONDS_PER_DAY: i64 = 86_400;

/// Default SLA in days for each stage. `Archived` has none.
pub fn default_sla_days(stage: Stage) -> Option<u32> {
    match stage {
        Stage::Intake => Some(3),
        Stage::Qualification => Some(5),
        Stage::Discovery => Some(7),
        Stage::Drafting => Some(10),
        Stage::PricingLegalReview => Some(5),
        Stage::ExecReview => Some(3),
        Stage::Submission => Some(2),
        Stage::Debrief => Some(5),
        Stage::Archived => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaReport {
    pub status: SlaStatus,
    pub days_in_stage: i64,
    pub sla: Option<u32>,
}

/// Compute the SLA status of a stage entered at `entered_at`.
///
/// `days_in_stage` counts whole elapsed days and is 0 when the entry time is
/// unknown or in the future.
pub fn get_sla_status(
    stage: Stage,
    entered_at: Option<DateTime<Utc>>,
    sla_override: Option<u32>,
    now: DateTime<Utc>,
) -> SlaReport {
    let days_in_stage = entered_at
        .map(|at| (now - at).num_seconds().div_euclid(SECONDS_PER_DAY).max(0))
        .unwrap_or(0);

    let sla = sla_override.or_else(|| default_sla_days(stage));

    let status = match sla {
        None => SlaStatus::Ok,
        Some(sla) => {
            let days = days_in_stage as f64;
            let sla = f64::from(sla);
            if days >= sla {
                SlaStatus::Breached
            } else if days >= WARNING_RATIO * sla {
                SlaStatus::Warning
            } else {
                SlaStatus::Ok
            }
        }
    };

    SlaReport {
        status,
        days_in_stage,
        sla,
    }
}

pub fn sla_report_for(rfp: &Rfp, now: DateTime<Utc>) -> SlaReport {
    get_sla_status(rfp.stage, rfp.stage_entered_at, rfp.stage_sla_days, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    fn entered(days_ago: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days_ago))
    }

    #[rstest]
    #[case(Stage::Qualification, 3, SlaStatus::Ok)]
    #[case(Stage::Qualification, 4, SlaStatus::Warning)]
    #[case(Stage::Qualification, 5, SlaStatus::Breached)]
    #[case(Stage::Intake, 2, SlaStatus::Ok)]
    #[case(Stage::Intake, 3, SlaStatus::Breached)]
    #[case(Stage::Intake, 4, SlaStatus::Breached)]
    #[case(Stage::Drafting, 7, SlaStatus::Ok)]
    #[case(Stage::Drafting, 8, SlaStatus::Warning)]
    #[case(Stage::Submission, 1, SlaStatus::Ok)]
    #[case(Stage::Submission, 2, SlaStatus::Breached)]
    #[case(Stage::Archived, 400, SlaStatus::Ok)]
    fn test_status_by_stage_and_days(
        #[case] stage: Stage,
        #[case] days: i64,
        #[case] expected: SlaStatus,
    ) {
        let report = get_sla_status(stage, entered(days), None, now());
        assert_eq!(report.status, expected);
        assert_eq!(report.days_in_stage, days);
    }

    #[test]
    fn test_status_matches_thresholds_for_every_stage() {
        for stage in Stage::ALL {
            let Some(sla) = default_sla_days(stage) else {
                continue;
            };
            for d in 0..=(i64::from(sla) + 3) {
                let report = get_sla_status(stage, entered(d), None, now());
                let expected = if d >= i64::from(sla) {
                    SlaStatus::Breached
                } else if d as f64 >= 0.75 * f64::from(sla) {
                    SlaStatus::Warning
                } else {
                    SlaStatus::Ok
                };
                assert_eq!(report.status, expected, "{} at {} days", stage, d);
            }
        }
    }

    #[test]
    fn test_partial_days_are_floored() {
        let at = Some(now() - Duration::hours(47));
        let report = get_sla_status(Stage::Intake, at, None, now());
        assert_eq!(report.days_in_stage, 1);
        assert_eq!(report.status, SlaStatus::Ok);
    }

    #[test]
    fn test_missing_or_future_entry_counts_as_zero_days() {
        assert_eq!(
            get_sla_status(Stage::Intake, None, None, now()).days_in_stage,
            0
        );
        let future = Some(now() + Duration::days(2));
        assert_eq!(
            get_sla_status(Stage::Intake, future, None, now()).days_in_stage,
            0
        );
    }

    #[test]
    fn test_override_replaces_default() {
        let report = get_sla_status(Stage::Intake, entered(4), Some(10), now());
        assert_eq!(report.sla, Some(10));
        assert_eq!(report.status, SlaStatus::Ok);
    }

    #[test]
    fn test_zero_sla_is_immediately_breached() {
        let report = get_sla_status(Stage::Drafting, entered(0), Some(0), now());
        assert_eq!(report.status, SlaStatus::Breached);
    }

    #[test]
    fn test_intake_four_days_is_breached() {
        let report = get_sla_status(Stage::Intake, entered(4), None, now());
        assert_eq!(
            report,
            SlaReport {
                status: SlaStatus::Breached,
                days_in_stage: 4,
                sla: Some(3),
            }
        );
    }
}
