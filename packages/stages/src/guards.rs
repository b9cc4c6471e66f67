// ABOUTME: Named precondition guards evaluated after the transition table allows a move
// ABOUTME: Each guard targets one stage and is testable on its own

use rfpdesk_core::Stage;

use super::transitions::TransitionContext;

/// A precondition for entering `target`
#[derive(Debug, Clone, Copy)]
pub struct StageGuard {
    pub name: &'static str,
    pub target: Stage,
    check: fn(&TransitionContext<'_>) -> Result<(), String>,
}

impl StageGuard {
    pub fn evaluate(&self, ctx: &TransitionContext<'_>) -> Result<(), String> {
        (self.check)(ctx)
    }
}

pub const GUARDS: &[StageGuard] = &[
    StageGuard {
        name: "submission_window_configured",
        target: Stage::Submission,
        check: submission_window_configured,
    },
    StageGuard {
        name: "award_date_after_submission",
        target: Stage::Submission,
        check: award_date_after_submission,
    },
    StageGuard {
        name: "submission_deadline_passed",
        target: Stage::Debrief,
        check: submission_deadline_passed,
    },
];

/// Guards that apply when entering `target`
pub fn guards_for(target: Stage) -> impl Iterator<Item = &'static StageGuard> {
    GUARDS.iter().filter(move |g| g.target == target)
}

pub fn submission_window_configured(ctx: &TransitionContext<'_>) -> Result<(), String> {
    if ctx.timeline.submission_end.is_none() {
        return Err("Submission window is not configured: set a submission deadline first".into());
    }
    Ok(())
}

pub fn award_date_after_submission(ctx: &TransitionContext<'_>) -> Result<(), String> {
    match (ctx.timeline.award_date, ctx.timeline.submission_end) {
        (Some(award), Some(deadline)) if award < deadline => Err(format!(
            "Award date {} is before the submission deadline {}",
            award.to_rfc3339(),
            deadline.to_rfc3339()
        )),
        _ => Ok(()),
    }
}

pub fn submission_deadline_passed(ctx: &TransitionContext<'_>) -> Result<(), String> {
    match ctx.timeline.submission_end {
        None => Err("Cannot debrief before a submission deadline is configured".into()),
        Some(deadline) if deadline > ctx.now => Err(format!(
            "Cannot debrief before the submission deadline {}",
            deadline.to_rfc3339()
        )),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rfpdesk_rfps::RfpTimeline;

    #[test]
    fn test_submission_window_configured() {
        let now = Utc::now();
        let empty = RfpTimeline::default();
        assert!(submission_window_configured(&TransitionContext::new(&empty, now)).is_err());

        let configured = RfpTimeline {
            submission_end: Some(now + Duration::days(3)),
            ..Default::default()
        };
        assert!(submission_window_configured(&TransitionContext::new(&configured, now)).is_ok());
    }

    #[test]
    fn test_award_date_after_submission() {
        let deadline = Utc.with_ymd_and_hms(2026, 6, 1, 17, 0, 0).unwrap();
        let bad = RfpTimeline {
            submission_end: Some(deadline),
            award_date: Some(deadline - Duration::days(1)),
            ..Default::default()
        };
        let ctx = TransitionContext::new(&bad, deadline);
        assert!(award_date_after_submission(&ctx).is_err());

        let only_award = RfpTimeline {
            award_date: Some(deadline),
            ..Default::default()
        };
        let ctx = TransitionContext::new(&only_award, deadline);
        assert!(award_date_after_submission(&ctx).is_ok());
    }

    #[test]
    fn test_submission_deadline_passed() {
        let deadline = Utc.with_ymd_and_hms(2026, 6, 1, 17, 0, 0).unwrap();
        let timeline = RfpTimeline {
            submission_end: Some(deadline),
            ..Default::default()
        };

        let before = TransitionContext::new(&timeline, deadline - Duration::minutes(1));
        assert!(submission_deadline_passed(&before).is_err());

        let at = TransitionContext::new(&timeline, deadline);
        assert!(submission_deadline_passed(&at).is_ok());
    }

    #[test]
    fn test_guards_for_target() {
        let names: Vec<_> = guards_for(Stage::Submission).map(|g| g.name).collect();
        assert_eq!(
            names,
            vec!["submission_window_configured", "award_date_after_submission"]
        );
        assert_eq!(guards_for(Stage::Drafting).count(), 0);
    }
}
