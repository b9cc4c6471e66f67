// ABOUTME: Pure timeline evaluation
// ABOUTME: Orders milestones, detects inconsistent windows, and computes due actions

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::types::{
    AppliedAction, MilestoneState, MilestoneStatus, TimelineAction, TimelineIssue,
    TimelineIssueCode,
};
use rfpdesk_rfps::RfpTimeline;

/// Action that is due now, with the milestone that triggered it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueAction {
    pub action: TimelineAction,
    pub milestone_at: DateTime<Utc>,
}

impl DueAction {
    pub fn applied_at(&self, now: DateTime<Utc>) -> AppliedAction {
        AppliedAction {
            action: self.action,
            milestone_at: self.milestone_at,
            applied_at: now,
        }
    }
}

/// Window inconsistencies. Timestamps are reported as-is, never corrected.
pub fn detect_issues(timeline: &RfpTimeline) -> Vec<TimelineIssue> {
    let windows = [
        (
            TimelineIssueCode::QaWindowInverted,
            "Q&A",
            timeline.ask_questions_start,
            timeline.ask_questions_end,
            [TimelineAction::QaOpened, TimelineAction::QaClosed],
        ),
        (
            TimelineIssueCode::SubmissionWindowInverted,
            "Submission",
            timeline.submission_start,
            timeline.submission_end,
            [
                TimelineAction::SubmissionOpened,
                TimelineAction::SubmissionClosed,
            ],
        ),
        (
            TimelineIssueCode::DemoWindowInverted,
            "Demo",
            timeline.demo_window_start,
            timeline.demo_window_end,
            [TimelineAction::DemoOpened, TimelineAction::DemoClosed],
        ),
    ];

    let mut issues = Vec::new();
    for (code, label, start, end, actions) in windows {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                issues.push(TimelineIssue {
                    code,
                    message: format!(
                        "{} window ends ({}) before it starts ({})",
                        label,
                        end.to_rfc3339(),
                        start.to_rfc3339()
                    ),
                    suppressed: actions.to_vec(),
                });
            }
        }
    }

    if let (Some(award), Some(deadline)) = (timeline.award_date, timeline.submission_end) {
        if award < deadline {
            issues.push(TimelineIssue {
                code: TimelineIssueCode::AwardBeforeSubmissionEnd,
                message: format!(
                    "Award date ({}) is before the submission deadline ({})",
                    award.to_rfc3339(),
                    deadline.to_rfc3339()
                ),
                suppressed: vec![TimelineAction::AwardDateReached],
            });
        }
    }

    issues
}

fn suppressed_actions(issues: &[TimelineIssue]) -> BTreeSet<TimelineAction> {
    issues
        .iter()
        .flat_map(|i| i.suppressed.iter().copied())
        .collect()
}

/// Configured milestones in evaluation order: chronological, ties broken by
/// canonical action order
fn chronological(timeline: &RfpTimeline) -> Vec<(TimelineAction, DateTime<Utc>)> {
    let mut present: Vec<_> = TimelineAction::ALL
        .iter()
        .filter_map(|a| a.milestone_at(timeline).map(|at| (*a, at)))
        .collect();
    present.sort_by(|(a, at_a), (b, at_b)| at_a.cmp(at_b).then(a.cmp(b)));
    present
}

/// Actions whose milestone is at or before `now`, not yet applied and not
/// suppressed, in evaluation order
pub fn compute_due_actions(
    timeline: &RfpTimeline,
    applied: &BTreeSet<TimelineAction>,
    issues: &[TimelineIssue],
    now: DateTime<Utc>,
) -> Vec<DueAction> {
    let suppressed = suppressed_actions(issues);

    chronological(timeline)
        .into_iter()
        .filter(|(action, at)| {
            *at <= now && !applied.contains(action) && !suppressed.contains(action)
        })
        .map(|(action, milestone_at)| DueAction {
            action,
            milestone_at,
        })
        .collect()
}

/// Milestone list for the snapshot: configured milestones chronologically,
/// then missing ones in canonical order. `applied` must already include the
/// actions applied by the current tick.
pub fn milestone_states(
    timeline: &RfpTimeline,
    applied: &BTreeSet<TimelineAction>,
    issues: &[TimelineIssue],
) -> Vec<MilestoneState> {
    let suppressed = suppressed_actions(issues);

    let mut states: Vec<MilestoneState> = chronological(timeline)
        .into_iter()
        .map(|(action, at)| {
            let status = if applied.contains(&action) {
                MilestoneStatus::Applied
            } else if suppressed.contains(&action) {
                MilestoneStatus::Suppressed
            } else {
                MilestoneStatus::Pending
            };
            MilestoneState {
                milestone: action.milestone().to_string(),
                action,
                at: Some(at),
                status,
            }
        })
        .collect();

    states.extend(
        TimelineAction::ALL
            .iter()
            .filter(|a| a.milestone_at(timeline).is_none())
            .map(|action| MilestoneState {
                milestone: action.milestone().to_string(),
                action: *action,
                at: None,
                status: MilestoneStatus::Missing,
            }),
    );

    states
}
