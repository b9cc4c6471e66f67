// ABOUTME: Timeline type definitions
// ABOUTME: Milestones, actions, issues, and the versioned snapshot persisted on the RFP

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use rfpdesk_core::{schema_version, versioned, Stage, VersionedError, SCHEMA_VERSION_KEY};
use rfpdesk_rfps::RfpTimeline;

/// Action fired when a milestone is reached.
///
/// Declaration order is the canonical tie-break order for milestones that
/// share a timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineAction {
    QaOpened,
    QaClosed,
    SubmissionOpened,
    SubmissionClosed,
    DemoOpened,
    DemoClosed,
    AwardDateReached,
}

impl TimelineAction {
    pub const ALL: [TimelineAction; 7] = [
        TimelineAction::QaOpened,
        TimelineAction::QaClosed,
        TimelineAction::SubmissionOpened,
        TimelineAction::SubmissionClosed,
        TimelineAction::DemoOpened,
        TimelineAction::DemoClosed,
        TimelineAction::AwardDateReached,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineAction::QaOpened => "QA_OPENED",
            TimelineAction::QaClosed => "QA_CLOSED",
            TimelineAction::SubmissionOpened => "SUBMISSION_OPENED",
            TimelineAction::SubmissionClosed => "SUBMISSION_CLOSED",
            TimelineAction::DemoOpened => "DEMO_OPENED",
            TimelineAction::DemoClosed => "DEMO_CLOSED",
            TimelineAction::AwardDateReached => "AWARD_DATE_REACHED",
        }
    }

    /// Milestone field that triggers this action
    pub fn milestone(&self) -> &'static str {
        match self {
            TimelineAction::QaOpened => "askQuestionsStart",
            TimelineAction::QaClosed => "askQuestionsEnd",
            TimelineAction::SubmissionOpened => "submissionStart",
            TimelineAction::SubmissionClosed => "submissionEnd",
            TimelineAction::DemoOpened => "demoWindowStart",
            TimelineAction::DemoClosed => "demoWindowEnd",
            TimelineAction::AwardDateReached => "awardDate",
        }
    }

    /// Read this action's milestone timestamp from an RFP timeline
    pub fn milestone_at(&self, timeline: &RfpTimeline) -> Option<DateTime<Utc>> {
        match self {
            TimelineAction::QaOpened => timeline.ask_questions_start,
            TimelineAction::QaClosed => timeline.ask_questions_end,
            TimelineAction::SubmissionOpened => timeline.submission_start,
            TimelineAction::SubmissionClosed => timeline.submission_end,
            TimelineAction::DemoOpened => timeline.demo_window_start,
            TimelineAction::DemoClosed => timeline.demo_window_end,
            TimelineAction::AwardDateReached => timeline.award_date,
        }
    }

    /// Human-readable line used for notifications
    pub fn describe(&self) -> &'static str {
        match self {
            TimelineAction::QaOpened => "Q&A window opened",
            TimelineAction::QaClosed => "Q&A window closed",
            TimelineAction::SubmissionOpened => "Submission window opened",
            TimelineAction::SubmissionClosed => "Submission deadline passed",
            TimelineAction::DemoOpened => "Demo window opened",
            TimelineAction::DemoClosed => "Demo window closed",
            TimelineAction::AwardDateReached => "Award date reached",
        }
    }
}

impl std::fmt::Display for TimelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    /// No timestamp configured
    Missing,
    /// Belongs to an inconsistent window; its action will not fire
    Suppressed,
    /// In the future
    Pending,
    /// Action has fired
    Applied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneState {
    pub milestone: String,
    pub action: TimelineAction,
    pub at: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineIssueCode {
    QaWindowInverted,
    SubmissionWindowInverted,
    DemoWindowInverted,
    AwardBeforeSubmissionEnd,
    StoredStateUnreadable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineIssue {
    pub code: TimelineIssueCode,
    pub message: String,
    /// Actions withheld because of this issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<TimelineAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAction {
    pub action: TimelineAction,
    pub milestone_at: DateTime<Utc>,
    pub applied_at: DateTime<Utc>,
}

/// Normalized view of an RFP's timeline after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStateSnapshot {
    pub schema_version: u64,
    pub evaluated_at: DateTime<Utc>,
    pub stage: Stage,
    pub milestones: Vec<MilestoneState>,
    pub issues: Vec<TimelineIssue>,
    /// Every action applied so far, oldest first
    pub applied_actions: Vec<AppliedAction>,
}

/// Body of a version 1 snapshot. Early rows carried only the applied list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotV1 {
    #[serde(default)]
    applied_actions: Vec<AppliedAction>,
    #[serde(default)]
    evaluated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    stage: Option<Stage>,
    #[serde(default)]
    milestones: Vec<MilestoneState>,
    #[serde(default)]
    issues: Vec<TimelineIssue>,
}

impl TimelineStateSnapshot {
    pub const SCHEMA_VERSION: u64 = 1;
    const RECORD: &'static str = "timeline state";

    /// Parse a stored snapshot. `fallback_stage` and `fallback_at` fill fields
    /// that legacy rows lack.
    pub fn from_stored(
        value: &Value,
        fallback_stage: Stage,
        fallback_at: DateTime<Utc>,
    ) -> Result<Self, VersionedError> {
        match schema_version(Self::RECORD, value)? {
            1 => {
                let mut body = value.clone();
                if let Some(map) = body.as_object_mut() {
                    map.remove(SCHEMA_VERSION_KEY);
                }
                let v1: SnapshotV1 = versioned::decode(Self::RECORD, body)?;
                Ok(Self {
                    schema_version: Self::SCHEMA_VERSION,
                    evaluated_at: v1.evaluated_at.unwrap_or(fallback_at),
                    stage: v1.stage.unwrap_or(fallback_stage),
                    milestones: v1.milestones,
                    issues: v1.issues,
                    applied_actions: v1.applied_actions,
                })
            }
            version => Err(VersionedError::Unsupported {
                record: Self::RECORD,
                version,
            }),
        }
    }

    /// Parse the raw column text of a stored snapshot
    pub fn parse_stored(
        raw: &str,
        fallback_stage: Stage,
        fallback_at: DateTime<Utc>,
    ) -> Result<Self, VersionedError> {
        let value: Value = serde_json::from_str(raw).map_err(|source| VersionedError::Malformed {
            record: Self::RECORD,
            source,
        })?;
        Self::from_stored(&value, fallback_stage, fallback_at)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn is_applied(&self, action: TimelineAction) -> bool {
        self.applied_actions.iter().any(|a| a.action == action)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TickOptions {
    pub dry_run: bool,
    pub triggered_by_user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickOutcome {
    pub rfp_id: String,
    pub dry_run: bool,
    pub snapshot: TimelineStateSnapshot,
    pub actions_applied: Vec<AppliedAction>,
    /// Stage entered by auto-advance, if any
    pub advanced_to: Option<Stage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub rfp_id: String,
    pub action: TimelineAction,
    pub milestone_at: DateTime<Utc>,
    pub applied_at: DateTime<Utc>,
    pub triggered_by_user_id: Option<String>,
    pub payload: Option<Value>,
}
