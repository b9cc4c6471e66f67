// ABOUTME: RFP type definitions
// ABOUTME: Aggregate record, timeline milestones, and create/update inputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rfpdesk_core::{RfpStatus, Stage};

/// Date-driven milestones of an RFP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpTimeline {
    pub ask_questions_start: Option<DateTime<Utc>>,
    pub ask_questions_end: Option<DateTime<Utc>>,
    pub submission_start: Option<DateTime<Utc>>,
    pub submission_end: Option<DateTime<Utc>>,
    pub demo_window_start: Option<DateTime<Utc>>,
    pub demo_window_end: Option<DateTime<Utc>>,
    pub award_date: Option<DateTime<Utc>>,
}

impl RfpTimeline {
    pub fn has_any_milestone(&self) -> bool {
        self.ask_questions_start.is_some()
            || self.ask_questions_end.is_some()
            || self.submission_start.is_some()
            || self.submission_end.is_some()
            || self.demo_window_start.is_some()
            || self.demo_window_end.is_some()
            || self.award_date.is_some()
    }

    /// Overlay the milestones that are set in `other`
    pub fn merge(&mut self, other: &RfpTimeline) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(
            ask_questions_start,
            ask_questions_end,
            submission_start,
            submission_end,
            demo_window_start,
            demo_window_end,
            award_date
        );
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rfp {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub stage: Stage,
    pub status: RfpStatus,
    pub stage_entered_at: Option<DateTime<Utc>>,
    pub stage_sla_days: Option<u32>,

    #[serde(flatten)]
    pub timeline: RfpTimeline,
    /// Stored timeline snapshot text, kept raw so the timeline engine can
    /// report a column it cannot read
    #[serde(skip)]
    pub timeline_state: Option<String>,

    // Archive
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub archived_by: Option<String>,

    // Ownership
    pub user_id: String,
    pub company_id: String,

    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rfp {
    /// Archived RFPs reject every mutation
    pub fn is_read_only(&self) -> bool {
        self.is_archived || self.stage == Stage::Archived
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpCreateInput {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<RfpStatus>,
    pub stage_sla_days: Option<u32>,
    #[serde(flatten)]
    pub timeline: RfpTimeline,
}

/// Optional RFP fields an update can reset to unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClearableField {
    Description,
    StageSlaDays,
    AskQuestionsStart,
    AskQuestionsEnd,
    SubmissionStart,
    SubmissionEnd,
    DemoWindowStart,
    DemoWindowEnd,
    AwardDate,
}

impl ClearableField {
    pub fn column(&self) -> &'static str {
        match self {
            ClearableField::Description => "description",
            ClearableField::StageSlaDays => "stage_sla_days",
            ClearableField::AskQuestionsStart => "ask_questions_start",
            ClearableField::AskQuestionsEnd => "ask_questions_end",
            ClearableField::SubmissionStart => "submission_start",
            ClearableField::SubmissionEnd => "submission_end",
            ClearableField::DemoWindowStart => "demo_window_start",
            ClearableField::DemoWindowEnd => "demo_window_end",
            ClearableField::AwardDate => "award_date",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfpUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<RfpStatus>,
    pub stage_sla_days: Option<u32>,
    #[serde(flatten)]
    pub timeline: RfpTimeline,
    /// Fields to reset to unset. A field cannot be set and cleared at once.
    #[serde(default)]
    pub clear: Vec<ClearableField>,
}

impl RfpUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.stage_sla_days.is_none()
            && !self.timeline.has_any_milestone()
            && self.clear.is_empty()
    }

    /// Whether this update also assigns a value to `field`
    pub fn sets(&self, field: ClearableField) -> bool {
        let t = &self.timeline;
        match field {
            ClearableField::Description => self
                .description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty()),
            ClearableField::StageSlaDays => self.stage_sla_days.is_some(),
            ClearableField::AskQuestionsStart => t.ask_questions_start.is_some(),
            ClearableField::AskQuestionsEnd => t.ask_questions_end.is_some(),
            ClearableField::SubmissionStart => t.submission_start.is_some(),
            ClearableField::SubmissionEnd => t.submission_end.is_some(),
            ClearableField::DemoWindowStart => t.demo_window_start.is_some(),
            ClearableField::DemoWindowEnd => t.demo_window_end.is_some(),
            ClearableField::AwardDate => t.award_date.is_some(),
        }
    }
}

/// A stage write, guarded by the version the caller read
#[derive(Debug, Clone)]
pub struct StageChange {
    pub expected_version: i64,
    pub stage: Stage,
    pub entered_at: DateTime<Utc>,
    /// Set when the new stage archives the RFP
    pub archived_by: Option<String>,
}
