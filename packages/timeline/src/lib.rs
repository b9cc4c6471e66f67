// ABOUTME: Timeline engine for date-driven RFP milestones
// ABOUTME: Normalizes milestones, computes due actions, and applies ticks with audit events

pub mod engine;
pub mod error;
pub mod normalize;
pub mod storage;
pub mod types;

pub use engine::{evaluate, stored_applied_actions, Evaluation, TickAllReport, TickFailure, TimelineEngine};
pub use error::{TimelineError, TimelineResult};
pub use normalize::{compute_due_actions, detect_issues, milestone_states, DueAction};
pub use storage::TimelineEventStorage;
pub use types::{
    AppliedAction, MilestoneState, MilestoneStatus, TickOptions, TickOutcome, TimelineAction,
    TimelineEvent, TimelineIssue, TimelineIssueCode, TimelineStateSnapshot,
};
