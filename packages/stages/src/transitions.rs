// ABOUTME: Stage transition table and validation
// ABOUTME: Fails closed: anything not explicitly allowed is rejected with a reason

use chrono::{DateTime, Utc};
use serde::Serialize;

use rfpdesk_core::Stage;
use rfpdesk_rfps::{Rfp, RfpTimeline};

use super::guards::guards_for;

/// RFP-specific facts the guards look at
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub timeline: &'a RfpTimeline,
    pub now: DateTime<Utc>,
}

impl<'a> TransitionContext<'a> {
    pub fn new(timeline: &'a RfpTimeline, now: DateTime<Utc>) -> Self {
        Self { timeline, now }
    }

    pub fn for_rfp(rfp: &'a Rfp, now: DateTime<Utc>) -> Self {
        Self::new(&rfp.timeline, now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDecision {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionDecision {
    fn allow() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Stages reachable from `current`: the next pipeline stage, one step back
/// for rework, and `Archived` from anywhere except `Archived` itself.
pub fn allowed_next_stages(current: Stage) -> Vec<Stage> {
    if current.is_terminal() {
        return Vec::new();
    }

    let mut allowed = Vec::with_capacity(3);
    if let Some(next) = current.next() {
        allowed.push(next);
    }
    if let Some(previous) = current.previous() {
        allowed.push(previous);
    }
    allowed.push(Stage::Archived);
    allowed
}

/// Decide whether `current -> requested` is permitted. Total over every pair.
pub fn validate_stage_transition(
    current: Stage,
    requested: Stage,
    ctx: &TransitionContext<'_>,
) -> TransitionDecision {
    if current.is_terminal() {
        return TransitionDecision::reject(format!(
            "{} is terminal: no further transitions are allowed",
            current
        ));
    }

    if current == requested {
        return TransitionDecision::reject(format!("RFP is already in {}", current));
    }

    let allowed = allowed_next_stages(current);
    if !allowed.contains(&requested) {
        let names = allowed
            .iter()
            .map(Stage::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return TransitionDecision::reject(format!(
            "Cannot move from {} to {}: allowed next stages are {}",
            current, requested, names
        ));
    }

    for guard in guards_for(requested) {
        if let Err(reason) = guard.evaluate(ctx) {
            return TransitionDecision::reject(reason);
        }
    }

    TransitionDecision::allow()
}
