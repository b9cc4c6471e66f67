// ABOUTME: Stage policy for the RFP workflow
// ABOUTME: SLA calculation, transition table with named guards, and stage-entry checklist automation

pub mod automation;
pub mod error;
pub mod guards;
pub mod service;
pub mod sla;
pub mod storage;
pub mod transitions;
pub mod types;

pub use automation::{run_stage_automations, stage_checklist};
pub use error::StageError;
pub use guards::{StageGuard, GUARDS};
pub use service::{StageService, TransitionOutcome};
pub use sla::{default_sla_days, get_sla_status, sla_report_for, SlaReport};
pub use storage::StageTaskStorage;
pub use transitions::{
    allowed_next_stages, validate_stage_transition, TransitionContext, TransitionDecision,
};
pub use types::{StageTask, StageTaskCreateInput, StageTaskUpdateInput};
