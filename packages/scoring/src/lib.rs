// ABOUTME: Weighted scoring for supplier readiness and RFP opportunity
// ABOUTME: Also owns supplier contacts and responses, whose derived fields the readiness calculator fills

pub mod error;
pub mod opportunity;
pub mod readiness;
pub mod scorecard;
pub mod service;
pub mod storage;
pub mod types;

pub use error::{ScoringError, ScoringResult};
pub use opportunity::{calculate_opportunity, OpportunityInputs, OPPORTUNITY};
pub use readiness::{calculate_readiness, timeliness, READINESS};
pub use scorecard::{percent, round1, FactorScore, FactorSpec, ScoreResult, Scorecard};
pub use service::ResponseService;
pub use storage::{ContactStorage, ResponseStorage};
pub use types::{
    ContactInviteInput, ContactStatus, ExtractedPricing, PricingLineItem, ReadinessBreakdown,
    ResponseInput, ResponseStatus, SupplierContact, SupplierResponse,
};
