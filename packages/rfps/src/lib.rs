// ABOUTME: RFP aggregate management
// ABOUTME: Provides types and storage for RFPs, their milestones, and archive state

pub mod storage;
pub mod types;

pub use storage::RfpStorage;
pub use types::{ClearableField, Rfp, RfpCreateInput, RfpTimeline, RfpUpdateInput, StageChange};
