// ABOUTME: Cached read models composed from RFP, contact, and response records
// ABOUTME: Portfolio and decision-brief composers behind a single-flight freshness cache

pub mod brief;
pub mod cache;
pub mod error;
pub mod portfolio;
pub mod service;

pub use brief::{compose_brief, DecisionBrief, RankedResponse};
pub use cache::{Cached, FreshnessCache, SnapshotKey, SnapshotKind};
pub use error::{SnapshotError, SnapshotResult};
pub use portfolio::{
    compose_portfolio, PortfolioSnapshot, RfpOpportunity, UpcomingMilestone, UPCOMING_WINDOW_DAYS,
};
pub use service::SnapshotService;
