// ABOUTME: Snapshot service wiring storage reads, composers, and the freshness caches
// ABOUTME: Writers call the invalidate methods so the next read recomposes

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use super::brief::{compose_brief, DecisionBrief};
use super::cache::{Cached, FreshnessCache, SnapshotKey, SnapshotKind};
use super::error::{SnapshotError, SnapshotResult};
use super::portfolio::{compose_portfolio, PortfolioSnapshot};
use rfpdesk_core::SharedClock;
use rfpdesk_rfps::RfpStorage;
use rfpdesk_scoring::{ContactStorage, ResponseStorage};

#[derive(Clone)]
pub struct SnapshotService {
    rfps: RfpStorage,
    contacts: ContactStorage,
    responses: ResponseStorage,
    portfolios: Arc<FreshnessCache<PortfolioSnapshot>>,
    briefs: Arc<FreshnessCache<DecisionBrief>>,
    clock: SharedClock,
}

impl SnapshotService {
    pub fn new(
        rfps: RfpStorage,
        contacts: ContactStorage,
        responses: ResponseStorage,
        threshold: Duration,
        clock: SharedClock,
    ) -> Self {
        Self {
            rfps,
            contacts,
            responses,
            portfolios: Arc::new(FreshnessCache::new(threshold, clock.clone())),
            briefs: Arc::new(FreshnessCache::new(threshold, clock.clone())),
            clock,
        }
    }

    pub async fn portfolio(&self, company_id: &str) -> SnapshotResult<Cached<PortfolioSnapshot>> {
        let key = SnapshotKey::new(company_id, SnapshotKind::Portfolio);
        self.portfolios
            .get_or_refresh(&key, move || async move {
                let (rfps, _) = self
                    .rfps
                    .list_rfps_paginated(company_id, false, None, None)
                    .await?;
                let contacts = self.contacts.list_for_buyer(company_id).await?;
                let responses = self.responses.list_for_company(company_id).await?;
                let snapshot =
                    compose_portfolio(company_id, &rfps, &contacts, &responses, self.clock.now())?;
                Ok::<_, SnapshotError>(snapshot)
            })
            .await
    }

    pub async fn decision_brief(&self, rfp_id: &str) -> SnapshotResult<Cached<DecisionBrief>> {
        let key = SnapshotKey::new(rfp_id, SnapshotKind::DecisionBrief);
        self.briefs
            .get_or_refresh(&key, move || async move {
                let rfp = self.rfps.get_rfp(rfp_id).await?;
                let contacts = self.contacts.list_contacts(rfp_id).await?;
                let responses = self.responses.list_for_rfp(rfp_id).await?;
                Ok::<_, SnapshotError>(compose_brief(&rfp, &contacts, &responses, self.clock.now()))
            })
            .await
    }

    /// Drop the snapshots a write to `rfp_id` makes stale: its decision
    /// brief and its company's portfolio
    pub async fn invalidate_rfp(&self, rfp_id: &str, company_id: &str) {
        debug!(rfp_id = %rfp_id, company_id = %company_id, "Invalidating snapshots");
        self.briefs
            .invalidate(&SnapshotKey::new(rfp_id, SnapshotKind::DecisionBrief))
            .await;
        self.invalidate_company(company_id).await;
    }

    pub async fn invalidate_company(&self, company_id: &str) {
        self.portfolios
            .invalidate(&SnapshotKey::new(company_id, SnapshotKind::Portfolio))
            .await;
    }
}
