// ABOUTME: Supplier response service
// ABOUTME: Invitations, response editing and submission, and explicit readiness recomputation

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::error::{ScoringError, ScoringResult};
use super::readiness::calculate_readiness;
use super::storage::{ContactStorage, ResponseStorage};
use super::types::{
    ContactInviteInput, ContactStatus, ReadinessBreakdown, ResponseInput, SupplierContact,
    SupplierResponse,
};
use rfpdesk_activity::{ActivityKind, ActivitySink, NewActivity};
use rfpdesk_core::SharedClock;
use rfpdesk_rfps::{Rfp, RfpStorage};
use rfpdesk_storage::StorageError;

#[derive(Clone)]
pub struct ResponseService {
    rfps: RfpStorage,
    contacts: ContactStorage,
    responses: ResponseStorage,
    activity: Arc<dyn ActivitySink>,
    clock: SharedClock,
}

impl ResponseService {
    pub fn new(
        rfps: RfpStorage,
        contacts: ContactStorage,
        responses: ResponseStorage,
        activity: Arc<dyn ActivitySink>,
        clock: SharedClock,
    ) -> Self {
        Self {
            rfps,
            contacts,
            responses,
            activity,
            clock,
        }
    }

    pub fn contacts(&self) -> &ContactStorage {
        &self.contacts
    }

    pub async fn invite_supplier(
        &self,
        rfp_id: &str,
        input: ContactInviteInput,
        actor: Option<&str>,
    ) -> ScoringResult<SupplierContact> {
        self.writable_rfp(rfp_id).await?;

        let contact = self.contacts.invite(rfp_id, input, self.clock.now()).await?;
        info!(rfp_id = %rfp_id, contact_id = %contact.id, "Supplier invited");

        self.activity
            .record(
                NewActivity::for_rfp(rfp_id, actor, ActivityKind::SupplierInvited)
                    .with_payload(json!({ "contactId": contact.id, "email": contact.email })),
            )
            .await;

        Ok(contact)
    }

    pub async fn list_contacts(&self, rfp_id: &str) -> ScoringResult<Vec<SupplierContact>> {
        self.rfps.get_rfp(rfp_id).await?;
        Ok(self.contacts.list_contacts(rfp_id).await?)
    }

    pub async fn list_responses(&self, rfp_id: &str) -> ScoringResult<Vec<SupplierResponse>> {
        self.rfps.get_rfp(rfp_id).await?;
        Ok(self.responses.list_for_rfp(rfp_id).await?)
    }

    pub async fn get_response(&self, response_id: &str) -> ScoringResult<SupplierResponse> {
        Ok(self.responses.get_response(response_id).await?)
    }

    /// Start a response on behalf of `contact_id`. Creating a response
    /// accepts the invitation.
    pub async fn create_response(
        &self,
        rfp_id: &str,
        contact_id: &str,
        input: ResponseInput,
    ) -> ScoringResult<SupplierResponse> {
        self.writable_rfp(rfp_id).await?;

        let contact = self.contacts.get_contact(contact_id).await?;
        if contact.rfp_id != rfp_id {
            return Err(StorageError::not_found("supplier contact", contact_id).into());
        }

        let response = self
            .responses
            .create_response(rfp_id, contact_id, input, self.clock.now())
            .await?;

        if contact.status == ContactStatus::Invited {
            self.contacts
                .set_status(contact_id, ContactStatus::Accepted)
                .await?;
        }

        Ok(response)
    }

    pub async fn update_response(
        &self,
        response_id: &str,
        input: ResponseInput,
    ) -> ScoringResult<SupplierResponse> {
        let existing = self.responses.get_response(response_id).await?;
        self.writable_rfp(&existing.rfp_id).await?;

        Ok(self
            .responses
            .update_response(response_id, input, self.clock.now())
            .await?)
    }

    /// Submit a draft response and recompute its readiness, since
    /// timeliness depends on the submission time
    pub async fn submit_response(
        &self,
        response_id: &str,
        actor: Option<&str>,
    ) -> ScoringResult<SupplierResponse> {
        let existing = self.responses.get_response(response_id).await?;
        self.writable_rfp(&existing.rfp_id).await?;

        let submitted = self
            .responses
            .mark_submitted(response_id, self.clock.now())
            .await?;
        self.contacts
            .set_status(&submitted.supplier_contact_id, ContactStatus::Submitted)
            .await?;

        self.activity
            .record(
                NewActivity::for_rfp(&submitted.rfp_id, actor, ActivityKind::ResponseSubmitted)
                    .with_payload(json!({ "responseId": submitted.id })),
            )
            .await;

        self.update_response_readiness(response_id).await
    }

    /// Recompute readiness from the response's stored inputs and persist the
    /// derived fields
    pub async fn update_response_readiness(
        &self,
        response_id: &str,
    ) -> ScoringResult<SupplierResponse> {
        let response = self.responses.get_response(response_id).await?;
        let rfp = self.writable_rfp(&response.rfp_id).await?;

        let result = calculate_readiness(&response, rfp.timeline.submission_end)?;
        let breakdown = ReadinessBreakdown {
            score: result.score,
            factors: result.factors,
            flags: result.flags,
            computed_at: self.clock.now(),
        };

        let updated = self.responses.write_readiness(response_id, &breakdown).await?;

        info!(
            response_id = %response_id,
            score = breakdown.score,
            flags = breakdown.flags.len(),
            "Readiness updated"
        );

        self.activity
            .record(
                NewActivity::for_rfp(&rfp.id, None, ActivityKind::ReadinessUpdated).with_payload(
                    json!({ "responseId": response_id, "score": breakdown.score }),
                ),
            )
            .await;

        Ok(updated)
    }

    async fn writable_rfp(&self, rfp_id: &str) -> ScoringResult<Rfp> {
        let rfp = self.rfps.get_rfp(rfp_id).await?;
        if rfp.is_read_only() {
            return Err(ScoringError::ArchivedReadOnly(rfp.id));
        }
        Ok(rfp)
    }
}
