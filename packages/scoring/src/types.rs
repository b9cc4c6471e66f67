// ABOUTME: Supplier contact and response types
// ABOUTME: Includes the versioned pricing and readiness records stored as JSON columns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scorecard::FactorScore;
use rfpdesk_core::{schema_version, versioned, VersionedError, SCHEMA_VERSION_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Invited,
    Accepted,
    Declined,
    Submitted,
}

impl ContactStatus {
    /// Counts towards supplier engagement
    pub fn is_engaged(&self) -> bool {
        matches!(self, ContactStatus::Accepted | ContactStatus::Submitted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierContact {
    pub id: String,
    pub rfp_id: String,
    pub supplier_company_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub status: ContactStatus,
    pub invited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInviteInput {
    pub email: String,
    pub name: Option<String>,
    pub supplier_company_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Draft,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingLineItem {
    pub description: String,
    pub amount: f64,
}

/// Pricing extracted from a supplier response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPricing {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub line_items: Vec<PricingLineItem>,
}

impl ExtractedPricing {
    pub const SCHEMA_VERSION: u64 = 1;
    const RECORD: &'static str = "extracted pricing";

    /// Parse a stored record; untagged legacy rows are version 1
    pub fn from_stored(value: Value) -> Result<Self, VersionedError> {
        match schema_version(Self::RECORD, &value)? {
            1 => versioned::decode(Self::RECORD, strip_version(value)),
            version => Err(VersionedError::Unsupported {
                record: Self::RECORD,
                version,
            }),
        }
    }

    pub fn to_stored(&self) -> Result<Value, serde_json::Error> {
        Ok(tag(serde_json::to_value(self)?, Self::SCHEMA_VERSION))
    }

    /// 100 with a positive total, 50 with line items only, 0 otherwise
    pub fn completeness(&self) -> f64 {
        match self.total {
            Some(total) if total > 0.0 => 100.0,
            _ if !self.line_items.is_empty() => 50.0,
            _ => 0.0,
        }
    }
}

/// Persisted result of a readiness computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessBreakdown {
    pub score: f64,
    pub factors: Vec<FactorScore>,
    pub flags: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

impl ReadinessBreakdown {
    pub const SCHEMA_VERSION: u64 = 1;
    const RECORD: &'static str = "readiness breakdown";

    pub fn from_stored(value: Value) -> Result<Self, VersionedError> {
        match schema_version(Self::RECORD, &value)? {
            1 => versioned::decode(Self::RECORD, strip_version(value)),
            version => Err(VersionedError::Unsupported {
                record: Self::RECORD,
                version,
            }),
        }
    }

    pub fn to_stored(&self) -> Result<Value, serde_json::Error> {
        Ok(tag(serde_json::to_value(self)?, Self::SCHEMA_VERSION))
    }
}

fn strip_version(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove(SCHEMA_VERSION_KEY);
    }
    value
}

fn tag(mut value: Value, version: u64) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(version));
    }
    value
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierResponse {
    pub id: String,
    pub rfp_id: String,
    pub supplier_contact_id: String,
    pub status: ResponseStatus,
    pub answers_total: i64,
    pub answers_completed: i64,
    pub compliance_coverage: Option<f64>,
    pub extracted_pricing: Option<ExtractedPricing>,
    pub submitted_at: Option<DateTime<Utc>>,

    // Derived by the readiness calculator
    pub readiness_score: Option<f64>,
    pub readiness_breakdown: Option<ReadinessBreakdown>,
    pub compliance_flags: Vec<String>,
    pub readiness_updated_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInput {
    pub answers_total: Option<i64>,
    pub answers_completed: Option<i64>,
    pub compliance_coverage: Option<f64>,
    pub extracted_pricing: Option<ExtractedPricing>,
}
