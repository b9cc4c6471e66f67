// ABOUTME: Domain enums shared across RFP Desk packages
// ABOUTME: Stage pipeline, RFP status, user role, and SLA status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Position of an RFP in the buyer-side workflow.
///
/// Declaration order is pipeline order, so `Ord` compares pipeline position.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Intake,
    Qualification,
    Discovery,
    Drafting,
    PricingLegalReview,
    ExecReview,
    Submission,
    Debrief,
    Archived,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Stage; 9] = [
        Stage::Intake,
        Stage::Qualification,
        Stage::Discovery,
        Stage::Drafting,
        Stage::PricingLegalReview,
        Stage::ExecReview,
        Stage::Submission,
        Stage::Debrief,
        Stage::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "INTAKE",
            Self::Qualification => "QUALIFICATION",
            Self::Discovery => "DISCOVERY",
            Self::Drafting => "DRAFTING",
            Self::PricingLegalReview => "PRICING_LEGAL_REVIEW",
            Self::ExecReview => "EXEC_REVIEW",
            Self::Submission => "SUBMISSION",
            Self::Debrief => "DEBRIEF",
            Self::Archived => "ARCHIVED",
        }
    }

    /// Zero-based index in the pipeline.
    pub fn position(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::ALL.len() - 1)
    }

    /// The following working stage. `Debrief` and `Archived` have none;
    /// archiving is a separate branch, not a pipeline step.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Debrief | Self::Archived => None,
            _ => Self::ALL.get(self.position() + 1).copied(),
        }
    }

    pub fn previous(&self) -> Option<Stage> {
        match self {
            Self::Intake | Self::Archived => None,
            _ => Self::ALL.get(self.position() - 1).copied(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("stage", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RfpStatus {
    Draft,
    Published,
    Closed,
    Awarded,
}

impl Default for RfpStatus {
    fn default() -> Self {
        RfpStatus::Draft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Supplier => "supplier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "supplier" => Ok(Role::Supplier),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Ok,
    Warning,
    Breached,
}
