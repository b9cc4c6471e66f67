// ABOUTME: Generic weighted scorecard
// ABOUTME: Composite 0-100 score with per-factor contributions and threshold flags

use serde::{Deserialize, Serialize};

use super::error::ScoringError;

/// One weighted factor of a scorecard
#[derive(Debug, Clone, Copy)]
pub struct FactorSpec {
    pub key: &'static str,
    pub weight: f64,
    /// Flag raised when the factor's value is below the threshold
    pub flag: Option<(&'static str, f64)>,
}

impl FactorSpec {
    pub const fn new(key: &'static str, weight: f64) -> Self {
        Self {
            key,
            weight,
            flag: None,
        }
    }

    pub const fn flagged(key: &'static str, weight: f64, flag: &'static str, below: f64) -> Self {
        Self {
            key,
            weight,
            flag: Some((flag, below)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scorecard {
    pub name: &'static str,
    pub factors: &'static [FactorSpec],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorScore {
    pub key: String,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: f64,
    pub factors: Vec<FactorScore>,
    pub flags: Vec<String>,
}

impl Scorecard {
    /// Score the given factor values. Each value is clamped to 0-100 and a
    /// non-finite value counts as 0. Flags annotate the result and never move
    /// the score.
    pub fn evaluate(&self, values: &[(&str, f64)]) -> Result<ScoreResult, ScoringError> {
        let mut factors = Vec::with_capacity(self.factors.len());
        let mut flags = Vec::new();
        let mut total = 0.0;

        for spec in self.factors {
            let raw = values
                .iter()
                .find(|(key, _)| *key == spec.key)
                .map(|(_, v)| *v)
                .ok_or(ScoringError::MissingFactor {
                    scorecard: self.name,
                    factor: spec.key,
                })?;
            let value = clamp_percent(raw);
            let contribution = value * spec.weight;
            total += contribution;

            if let Some((flag, below)) = spec.flag {
                if value < below {
                    flags.push(flag.to_string());
                }
            }

            factors.push(FactorScore {
                key: spec.key.to_string(),
                value: round1(value),
                weight: spec.weight,
                contribution: round1(contribution),
            });
        }

        Ok(ScoreResult {
            score: round1(clamp_percent(total)),
            factors,
            flags,
        })
    }

    pub fn total_weight(&self) -> f64 {
        self.factors.iter().map(|f| f.weight).sum()
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a percentage; 0 when `whole` is 0
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64) * 100.0
}
