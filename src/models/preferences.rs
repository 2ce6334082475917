use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use super::{Sector, Stage};
use crate::error::{AppError, AppResult};

/// How much early-stage or late-stage risk an investor accepts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

/// Investor preferences captured by the settings form
///
/// Every field is optional on the wire. An absent list and an empty list both
/// mean the dimension is not configured. Invalid entries in `sectors` and
/// `stages` are dropped individually, so one bad value never discards the
/// rest of the profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferenceProfile {
    /// Preferred sectors
    #[serde(deserialize_with = "skip_invalid_entries")]
    pub sectors: Vec<Sector>,
    /// Preferred funding stages
    #[serde(deserialize_with = "skip_invalid_entries")]
    pub stages: Vec<Stage>,
    /// Informational only; never used in scoring
    pub min_investment: Option<f64>,
    /// Informational only; never used in scoring
    pub max_investment: Option<f64>,
    /// Preferred locations, matched exactly
    pub locations: Vec<String>,
    pub risk_tolerance: Option<RiskTolerance>,
    /// Whether the investor only wants startups already generating revenue
    pub revenue_requirement: bool,
}

fn skip_invalid_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, entry = %entry, "Skipping invalid preference entry");
                None
            }
        })
        .collect())
}

impl PreferenceProfile {
    /// Creates an empty profile
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefers_sector(&self, sector: &Sector) -> bool {
        self.sectors.contains(sector)
    }

    pub fn prefers_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn prefers_location(&self, location: &str) -> bool {
        self.locations.iter().any(|l| l == location)
    }

    /// Checks the investment bounds entered on the settings form
    pub fn validate(&self) -> AppResult<()> {
        for bound in [self.min_investment, self.max_investment].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(AppError::InvalidInput(
                    "Investment bounds must be non-negative numbers".to_string(),
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_investment, self.max_investment) {
            if min > max {
                return Err(AppError::InvalidInput(format!(
                    "Minimum investment {} exceeds maximum investment {}",
                    min, max
                )));
            }
        }

        Ok(())
    }
}
