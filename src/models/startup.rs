use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Revenue text meaning the startup has no revenue yet
pub const NO_REVENUE: &str = "$0 MRR";

/// Industry sector of a startup (e.g., "AI/ML", "FinTech")
///
/// Matching is exact and case-sensitive, so the value is stored verbatim.
/// Only blank values are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sector(String);

impl Sector {
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("sector must not be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Sector for built-in catalog entries, whose names are never blank
    pub(crate) fn from_catalog(name: &'static str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sector> for String {
    fn from(sector: Sector) -> Self {
        sector.0
    }
}

impl Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Funding stage, ordered from earliest to latest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Pre-seed")]
    PreSeed,
    #[serde(rename = "Seed")]
    Seed,
    #[serde(rename = "Series A")]
    SeriesA,
    #[serde(rename = "Series B")]
    SeriesB,
    #[serde(rename = "Series C+")]
    SeriesCPlus,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::PreSeed,
        Stage::Seed,
        Stage::SeriesA,
        Stage::SeriesB,
        Stage::SeriesCPlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreSeed => "Pre-seed",
            Stage::Seed => "Seed",
            Stage::SeriesA => "Series A",
            Stage::SeriesB => "Series B",
            Stage::SeriesCPlus => "Series C+",
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage: {}", s))
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A startup seeking funding, as supplied by the marketplace catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Startup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sector: Sector,
    pub stage: Stage,
    #[serde(default)]
    pub funding_target: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub team_size: u32,
    /// Free text such as "$8K MRR"; "$0 MRR" means no revenue
    #[serde(default)]
    pub revenue: Option<String>,
    #[serde(default)]
    pub traction: String,
    #[serde(default)]
    pub logo: String,
    /// Attached by the recommendation engine; not part of the startup's identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_score: Option<u8>,
}

impl Startup {
    /// Creates a startup with the matching dimensions set and everything else blank
    pub fn new(id: impl Into<String>, name: impl Into<String>, sector: Sector, stage: Stage) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            sector,
            stage,
            funding_target: String::new(),
            location: String::new(),
            team_size: 0,
            revenue: None,
            traction: String::new(),
            logo: String::new(),
            recommendation_score: None,
        }
    }

    /// Whether the revenue field reports actual revenue
    pub fn reports_revenue(&self) -> bool {
        self.revenue
            .as_deref()
            .is_some_and(|revenue| !revenue.is_empty() && revenue != NO_REVENUE)
    }

    /// Returns a copy carrying the given recommendation score
    pub fn with_score(&self, score: u8) -> Self {
        Self {
            recommendation_score: Some(score),
            ..self.clone()
        }
    }
}
