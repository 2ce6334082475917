use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Sector, Stage};

/// A single swipe decision recorded against a startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub startup_id: String,
    pub interested: bool,
    pub sector: Sector,
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
    /// Score at the moment of the swipe; kept for analysis, never fed back into scoring
    pub recommendation_score: u8,
}

/// Append-only swipe history, serialized as a plain JSON array
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InteractionHistory {
    records: Vec<InteractionRecord>,
}

impl InteractionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: InteractionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fraction of interested swipes among records sharing the sector or the stage
    pub fn interest_ratio(&self, sector: &Sector, stage: Stage) -> Option<f64> {
        let (interested, total) = self
            .records
            .iter()
            .filter(|r| &r.sector == sector || r.stage == stage)
            .fold((0u32, 0u32), |(interested, total), r| {
                (interested + u32::from(r.interested), total + 1)
            });

        if total == 0 {
            None
        } else {
            Some(f64::from(interested) / f64::from(total))
        }
    }
}

impl From<Vec<InteractionRecord>> for InteractionHistory {
    fn from(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }
}
