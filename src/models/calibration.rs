use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Sector, Stage, Startup};

/// Interest rating given to a startup during calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// "Not Interested"
    pub const NOT_INTERESTED: Rating = Rating(1);
    /// "Maybe"
    pub const MAYBE: Rating = Rating(3);
    /// "Very Interested"
    pub const VERY_INTERESTED: Rating = Rating(5);

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("rating must be between 1 and 5, got {}", value))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// One investor rating of a calibration startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    pub startup_id: String,
    pub rating: Rating,
    pub sector: Sector,
    pub stage: Stage,
    #[serde(default)]
    pub revenue: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CalibrationRecord {
    pub fn for_startup(startup: &Startup, rating: Rating) -> Self {
        Self {
            startup_id: startup.id.clone(),
            rating,
            sector: startup.sector.clone(),
            stage: startup.stage,
            revenue: startup.revenue.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Calibration ratings keyed by startup
///
/// Serialized as a plain JSON array of records.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CalibrationSet {
    records: Vec<CalibrationRecord>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any earlier rating of the same startup in place
    pub fn upsert(&mut self, record: CalibrationRecord) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.startup_id == record.startup_id)
        {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    pub fn records(&self) -> &[CalibrationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean rating over records in the given sector, if any exist
    pub fn mean_rating_for_sector(&self, sector: &Sector) -> Option<f64> {
        mean_rating(self.records.iter().filter(|r| &r.sector == sector))
    }

    /// Mean rating over records at the given stage, if any exist
    pub fn mean_rating_for_stage(&self, stage: Stage) -> Option<f64> {
        mean_rating(self.records.iter().filter(|r| r.stage == stage))
    }
}

impl From<Vec<CalibrationRecord>> for CalibrationSet {
    fn from(records: Vec<CalibrationRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.upsert(record);
        }
        set
    }
}

fn mean_rating<'a>(records: impl Iterator<Item = &'a CalibrationRecord>) -> Option<f64> {
    let (sum, count) = records.fold((0u32, 0u32), |(sum, count), r| {
        (sum + u32::from(r.rating.value()), count + 1)
    });

    if count == 0 {
        None
    } else {
        Some(f64::from(sum) / f64::from(count))
    }
}
