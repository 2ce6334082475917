mod calibration;
mod interaction;
mod preferences;
mod startup;

pub use calibration::{CalibrationRecord, CalibrationSet, Rating};
pub use interaction::{InteractionHistory, InteractionRecord};
pub use preferences::{PreferenceProfile, RiskTolerance};
pub use startup::{Sector, Stage, Startup, NO_REVENUE};
