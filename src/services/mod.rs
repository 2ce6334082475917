pub mod calibration;
pub mod preferences;
pub mod recommendations;

pub use recommendations::{RecommendationEngine, DEFAULT_RECOMMENDATION_COUNT};
