use crate::{
    db::PreferenceRepository,
    error::{AppError, AppResult},
    models::{CalibrationRecord, Rating, Sector, Stage, Startup},
};

/// Demo startups an investor rates once during onboarding
///
/// The set spans every funding stage so stage affinity can be learned
/// alongside sector affinity.
pub fn calibration_deck() -> Vec<Startup> {
    vec![
        deck_entry(
            "cal-1",
            "NeuralDesk",
            "AI/ML",
            Stage::Seed,
            "AI assistant that drafts support replies from a company's help center",
            "$1.5M",
            "San Francisco, CA",
            8,
            "$8K MRR",
            "40 paying teams, 22% MoM growth",
        ),
        deck_entry(
            "cal-2",
            "Ledgerly",
            "FinTech",
            Stage::SeriesA,
            "Automated bookkeeping and cash-flow forecasting for small businesses",
            "$8M",
            "New York, NY",
            24,
            "$120K MRR",
            "1,800 SMB customers",
        ),
        deck_entry(
            "cal-3",
            "GridFlow",
            "CleanTech",
            Stage::PreSeed,
            "Software that schedules EV charging around grid demand peaks",
            "$750K",
            "Austin, TX",
            4,
            "$0 MRR",
            "Two utility pilots signed",
        ),
        deck_entry(
            "cal-4",
            "CareLoop",
            "HealthTech",
            Stage::SeriesB,
            "Remote monitoring platform for post-operative patients",
            "$20M",
            "Boston, MA",
            65,
            "$450K MRR",
            "Deployed in 30 hospitals",
        ),
        deck_entry(
            "cal-5",
            "Stackwise",
            "SaaS",
            Stage::SeriesCPlus,
            "Observability suite for mid-market engineering teams",
            "$60M",
            "Seattle, WA",
            210,
            "$2.1M MRR",
            "Net revenue retention of 135%",
        ),
        deck_entry(
            "cal-6",
            "Tutorly",
            "EdTech",
            Stage::Seed,
            "Adaptive math tutoring delivered over messaging apps",
            "$2M",
            "Chicago, IL",
            11,
            "$15K MRR",
            "25,000 weekly active students",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn deck_entry(
    id: &str,
    name: &str,
    sector: &'static str,
    stage: Stage,
    description: &str,
    funding_target: &str,
    location: &str,
    team_size: u32,
    revenue: &str,
    traction: &str,
) -> Startup {
    Startup {
        description: description.to_string(),
        funding_target: funding_target.to_string(),
        location: location.to_string(),
        team_size,
        revenue: Some(revenue.to_string()),
        traction: traction.to_string(),
        ..Startup::new(id, name, Sector::from_catalog(sector), stage)
    }
}

/// Stores the investor's rating of a startup, replacing any earlier rating of it
pub async fn record_calibration(
    repository: &PreferenceRepository,
    startup: &Startup,
    rating: Rating,
) -> AppResult<CalibrationRecord> {
    let record = CalibrationRecord::for_startup(startup, rating);
    let calibration = repository.upsert_calibration(record.clone()).await?;

    tracing::info!(
        startup_id = %record.startup_id,
        rating = rating.value(),
        calibrated = calibration.len(),
        "Calibration rating recorded"
    );

    Ok(record)
}

/// Parses a raw rating from a request
pub fn parse_rating(value: u8) -> AppResult<Rating> {
    Rating::try_from(value).map_err(AppError::InvalidInput)
}

/// Discards every calibration rating for the investor
pub async fn reset_calibration(repository: &PreferenceRepository) -> AppResult<()> {
    repository.clear_calibration().await?;
    tracing::info!(
        investor_id = repository.investor_id().unwrap_or("-"),
        "Calibration reset"
    );
    Ok(())
}
