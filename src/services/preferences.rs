use crate::{db::PreferenceRepository, error::AppResult, models::PreferenceProfile};

/// Replaces the investor's stored preferences with `preferences`
///
/// Nothing from the previous profile is merged in.
pub async fn save_preferences(
    repository: &PreferenceRepository,
    preferences: PreferenceProfile,
) -> AppResult<PreferenceProfile> {
    preferences.validate()?;
    repository.save_preferences(&preferences).await?;

    tracing::info!(
        investor_id = repository.investor_id().unwrap_or("-"),
        sectors = preferences.sectors.len(),
        stages = preferences.stages.len(),
        locations = preferences.locations.len(),
        revenue_requirement = preferences.revenue_requirement,
        "Investor preferences saved"
    );

    Ok(preferences)
}
