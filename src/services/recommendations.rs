//! Investor-side recommendation engine.
//!
//! Scores startups from three persisted signals:
//! 1. The investor's preference profile (sector, stage, location, revenue, risk)
//! 2. Calibration ratings given during onboarding
//! 3. Swipe history
//!
//! Signals are loaded once when the engine is built. Only `log_interaction`
//! changes them afterwards.

use chrono::Utc;

use crate::{
    db::PreferenceRepository,
    models::{
        CalibrationSet, InteractionHistory, InteractionRecord, PreferenceProfile, RiskTolerance,
        Stage, Startup,
    },
};

/// Number of startups returned when the caller does not ask for a count
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

const BASE_SCORE: f64 = 50.0;

const SECTOR_MATCH: f64 = 30.0;
const SECTOR_MISMATCH: f64 = -10.0;
const STAGE_MATCH: f64 = 25.0;
const STAGE_MISMATCH: f64 = -5.0;
const LOCATION_MATCH: f64 = 15.0;
const REVENUE_MATCH: f64 = 20.0;
const REVENUE_MISSING: f64 = -15.0;

/// Neutral point of the 1..=5 calibration scale
const NEUTRAL_RATING: f64 = 3.0;
const SECTOR_CALIBRATION_WEIGHT: f64 = 10.0;
const STAGE_CALIBRATION_WEIGHT: f64 = 8.0;
const HISTORY_WEIGHT: f64 = 20.0;

const LOW_RISK_PRE_SEED_PENALTY: f64 = -15.0;
const HIGH_RISK_LATE_STAGE_PENALTY: f64 = -10.0;

/// Mean sector calibration at or above which the reason mentions past interest
const HIGH_INTEREST_RATING: f64 = 4.0;

const FALLBACK_REASON: &str = "shows strong growth potential";

/// Scores and ranks startups for one investor session
pub struct RecommendationEngine {
    repository: PreferenceRepository,
    preferences: PreferenceProfile,
    calibration: CalibrationSet,
    history: InteractionHistory,
}

impl RecommendationEngine {
    /// Builds an engine from the investor's stored signals
    ///
    /// Never fails: absent or malformed data leaves that signal empty, which
    /// scores every startup at the neutral baseline.
    pub async fn load(repository: PreferenceRepository) -> Self {
        let preferences = repository.load_preferences().await;
        let calibration = repository.load_calibration().await;
        let history = repository.load_interactions().await;

        tracing::debug!(
            investor_id = repository.investor_id().unwrap_or("-"),
            calibration_records = calibration.len(),
            interactions = history.len(),
            "Recommendation engine loaded"
        );

        Self {
            repository,
            preferences,
            calibration,
            history,
        }
    }

    pub fn preferences(&self) -> &PreferenceProfile {
        &self.preferences
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    pub fn history(&self) -> &InteractionHistory {
        &self.history
    }

    /// Scores a startup from 0 to 100, where 50 is neutral
    ///
    /// Adjustments are summed and the total is clamped once at the end.
    pub fn calculate_startup_score(&self, startup: &Startup) -> u8 {
        let prefs = &self.preferences;
        let mut adjustment = 0.0;

        if !prefs.sectors.is_empty() {
            adjustment += if prefs.prefers_sector(&startup.sector) {
                SECTOR_MATCH
            } else {
                SECTOR_MISMATCH
            };
        }

        if !prefs.stages.is_empty() {
            adjustment += if prefs.prefers_stage(startup.stage) {
                STAGE_MATCH
            } else {
                STAGE_MISMATCH
            };
        }

        if prefs.prefers_location(&startup.location) {
            adjustment += LOCATION_MATCH;
        }

        if prefs.revenue_requirement {
            adjustment += if startup.reports_revenue() {
                REVENUE_MATCH
            } else {
                REVENUE_MISSING
            };
        }

        if let Some(mean) = self.calibration.mean_rating_for_sector(&startup.sector) {
            adjustment += (mean - NEUTRAL_RATING) * SECTOR_CALIBRATION_WEIGHT;
        }

        if let Some(mean) = self.calibration.mean_rating_for_stage(startup.stage) {
            adjustment += (mean - NEUTRAL_RATING) * STAGE_CALIBRATION_WEIGHT;
        }

        if let Some(ratio) = self.history.interest_ratio(&startup.sector, startup.stage) {
            adjustment += (ratio - 0.5) * HISTORY_WEIGHT;
        }

        match (prefs.risk_tolerance, startup.stage) {
            (Some(RiskTolerance::Low), Stage::PreSeed) => adjustment += LOW_RISK_PRE_SEED_PENALTY,
            (Some(RiskTolerance::High), Stage::SeriesCPlus) => {
                adjustment += HIGH_RISK_LATE_STAGE_PENALTY
            }
            _ => {}
        }

        (BASE_SCORE + adjustment).clamp(0.0, 100.0).round() as u8
    }

    /// Returns the `count` best-scoring startups, each carrying its score
    ///
    /// Ties keep their input order.
    pub fn recommended_startups(&self, candidates: &[Startup], count: usize) -> Vec<Startup> {
        let mut scored: Vec<Startup> = candidates
            .iter()
            .map(|startup| startup.with_score(self.calculate_startup_score(startup)))
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.recommendation_score.cmp(&a.recommendation_score));
        scored.truncate(count);

        tracing::debug!(
            candidates = candidates.len(),
            returned = scored.len(),
            "Ranked recommendation candidates"
        );

        scored
    }

    /// Short explanation shown next to a recommendation
    ///
    /// This is a display heuristic and does not mirror the score's weighting.
    pub fn recommendation_reason(&self, startup: &Startup) -> String {
        let prefs = &self.preferences;
        let mut reasons: Vec<String> = Vec::with_capacity(2);

        if prefs.prefers_sector(&startup.sector) {
            reasons.push(format!("matches your {} sector preference", startup.sector));
        }

        if prefs.prefers_stage(startup.stage) {
            reasons.push(format!("aligns with your {} stage focus", startup.stage));
        }

        if prefs.prefers_location(&startup.location) {
            reasons.push("located in your preferred region".to_string());
        }

        let high_interest = self
            .calibration
            .mean_rating_for_sector(&startup.sector)
            .is_some_and(|mean| mean >= HIGH_INTEREST_RATING);
        if high_interest {
            reasons.push(format!(
                "you showed high interest in similar {} companies",
                startup.sector
            ));
        }

        match reasons.as_slice() {
            [] => format!("Recommended because it {}.", FALLBACK_REASON),
            [only] => format!("Recommended because it {}.", only),
            [first, second, ..] => format!("Recommended because it {} and {}.", first, second),
        }
    }

    /// Records a swipe and appends it to the stored history
    ///
    /// The score is recomputed at this point rather than taken from any earlier
    /// ranking. Repeated swipes on the same startup are all kept. After a
    /// successful append the engine's history is the stored one, which includes
    /// swipes logged by other engines in the meantime. A failed append is
    /// logged; the in-memory history still gains the new record.
    pub async fn log_interaction(&mut self, startup: &Startup, interested: bool) -> InteractionRecord {
        let record = InteractionRecord {
            startup_id: startup.id.clone(),
            interested,
            sector: startup.sector.clone(),
            stage: startup.stage,
            timestamp: Utc::now(),
            recommendation_score: self.calculate_startup_score(startup),
        };

        match self.repository.append_interaction(record.clone()).await {
            Ok(history) => self.history = history,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    startup_id = %record.startup_id,
                    "Failed to persist interaction history"
                );
                self.history.push(record.clone());
            }
        }

        tracing::info!(
            startup_id = %record.startup_id,
            interested,
            score = record.recommendation_score,
            history_len = self.history.len(),
            "Interaction logged"
        );

        record
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::store::MockKeyValueStore;
    use crate::db::{InMemoryStore, KeyValueStore};
    use crate::error::AppError;
    use crate::models::{CalibrationRecord, Rating, Sector};

    fn sector(name: &str) -> Sector {
        Sector::new(name).unwrap()
    }

    fn startup(id: &str, sector_name: &str, stage: Stage) -> Startup {
        Startup::new(id, format!("Startup {}", id), sector(sector_name), stage)
    }

    fn swipe(sector_name: &str, stage: Stage, interested: bool) -> InteractionRecord {
        InteractionRecord {
            startup_id: "h".to_string(),
            interested,
            sector: sector(sector_name),
            stage,
            timestamp: Utc::now(),
            recommendation_score: 50,
        }
    }

    fn engine_with(
        preferences: PreferenceProfile,
        calibration: CalibrationSet,
        history: InteractionHistory,
    ) -> RecommendationEngine {
        RecommendationEngine {
            repository: PreferenceRepository::new(Arc::new(InMemoryStore::new())),
            preferences,
            calibration,
            history,
        }
    }

    fn fintech_seed_prefs() -> PreferenceProfile {
        PreferenceProfile {
            sectors: vec![sector("FinTech")],
            stages: vec![Stage::Seed],
            ..PreferenceProfile::default()
        }
    }

    fn calibration(records: &[(&str, &str, Stage, Rating)]) -> CalibrationSet {
        let mut set = CalibrationSet::new();
        for (id, sector_name, stage, rating) in records {
            set.upsert(CalibrationRecord::for_startup(
                &startup(id, sector_name, *stage),
                *rating,
            ));
        }
        set
    }

    #[test]
    fn test_empty_signals_score_neutral() {
        let engine = engine_with(
            PreferenceProfile::default(),
            CalibrationSet::new(),
            InteractionHistory::new(),
        );

        for stage in Stage::ALL {
            assert_eq!(engine.calculate_startup_score(&startup("a", "AI/ML", stage)), 50);
        }
    }

    #[test]
    fn test_preference_matches_and_clamping() {
        let engine = engine_with(fintech_seed_prefs(), CalibrationSet::new(), InteractionHistory::new());

        let mut matching = startup("a", "FinTech", Stage::Seed);
        matching.revenue = Some("$8K MRR".to_string());
        assert_eq!(engine.calculate_startup_score(&matching), 100);

        let other = startup("b", "CleanTech", Stage::SeriesA);
        assert_eq!(engine.calculate_startup_score(&other), 35);
    }

    #[test]
    fn test_sector_match_versus_mismatch() {
        let prefs = PreferenceProfile {
            sectors: vec![sector("FinTech")],
            ..PreferenceProfile::default()
        };
        let engine = engine_with(prefs, CalibrationSet::new(), InteractionHistory::new());

        let matching = engine.calculate_startup_score(&startup("a", "FinTech", Stage::SeriesB));
        let other = engine.calculate_startup_score(&startup("b", "EdTech", Stage::SeriesB));
        assert_eq!(matching, 80);
        assert_eq!(other, 40);
        // +30 for the match versus -10 for the mismatch
        assert_eq!(matching - other, 40);
    }

    #[test]
    fn test_sector_calibration_offsets_preference() {
        let engine = engine_with(
            fintech_seed_prefs(),
            calibration(&[("c1", "FinTech", Stage::SeriesB, Rating::NOT_INTERESTED)]),
            InteractionHistory::new(),
        );

        let candidate = startup("a", "FinTech", Stage::Seed);
        // 50 + 30 + 25 - 20
        assert_eq!(engine.calculate_startup_score(&candidate), 85);
    }

    #[test]
    fn test_calibration_terms_by_rating() {
        for (rating, expected) in [
            (Rating::VERY_INTERESTED, 70),
            (Rating::MAYBE, 50),
            (Rating::NOT_INTERESTED, 30),
        ] {
            let engine = engine_with(
                PreferenceProfile::default(),
                calibration(&[("c1", "HealthTech", Stage::SeriesB, rating)]),
                InteractionHistory::new(),
            );
            let candidate = startup("a", "HealthTech", Stage::Seed);
            assert_eq!(engine.calculate_startup_score(&candidate), expected);
        }
    }

    #[test]
    fn test_stage_calibration_uses_smaller_weight() {
        let engine = engine_with(
            PreferenceProfile::default(),
            calibration(&[("c1", "AI/ML", Stage::SeriesA, Rating::VERY_INTERESTED)]),
            InteractionHistory::new(),
        );
        let candidate = startup("a", "FinTech", Stage::SeriesA);
        assert_eq!(engine.calculate_startup_score(&candidate), 66);
    }

    #[test]
    fn test_history_affinity() {
        let history = InteractionHistory::from(vec![
            swipe("FinTech", Stage::SeriesB, true),
            swipe("FinTech", Stage::SeriesB, true),
            swipe("AI/ML", Stage::Seed, true),
            swipe("AI/ML", Stage::Seed, false),
        ]);
        let engine = engine_with(PreferenceProfile::default(), CalibrationSet::new(), history);

        // all FinTech swipes were interested
        assert_eq!(engine.calculate_startup_score(&startup("a", "FinTech", Stage::PreSeed)), 60);
        // sector or stage match: 3 of 4 interested
        assert_eq!(engine.calculate_startup_score(&startup("b", "FinTech", Stage::Seed)), 55);
        // no overlap
        assert_eq!(engine.calculate_startup_score(&startup("c", "EdTech", Stage::SeriesA)), 50);
    }

    #[test]
    fn test_fractional_history_term_rounds_to_nearest() {
        // (1/3 - 0.5) * 20 = -3.33, so 46.67
        let history = InteractionHistory::from(vec![
            swipe("FinTech", Stage::Seed, true),
            swipe("FinTech", Stage::Seed, false),
            swipe("FinTech", Stage::Seed, false),
        ]);
        let engine = engine_with(PreferenceProfile::default(), CalibrationSet::new(), history);
        assert_eq!(engine.calculate_startup_score(&startup("a", "FinTech", Stage::Seed)), 47);
    }

    #[test]
    fn test_half_point_score_rounds_up() {
        // (3/8 - 0.5) * 20 = -2.5, so exactly 47.5
        let mut records = vec![swipe("SaaS", Stage::SeriesA, true); 3];
        records.extend(vec![swipe("SaaS", Stage::SeriesA, false); 5]);
        let engine = engine_with(
            PreferenceProfile::default(),
            CalibrationSet::new(),
            InteractionHistory::from(records),
        );
        assert_eq!(engine.calculate_startup_score(&startup("a", "SaaS", Stage::SeriesA)), 48);
    }

    #[test]
    fn test_location_and_revenue_requirement() {
        let prefs = PreferenceProfile {
            locations: vec!["Austin, TX".to_string()],
            revenue_requirement: true,
            ..PreferenceProfile::default()
        };
        let engine = engine_with(prefs, CalibrationSet::new(), InteractionHistory::new());

        let mut local = startup("a", "FinTech", Stage::Seed);
        local.location = "Austin, TX".to_string();
        local.revenue = Some("$12K MRR".to_string());
        assert_eq!(engine.calculate_startup_score(&local), 85);

        let mut remote = startup("b", "FinTech", Stage::Seed);
        remote.location = "Boston, MA".to_string();
        remote.revenue = Some("$0 MRR".to_string());
        assert_eq!(engine.calculate_startup_score(&remote), 35);
    }

    #[test]
    fn test_risk_tolerance_penalties() {
        let low = engine_with(
            PreferenceProfile {
                risk_tolerance: Some(RiskTolerance::Low),
                ..PreferenceProfile::default()
            },
            CalibrationSet::new(),
            InteractionHistory::new(),
        );
        assert_eq!(low.calculate_startup_score(&startup("a", "AI/ML", Stage::PreSeed)), 35);
        assert_eq!(low.calculate_startup_score(&startup("b", "AI/ML", Stage::SeriesCPlus)), 50);

        let high = engine_with(
            PreferenceProfile {
                risk_tolerance: Some(RiskTolerance::High),
                ..PreferenceProfile::default()
            },
            CalibrationSet::new(),
            InteractionHistory::new(),
        );
        assert_eq!(high.calculate_startup_score(&startup("c", "AI/ML", Stage::SeriesCPlus)), 40);
        assert_eq!(high.calculate_startup_score(&startup("d", "AI/ML", Stage::PreSeed)), 50);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let prefs = PreferenceProfile {
            sectors: vec![sector("FinTech")],
            stages: vec![Stage::SeriesCPlus],
            revenue_requirement: true,
            risk_tolerance: Some(RiskTolerance::Low),
            ..PreferenceProfile::default()
        };
        let engine = engine_with(
            prefs,
            calibration(&[("c1", "AI/ML", Stage::PreSeed, Rating::NOT_INTERESTED)]),
            InteractionHistory::from(vec![swipe("AI/ML", Stage::PreSeed, false)]),
        );
        // 50 - 10 - 5 - 15 - 20 - 16 - 10 - 15 = -41
        assert_eq!(engine.calculate_startup_score(&startup("a", "AI/ML", Stage::PreSeed)), 0);
    }

    #[test]
    fn test_recommended_startups_sorted_stable_and_truncated() {
        let engine = engine_with(fintech_seed_prefs(), CalibrationSet::new(), InteractionHistory::new());
        let candidates = vec![
            startup("1", "CleanTech", Stage::SeriesA),
            startup("2", "FinTech", Stage::SeriesA),
            startup("3", "CleanTech", Stage::Seed),
            startup("4", "FinTech", Stage::SeriesB),
            startup("5", "FinTech", Stage::Seed),
        ];

        let ranked = engine.recommended_startups(&candidates, 4);
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        // 5 scores 100, 2 and 4 tie at 75, 3 scores 65
        assert_eq!(ids, vec!["5", "2", "4", "3"]);
        assert_eq!(ranked[0].recommendation_score, Some(100));
        assert_eq!(ranked[1].recommendation_score, Some(75));

        // inputs are not decorated
        assert!(candidates.iter().all(|c| c.recommendation_score.is_none()));
    }

    #[test]
    fn test_recommended_startups_edge_counts() {
        let engine = engine_with(
            PreferenceProfile::default(),
            CalibrationSet::new(),
            InteractionHistory::new(),
        );
        assert!(engine.recommended_startups(&[], DEFAULT_RECOMMENDATION_COUNT).is_empty());

        let candidates = vec![
            startup("1", "FinTech", Stage::Seed),
            startup("2", "AI/ML", Stage::Seed),
        ];
        let ranked = engine.recommended_startups(&candidates, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "1");
        assert!(engine.recommended_startups(&candidates, 0).is_empty());
    }

    #[test]
    fn test_reason_joins_first_two_clauses() {
        let engine = engine_with(fintech_seed_prefs(), CalibrationSet::new(), InteractionHistory::new());
        let reason = engine.recommendation_reason(&startup("a", "FinTech", Stage::Seed));
        assert_eq!(
            reason,
            "Recommended because it matches your FinTech sector preference and aligns with your Seed stage focus."
        );
    }

    #[test]
    fn test_reason_single_clause_and_fallback() {
        let engine = engine_with(fintech_seed_prefs(), CalibrationSet::new(), InteractionHistory::new());
        assert_eq!(
            engine.recommendation_reason(&startup("a", "AI/ML", Stage::Seed)),
            "Recommended because it aligns with your Seed stage focus."
        );
        assert_eq!(
            engine.recommendation_reason(&startup("b", "AI/ML", Stage::SeriesB)),
            "Recommended because it shows strong growth potential."
        );
    }

    #[test]
    fn test_reason_location_and_calibration_interest() {
        let prefs = PreferenceProfile {
            locations: vec!["Denver, CO".to_string()],
            ..PreferenceProfile::default()
        };
        let engine = engine_with(
            prefs,
            calibration(&[
                ("c1", "HealthTech", Stage::SeriesA, Rating::VERY_INTERESTED),
                ("c2", "HealthTech", Stage::Seed, Rating::MAYBE),
            ]),
            InteractionHistory::new(),
        );

        let mut candidate = startup("a", "HealthTech", Stage::SeriesB);
        candidate.location = "Denver, CO".to_string();
        assert_eq!(
            engine.recommendation_reason(&candidate),
            "Recommended because it located in your preferred region and you showed high interest in similar HealthTech companies."
        );
    }

    #[test]
    fn test_reason_ignores_average_calibration_interest() {
        let engine = engine_with(
            PreferenceProfile::default(),
            calibration(&[
                ("c1", "HealthTech", Stage::SeriesA, Rating::VERY_INTERESTED),
                ("c2", "HealthTech", Stage::Seed, Rating::NOT_INTERESTED),
            ]),
            InteractionHistory::new(),
        );
        assert_eq!(
            engine.recommendation_reason(&startup("a", "HealthTech", Stage::SeriesB)),
            "Recommended because it shows strong growth potential."
        );
    }

    #[tokio::test]
    async fn test_log_interaction_persists_and_reloads() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let repo = PreferenceRepository::for_investor(store.clone(), "inv-1");
        repo.save_preferences(&fintech_seed_prefs()).await.unwrap();

        let mut engine = RecommendationEngine::load(repo.clone()).await;
        let candidate = startup("s-9", "FinTech", Stage::SeriesA);

        let record = engine.log_interaction(&candidate, true).await;
        assert_eq!(record.recommendation_score, 75);
        engine.log_interaction(&candidate, false).await;
        assert_eq!(engine.history().len(), 2);

        let reloaded = RecommendationEngine::load(repo).await;
        let records = reloaded.history().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].startup_id, "s-9");
        assert!(records[0].interested);
        assert!(!records[1].interested);
        assert_eq!(records[0].sector.as_str(), "FinTech");
        assert_eq!(records[0].stage, Stage::SeriesA);
    }

    #[tokio::test]
    async fn test_log_interaction_rescores_with_current_history() {
        let repo = PreferenceRepository::new(Arc::new(InMemoryStore::new()));
        let mut engine = RecommendationEngine::load(repo).await;
        let candidate = startup("s-1", "AI/ML", Stage::Seed);

        assert_eq!(engine.log_interaction(&candidate, true).await.recommendation_score, 50);
        // the first swipe now counts: (1.0 - 0.5) * 20
        assert_eq!(engine.log_interaction(&candidate, true).await.recommendation_score, 60);
    }

    #[tokio::test]
    async fn test_engines_loaded_together_keep_both_swipes() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let repo = PreferenceRepository::for_investor(store, "inv");
        let mut first = RecommendationEngine::load(repo.clone()).await;
        let mut second = RecommendationEngine::load(repo.clone()).await;

        first.log_interaction(&startup("a", "FinTech", Stage::Seed), true).await;
        second.log_interaction(&startup("b", "SaaS", Stage::SeriesB), false).await;
        assert_eq!(second.history().len(), 2);

        let reloaded = RecommendationEngine::load(repo).await;
        let ids: Vec<&str> = reloaded
            .history()
            .records()
            .iter()
            .map(|r| r.startup_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_log_interaction_survives_store_failure() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_set()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("writer gone".to_string())));

        let mut engine = RecommendationEngine::load(PreferenceRepository::new(Arc::new(mock))).await;
        engine.log_interaction(&startup("a", "FinTech", Stage::Seed), false).await;
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_load_with_malformed_data_blocking() {
        let store = InMemoryStore::new();
        tokio_test::block_on(async {
            store.set("investorPreferences", "{".to_string()).await.unwrap();
            store
                .set("calibrationLearning", r#"[{"startupId":1}]"#.to_string())
                .await
                .unwrap();
        });

        let engine =
            tokio_test::block_on(RecommendationEngine::load(PreferenceRepository::new(Arc::new(store))));
        assert_eq!(engine.preferences(), &PreferenceProfile::default());
        assert!(engine.calibration().is_empty());
        assert_eq!(engine.calculate_startup_score(&startup("a", "FinTech", Stage::Seed)), 50);
    }
}
