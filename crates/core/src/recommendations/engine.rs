//! Recommendation Engine implementation

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::reasoning::{generate_reasoning, generate_risk_factors};
use super::scoring::{classify_confidence, factor_scores, ScoringWeights};
use super::sizing::{expected_conversion_rate, recommended_quantity};
use super::types::*;
use super::RecommendationResult;
use crate::errors::DomainError;

/// Validated tuning for one recommendation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationConfig {
    weights: ScoringWeights,
    min_confidence_threshold: f64,
    quantity_multiplier: f64,
}

impl RecommendationConfig {
    /// Build a config, rejecting weights that do not sum to 1.0 and out-of-range knobs
    pub fn new(
        weights: ScoringWeights,
        min_confidence_threshold: f64,
        quantity_multiplier: f64,
    ) -> RecommendationResult<Self> {
        weights.validate()?;

        if !min_confidence_threshold.is_finite() || !(0.0..=1.0).contains(&min_confidence_threshold)
        {
            return Err(DomainError::ThresholdOutOfRange(min_confidence_threshold));
        }
        if !quantity_multiplier.is_finite() || quantity_multiplier <= 0.0 {
            return Err(DomainError::InvalidQuantityMultiplier(quantity_multiplier));
        }

        Ok(Self { weights, min_confidence_threshold, quantity_multiplier })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn min_confidence_threshold(&self) -> f64 {
        self.min_confidence_threshold
    }

    pub fn quantity_multiplier(&self) -> f64 {
        self.quantity_multiplier
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weights: super::DEFAULT_WEIGHTS,
            min_confidence_threshold: super::DEFAULT_MIN_CONFIDENCE_THRESHOLD,
            quantity_multiplier: super::DEFAULT_QUANTITY_MULTIPLIER,
        }
    }
}

/// Stateless engine pairing stores with campaigns
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Build the full recommendation for one store/campaign pairing, without filtering
    pub fn recommend(
        &self,
        store: &StorePerformanceMetrics,
        campaign: &CampaignCreativePerformance,
        patterns: &[GeographicPattern],
    ) -> CampaignRecommendation {
        let scores = factor_scores(store, campaign, patterns);
        if scores.geographic_fit > 1.0 {
            debug!(
                event_name = "recommendations.geographic_fit.boosted",
                store_id = %store.store_id,
                campaign_id = %campaign.campaign_id,
                geographic_fit = scores.geographic_fit,
                "regional match pushed geographic fit above 1.0"
            );
        }

        let overall_score = self.config.weights.combine(&scores);

        CampaignRecommendation {
            store_id: store.store_id.clone(),
            store_name: store.store_name.clone(),
            campaign_id: campaign.campaign_id.clone(),
            campaign_name: campaign.campaign_name.clone(),
            overall_score,
            confidence_level: classify_confidence(overall_score, store, campaign),
            recommended_quantity: recommended_quantity(
                store,
                overall_score,
                self.config.quantity_multiplier,
            ),
            scores,
            reasoning: generate_reasoning(store, campaign, &scores, overall_score),
            expected_conversion_rate: expected_conversion_rate(store, campaign, overall_score),
            risk_factors: generate_risk_factors(store, campaign, overall_score),
        }
    }

    /// Recommendations for one store, best first, dropping pairings below the threshold.
    /// Equal scores keep campaign input order.
    pub fn generate_store_recommendations(
        &self,
        store: &StorePerformanceMetrics,
        campaigns: &[CampaignCreativePerformance],
        patterns: &[GeographicPattern],
    ) -> Vec<CampaignRecommendation> {
        let mut recommendations: Vec<CampaignRecommendation> = campaigns
            .iter()
            .map(|campaign| self.recommend(store, campaign, patterns))
            .filter(|rec| rec.overall_score >= self.config.min_confidence_threshold)
            .collect();

        // sort_by is stable
        recommendations.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

        debug!(
            event_name = "recommendations.store.scored",
            store_id = %store.store_id,
            candidates = campaigns.len(),
            retained = recommendations.len(),
            "scored campaigns for store"
        );

        recommendations
    }

    /// Recommendations for every store, keyed by store id. Stores are scored in parallel;
    /// a repeated store id keeps the last occurrence.
    pub fn generate_batch_recommendations(
        &self,
        stores: &[StorePerformanceMetrics],
        campaigns: &[CampaignCreativePerformance],
        patterns: &[GeographicPattern],
    ) -> BTreeMap<String, Vec<CampaignRecommendation>> {
        let per_store: Vec<(String, Vec<CampaignRecommendation>)> = stores
            .par_iter()
            .map(|store| {
                let recs = self.generate_store_recommendations(store, campaigns, patterns);
                (store.store_id.clone(), recs)
            })
            .collect();

        let retained: usize = per_store.iter().map(|(_, recs)| recs.len()).sum();
        let batch: BTreeMap<_, _> = per_store.into_iter().collect();

        info!(
            event_name = "recommendations.batch.completed",
            stores = stores.len(),
            campaigns = campaigns.len(),
            retained,
            stores_without_recommendations =
                batch.values().filter(|recs| recs.is_empty()).count(),
            "batch recommendations generated"
        );

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendations::DEFAULT_WEIGHTS;

    fn example_store() -> StorePerformanceMetrics {
        StorePerformanceMetrics {
            store_id: "store-portland".to_string(),
            store_name: "Portland Central".to_string(),
            region: "West".to_string(),
            state: "OR".to_string(),
            total_campaigns: 5,
            avg_conversion_rate: 0.18,
            recent_campaigns: 3,
            recent_conversion_rate: 0.21,
            total_recipients: 4_000,
            avg_time_to_conversion_hours: 0.0,
        }
    }

    fn example_campaign() -> CampaignCreativePerformance {
        CampaignCreativePerformance {
            campaign_id: "camp-spring".to_string(),
            campaign_name: "Spring Sale".to_string(),
            total_recipients: 1_200,
            overall_conversion_rate: 0.15,
            top_performing_regions: vec![RegionPerformance {
                region: "West".to_string(),
                conversion_rate: 0.22,
            }],
            top_performing_states: vec![],
            avg_time_to_conversion_hours: 0.0,
        }
    }

    fn campaign(id: &str, rate: f64, recipients: u64) -> CampaignCreativePerformance {
        CampaignCreativePerformance {
            campaign_id: id.to_string(),
            campaign_name: format!("Campaign {id}"),
            total_recipients: recipients,
            overall_conversion_rate: rate,
            top_performing_regions: vec![],
            top_performing_states: vec![],
            avg_time_to_conversion_hours: 0.0,
        }
    }

    #[test]
    fn test_example_scenario() {
        let engine = RecommendationEngine::default();
        let rec = engine.recommend(&example_store(), &example_campaign(), &[]);

        assert!((rec.scores.store_performance - 0.99).abs() < 1e-9);
        assert!((rec.scores.creative_performance - 0.85).abs() < 1e-9);
        assert!((rec.scores.geographic_fit - 1.21).abs() < 1e-9);
        assert!((rec.scores.timing_alignment - 0.8).abs() < 1e-9);
        // 0.99*0.4 + 0.85*0.3 + 1.21*0.2 + 0.8*0.1
        assert!((rec.overall_score - 0.973).abs() < 1e-9);
        assert_eq!(rec.confidence_level, ConfidenceLevel::High);

        // 4000 / 5 = 800; 800 * (0.7 + 0.973 * 0.6) = 1027.04 -> 1050
        assert_eq!(rec.recommended_quantity, 1050);
        // (0.18*0.6 + 0.15*0.4) * (0.9 + 0.973*0.2) = 0.168 * 1.0946
        assert!((rec.expected_conversion_rate - 0.168 * 1.0946).abs() < 1e-9);
        assert!(rec.risk_factors.is_empty());
        assert_eq!(rec.reasoning.len(), 4);
    }

    #[test]
    fn test_store_recommendations_filter_and_sort() {
        let config = RecommendationConfig::new(DEFAULT_WEIGHTS, 0.7, 1.0).unwrap();
        let engine = RecommendationEngine::new(config);
        let campaigns = vec![
            campaign("weak", 0.01, 2_000),
            campaign("strong", 0.19, 2_000),
            campaign("medium", 0.12, 2_000),
        ];

        let recs = engine.generate_store_recommendations(&example_store(), &campaigns, &[]);
        let ids: Vec<_> = recs.iter().map(|rec| rec.campaign_id.as_str()).collect();

        assert_eq!(ids, vec!["strong", "medium"]);
        assert!(recs.iter().all(|rec| rec.overall_score >= 0.7));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let engine = RecommendationEngine::default();
        let campaigns = vec![
            campaign("first", 0.10, 800),
            campaign("second", 0.10, 800),
            campaign("third", 0.10, 800),
        ];

        let recs = engine.generate_store_recommendations(&example_store(), &campaigns, &[]);
        let ids: Vec<_> = recs.iter().map(|rec| rec.campaign_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_everything_below_threshold_yields_empty_list() {
        let config = RecommendationConfig::new(DEFAULT_WEIGHTS, 1.0, 1.0).unwrap();
        let engine = RecommendationEngine::new(config);
        let recs = engine.generate_store_recommendations(
            &example_store(),
            &[campaign("only", 0.02, 50)],
            &[],
        );
        assert!(recs.is_empty());
    }

    #[test]
    fn test_batch_matches_per_store_results() {
        let engine = RecommendationEngine::default();
        let mut new_store = example_store();
        new_store.store_id = "store-new".to_string();
        new_store.total_campaigns = 0;
        new_store.recent_campaigns = 0;
        new_store.total_recipients = 0;

        let stores = vec![example_store(), new_store.clone()];
        let campaigns = vec![example_campaign(), campaign("plain", 0.08, 300)];

        let batch = engine.generate_batch_recommendations(&stores, &campaigns, &[]);
        assert_eq!(batch.len(), 2);
        for store in &stores {
            assert_eq!(
                batch[&store.store_id],
                engine.generate_store_recommendations(store, &campaigns, &[])
            );
        }
    }

    #[test]
    fn test_batch_of_nothing_is_empty() {
        let engine = RecommendationEngine::default();
        assert!(engine.generate_batch_recommendations(&[], &[example_campaign()], &[]).is_empty());

        let batch = engine.generate_batch_recommendations(&[example_store()], &[], &[]);
        assert_eq!(batch.get("store-portland"), Some(&Vec::new()));
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let skewed = ScoringWeights { store_performance: 0.5, ..DEFAULT_WEIGHTS };
        assert!(matches!(
            RecommendationConfig::new(skewed, 0.5, 1.0),
            Err(DomainError::WeightsDoNotSumToOne { .. })
        ));
        assert!(matches!(
            RecommendationConfig::new(DEFAULT_WEIGHTS, 1.5, 1.0),
            Err(DomainError::ThresholdOutOfRange(_))
        ));
        assert!(matches!(
            RecommendationConfig::new(DEFAULT_WEIGHTS, 0.5, 0.0),
            Err(DomainError::InvalidQuantityMultiplier(_))
        ));
        assert!(matches!(
            RecommendationConfig::new(DEFAULT_WEIGHTS, 0.5, f64::NAN),
            Err(DomainError::InvalidQuantityMultiplier(_))
        ));
    }
}
