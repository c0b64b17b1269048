//! Print-quantity sizing and conversion prediction

use super::types::{CampaignCreativePerformance, StorePerformanceMetrics};

/// Quantity used when a store has never been mailed
pub const DEFAULT_BASE_QUANTITY: f64 = 300.0;
/// Print batches are ordered in multiples of this
pub const QUANTITY_INCREMENT: f64 = 50.0;
pub const MIN_QUANTITY: u32 = 100;
pub const MAX_QUANTITY: u32 = 2000;
/// Predictions above this are treated as implausible
pub const MAX_EXPECTED_CONVERSION_RATE: f64 = 0.5;

/// Recommended print quantity: the store's average volume per campaign, scaled by score
/// (0.7x - 1.3x) and the caller's multiplier, rounded to 50 and clamped to 100..=2000.
pub fn recommended_quantity(
    store: &StorePerformanceMetrics,
    overall_score: f64,
    quantity_multiplier: f64,
) -> u32 {
    let base = if store.total_recipients == 0 {
        DEFAULT_BASE_QUANTITY
    } else {
        store.total_recipients as f64 / f64::from(store.total_campaigns.max(1))
    };

    let score_multiplier = 0.7 + overall_score * 0.6;
    let raw = base * score_multiplier * quantity_multiplier;
    let rounded = (raw / QUANTITY_INCREMENT).round() * QUANTITY_INCREMENT;

    if rounded.is_nan() {
        return MIN_QUANTITY;
    }
    // Both bounds are multiples of the increment, so clamping keeps the granularity.
    rounded.clamp(f64::from(MIN_QUANTITY), f64::from(MAX_QUANTITY)) as u32
}

/// Expected conversion rate: store and campaign history blended by how much store
/// history exists, nudged by score (0.9x - 1.1x), capped at 50%.
pub fn expected_conversion_rate(
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
    overall_score: f64,
) -> f64 {
    let store_weight = (f64::from(store.total_campaigns) / 5.0).min(0.6);
    let campaign_weight = 1.0 - store_weight;

    let base_rate = store.avg_conversion_rate * store_weight
        + campaign.overall_conversion_rate * campaign_weight;
    let adjustment = 0.9 + overall_score * 0.2;

    (base_rate * adjustment).min(MAX_EXPECTED_CONVERSION_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(total_campaigns: u32, total_recipients: u64) -> StorePerformanceMetrics {
        StorePerformanceMetrics {
            store_id: "s1".to_string(),
            store_name: "Downtown Miami Store".to_string(),
            region: "Southeast".to_string(),
            state: "FL".to_string(),
            total_campaigns,
            avg_conversion_rate: 0.04,
            recent_campaigns: 0,
            recent_conversion_rate: 0.0,
            total_recipients,
            avg_time_to_conversion_hours: 0.0,
        }
    }

    fn campaign(rate: f64) -> CampaignCreativePerformance {
        CampaignCreativePerformance {
            campaign_id: "c1".to_string(),
            campaign_name: "Holiday Postcard".to_string(),
            total_recipients: 1_000,
            overall_conversion_rate: rate,
            top_performing_regions: vec![],
            top_performing_states: vec![],
            avg_time_to_conversion_hours: 0.0,
        }
    }

    #[test]
    fn test_new_store_uses_default_base() {
        // 300 * (0.7 + 0.5 * 0.6) = 300
        assert_eq!(recommended_quantity(&store(0, 0), 0.5, 1.0), 300);
        // 300 * 1.3 = 390 -> 400
        assert_eq!(recommended_quantity(&store(0, 0), 1.0, 1.0), 400);
    }

    #[test]
    fn test_quantity_from_history_rounds_to_fifty() {
        // 4000 / 5 = 800; 800 * (0.7 + 0.8 * 0.6) = 944 -> 950
        assert_eq!(recommended_quantity(&store(5, 4_000), 0.8, 1.0), 950);
        // 944 * 0.5 = 472 -> 450
        assert_eq!(recommended_quantity(&store(5, 4_000), 0.8, 0.5), 450);
    }

    #[test]
    fn test_recipients_without_campaigns_do_not_divide_by_zero() {
        // 600 / max(0, 1) = 600; 600 * 1.0 = 600
        assert_eq!(recommended_quantity(&store(0, 600), 0.5, 1.0), 600);
    }

    #[test]
    fn test_quantity_is_clamped() {
        assert_eq!(recommended_quantity(&store(1, 50), 0.0, 1.0), 100);
        assert_eq!(recommended_quantity(&store(1, 50_000), 1.0, 3.0), 2000);
    }

    #[test]
    fn test_store_weight_caps_at_sixty_percent() {
        // new store: campaign only; 0.10 * (0.9 + 0.5 * 0.2) = 0.10
        assert!((expected_conversion_rate(&store(0, 0), &campaign(0.10), 0.5) - 0.10).abs() < 1e-9);

        // 2 campaigns: 0.4 store weight; 0.04*0.4 + 0.10*0.6 = 0.076
        let two_campaigns = expected_conversion_rate(&store(2, 0), &campaign(0.10), 0.5);
        assert!((two_campaigns - 0.076).abs() < 1e-9);

        // 10 campaigns: capped 0.6; 0.04*0.6 + 0.10*0.4 = 0.064
        assert!(
            (expected_conversion_rate(&store(10, 0), &campaign(0.10), 0.5) - 0.064).abs() < 1e-9
        );
    }

    #[test]
    fn test_expected_conversion_is_capped() {
        let mut hot = store(10, 0);
        hot.avg_conversion_rate = 0.9;
        assert_eq!(expected_conversion_rate(&hot, &campaign(0.9), 1.2), 0.5);
    }
}
