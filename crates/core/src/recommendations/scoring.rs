//! Factor scorers, score combination and confidence classification

use serde::{Deserialize, Serialize};

use super::types::*;
use super::{NEUTRAL_SCORE, REFERENCE_CONVERSION_CEILING};
use crate::errors::DomainError;

/// Weights for the four scoring factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for store performance (default: 0.40)
    pub store_performance: f64,
    /// Weight for creative performance (default: 0.30)
    pub creative_performance: f64,
    /// Weight for geographic fit (default: 0.20)
    pub geographic_fit: f64,
    /// Weight for timing alignment (default: 0.10)
    pub timing_alignment: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.store_performance
            + self.creative_performance
            + self.geographic_fit
            + self.timing_alignment
    }

    /// Each weight must be a fraction and together they must sum to 1.0
    pub fn validate(&self) -> Result<(), DomainError> {
        let named = [
            ("store_performance", self.store_performance),
            ("creative_performance", self.creative_performance),
            ("geographic_fit", self.geographic_fit),
            ("timing_alignment", self.timing_alignment),
        ];
        for (name, value) in named {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DomainError::WeightOutOfRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > super::WEIGHT_SUM_TOLERANCE {
            return Err(DomainError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }

    /// Weighted overall score. Not clamped: a proven regional match may push it past 1.0.
    pub fn combine(&self, scores: &FactorScores) -> f64 {
        scores.store_performance * self.store_performance
            + scores.creative_performance * self.creative_performance
            + scores.geographic_fit * self.geographic_fit
            + scores.timing_alignment * self.timing_alignment
    }
}

fn normalize_rate(rate: f64) -> f64 {
    rate / REFERENCE_CONVERSION_CEILING
}

/// Trend of the trailing window against the lifetime average, if the window has enough campaigns
pub fn performance_trend(store: &StorePerformanceMetrics) -> Option<PerformanceTrend> {
    if store.recent_campaigns < 2 {
        return None;
    }

    let trend = if store.recent_conversion_rate > store.avg_conversion_rate * 1.1 {
        PerformanceTrend::Improving
    } else if store.recent_conversion_rate < store.avg_conversion_rate * 0.9 {
        PerformanceTrend::Declining
    } else {
        PerformanceTrend::Stable
    };
    Some(trend)
}

/// Store-performance score. New stores get a neutral score so they are not starved.
pub fn store_performance_score(store: &StorePerformanceMetrics) -> f64 {
    if store.total_campaigns == 0 {
        return NEUTRAL_SCORE;
    }

    let base = normalize_rate(store.avg_conversion_rate).min(1.0);
    let multiplier = performance_trend(store).map(|trend| trend.multiplier()).unwrap_or(1.0);

    (base * multiplier).min(1.0)
}

/// Creative-performance score with a sample-size bonus
pub fn creative_performance_score(campaign: &CampaignCreativePerformance) -> f64 {
    if campaign.total_recipients == 0 {
        return NEUTRAL_SCORE;
    }

    let base = normalize_rate(campaign.overall_conversion_rate).min(1.0);
    let sample_bonus = if campaign.total_recipients >= 1000 {
        0.10
    } else if campaign.total_recipients >= 500 {
        0.05
    } else {
        0.0
    };

    (base + sample_bonus).min(1.0)
}

/// Geographic-fit score. First match wins: campaign region, campaign state,
/// regional pattern, neutral.
///
/// The regional branch is boosted by 1.1x and left unclamped, so it can exceed 1.0.
pub fn geographic_fit_score(
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
    patterns: &[GeographicPattern],
) -> f64 {
    if let Some(rate) = campaign.region_rate(&store.region) {
        return normalize_rate(rate) * 1.1;
    }

    if let Some(rate) = campaign.state_rate(&store.state) {
        return normalize_rate(rate).min(1.0);
    }

    if let Some(pattern) = patterns.iter().find(|pattern| pattern.region == store.region) {
        return normalize_rate(pattern.avg_conversion_rate).min(1.0);
    }

    NEUTRAL_SCORE
}

/// Timing-alignment score from the gap between average times to conversion
pub fn timing_alignment_score(store_hours: f64, campaign_hours: f64) -> f64 {
    if store_hours == 0.0 || campaign_hours == 0.0 {
        return super::NO_TIMING_DATA_SCORE;
    }

    let gap = (store_hours - campaign_hours).abs();
    if gap <= 24.0 {
        1.0
    } else if gap <= 48.0 {
        0.8
    } else if gap <= 72.0 {
        0.6
    } else if gap <= 168.0 {
        0.5
    } else {
        0.3
    }
}

/// Score every factor for one store/campaign pairing
pub fn factor_scores(
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
    patterns: &[GeographicPattern],
) -> FactorScores {
    FactorScores {
        store_performance: store_performance_score(store),
        creative_performance: creative_performance_score(campaign),
        geographic_fit: geographic_fit_score(store, campaign, patterns),
        timing_alignment: timing_alignment_score(
            store.avg_time_to_conversion_hours,
            campaign.avg_time_to_conversion_hours,
        ),
    }
}

/// High needs a strong score and both kinds of history; medium needs either.
pub fn classify_confidence(
    overall_score: f64,
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
) -> ConfidenceLevel {
    let store_history = store.total_campaigns >= 3;
    let campaign_history = campaign.total_recipients >= 100;

    if overall_score >= 0.75 && store_history && campaign_history {
        ConfidenceLevel::High
    } else if overall_score >= 0.6 && (store_history || campaign_history) {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}
