//! Types for the Recommendation Engine

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Aggregated performance history for one retail location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePerformanceMetrics {
    pub store_id: String,
    pub store_name: String,
    pub region: String,
    pub state: String,
    /// Campaigns ever run at this store (0 for new stores)
    pub total_campaigns: u32,
    /// Lifetime conversion rate (0.0 - 1.0)
    pub avg_conversion_rate: f64,
    /// Campaigns inside the trailing window
    pub recent_campaigns: u32,
    /// Conversion rate inside the trailing window (0.0 - 1.0)
    pub recent_conversion_rate: f64,
    /// Lifetime mail volume
    pub total_recipients: u64,
    /// Average hours between delivery and conversion (0 when unknown)
    pub avg_time_to_conversion_hours: f64,
}

/// Conversion rate observed for a campaign within one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPerformance {
    pub region: String,
    pub conversion_rate: f64,
}

/// Conversion rate observed for a campaign within one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePerformance {
    pub state: String,
    pub conversion_rate: f64,
}

/// Aggregated performance history for one candidate campaign creative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignCreativePerformance {
    pub campaign_id: String,
    pub campaign_name: String,
    /// Recipients ever sent this creative
    pub total_recipients: u64,
    /// Conversion rate across all recipients (0.0 - 1.0)
    pub overall_conversion_rate: f64,
    /// Best regions first; empty when there is no regional signal yet
    #[serde(default)]
    pub top_performing_regions: Vec<RegionPerformance>,
    /// Best states first; empty when there is no state signal yet
    #[serde(default)]
    pub top_performing_states: Vec<StatePerformance>,
    /// Average hours between delivery and conversion (0 when unknown)
    pub avg_time_to_conversion_hours: f64,
}

impl CampaignCreativePerformance {
    /// Rate for `region` if the campaign has proven history there
    pub fn region_rate(&self, region: &str) -> Option<f64> {
        self.top_performing_regions
            .iter()
            .find(|entry| entry.region == region)
            .map(|entry| entry.conversion_rate)
    }

    /// Rate for `state` if the campaign has proven history there
    pub fn state_rate(&self, state: &str) -> Option<f64> {
        self.top_performing_states
            .iter()
            .find(|entry| entry.state == state)
            .map(|entry| entry.conversion_rate)
    }
}

/// Campaign-independent conversion average for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicPattern {
    pub region: String,
    pub avg_conversion_rate: f64,
}

/// The four factor sub-scores kept on every recommendation for auditability
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorScores {
    /// Store performance (0.0 - 1.0)
    pub store_performance: f64,
    /// Creative performance (0.0 - 1.0)
    pub creative_performance: f64,
    /// Geographic fit (0.0 - 1.0, up to 1.1x on a proven regional match)
    pub geographic_fit: f64,
    /// Timing alignment (0.0 - 1.0)
    pub timing_alignment: f64,
}

/// Confidence tier for a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    /// Strong score backed by store and creative history
    High,
    /// Good score backed by either store or creative history
    Medium,
    /// Everything else
    Low,
}

/// Direction of a store's recent conversion rate against its lifetime average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTrend {
    Improving,
    Stable,
    Declining,
}

impl PerformanceTrend {
    /// Multiplier applied to the store-performance score
    pub fn multiplier(&self) -> f64 {
        match self {
            PerformanceTrend::Improving => 1.1,
            PerformanceTrend::Stable => 1.0,
            PerformanceTrend::Declining => 0.9,
        }
    }
}

/// A ranked campaign recommendation for one store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignRecommendation {
    pub store_id: String,
    pub store_name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    /// Weighted combination of the factor scores
    pub overall_score: f64,
    pub confidence_level: ConfidenceLevel,
    /// Print quantity, a multiple of 50 within 100..=2000
    pub recommended_quantity: u32,
    pub scores: FactorScores,
    /// Human-readable justification, in a fixed order
    pub reasoning: Vec<String>,
    /// Predicted conversion rate (0.0 - 0.5)
    pub expected_conversion_rate: f64,
    /// Caution flags, possibly empty
    pub risk_factors: Vec<String>,
}

/// Everything the engine needs for one batch, as supplied by the performance-data service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    #[serde(default)]
    pub stores: Vec<StorePerformanceMetrics>,
    #[serde(default)]
    pub campaigns: Vec<CampaignCreativePerformance>,
    #[serde(default)]
    pub geographic_patterns: Vec<GeographicPattern>,
}

impl RecommendationInput {
    /// Check the aggregate invariants the engine assumes but never verifies itself
    pub fn validate(&self) -> Result<(), DomainError> {
        for store in &self.stores {
            validate_store(store)?;
        }
        for campaign in &self.campaigns {
            validate_campaign(campaign)?;
        }
        for pattern in &self.geographic_patterns {
            if pattern.region.trim().is_empty() {
                return Err(invalid("geographic pattern", "<unnamed>", "region must not be empty"));
            }
            ensure_rate(
                "geographic pattern",
                &pattern.region,
                "avg_conversion_rate",
                pattern.avg_conversion_rate,
            )?;
        }
        Ok(())
    }

    /// Find a store by id; a repeated id resolves to its last occurrence, as in batch runs
    pub fn store(&self, store_id: &str) -> Option<&StorePerformanceMetrics> {
        self.stores.iter().rfind(|store| store.store_id == store_id)
    }
}

fn validate_store(store: &StorePerformanceMetrics) -> Result<(), DomainError> {
    if store.store_id.trim().is_empty() {
        return Err(invalid("store", &store.store_name, "store_id must not be empty"));
    }
    let id = store.store_id.as_str();
    ensure_rate("store", id, "avg_conversion_rate", store.avg_conversion_rate)?;
    ensure_rate("store", id, "recent_conversion_rate", store.recent_conversion_rate)?;
    ensure_hours("store", id, store.avg_time_to_conversion_hours)?;
    if store.recent_campaigns > store.total_campaigns {
        return Err(invalid(
            "store",
            id,
            &format!(
                "recent_campaigns ({}) exceeds total_campaigns ({})",
                store.recent_campaigns, store.total_campaigns
            ),
        ));
    }
    Ok(())
}

fn validate_campaign(campaign: &CampaignCreativePerformance) -> Result<(), DomainError> {
    if campaign.campaign_id.trim().is_empty() {
        return Err(invalid("campaign", &campaign.campaign_name, "campaign_id must not be empty"));
    }
    let id = campaign.campaign_id.as_str();
    ensure_rate("campaign", id, "overall_conversion_rate", campaign.overall_conversion_rate)?;
    ensure_hours("campaign", id, campaign.avg_time_to_conversion_hours)?;
    for region in &campaign.top_performing_regions {
        ensure_rate("campaign", id, "top_performing_regions.rate", region.conversion_rate)?;
    }
    for state in &campaign.top_performing_states {
        ensure_rate("campaign", id, "top_performing_states.rate", state.conversion_rate)?;
    }
    Ok(())
}

fn ensure_rate(kind: &'static str, id: &str, field: &str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(kind, id, &format!("{field} must be a fraction in 0.0..=1.0 (got {value})")))
    }
}

fn ensure_hours(kind: &'static str, id: &str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(
            kind,
            id,
            &format!("avg_time_to_conversion_hours must be non-negative (got {value})"),
        ))
    }
}

fn invalid(kind: &'static str, id: &str, reason: &str) -> DomainError {
    DomainError::InvalidInput { kind, id: id.to_owned(), reason: reason.to_owned() }
}
