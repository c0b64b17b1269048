//! Campaign-to-Store Recommendation Engine
//!
//! Pairs retail stores with candidate direct-mail campaigns using store history,
//! creative history, geographic fit and conversion timing, and sizes a print run
//! for every pairing that clears the confidence threshold.

mod engine;
mod reasoning;
mod scoring;
mod sizing;
mod types;

pub use engine::{RecommendationConfig, RecommendationEngine};
pub use reasoning::{generate_reasoning, generate_risk_factors, FALLBACK_REASON};
pub use scoring::{
    classify_confidence, creative_performance_score, factor_scores, geographic_fit_score,
    performance_trend, store_performance_score, timing_alignment_score, ScoringWeights,
};
pub use sizing::{
    expected_conversion_rate, recommended_quantity, MAX_EXPECTED_CONVERSION_RATE, MAX_QUANTITY,
    MIN_QUANTITY,
};
pub use types::*;

use crate::errors::DomainError;

/// Result type for recommendation operations
pub type RecommendationResult<T> = Result<T, DomainError>;

/// Default scoring weights
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    store_performance: 0.40,
    creative_performance: 0.30,
    geographic_fit: 0.20,
    timing_alignment: 0.10,
};

/// Pairings scoring below this are dropped
pub const DEFAULT_MIN_CONFIDENCE_THRESHOLD: f64 = 0.50;

pub const DEFAULT_QUANTITY_MULTIPLIER: f64 = 1.0;

/// Allowed drift of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A 20% conversion rate counts as excellent
pub const REFERENCE_CONVERSION_CEILING: f64 = 0.20;

/// Score used when a factor has no history to judge
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Timing score when either side has no time-to-conversion data
pub const NO_TIMING_DATA_SCORE: f64 = 0.8;
