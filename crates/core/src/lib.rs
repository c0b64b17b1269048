pub mod config;
pub mod errors;
pub mod fixtures;
pub mod recommendations;

pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use errors::{ApplicationError, DomainError};
pub use recommendations::{
    CampaignCreativePerformance, CampaignRecommendation, ConfidenceLevel, FactorScores,
    GeographicPattern, RecommendationConfig, RecommendationEngine, RecommendationInput,
    ScoringWeights, StorePerformanceMetrics,
};
