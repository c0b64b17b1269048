use thiserror::Error;

use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("scoring weight `{name}` must be in range 0.0..=1.0 (got {value})")]
    WeightOutOfRange { name: &'static str, value: f64 },
    #[error("scoring weights must sum to 1.0 (got {sum})")]
    WeightsDoNotSumToOne { sum: f64 },
    #[error("min_confidence_threshold must be in range 0.0..=1.0 (got {0})")]
    ThresholdOutOfRange(f64),
    #[error("quantity_multiplier must be a positive finite number (got {0})")]
    InvalidQuantityMultiplier(f64),
    #[error("invalid {kind} `{id}`: {reason}")]
    InvalidInput { kind: &'static str, id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("input failure: {0}")]
    Input(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl ApplicationError {
    /// Stable tag for structured command output
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidInput { .. }) | Self::Input(_) => "input_validation",
            Self::Domain(_) | Self::Config(_) => "config_validation",
            Self::Serialization(_) => "serialization",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.error_class() {
            "config_validation" => 2,
            "input_validation" => 3,
            _ => 1,
        }
    }
}
