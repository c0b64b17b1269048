use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;
use crate::recommendations::{
    RecommendationConfig, ScoringWeights, DEFAULT_MIN_CONFIDENCE_THRESHOLD,
    DEFAULT_QUANTITY_MULTIPLIER, DEFAULT_WEIGHTS,
};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["storemail.toml", "config/storemail.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub recommendation: RecommendationSettings,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct RecommendationSettings {
    pub weights: ScoringWeights,
    pub min_confidence_threshold: f64,
    pub quantity_multiplier: f64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub min_confidence_threshold: Option<f64>,
    pub quantity_multiplier: Option<f64>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
    #[error("recommendation settings are invalid: {0}")]
    Recommendation(#[from] DomainError),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recommendation: RecommendationSettings {
                weights: DEFAULT_WEIGHTS,
                min_confidence_threshold: DEFAULT_MIN_CONFIDENCE_THRESHOLD,
                quantity_multiplier: DEFAULT_QUANTITY_MULTIPLIER,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(recommendation) = patch.recommendation {
            if let Some(threshold) = recommendation.min_confidence_threshold {
                self.recommendation.min_confidence_threshold = threshold;
            }
            if let Some(multiplier) = recommendation.quantity_multiplier {
                self.recommendation.quantity_multiplier = multiplier;
            }
            if let Some(weights) = recommendation.weights {
                let current = &mut self.recommendation.weights;
                if let Some(value) = weights.store_performance {
                    current.store_performance = value;
                }
                if let Some(value) = weights.creative_performance {
                    current.creative_performance = value;
                }
                if let Some(value) = weights.geographic_fit {
                    current.geographic_fit = value;
                }
                if let Some(value) = weights.timing_alignment {
                    current.timing_alignment = value;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOREMAIL_MIN_CONFIDENCE_THRESHOLD") {
            self.recommendation.min_confidence_threshold =
                parse_f64("STOREMAIL_MIN_CONFIDENCE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("STOREMAIL_QUANTITY_MULTIPLIER") {
            self.recommendation.quantity_multiplier =
                parse_f64("STOREMAIL_QUANTITY_MULTIPLIER", &value)?;
        }

        let weights = &mut self.recommendation.weights;
        if let Some(value) = read_env("STOREMAIL_WEIGHT_STORE_PERFORMANCE") {
            weights.store_performance = parse_f64("STOREMAIL_WEIGHT_STORE_PERFORMANCE", &value)?;
        }
        if let Some(value) = read_env("STOREMAIL_WEIGHT_CREATIVE_PERFORMANCE") {
            weights.creative_performance =
                parse_f64("STOREMAIL_WEIGHT_CREATIVE_PERFORMANCE", &value)?;
        }
        if let Some(value) = read_env("STOREMAIL_WEIGHT_GEOGRAPHIC_FIT") {
            weights.geographic_fit = parse_f64("STOREMAIL_WEIGHT_GEOGRAPHIC_FIT", &value)?;
        }
        if let Some(value) = read_env("STOREMAIL_WEIGHT_TIMING_ALIGNMENT") {
            weights.timing_alignment = parse_f64("STOREMAIL_WEIGHT_TIMING_ALIGNMENT", &value)?;
        }

        let log_level =
            read_env("STOREMAIL_LOGGING_LEVEL").or_else(|| read_env("STOREMAIL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOREMAIL_LOGGING_FORMAT").or_else(|| read_env("STOREMAIL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(threshold) = overrides.min_confidence_threshold {
            self.recommendation.min_confidence_threshold = threshold;
        }
        if let Some(multiplier) = overrides.quantity_multiplier {
            self.recommendation.quantity_multiplier = multiplier;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.recommendation_config()?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Engine configuration built from the recommendation settings
    pub fn recommendation_config(&self) -> Result<RecommendationConfig, ConfigError> {
        let settings = &self.recommendation;
        let config = RecommendationConfig::new(
            settings.weights,
            settings.min_confidence_threshold,
            settings.quantity_multiplier,
        )?;
        Ok(config)
    }
}

/// First config file that exists: the explicit path, else the default candidates
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    min_confidence_threshold: Option<f64>,
    quantity_multiplier: Option<f64>,
    weights: Option<WeightsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    store_performance: Option<f64>,
    creative_performance: Option<f64>,
    geographic_fit: Option<f64>,
    timing_alignment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::errors::DomainError;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ALL_VARS: &[&str] = &[
        "STOREMAIL_MIN_CONFIDENCE_THRESHOLD",
        "STOREMAIL_QUANTITY_MULTIPLIER",
        "STOREMAIL_WEIGHT_STORE_PERFORMANCE",
        "STOREMAIL_WEIGHT_CREATIVE_PERFORMANCE",
        "STOREMAIL_WEIGHT_GEOGRAPHIC_FIT",
        "STOREMAIL_WEIGHT_TIMING_ALIGNMENT",
        "STOREMAIL_LOGGING_LEVEL",
        "STOREMAIL_LOG_LEVEL",
        "STOREMAIL_LOGGING_FORMAT",
        "STOREMAIL_LOG_FORMAT",
        "TEST_STOREMAIL_MULTIPLIER",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let engine_config =
            config.recommendation_config().map_err(|err| format!("invalid defaults: {err}"))?;

        ensure(engine_config.min_confidence_threshold() == 0.5, "default threshold is 0.5")?;
        ensure(engine_config.quantity_multiplier() == 1.0, "default multiplier is 1.0")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("TEST_STOREMAIL_MULTIPLIER", "1.5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storemail.toml");
            fs::write(
                &path,
                r#"
[recommendation]
quantity_multiplier = ${TEST_STOREMAIL_MULTIPLIER}
min_confidence_threshold = 0.6

[recommendation.weights]
store_performance = 0.25
creative_performance = 0.25
geographic_fit = 0.25
timing_alignment = 0.25
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.recommendation.quantity_multiplier == 1.5,
                "multiplier should be interpolated from environment",
            )?;
            ensure(
                config.recommendation.min_confidence_threshold == 0.6,
                "threshold should come from file",
            )?;
            ensure(
                config.recommendation.weights.geographic_fit == 0.25,
                "weights should come from file",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("STOREMAIL_LOG_LEVEL", "warn");
        env::set_var("STOREMAIL_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("STOREMAIL_QUANTITY_MULTIPLIER", "1.2");
        env::set_var("STOREMAIL_MIN_CONFIDENCE_THRESHOLD", "0.55");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("storemail.toml");
            fs::write(
                &path,
                r#"
[recommendation]
min_confidence_threshold = 0.7
quantity_multiplier = 0.8

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    min_confidence_threshold: Some(0.65),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.recommendation.min_confidence_threshold == 0.65,
                "override threshold should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.recommendation.quantity_multiplier == 1.2,
                "env multiplier should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_when_weights_do_not_sum_to_one() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("STOREMAIL_WEIGHT_STORE_PERFORMANCE", "0.6");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Recommendation(DomainError::WeightsDoNotSumToOne { .. })
                ),
                "validation failure should report the weight sum",
            )?;
            ensure(
                error.to_string().contains("must sum to 1.0"),
                "message should explain the weight contract",
            )
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn unparsable_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        env::set_var("STOREMAIL_QUANTITY_MULTIPLIER", "lots");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "STOREMAIL_QUANTITY_MULTIPLIER"
                ),
                "bad multiplier should be reported with its key",
            )
        })();

        clear_vars(ALL_VARS);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let missing = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(missing),
            require_file: true,
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(error, Some(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }

    #[test]
    fn bad_log_level_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ALL_VARS);

        let error = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                log_level: Some("verbose".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(
                error,
                Some(ConfigError::Validation(ref message)) if message.contains("logging.level")
            ),
            "validation failure should mention logging.level",
        )
    }
}
