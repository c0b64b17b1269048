use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storemail_core::config::{resolve_config_path, AppConfig, LoadOptions, LogFormat};
use storemail_core::errors::ApplicationError;
use toml::Value;

use crate::commands::CommandResult;

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.clone(),
        require_file: config_path.is_some(),
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("config", &ApplicationError::from(error)),
    };

    let file_path = resolve_config_path(config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, file_doc.as_ref(), file_path.as_deref())
    };

    let settings = &config.recommendation;
    let weights = &settings.weights;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "recommendation.min_confidence_threshold",
        &settings.min_confidence_threshold.to_string(),
        source("recommendation.min_confidence_threshold", &["STOREMAIL_MIN_CONFIDENCE_THRESHOLD"]),
    ));
    lines.push(render_line(
        "recommendation.quantity_multiplier",
        &settings.quantity_multiplier.to_string(),
        source("recommendation.quantity_multiplier", &["STOREMAIL_QUANTITY_MULTIPLIER"]),
    ));

    let weight_fields = [
        ("store_performance", weights.store_performance, "STOREMAIL_WEIGHT_STORE_PERFORMANCE"),
        (
            "creative_performance",
            weights.creative_performance,
            "STOREMAIL_WEIGHT_CREATIVE_PERFORMANCE",
        ),
        ("geographic_fit", weights.geographic_fit, "STOREMAIL_WEIGHT_GEOGRAPHIC_FIT"),
        ("timing_alignment", weights.timing_alignment, "STOREMAIL_WEIGHT_TIMING_ALIGNMENT"),
    ];
    for (name, value, env_key) in weight_fields {
        let key_path = format!("recommendation.weights.{name}");
        lines.push(render_line(&key_path, &value.to_string(), source(&key_path, &[env_key])));
    }

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["STOREMAIL_LOGGING_LEVEL", "STOREMAIL_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        log_format_name(config.logging.format),
        source("logging.format", &["STOREMAIL_LOGGING_FORMAT", "STOREMAIL_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

/// Env keys are checked in order; the first one set wins, matching how the loader reads them
fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env_key = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = set_env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
