use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use storemail_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use storemail_core::errors::ApplicationError;
use storemail_core::recommendations::{
    CampaignRecommendation, RecommendationConfig, RecommendationEngine, RecommendationInput,
};
use tracing::{info, warn};

use crate::commands::CommandResult;

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default)]
pub struct RecommendArgs {
    pub input: PathBuf,
    pub store_id: Option<String>,
    pub config_path: Option<PathBuf>,
    pub min_confidence: Option<f64>,
    pub quantity_multiplier: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RecommendReport {
    command: &'static str,
    status: &'static str,
    generated_at: DateTime<Utc>,
    config: RecommendationConfig,
    stores_without_recommendations: Vec<String>,
    recommendations: BTreeMap<String, Vec<CampaignRecommendation>>,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    match execute(&args) {
        Ok(report) => CommandResult::payload(COMMAND, &report),
        Err(error) => {
            warn!(
                event_name = "cli.recommend.failed",
                error_class = error.error_class(),
                error = %error,
                "recommend command failed"
            );
            CommandResult::from_error(COMMAND, &error)
        }
    }
}

fn execute(args: &RecommendArgs) -> Result<RecommendReport, ApplicationError> {
    let config = AppConfig::load(LoadOptions {
        config_path: args.config_path.clone(),
        require_file: args.config_path.is_some(),
        overrides: ConfigOverrides {
            min_confidence_threshold: args.min_confidence,
            quantity_multiplier: args.quantity_multiplier,
            ..ConfigOverrides::default()
        },
    })?;
    let engine = RecommendationEngine::new(config.recommendation_config()?);

    let input = read_input(&args.input)?;
    input.validate()?;

    let recommendations = match args.store_id.as_deref() {
        Some(store_id) => {
            let store = input.store(store_id).ok_or_else(|| {
                ApplicationError::Input(format!(
                    "store `{store_id}` is not present in `{}`",
                    args.input.display()
                ))
            })?;
            let recs = engine.generate_store_recommendations(
                store,
                &input.campaigns,
                &input.geographic_patterns,
            );
            BTreeMap::from([(store.store_id.clone(), recs)])
        }
        None => engine.generate_batch_recommendations(
            &input.stores,
            &input.campaigns,
            &input.geographic_patterns,
        ),
    };

    let stores_without_recommendations: Vec<String> = recommendations
        .iter()
        .filter(|(_, recs)| recs.is_empty())
        .map(|(store_id, _)| store_id.clone())
        .collect();

    info!(
        event_name = "cli.recommend.completed",
        input = %args.input.display(),
        stores = recommendations.len(),
        stores_without_recommendations = stores_without_recommendations.len(),
        "recommend command completed"
    );

    Ok(RecommendReport {
        command: COMMAND,
        status: "ok",
        generated_at: Utc::now(),
        config: *engine.config(),
        stores_without_recommendations,
        recommendations,
    })
}

fn read_input(path: &Path) -> Result<RecommendationInput, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Input(format!("could not read `{}`: {error}", path.display()))
    })?;

    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Input(format!("could not parse `{}`: {error}", path.display()))
    })
}
