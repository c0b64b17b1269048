//! Deterministic demo performance data
//!
//! Simulates six historical deployments per demo store with diminishing returns on
//! quantity and seeded noise, then aggregates them into the records the engine consumes.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::recommendations::{
    CampaignCreativePerformance, GeographicPattern, RecommendationInput, RegionPerformance,
    StatePerformance, StorePerformanceMetrics,
};

pub const DEFAULT_SEED: u64 = 42;

/// Deployment quantities run at every demo store, oldest last
pub const DEPLOYMENT_QUANTITIES: [u32; 6] = [300, 500, 800, 1200, 2000, 3500];

/// Deployments newer than this count towards the recent window
pub const RECENT_WINDOW_DAYS: u32 = 30;

const HALF_SATURATION_QUANTITY: f64 = 2000.0;
const SATURATION_EXPONENT: f64 = 0.9;
const NOISE_SPREAD: f64 = 0.4;
const MIN_ACTUAL_RATE_PERCENT: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct StoreSeed {
    id: &'static str,
    name: &'static str,
    region: &'static str,
    state: &'static str,
    base_rate_percent: f64,
    avg_time_to_conversion_hours: f64,
}

const STORE_SEEDS: &[StoreSeed] = &[
    StoreSeed {
        id: "store_portland_central",
        name: "Portland Central",
        region: "West",
        state: "OR",
        base_rate_percent: 5.0,
        avg_time_to_conversion_hours: 52.0,
    },
    StoreSeed {
        id: "store_phoenix_north",
        name: "Phoenix North",
        region: "Southwest",
        state: "AZ",
        base_rate_percent: 3.0,
        avg_time_to_conversion_hours: 70.0,
    },
    StoreSeed {
        id: "store_downtown_miami",
        name: "Downtown Miami Store",
        region: "Southeast",
        state: "FL",
        base_rate_percent: 2.5,
        avg_time_to_conversion_hours: 96.0,
    },
];

const SEEDED_CAMPAIGN_ID: &str = "camp_seasonal_postcard";
const SEEDED_CAMPAIGN_HOURS: f64 = 60.0;
const UNTESTED_CAMPAIGN_ID: &str = "camp_new_creative";

/// One simulated historical mailing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deployment {
    pub quantity: u32,
    pub days_ago: u32,
    pub conversions: u32,
}

/// Fraction of the base rate reached at `quantity`; 0.5 at the half-saturation point
pub fn saturation_factor(quantity: u32) -> f64 {
    let scaled = f64::from(quantity).powf(SATURATION_EXPONENT);
    scaled / (HALF_SATURATION_QUANTITY.powf(SATURATION_EXPONENT) + scaled)
}

fn simulate_deployments(seed: &StoreSeed, rng: &mut StdRng) -> Vec<Deployment> {
    DEPLOYMENT_QUANTITIES
        .iter()
        .enumerate()
        .map(|(index, &quantity)| {
            let effective_rate =
                seed.base_rate_percent * (0.5 + 0.5 * saturation_factor(quantity));
            let noise = (rng.gen::<f64>() - 0.5) * NOISE_SPREAD;
            let actual_rate = (effective_rate * (1.0 + noise)).max(MIN_ACTUAL_RATE_PERCENT);
            let conversions = (f64::from(quantity) * actual_rate / 100.0).round() as u32;

            Deployment { quantity, days_ago: 10 + index as u32 * 15, conversions }
        })
        .collect()
}

fn rate(conversions: u64, recipients: u64) -> f64 {
    if recipients == 0 {
        0.0
    } else {
        conversions as f64 / recipients as f64
    }
}

fn aggregate_store(seed: &StoreSeed, deployments: &[Deployment]) -> StorePerformanceMetrics {
    let recipients: u64 = deployments.iter().map(|d| u64::from(d.quantity)).sum();
    let conversions: u64 = deployments.iter().map(|d| u64::from(d.conversions)).sum();

    let recent: Vec<&Deployment> =
        deployments.iter().filter(|d| d.days_ago <= RECENT_WINDOW_DAYS).collect();
    let recent_recipients: u64 = recent.iter().map(|d| u64::from(d.quantity)).sum();
    let recent_conversions: u64 = recent.iter().map(|d| u64::from(d.conversions)).sum();

    StorePerformanceMetrics {
        store_id: seed.id.to_owned(),
        store_name: seed.name.to_owned(),
        region: seed.region.to_owned(),
        state: seed.state.to_owned(),
        total_campaigns: deployments.len() as u32,
        avg_conversion_rate: rate(conversions, recipients),
        recent_campaigns: recent.len() as u32,
        recent_conversion_rate: rate(recent_conversions, recent_recipients),
        total_recipients: recipients,
        avg_time_to_conversion_hours: seed.avg_time_to_conversion_hours,
    }
}

/// Build the demo input. The same seed always yields the same records.
pub fn demo_input(seed: u64) -> RecommendationInput {
    let mut rng = StdRng::seed_from_u64(seed);

    let simulated: Vec<(StoreSeed, Vec<Deployment>)> = STORE_SEEDS
        .iter()
        .map(|store_seed| (*store_seed, simulate_deployments(store_seed, &mut rng)))
        .collect();

    let stores: Vec<StorePerformanceMetrics> =
        simulated.iter().map(|(seed, deployments)| aggregate_store(seed, deployments)).collect();

    // All deployments ran the same creative, so its history is the sum over stores.
    let campaign_recipients: u64 = stores.iter().map(|store| store.total_recipients).sum();
    let campaign_conversions: u64 = simulated
        .iter()
        .flat_map(|(_, deployments)| deployments.iter())
        .map(|d| u64::from(d.conversions))
        .sum();

    let mut by_rate: Vec<&StorePerformanceMetrics> = stores.iter().collect();
    by_rate.sort_by(|a, b| b.avg_conversion_rate.total_cmp(&a.avg_conversion_rate));

    let seeded_campaign = CampaignCreativePerformance {
        campaign_id: SEEDED_CAMPAIGN_ID.to_owned(),
        campaign_name: "Seasonal Postcard".to_owned(),
        total_recipients: campaign_recipients,
        overall_conversion_rate: rate(campaign_conversions, campaign_recipients),
        top_performing_regions: by_rate
            .iter()
            .map(|store| RegionPerformance {
                region: store.region.clone(),
                conversion_rate: store.avg_conversion_rate,
            })
            .collect(),
        top_performing_states: by_rate
            .iter()
            .map(|store| StatePerformance {
                state: store.state.clone(),
                conversion_rate: store.avg_conversion_rate,
            })
            .collect(),
        avg_time_to_conversion_hours: SEEDED_CAMPAIGN_HOURS,
    };

    let untested_campaign = CampaignCreativePerformance {
        campaign_id: UNTESTED_CAMPAIGN_ID.to_owned(),
        campaign_name: "New Creative (untested)".to_owned(),
        total_recipients: 0,
        overall_conversion_rate: 0.0,
        top_performing_regions: Vec::new(),
        top_performing_states: Vec::new(),
        avg_time_to_conversion_hours: 0.0,
    };

    RecommendationInput {
        geographic_patterns: regional_patterns(&stores),
        stores,
        campaigns: vec![seeded_campaign, untested_campaign],
    }
}

/// Recipient-weighted conversion rate per region
fn regional_patterns(stores: &[StorePerformanceMetrics]) -> Vec<GeographicPattern> {
    let mut totals: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for store in stores {
        let entry = totals.entry(store.region.as_str()).or_insert((0.0, 0));
        entry.0 += store.avg_conversion_rate * store.total_recipients as f64;
        entry.1 += store.total_recipients;
    }

    totals
        .into_iter()
        .map(|(region, (weighted, recipients))| GeographicPattern {
            region: region.to_owned(),
            avg_conversion_rate: if recipients == 0 { 0.0 } else { weighted / recipients as f64 },
        })
        .collect()
}
