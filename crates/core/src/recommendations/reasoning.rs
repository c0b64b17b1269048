//! Human-readable reasoning and risk flags

use super::types::*;

pub const FALLBACK_REASON: &str = "Recommendation based on available performance data";

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Generate reasoning bullets in a fixed order: store, creative, geography, timing, caution
pub fn generate_reasoning(
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
    scores: &FactorScores,
    overall_score: f64,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if scores.store_performance >= 0.8 {
        reasons.push(format!(
            "Excellent store performance ({} average conversion rate across {} campaigns)",
            percent(store.avg_conversion_rate),
            store.total_campaigns
        ));
    } else if scores.store_performance >= 0.6 {
        reasons.push(format!(
            "Good store performance ({} average conversion rate)",
            percent(store.avg_conversion_rate)
        ));
    } else if store.total_campaigns == 0 {
        reasons.push(format!(
            "New store with no campaign history; fit inferred from {} regional patterns",
            store.region
        ));
    }

    if scores.creative_performance >= 0.8 {
        reasons.push(format!(
            "Strong creative performance ({} conversion across {} recipients)",
            percent(campaign.overall_conversion_rate),
            campaign.total_recipients
        ));
    } else if scores.creative_performance >= 0.6 {
        reasons.push(format!(
            "Solid creative performance ({} conversion)",
            percent(campaign.overall_conversion_rate)
        ));
    }

    let region_rate = campaign.region_rate(&store.region);
    match region_rate {
        Some(rate) if scores.geographic_fit >= 0.8 => reasons.push(format!(
            "Campaign performs well in the {} region ({} conversion)",
            store.region,
            percent(rate)
        )),
        _ if scores.geographic_fit >= 0.6 => {
            reasons.push(format!("Good geographic fit for {} stores", store.state))
        }
        _ => {}
    }

    if scores.timing_alignment >= 0.8 {
        let no_timing_data = store.avg_time_to_conversion_hours == 0.0
            || campaign.avg_time_to_conversion_hours == 0.0;
        let line = if no_timing_data {
            "No conversion timing history yet; timing does not count against this pairing"
        } else {
            "Conversion timing aligns with this store's historical pattern"
        };
        reasons.push(line.to_string());
    }

    if (0.5..0.7).contains(&overall_score) {
        reasons.push("Moderate confidence; consider a smaller test run first".to_string());
    }

    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON.to_string());
    }

    reasons
}

/// Generate risk flags, independent of the reasoning bullets
pub fn generate_risk_factors(
    store: &StorePerformanceMetrics,
    campaign: &CampaignCreativePerformance,
    overall_score: f64,
) -> Vec<String> {
    let mut risks = Vec::new();

    if store.total_campaigns < 2 {
        let noun = if store.total_campaigns == 1 { "campaign" } else { "campaigns" };
        risks.push(format!("Limited store history ({} {noun})", store.total_campaigns));
    }

    if campaign.total_recipients < 100 {
        risks.push(format!(
            "Creative has limited testing ({} recipients)",
            campaign.total_recipients
        ));
    }

    if store.recent_campaigns >= 2
        && store.recent_conversion_rate < store.avg_conversion_rate * 0.8
    {
        risks.push(format!(
            "Declining store performance trend (recent {} vs {} lifetime)",
            percent(store.recent_conversion_rate),
            percent(store.avg_conversion_rate)
        ));
    }

    if overall_score < 0.6 {
        risks.push("Low overall confidence score; monitor results closely".to_string());
    }

    risks
}
