use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

use crate::models::entity::Entity;
use crate::models::event::TimelineEvent;
use crate::models::profile::{BudgetSummary, HeatmapDay, LeadQuality, QualityLevel};
use crate::models::record::LeadScore;
use crate::utils::money;

/// Number of daily buckets in the engagement heatmap.
pub const HEATMAP_DAYS: i64 = 42;

pub const BUDGET_NOT_SPECIFIED: &str = "Not specified";
const DEFAULT_CURRENCY: &str = "EUR";

/// Band an externally supplied 0-100 score. An absent score stays absent;
/// "unknown" is never collapsed into the low band.
pub fn band_lead_quality(lead_score: Option<&LeadScore>) -> Option<LeadQuality> {
    let lead_score = lead_score?;

    let mut seen = HashSet::new();
    let factors: Vec<String> = lead_score
        .signals
        .iter()
        .map(|signal| signal.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect();

    Some(LeadQuality {
        score: lead_score.score,
        level: quality_level(lead_score.score),
        factors,
    })
}

pub fn quality_level(score: f64) -> QualityLevel {
    if score >= 70.0 {
        QualityLevel::High
    } else if score >= 40.0 {
        QualityLevel::Medium
    } else {
        QualityLevel::Low
    }
}

/// Summarize the entity's monetary range: point value, else range max, else
/// range min. Downstream renders the result unconditionally, so "nothing
/// specified" is a canonical string and zero, never an absent value.
pub fn summarize_budget(entity: &Entity) -> BudgetSummary {
    let candidates = [entity.budget, entity.budget_max, entity.budget_min];
    let amount = candidates.into_iter().flatten().next();

    match amount {
        Some(amount) => {
            let currency = entity.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
            BudgetSummary {
                formatted: money::format_currency(amount, currency),
                average: amount,
            }
        }
        None => BudgetSummary {
            formatted: BUDGET_NOT_SPECIFIED.to_string(),
            average: 0.0,
        },
    }
}

/// Dense trailing engagement window: exactly [`HEATMAP_DAYS`] buckets ending
/// on the calendar day of `now`, zero-filled, strictly ascending by day.
///
/// Bucketing uses the calendar date in `now`'s timezone for both the window
/// edges and the events, so day boundaries line up with what the viewer
/// sees rather than with UTC truncation.
pub fn engagement_heatmap<Tz: TimeZone>(
    events: &[TimelineEvent],
    now: DateTime<Tz>,
) -> Vec<HeatmapDay> {
    let today = now.date_naive();
    let start = today - Duration::days(HEATMAP_DAYS - 1);

    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for event in events {
        let day = event.occurred_at.with_timezone(&now.timezone()).date_naive();
        if day >= start && day <= today {
            *counts.entry(day).or_insert(0) += 1;
        }
    }

    (0..HEATMAP_DAYS)
        .map(|offset| {
            let date = start + Duration::days(offset);
            HeatmapDay {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}
