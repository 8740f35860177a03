use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::entity::Entity;
use crate::models::event::TimelineEvent;
use crate::models::record::{RawAppointment, RawMatch, RawTask};

/// The aggregation's output: everything knowable about one entity, built
/// fresh per call and never persisted.
///
/// `degraded_sources` names the secondary sources that fell back to their
/// default value, so callers can surface partial data without being forced
/// to handle degradation as an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompositeProfile {
    pub entity: Entity,
    pub tasks: Vec<RawTask>,
    pub appointments: Vec<RawAppointment>,
    pub events: Vec<TimelineEvent>,
    pub matches: Vec<RawMatch>,
    pub metrics: DerivedMetrics,
    pub degraded_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// `None` when the scoring engine had no score for the entity; "unknown"
    /// is never collapsed into a band.
    pub lead_quality: Option<LeadQuality>,
    pub budget_summary: BudgetSummary,
    /// Dense trailing window, one bucket per calendar day.
    pub engagement: Vec<HeatmapDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuality {
    pub score: f64,
    pub level: QualityLevel,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub formatted: String,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: u32,
}
