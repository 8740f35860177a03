use serde::{Deserialize, Serialize};

/// The subject of the 360° view. Read-only within this subsystem.
///
/// The budget fields carry up to three candidate amounts: a point value and
/// a range. `quality_score` is opaque and externally supplied; the banding
/// applied to the scoring engine's output lives in the metrics layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub budget_min: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub quality_score: Option<f64>,
}
