use serde::{Deserialize, Serialize};

/// A resolved actor identity. Built once per aggregation call from a
/// directory snapshot; valid for the lifetime of that call only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
