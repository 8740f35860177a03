use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw activity record from the audit/activity log. Carries up to three
/// candidate timestamps; normalization resolves them into one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawActivity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Call,
    Email,
    Meeting,
    Note,
    PropertyViewing,
    FollowUp,
    DocumentAction,
    FieldChange,
    Other,
}

impl EventCategory {
    /// Classify a source system's raw type tag. Unrecognized tags become
    /// `Other` instead of erroring.
    pub fn from_raw_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "call" | "phone_call" => EventCategory::Call,
            "email" => EventCategory::Email,
            "meeting" => EventCategory::Meeting,
            "note" => EventCategory::Note,
            "viewing" | "property_viewing" => EventCategory::PropertyViewing,
            "follow_up" | "followup" => EventCategory::FollowUp,
            "document" | "document_action" | "document_upload" => EventCategory::DocumentAction,
            "field_change" | "change" | "update" => EventCategory::FieldChange,
            _ => EventCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Call => "call",
            EventCategory::Email => "email",
            EventCategory::Meeting => "meeting",
            EventCategory::Note => "note",
            EventCategory::PropertyViewing => "property_viewing",
            EventCategory::FollowUp => "follow_up",
            EventCategory::DocumentAction => "document_action",
            EventCategory::FieldChange => "field_change",
            EventCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Completed,
    Open,
    Planned,
    Cancelled,
}

impl EventStatus {
    /// Status tags are passed through from the source; anything outside the
    /// known set is dropped rather than guessed at.
    pub fn from_raw_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "completed" | "done" => Some(EventStatus::Completed),
            "open" | "pending" => Some(EventStatus::Open),
            "planned" | "scheduled" => Some(EventStatus::Planned),
            "cancelled" | "canceled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Completed => "completed",
            EventStatus::Open => "open",
            EventStatus::Planned => "planned",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

/// The normalized, source-agnostic unit of the engagement timeline.
///
/// `occurred_at` is always resolved; when a raw record carries none of its
/// candidate timestamps, normalization time is used so sorting and heatmap
/// bucketing stay total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: String,
    pub category: EventCategory,
    pub title: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub status: Option<EventStatus>,
    pub actor_id: Option<String>,
    pub actor_label: String,
    pub actor_avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_tags_map_to_other() {
        assert_eq!(EventCategory::from_raw_tag("CALL"), EventCategory::Call);
        assert_eq!(
            EventCategory::from_raw_tag("property_viewing"),
            EventCategory::PropertyViewing
        );
        assert_eq!(
            EventCategory::from_raw_tag("telepathy"),
            EventCategory::Other
        );
        assert_eq!(EventCategory::from_raw_tag(""), EventCategory::Other);
    }

    #[test]
    fn status_tags_outside_known_set_are_dropped() {
        assert_eq!(
            EventStatus::from_raw_tag("Completed"),
            Some(EventStatus::Completed)
        );
        assert_eq!(
            EventStatus::from_raw_tag("scheduled"),
            Some(EventStatus::Planned)
        );
        assert_eq!(EventStatus::from_raw_tag("weird"), None);
    }
}
