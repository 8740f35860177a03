use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::{NoExpand, Regex};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::event::{EventCategory, EventStatus, RawActivity, TimelineEvent};
use crate::models::identity::Identity;

pub const SYSTEM_ACTOR_LABEL: &str = "system";
pub const SELF_ACTOR_LABEL: &str = "you";

/// Map heterogeneous raw activity records into normalized timeline events.
///
/// Pure function: the identity map is request-scoped and passed in, `now`
/// is the timestamp fallback of last resort. Records that fail to normalize
/// are skipped; one bad record never fails the batch. Output order matches
/// input order; callers sort as needed.
pub fn normalize(
    raw: Vec<RawActivity>,
    identities: &HashMap<String, Identity>,
    viewer_id: &str,
    now: DateTime<Utc>,
) -> Vec<TimelineEvent> {
    raw.into_iter()
        .filter_map(|record| match normalize_one(record, identities, viewer_id, now) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(target: "app::normalize", error = %err, "skipping malformed activity");
                None
            }
        })
        .collect()
}

fn normalize_one(
    raw: RawActivity,
    identities: &HashMap<String, Identity>,
    viewer_id: &str,
    now: DateTime<Utc>,
) -> AppResult<TimelineEvent> {
    let category = raw
        .activity_type
        .as_deref()
        .map(EventCategory::from_raw_tag)
        .unwrap_or(EventCategory::Other);

    let occurred_at = resolve_occurred_at(&raw, now)?;

    let (actor_label, actor_avatar) =
        resolve_actor(raw.actor_id.as_deref(), identities, viewer_id);

    let mut description = raw.description.unwrap_or_default();
    if let Some(actor_id) = raw.actor_id.as_deref() {
        description = rewrite_actor_references(&description, actor_id, &actor_label);
    }

    Ok(TimelineEvent {
        id: raw.id,
        category,
        title: raw.title.unwrap_or_default(),
        description,
        occurred_at,
        status: raw.status.as_deref().and_then(EventStatus::from_raw_tag),
        actor_id: raw.actor_id,
        actor_label,
        actor_avatar,
    })
}

/// Candidate timestamps in priority order: completion, schedule, creation.
/// Absent candidates fall through to the next one; a present but
/// unparseable candidate makes the record malformed. With no candidate at
/// all the aggregation time is used, keeping `occurred_at` total.
fn resolve_occurred_at(raw: &RawActivity, now: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    let candidates = [&raw.completed_at, &raw.scheduled_at, &raw.created_at];

    for candidate in candidates.into_iter().flatten() {
        return DateTime::parse_from_rfc3339(candidate)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| {
                AppError::malformed_record(&raw.id, format!("unparseable timestamp: {err}"))
            });
    }

    Ok(now)
}

fn resolve_actor(
    actor_id: Option<&str>,
    identities: &HashMap<String, Identity>,
    viewer_id: &str,
) -> (String, Option<String>) {
    let Some(actor_id) = actor_id else {
        return (SYSTEM_ACTOR_LABEL.to_string(), None);
    };

    let avatar = identities
        .get(actor_id)
        .and_then(|identity| identity.avatar_url.clone());

    if actor_id == viewer_id {
        return (SELF_ACTOR_LABEL.to_string(), avatar);
    }

    match identities.get(actor_id) {
        Some(identity) => (identity.display_name.clone(), avatar),
        // Raw identifiers are never shown whole to the end consumer.
        None => (placeholder_label(actor_id), None),
    }
}

fn placeholder_label(actor_id: &str) -> String {
    let prefix: String = actor_id.chars().take(8).collect();
    format!("user-{prefix}")
}

/// Rewrite `<keyword> <raw-id>` occurrences in free text with the resolved
/// actor label. Word-boundary-safe and case-insensitive, restricted to the
/// keyword-prefixed forms upstream audit logs emit ("changed by User 9f3a…",
/// "changed by 9f3a…"); keywords are user, by and agent. Identifiers that
/// appear in any other context stay as written.
fn rewrite_actor_references(description: &str, actor_id: &str, label: &str) -> String {
    if description.is_empty() {
        return description.to_string();
    }

    let pattern = format!(r"(?i)\b(?:user|by|agent)\s+{}\b", regex::escape(actor_id));
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(description, NoExpand(label)).into_owned(),
        Err(err) => {
            warn!(target: "app::normalize", error = %err, "redaction pattern failed to compile");
            description.to_string()
        }
    }
}
