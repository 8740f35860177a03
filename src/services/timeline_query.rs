use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::event::{EventCategory, EventStatus, TimelineEvent};

/// Conjunctive timeline predicate: every supplied field must match. Date
/// bounds are UTC calendar days, inclusive of the whole day.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineFilter {
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

pub fn filter_timeline(events: &[TimelineEvent], filter: &TimelineFilter) -> Vec<TimelineEvent> {
    events
        .iter()
        .filter(|event| matches(event, filter))
        .cloned()
        .collect()
}

fn matches(event: &TimelineEvent, filter: &TimelineFilter) -> bool {
    if let Some(category) = filter.category {
        if event.category != category {
            return false;
        }
    }

    if let Some(status) = filter.status {
        if event.status != Some(status) {
            return false;
        }
    }

    let day = event.occurred_at.date_naive();
    if let Some(from) = filter.date_from {
        if day < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to {
        if day > to {
            return false;
        }
    }

    true
}

const CSV_COLUMNS: [&str; 7] = [
    "date",
    "time",
    "category",
    "title",
    "status",
    "actor",
    "description",
];

/// Serialize events to UTF-8 CSV with a header row and a stable column
/// order. Operates on whatever list it is given; callers decide whether the
/// export reflects an active filter.
pub fn export_csv(events: &[TimelineEvent]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push('\n');

    for event in events {
        let row = [
            event.occurred_at.format("%Y-%m-%d").to_string(),
            event.occurred_at.format("%H:%M:%S").to_string(),
            event.category.as_str().to_string(),
            event.title.clone(),
            event
                .status
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            event.actor_label.clone(),
            event.description.clone(),
        ];

        let escaped: Vec<String> = row.iter().map(|field| escape_csv_field(field)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    }

    out.into_bytes()
}

fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn event(id: &str, category: EventCategory, timestamp: &str) -> TimelineEvent {
        TimelineEvent {
            id: id.to_string(),
            category,
            title: format!("Event {id}"),
            description: String::new(),
            occurred_at: DateTime::parse_from_rfc3339(timestamp)
                .unwrap()
                .with_timezone(&Utc),
            status: Some(EventStatus::Completed),
            actor_id: None,
            actor_label: "system".to_string(),
            actor_avatar: None,
        }
    }

    /// Minimal RFC-4180 reader used to verify exports round-trip.
    fn parse_csv(bytes: &[u8]) -> Vec<Vec<String>> {
        let text = std::str::from_utf8(bytes).unwrap();
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(ch) = chars.next() {
            if in_quotes {
                match ch {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    other => field.push(other),
                }
            } else {
                match ch {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    other => field.push(other),
                }
            }
        }
        if !field.is_empty() || !row.is_empty() {
            row.push(field);
            rows.push(row);
        }
        rows
    }

    #[test]
    fn filter_is_conjunctive_over_supplied_predicates() {
        let events = vec![
            event("1", EventCategory::Call, "2026-08-10T10:00:00Z"),
            event("2", EventCategory::Email, "2026-08-10T11:00:00Z"),
            event("3", EventCategory::Call, "2026-08-20T10:00:00Z"),
        ];

        let filter = TimelineFilter {
            category: Some(EventCategory::Call),
            status: Some(EventStatus::Completed),
            date_from: Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap()),
            date_to: None,
        };

        let filtered = filter_timeline(&events, &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "3");
    }

    #[test]
    fn date_bounds_include_the_whole_day() {
        let events = vec![
            event("early", EventCategory::Note, "2026-08-10T00:00:01Z"),
            event("late", EventCategory::Note, "2026-08-12T23:59:59Z"),
        ];

        let filter = TimelineFilter {
            date_from: Some(NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2026, 8, 12).unwrap()),
            ..Default::default()
        };

        assert_eq!(filter_timeline(&events, &filter).len(), 2);
    }

    #[test]
    fn empty_filter_passes_everything_through() {
        let events = vec![
            event("1", EventCategory::Call, "2026-08-10T10:00:00Z"),
            event("2", EventCategory::Email, "2026-08-11T10:00:00Z"),
        ];
        assert_eq!(
            filter_timeline(&events, &TimelineFilter::default()).len(),
            2
        );
    }

    #[test]
    fn export_has_stable_header_and_one_row_per_event() {
        let events = vec![
            event("1", EventCategory::Call, "2026-08-10T10:00:00Z"),
            event("2", EventCategory::Email, "2026-08-11T10:00:00Z"),
        ];

        let rows = parse_csv(&export_csv(&events));
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            vec!["date", "time", "category", "title", "status", "actor", "description"]
        );
        assert_eq!(rows[1][0], "2026-08-10");
        assert_eq!(rows[1][2], "call");
    }

    #[test]
    fn embedded_delimiters_and_quotes_round_trip() {
        let mut tricky = event("1", EventCategory::Note, "2026-08-10T10:00:00Z");
        tricky.description = "price dropped, buyer said \"too high\"\nfollow up".to_string();
        tricky.title = "Notes, misc".to_string();

        let rows = parse_csv(&export_csv(&[tricky.clone()]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][3], tricky.title);
        assert_eq!(rows[1][6], tricky.description);
    }

    #[test]
    fn status_less_events_export_an_empty_status_column() {
        let mut no_status = event("1", EventCategory::Note, "2026-08-10T10:00:00Z");
        no_status.status = None;

        let rows = parse_csv(&export_csv(&[no_status]));
        assert_eq!(rows[1][4], "");
    }
}
