use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::info;

use crate::clients::CrmBackend;
use crate::config::BackendConfig;
use crate::error::AppResult;
use crate::models::profile::{CompositeProfile, DerivedMetrics};
use crate::services::event_normalizer;
use crate::services::identity_directory::IdentityDirectory;
use crate::services::metrics;
use crate::services::source_fetcher::{SourceBundle, SourceFetcher};

/// Builds the 360° view of one entity: fan-out, identity resolution,
/// normalization, derived metrics, assembly. Pure composition over the read
/// collaborators; nothing is persisted.
///
/// Only `EntityUnavailable` (or caller cancellation) escapes as an error;
/// every other partial failure is absorbed into fallback values per source.
pub struct ProfileAggregator {
    fetcher: SourceFetcher,
    directory: IdentityDirectory,
}

impl ProfileAggregator {
    pub fn new(backend: Arc<dyn CrmBackend>, config: BackendConfig) -> Self {
        Self {
            fetcher: SourceFetcher::new(backend.clone(), config),
            directory: IdentityDirectory::new(backend),
        }
    }

    pub async fn aggregate(&self, entity_id: &str, viewer_id: &str) -> AppResult<CompositeProfile> {
        let bundle = self.fetcher.fetch(entity_id).await?;

        let actor_ids = collect_actor_ids(&bundle);
        let identities = self.directory.resolve(&actor_ids).await;

        let mut events =
            event_normalizer::normalize(bundle.activities, &identities, viewer_id, Utc::now());
        // Recent-first default view order; consumers re-sort as needed.
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

        let derived = DerivedMetrics {
            lead_quality: metrics::band_lead_quality(bundle.lead_score.as_ref()),
            budget_summary: metrics::summarize_budget(&bundle.entity),
            engagement: metrics::engagement_heatmap(&events, Local::now()),
        };

        info!(
            target: "app::profile",
            entity_id,
            events = events.len(),
            tasks = bundle.tasks.len(),
            appointments = bundle.appointments.len(),
            degraded = ?bundle.degraded,
            "profile assembled"
        );

        Ok(CompositeProfile {
            entity: bundle.entity,
            tasks: bundle.tasks,
            appointments: bundle.appointments,
            events,
            matches: bundle.matches,
            metrics: derived,
            degraded_sources: bundle.degraded.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Union of every actor id referenced by the fetched records; seeds the one
/// batched identity lookup.
fn collect_actor_ids(bundle: &SourceBundle) -> HashSet<String> {
    let mut ids = HashSet::new();

    ids.extend(bundle.tasks.iter().filter_map(|task| task.owner_id.clone()));
    ids.extend(
        bundle
            .appointments
            .iter()
            .filter_map(|appointment| appointment.organizer_id.clone()),
    );
    ids.extend(
        bundle
            .activities
            .iter()
            .filter_map(|activity| activity.actor_id.clone()),
    );

    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::models::entity::Entity;
    use crate::models::event::RawActivity;
    use crate::models::identity::Identity;
    use crate::models::profile::QualityLevel;
    use crate::models::record::{LeadScore, RawAppointment, RawMatch, RawTask, ScoreSignal};

    #[derive(Default)]
    struct FixtureBackend {
        fail_secondaries: bool,
    }

    #[async_trait]
    impl CrmBackend for FixtureBackend {
        async fn get_entity(&self, entity_id: &str) -> AppResult<Entity> {
            Ok(Entity {
                id: entity_id.to_string(),
                display_name: "Acme GmbH".to_string(),
                classification: Some("buyer".to_string()),
                status: Some("active".to_string()),
                budget: None,
                budget_max: Some(500_000.0),
                budget_min: Some(300_000.0),
                currency: Some("EUR".to_string()),
                quality_score: None,
            })
        }

        async fn list_tasks(&self, _entity_id: &str) -> AppResult<Vec<RawTask>> {
            if self.fail_secondaries {
                return Err(AppError::upstream(500, "GET /api/tasks"));
            }
            Ok(vec![RawTask {
                id: "t-1".to_string(),
                title: "Send exposé".to_string(),
                description: None,
                status: Some("open".to_string()),
                due_at: None,
                completed_at: None,
                created_at: None,
                owner_id: Some("u-1".to_string()),
            }])
        }

        async fn list_appointments(&self, _entity_id: &str) -> AppResult<Vec<RawAppointment>> {
            if self.fail_secondaries {
                return Err(AppError::upstream(500, "GET /api/appointments"));
            }
            Ok(vec![])
        }

        async fn get_lead_score(&self, _entity_id: &str) -> AppResult<Option<LeadScore>> {
            if self.fail_secondaries {
                return Err(AppError::upstream(500, "GET /api/scoring"));
            }
            Ok(Some(LeadScore {
                score: 72.0,
                signals: vec![ScoreSignal {
                    name: "responds quickly".to_string(),
                }],
            }))
        }

        async fn get_matches(&self, _entity_id: &str, _limit: u32) -> AppResult<Vec<RawMatch>> {
            if self.fail_secondaries {
                return Err(AppError::upstream(500, "GET /api/matching"));
            }
            Ok(vec![])
        }

        async fn list_activities(&self, _entity_id: &str) -> AppResult<Vec<RawActivity>> {
            if self.fail_secondaries {
                return Err(AppError::upstream(500, "GET /api/activities"));
            }
            Ok(vec![
                RawActivity {
                    id: "a-1".to_string(),
                    activity_type: Some("call".to_string()),
                    title: Some("Intro call".to_string()),
                    description: None,
                    completed_at: Some("2026-08-20T10:00:00Z".to_string()),
                    scheduled_at: None,
                    created_at: None,
                    actor_id: Some("u-1".to_string()),
                    status: Some("completed".to_string()),
                },
                RawActivity {
                    id: "a-2".to_string(),
                    activity_type: Some("field_change".to_string()),
                    title: Some("Status update".to_string()),
                    description: Some("changed by User u-1".to_string()),
                    completed_at: None,
                    scheduled_at: None,
                    created_at: Some("2026-08-22T09:00:00Z".to_string()),
                    actor_id: Some("u-1".to_string()),
                    status: None,
                },
            ])
        }

        async fn resolve_identities(
            &self,
            ids: &[String],
        ) -> AppResult<HashMap<String, Identity>> {
            Ok(ids
                .iter()
                .map(|id| {
                    (
                        id.clone(),
                        Identity {
                            id: id.clone(),
                            display_name: "Dana Meyer".to_string(),
                            avatar_url: None,
                        },
                    )
                })
                .collect())
        }
    }

    fn aggregator(fail_secondaries: bool) -> ProfileAggregator {
        ProfileAggregator::new(
            Arc::new(FixtureBackend { fail_secondaries }),
            BackendConfig::default(),
        )
    }

    #[tokio::test]
    async fn assembles_a_full_profile_with_resolved_actors() {
        let profile = aggregator(false).aggregate("c-1", "viewer").await.unwrap();

        assert_eq!(profile.tasks.len(), 1);
        assert_eq!(profile.events.len(), 2);
        // Recent first.
        assert_eq!(profile.events[0].id, "a-2");
        assert_eq!(profile.events[0].actor_label, "Dana Meyer");
        assert_eq!(profile.events[0].description, "changed by Dana Meyer");
        assert_eq!(
            profile.metrics.lead_quality.as_ref().unwrap().level,
            QualityLevel::High
        );
        assert_eq!(profile.metrics.budget_summary.formatted, "EUR 500,000");
        assert_eq!(profile.metrics.engagement.len(), 42);
        assert!(profile.degraded_sources.is_empty());
    }

    #[tokio::test]
    async fn all_secondary_failures_still_produce_a_profile() {
        let profile = aggregator(true).aggregate("c-1", "viewer").await.unwrap();

        assert!(profile.tasks.is_empty());
        assert!(profile.appointments.is_empty());
        assert!(profile.events.is_empty());
        assert!(profile.matches.is_empty());
        assert!(profile.metrics.lead_quality.is_none());
        assert_eq!(profile.metrics.engagement.len(), 42);
        assert_eq!(profile.degraded_sources.len(), 5);
    }

    #[test]
    fn actor_ids_are_unioned_across_record_kinds() {
        let bundle = SourceBundle {
            entity: Entity {
                id: "c-1".to_string(),
                display_name: "Acme".to_string(),
                classification: None,
                status: None,
                budget: None,
                budget_max: None,
                budget_min: None,
                currency: None,
                quality_score: None,
            },
            tasks: vec![RawTask {
                id: "t-1".to_string(),
                title: "x".to_string(),
                description: None,
                status: None,
                due_at: None,
                completed_at: None,
                created_at: None,
                owner_id: Some("u-1".to_string()),
            }],
            appointments: vec![RawAppointment {
                id: "ap-1".to_string(),
                title: "x".to_string(),
                location: None,
                status: None,
                starts_at: None,
                ends_at: None,
                created_at: None,
                organizer_id: Some("u-2".to_string()),
            }],
            lead_score: None,
            matches: vec![],
            activities: vec![RawActivity {
                id: "a-1".to_string(),
                activity_type: None,
                title: None,
                description: None,
                completed_at: None,
                scheduled_at: None,
                created_at: None,
                actor_id: Some("u-1".to_string()),
                status: None,
            }],
            degraded: vec![],
        };

        let ids = collect_actor_ids(&bundle);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("u-1"));
        assert!(ids.contains("u-2"));
    }
}
