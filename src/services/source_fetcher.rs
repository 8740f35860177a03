use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::clients::CrmBackend;
use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::models::entity::Entity;
use crate::models::event::RawActivity;
use crate::models::record::{LeadScore, RawAppointment, RawMatch, RawTask};

pub const SOURCE_TASKS: &str = "tasks";
pub const SOURCE_APPOINTMENTS: &str = "appointments";
pub const SOURCE_LEAD_SCORE: &str = "lead-score";
pub const SOURCE_MATCHES: &str = "matches";
pub const SOURCE_ACTIVITIES: &str = "activities";

/// Everything one fan-out round brought back. Secondary sources that failed
/// or timed out hold their fallback value and are listed in `degraded`.
#[derive(Debug, Clone)]
pub struct SourceBundle {
    pub entity: Entity,
    pub tasks: Vec<RawTask>,
    pub appointments: Vec<RawAppointment>,
    pub lead_score: Option<LeadScore>,
    pub matches: Vec<RawMatch>,
    pub activities: Vec<RawActivity>,
    pub degraded: Vec<&'static str>,
}

/// Issues the upstream queries for one aggregation concurrently, each
/// secondary source in its own failure domain.
///
/// Only the entity-detail read is fatal; without the subject entity none of
/// the other payloads mean anything. Everything else degrades to a fallback
/// value under its own timeout budget.
pub struct SourceFetcher {
    backend: Arc<dyn CrmBackend>,
    config: BackendConfig,
}

impl SourceFetcher {
    pub fn new(backend: Arc<dyn CrmBackend>, config: BackendConfig) -> Self {
        Self { backend, config }
    }

    pub async fn fetch(&self, entity_id: &str) -> AppResult<SourceBundle> {
        let budget = self.config.source_timeout();

        let (entity, tasks, appointments, lead_score, matches, activities) = tokio::join!(
            self.backend.get_entity(entity_id),
            guard(SOURCE_TASKS, budget, self.backend.list_tasks(entity_id)),
            guard(
                SOURCE_APPOINTMENTS,
                budget,
                self.backend.list_appointments(entity_id),
            ),
            guard(
                SOURCE_LEAD_SCORE,
                budget,
                self.backend.get_lead_score(entity_id),
            ),
            guard(
                SOURCE_MATCHES,
                budget,
                self.backend.get_matches(entity_id, self.config.match_limit),
            ),
            guard(
                SOURCE_ACTIVITIES,
                budget,
                self.backend.list_activities(entity_id),
            ),
        );

        let entity = entity.map_err(|err| AppError::entity_unavailable(entity_id, &err))?;

        let mut degraded = Vec::new();
        let mut record = |source: &'static str, hit: bool| {
            if !hit {
                degraded.push(source);
            }
        };

        record(SOURCE_TASKS, tasks.is_ok());
        record(SOURCE_APPOINTMENTS, appointments.is_ok());
        record(SOURCE_LEAD_SCORE, lead_score.is_ok());
        record(SOURCE_MATCHES, matches.is_ok());
        record(SOURCE_ACTIVITIES, activities.is_ok());

        debug!(
            target: "app::fetch",
            entity_id,
            degraded = degraded.len(),
            "source fan-out complete"
        );

        Ok(SourceBundle {
            entity,
            tasks: tasks.unwrap_or_default(),
            appointments: appointments.unwrap_or_default(),
            lead_score: lead_score.ok().flatten(),
            matches: matches.unwrap_or_default(),
            activities: activities.unwrap_or_default(),
            degraded,
        })
    }
}

/// Wrap one secondary query in its own failure domain. Failures and
/// timeouts become `SourceDegraded`; the caller substitutes the source's
/// fallback value instead of propagating it.
async fn guard<T>(
    source: &'static str,
    budget: Duration,
    query: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    match timeout(budget, query).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(AppError::source_degraded(source, err.to_string())),
        Err(_) => Err(AppError::source_degraded(
            source,
            format!("timed out after {}ms", budget.as_millis()),
        )),
    }
}
