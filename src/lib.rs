pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use clients::{CrmBackend, HttpBackend};
pub use config::BackendConfig;
pub use error::{AppError, AppResult};
pub use models::profile::CompositeProfile;
pub use services::profile_aggregator::ProfileAggregator;
pub use services::timeline_query::{export_csv, filter_timeline, TimelineFilter};
