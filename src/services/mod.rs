pub mod event_normalizer;
pub mod identity_directory;
pub mod metrics;
pub mod profile_aggregator;
pub mod source_fetcher;
pub mod timeline_query;
