pub mod app_config;
pub mod database;
pub mod endpoints;
pub mod observability;
pub mod poller;

pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use endpoints::{ResolverConfig, WebhookConfig};
pub use observability::ObservabilityConfig;
pub use poller::PollerConfig;
