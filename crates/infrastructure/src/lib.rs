pub mod database;
pub mod http;
pub mod observability;
pub mod timeout_handler;

pub use database::{DatabaseManager, DatabasePool, DatabaseType};
pub use http::{MetaNameResolver, WebhookDispatcher};
pub use observability::{MetricsCollector, StructuredLogger};
pub use timeout_handler::{TimeoutConfig, TimeoutHandler};
