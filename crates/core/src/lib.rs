pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use errors::*;
pub use models::{
    ArchivedRecord, DeliveryOutcome, EnrichedRecord, NotificationItem, NotificationPayload,
    StagedRecord,
};
pub use traits::{ArchiveWriter, BatchReader, DispatchStatus, NameResolver, NotificationDispatcher};
