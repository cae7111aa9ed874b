pub mod launch;
pub mod notification;

pub use launch::{ArchivedRecord, DeliveryOutcome, EnrichedRecord, StagedRecord};
pub use notification::{clean_display_name, NotificationItem, NotificationPayload};
