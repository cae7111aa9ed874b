pub mod dispatcher;
pub mod resolver;
pub mod storage;

pub use dispatcher::{DispatchStatus, NotificationDispatcher};
pub use resolver::NameResolver;
pub use storage::{ArchiveWriter, BatchReader};
