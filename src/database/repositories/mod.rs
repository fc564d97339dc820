pub mod directory;
pub mod incidence;
pub mod memory;
pub mod notification;
pub mod shift_exception;
pub mod workflow;

// Re-export all adapters for easy importing
pub use directory::PgEmployeeDirectory;
pub use incidence::PgIncidenceSink;
pub use memory::{
    InMemoryEmployeeDirectory, InMemoryIncidenceSink, InMemoryNotificationSink,
    InMemoryShiftExceptionSink, InMemoryWorkflowStore,
};
pub use notification::PgNotificationSink;
pub use shift_exception::PgShiftExceptionSink;
pub use workflow::{PgWorkflowStore, PgWorkflowTransaction};
