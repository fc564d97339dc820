pub mod absence;
pub mod employee;
pub mod history;
pub mod incidence;
mod macros;

// Re-export all models for easy importing
pub use absence::*;
pub use employee::*;
pub use history::*;
pub use incidence::*;
