pub mod error;
pub mod models;
pub mod repository;
pub mod session;

// Re-exports
pub use error::{Error, Result};
pub use models::{DueTaskRecord, EventRecord, OperatorRecord, TaskRecord};
pub use repository::Database;
pub use session::DbSession;
