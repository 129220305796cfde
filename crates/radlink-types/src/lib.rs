pub mod api;
pub mod error;
pub mod models;
pub mod time;

pub use error::CoreError;
pub use models::{Principal, Role, TaskPriority, TaskStatus};
