//! Domain atoms for the task board: tasks, comments, viewer identity and the
//! remote document store they are persisted in.

pub mod comments;
pub mod error;
pub mod record;
pub mod store;
pub mod tasks;
pub mod users;

pub use error::{ServiceError, ValidationError};
pub use record::Record;
