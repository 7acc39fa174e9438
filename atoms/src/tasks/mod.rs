// Re-export model types and service functions
pub mod model;
pub mod service;

pub use model::{Task, TaskAccess, CreateTaskPayload, UpdateTaskPayload};
pub use service::*;
