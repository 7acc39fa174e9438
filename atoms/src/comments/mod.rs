pub mod model;
pub mod service;

pub use model::{Comment, CreateCommentPayload};
pub use service::*;
