pub mod model;

pub use model::{SessionState, Viewer};
