pub mod auth;
pub mod config;
pub mod state;
pub mod stats;

pub use config::Config;
pub use state::AppState;
