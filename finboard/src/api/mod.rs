//! API module for the finboard HTTP server

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::AppState;
pub use server::{build_state, router, state_from_config, ApiServer};
