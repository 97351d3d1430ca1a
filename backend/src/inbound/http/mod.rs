//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod routes;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
pub use routes::configure_api;
