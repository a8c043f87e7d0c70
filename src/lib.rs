//! devops-demo - a deliberately misbehaving HTTP service
//!
//! Environment variables make the service crash on start, delay or refuse
//! readiness, or grow its memory until the container runtime kills it. The
//! binary in `main.rs` wires these modules together; they are exposed here so
//! the router and startup checks can be exercised in-process.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod middleware;
pub mod readiness;
pub mod routes;
pub mod startup;
pub mod state;
pub mod templates;

pub use error::{AppError, StartupError};
pub use routes::create_router;
pub use state::AppState;
