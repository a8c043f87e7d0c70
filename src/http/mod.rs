//! HTTP server module.
//!
//! The server is plain HTTP; TLS is expected to be terminated by the ingress
//! in front of the pod. It includes graceful shutdown on SIGTERM/SIGINT so
//! rolling updates drain in-flight requests.

mod server;
mod shutdown;

pub use server::{start_server, ServerError};
