//! HTTP API Layer
//!
//! Health, webhook ingress, statistics JSON and the HTML dashboard.

mod dashboard;
pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{router, AppState, HttpServer, HttpServerConfig};
