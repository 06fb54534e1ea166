// ClipQueue Core - Domain Logic & Ports
// NO infrastructure dependencies: adapters implement the ports in infra crates

pub mod application;
pub mod domain;
pub mod error;
pub mod format;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
