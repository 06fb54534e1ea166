//! Logging setup
//!
//! `RUST_LOG` selects levels (default `clipqueue=info`); `CLIPQUEUE_LOG_FORMAT`
//! selects the output:
//!
//! ```text
//! CLIPQUEUE_LOG_FORMAT=json RUST_LOG=clipqueue=debug ./clipqueue-bot
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FORMAT_VAR: &str = "CLIPQUEUE_LOG_FORMAT";
const DEFAULT_LOG_FILTER: &str = "clipqueue=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Development: multi-line, colored
    Pretty,
    /// Production: one JSON object per event
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber
pub fn init_logging(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
