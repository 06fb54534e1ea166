//! Daemon settings
//!
//! Layered with the `config` crate: struct defaults, then an optional TOML
//! file (`clipqueue.toml`, or the path in `CLIPQUEUE_CONFIG`), then
//! `CLIPQUEUE_<SECTION>__<KEY>` environment variables, then the plain
//! `TELEGRAM_BOT_TOKEN` and `PORT` variables.

use clipqueue_api_http::HttpServerConfig;
use clipqueue_core::application::{AdmissionConfig, MaintenanceConfig};
use clipqueue_infra_scraper::ScraperConfig;
use clipqueue_telegram::{PollerConfig, DEFAULT_API_BASE};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "CLIPQUEUE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "clipqueue.toml";
const ENV_PREFIX: &str = "CLIPQUEUE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub queue: QueueSettings,
    pub stats: StatsSettings,
    pub scraper: ScraperSettings,
    pub telegram: TelegramSettings,
    pub maintenance: MaintenanceSettings,
    pub shutdown: ShutdownSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let defaults = HttpServerConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    pub cooldown_secs: u64,
    pub url_marker: String,
}

impl Default for QueueSettings {
    fn default() -> Self {
        let defaults = AdmissionConfig::default();
        Self {
            cooldown_secs: defaults.cooldown.as_secs(),
            url_marker: defaults.url_marker,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    /// SQLite URL or file path; unset means in-memory statistics
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub base_url: String,
    pub download_dir: String,
    pub timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        let defaults = ScraperConfig::default();
        Self {
            base_url: defaults.base_url,
            download_dir: defaults.download_dir.to_string_lossy().into_owned(),
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    /// Long polling with getUpdates
    #[default]
    Polling,
    /// Updates arrive on POST /webhook; the webhook is registered externally
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub mode: BotMode,
    pub poll_timeout_secs: u64,
    pub api_base: String,
    /// Shown on the dashboard
    pub bot_link: Option<String>,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            mode: BotMode::default(),
            poll_timeout_secs: PollerConfig::default().timeout_secs,
            api_base: DEFAULT_API_BASE.to_string(),
            bot_link: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MaintenanceSettings {
    pub interval_secs: u64,
    pub artifact_max_age_secs: u64,
}

impl Default for MaintenanceSettings {
    fn default() -> Self {
        let defaults = MaintenanceConfig::default();
        Self {
            interval_secs: defaults.interval.as_secs(),
            artifact_max_age_secs: defaults.artifact_max_age.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    pub timeout_secs: u64,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Settings {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load using `vars` in place of the process environment
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let path = vars
            .get(CONFIG_PATH_VAR)
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let settings: Settings = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )
            .set_override_option("telegram.bot_token", vars.get("TELEGRAM_BOT_TOKEN").cloned())?
            .set_override_option("http.port", vars.get("PORT").cloned())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.url_marker.trim().is_empty() {
            return Err(ConfigError::Message(
                "queue.url_marker must not be empty".to_string(),
            ));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "scraper.timeout_secs must be positive".to_string(),
            ));
        }
        if self.maintenance.interval_secs == 0 {
            return Err(ConfigError::Message(
                "maintenance.interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Bot token, if one is configured and non-blank
    pub fn bot_token(&self) -> Option<&str> {
        self.telegram
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Database location with a leading `~` expanded
    pub fn database_url(&self) -> Option<String> {
        self.stats
            .database_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| shellexpand::tilde(u).into_owned())
    }

    pub fn admission(&self) -> AdmissionConfig {
        AdmissionConfig {
            cooldown: Duration::from_secs(self.queue.cooldown_secs),
            url_marker: self.queue.url_marker.clone(),
        }
    }

    pub fn http_server(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.http.host.clone(),
            port: self.http.port,
        }
    }

    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            base_url: self.scraper.base_url.clone(),
            download_dir: PathBuf::from(shellexpand::tilde(&self.scraper.download_dir).into_owned()),
            timeout: Duration::from_secs(self.scraper.timeout_secs),
            ..ScraperConfig::default()
        }
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            timeout_secs: self.telegram.poll_timeout_secs,
            ..PollerConfig::default()
        }
    }

    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            interval: Duration::from_secs(self.maintenance.interval_secs),
            artifact_max_age: Duration::from_secs(self.maintenance.artifact_max_age_secs),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown.timeout_secs)
    }
}
