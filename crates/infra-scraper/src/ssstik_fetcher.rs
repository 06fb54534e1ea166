// ssstik.io MediaFetcher implementation
// reason: reqwest with a per-fetch cookie store, regex extraction (no DOM parser)

use crate::parse::{absolutize, artifact_file_name, PagePatterns};
use async_trait::async_trait;
use clipqueue_core::port::{FetchError, FetchResult, MediaFetcher};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:147.0) Gecko/20100101 Firefox/147.0";

/// Scraper settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Origin of the scraping service, without trailing path
    pub base_url: String,
    /// Where fetched media is written
    pub download_dir: PathBuf,
    /// Whole-request timeout for every HTTP call
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ssstik.io".to_string(),
            download_dir: PathBuf::from("/tmp/downloads"),
            timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ScraperConfig {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn page_url(&self) -> String {
        format!("{}/en-1", self.base())
    }

    pub fn api_url(&self) -> String {
        format!("{}/abc?url=dl", self.base())
    }
}

/// Ordinary upstream failure; becomes `FetchResult::Failed`
struct StepFailure(String);

impl From<reqwest::Error> for StepFailure {
    fn from(err: reqwest::Error) -> Self {
        StepFailure(err.to_string())
    }
}

type StepResult<T> = std::result::Result<T, StepFailure>;

/// Write the clip to disk, leaving nothing behind if the write fails partway
async fn persist(file_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(e) = tokio::fs::write(file_path, bytes).await {
        let _ = tokio::fs::remove_file(file_path).await;
        return Err(e);
    }
    Ok(())
}

fn expect_ok(status: StatusCode, what: &str) -> StepResult<()> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(StepFailure(format!("{}: {}", what, status.as_u16())))
    }
}

/// Fetches TikTok media through the ssstik.io token + form flow
pub struct SsstikFetcher {
    config: ScraperConfig,
    patterns: PagePatterns,
}

impl SsstikFetcher {
    /// Create the fetcher and make sure the download directory exists
    pub fn new(config: ScraperConfig) -> Result<Self, FetchError> {
        let patterns = PagePatterns::new().map_err(|e| FetchError::Client(e.to_string()))?;
        std::fs::create_dir_all(&config.download_dir)?;
        Ok(Self { config, patterns })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    // A fresh client per fetch keeps cookies from leaking between jobs
    fn build_client(&self) -> Result<Client, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        Client::builder()
            .cookie_store(true)
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))
    }

    async fn fetch_token(&self, client: &Client) -> StepResult<String> {
        info!("Fetching page token...");
        let response = client.get(self.config.page_url()).send().await?;
        expect_ok(response.status(), "Failed to load page")?;

        let html = response.text().await?;
        self.patterns
            .extract_token(&html)
            .ok_or_else(|| StepFailure("Could not find 'tt' token".to_string()))
    }

    async fn fetch_download_link(
        &self,
        client: &Client,
        source_url: &str,
        token: &str,
    ) -> StepResult<String> {
        info!("Calling ssstik.io API...");
        let page_url = self.config.page_url();

        let response = client
            .post(self.config.api_url())
            .form(&[("id", source_url), ("locale", "en"), ("tt", token)])
            .header("HX-Request", "true")
            .header("HX-Trigger", "_gcaptcha_pt")
            .header("HX-Target", "target")
            .header("HX-Current-URL", page_url.as_str())
            .header(ORIGIN, self.config.base())
            .header(REFERER, page_url.as_str())
            .send()
            .await?;
        expect_ok(response.status(), "API request failed")?;

        let html = response.text().await?;
        let link = self
            .patterns
            .select_download_link(&html)
            .ok_or_else(|| StepFailure("No download link found".to_string()))?;

        Ok(absolutize(&link, self.config.base()))
    }

    async fn download(&self, client: &Client, download_url: &str) -> StepResult<Vec<u8>> {
        let preview: String = download_url.chars().take(80).collect();
        info!(download_url = %preview, "Downloading media");

        let response = client
            .get(download_url)
            .header(REFERER, format!("{}/", self.config.base()))
            .send()
            .await?;
        expect_ok(response.status(), "Download failed")?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn run_flow(&self, client: &Client, source_url: &str) -> StepResult<Vec<u8>> {
        let token = self.fetch_token(client).await?;
        debug!("Token acquired");
        let download_url = self.fetch_download_link(client, source_url, &token).await?;
        self.download(client, &download_url).await
    }
}

#[async_trait]
impl MediaFetcher for SsstikFetcher {
    async fn fetch(&self, source_url: &str) -> Result<FetchResult, FetchError> {
        let client = self.build_client()?;

        let bytes = match self.run_flow(&client, source_url).await {
            Ok(bytes) => bytes,
            Err(StepFailure(error)) => {
                warn!(source_url, error = %error, "Fetch failed");
                return Ok(FetchResult::Failed { error });
            }
        };

        let video_id = self.patterns.extract_video_id(source_url);
        let file_name = artifact_file_name(video_id.as_deref(), chrono::Utc::now());
        let file_path = self.config.download_dir.join(&file_name);

        tokio::fs::create_dir_all(&self.config.download_dir).await?;
        if let Err(e) = persist(&file_path, &bytes).await {
            warn!(file = %file_name, error = %e, "Failed to write download");
            return Err(e.into());
        }

        info!(file = %file_name, bytes = bytes.len(), "Downloaded");
        Ok(FetchResult::Fetched { file_path })
    }
}
