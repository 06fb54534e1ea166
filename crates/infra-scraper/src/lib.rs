// ClipQueue Infrastructure - Scraper Adapters
// Implements: MediaFetcher (ssstik.io form flow), ArtifactJanitor (download dir)

pub mod janitor;
pub mod parse;
pub mod ssstik_fetcher;

pub use janitor::DownloadDirJanitor;
pub use ssstik_fetcher::{ScraperConfig, SsstikFetcher};
