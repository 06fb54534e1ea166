// Worker constants (no magic values)
use std::time::Duration;

/// Minimum interval between two accepted submissions from one submitter (15s)
pub const DEFAULT_COOLDOWN_WINDOW: Duration = Duration::from_secs(15);

/// Substring every source URL must contain to be worth a queue slot
pub const DEFAULT_URL_MARKER: &str = "tiktok.com";

/// How often the maintenance scheduler runs (60s)
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Leftover artifacts older than this are swept (10 minutes)
/// A fetch is bounded by a 60s client timeout, so live files never get this old
pub const DEFAULT_ARTIFACT_MAX_AGE: Duration = Duration::from_secs(10 * 60);
