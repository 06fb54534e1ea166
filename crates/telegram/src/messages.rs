//! User-facing message texts

use chrono::{DateTime, Utc};
use clipqueue_core::domain::JobFailure;
use clipqueue_core::format::group_thousands;
use clipqueue_core::port::UserStats;

pub const DOWNLOADING: &str = "⏳ Downloading your video...";
pub const PROCESSING: &str = "⏳ Processing your video...";
pub const DELIVERY_CAPTION: &str = "✅ Here's your video without watermark!";
pub const STATS_UNAVAILABLE: &str = "❌ Statistics are unavailable right now. Please try again later.";

pub fn welcome(first_name: &str, cooldown_secs: u64) -> String {
    let first_name = escape_markdown(first_name);
    format!(
        "🎬 *TikTok Video Downloader Bot*\n\
         \n\
         Hi {first_name}! 👋\n\
         \n\
         Send me a TikTok video link and I'll download it for you without watermark!\n\
         \n\
         *How to use:*\n\
         1. Copy a TikTok video link\n\
         2. Paste it here\n\
         3. Get your video!\n\
         \n\
         *Supported links:*\n\
         • `https://www.tiktok.com/@user/video/...`\n\
         • `https://vm.tiktok.com/...`\n\
         \n\
         📊 /stats - View your download stats\n\
         ❓ /help - Show this message\n\
         \n\
         ⏱️ Note: {cooldown_secs} second cooldown between downloads"
    )
}

pub fn personal_stats(stats: &UserStats, now: DateTime<Utc>) -> String {
    format!(
        "📊 *Your Download Statistics*\n\
         \n\
         📥 Total Downloads: *{}*\n\
         ✅ Successful: *{}*\n\
         ❌ Failed: *{}*\n\
         \n\
         📅 Today: *{}*\n\
         \n\
         🕐 Updated: {}",
        group_thousands(stats.total_downloads),
        group_thousands(stats.successful_downloads),
        group_thousands(stats.failed_downloads),
        group_thousands(stats.today_downloads),
        now.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn invalid_link() -> String {
    "❌ Please send a valid TikTok video link.\n\n\
     Example: `https://www.tiktok.com/@user/video/123456789`"
        .to_string()
}

pub fn cooldown(remaining_seconds: u64) -> String {
    format!("⏱️ Please wait *{remaining_seconds}* seconds before downloading again.")
}

/// Status message posted on admission; `position` is the depth ahead of the job
pub fn queued(position: usize) -> String {
    if position == 0 {
        PROCESSING.to_string()
    } else {
        format!("⏳ Added to queue. Position: *{}*\nPlease wait...", position + 1)
    }
}

pub fn failure(failure: &JobFailure) -> String {
    match failure {
        JobFailure::FetchFailed(detail) | JobFailure::DeliveryFailed(detail) => format!(
            "❌ Failed to download video.\n\n\
             Error: {detail}\n\n\
             Please try again or check if the link is correct."
        ),
        JobFailure::Unexpected(detail) => {
            format!("❌ An error occurred. Please try again later.\n\nError: {detail}")
        }
    }
}

/// Escape the characters legacy Markdown treats as entity delimiters
pub fn escape_markdown(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
