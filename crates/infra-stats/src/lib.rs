// ClipQueue Infrastructure - Statistics Store Adapters
// Implements: StatsStore (SQLite, in-memory fallback)

mod connection;
mod memory_store;
mod migration;
mod sqlite_store;

pub use connection::create_pool;
pub use memory_store::InMemoryStatsStore;
pub use migration::run_migrations;
pub use sqlite_store::SqliteStatsStore;

/// Longest URL kept in storage
pub const MAX_STORED_URL_CHARS: usize = 500;

pub(crate) fn truncate_url(url: &str) -> String {
    url.chars().take(MAX_STORED_URL_CHARS).collect()
}

/// Midnight (UTC) of the day containing `now_millis`, in millis
pub(crate) fn start_of_day_millis(now_millis: i64) -> i64 {
    chrono::DateTime::from_timestamp_millis(now_millis)
        .map(|dt| {
            dt.date_naive()
                .and_time(chrono::NaiveTime::MIN)
                .and_utc()
                .timestamp_millis()
        })
        .unwrap_or(0)
}
