//! ClipQueue CLI - reads the daemon's HTTP surface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipqueue_core::domain::WorkerState;
use clipqueue_core::port::{AggregateStats, UserStats};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tabled::{Table, Tabled};

const DEFAULT_URL: &str = "http://127.0.0.1:8000";

#[derive(Parser)]
#[command(name = "clipqueue")]
#[command(about = "ClipQueue bot CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon HTTP URL
    #[arg(long, env = "CLIPQUEUE_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is up
    Health,

    /// Show download statistics
    Stats {
        /// Only this Telegram user
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Show queue depth and worker state
    Queue,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    service: String,
}

#[derive(Deserialize)]
struct QueueResponse {
    depth: usize,
    worker_state: WorkerState,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Tabled)]
struct StatRow {
    metric: &'static str,
    value: i64,
}

fn aggregate_rows(stats: &AggregateStats) -> Vec<StatRow> {
    vec![
        StatRow { metric: "Total users", value: stats.total_users },
        StatRow { metric: "Total downloads", value: stats.total_downloads },
        StatRow { metric: "Successful", value: stats.successful_downloads },
        StatRow { metric: "Failed", value: stats.failed_downloads },
        StatRow { metric: "Today", value: stats.today_downloads },
    ]
}

fn user_rows(stats: &UserStats) -> Vec<StatRow> {
    vec![
        StatRow { metric: "Total downloads", value: stats.total_downloads },
        StatRow { metric: "Successful", value: stats.successful_downloads },
        StatRow { metric: "Failed", value: stats.failed_downloads },
        StatRow { metric: "Today", value: stats.today_downloads },
    ]
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

async fn get_json<T: DeserializeOwned>(base: &str, path: &str) -> Result<T> {
    let url = endpoint(base, path);
    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to daemon at {}", base))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| "no details".to_string());
        anyhow::bail!("{} returned {}: {}", path, status, detail);
    }

    response.json().await.context("Failed to parse response")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Health => match get_json::<HealthResponse>(&cli.url, "/health").await {
            Ok(health) => {
                println!("{}", "Service Status".cyan().bold());
                println!();
                println!("  {} {}", "URL:".bold(), cli.url);
                println!("  {} {}", "Service:".bold(), health.service);
                println!("  {} {}", "Status:".bold(), health.status.to_uppercase().green());
                println!("  {} {}", "Checked at:".bold(), health.timestamp);
            }
            Err(e) => {
                println!("  {} {}", "Status:".bold(), "OFFLINE".red());
                println!("  {} {}", "Error:".bold(), e);
                std::process::exit(1);
            }
        },

        Commands::Stats { user: None } => {
            let stats: AggregateStats = get_json(&cli.url, "/api/stats").await?;
            println!("{}", "Download Statistics".cyan().bold());
            println!();
            println!("{}", Table::new(aggregate_rows(&stats)));
        }

        Commands::Stats { user: Some(user) } => {
            let stats: UserStats =
                get_json(&cli.url, &format!("/api/stats/users/{}", user)).await?;
            println!("{}", format!("Statistics for user {}", user).cyan().bold());
            println!();
            println!("{}", Table::new(user_rows(&stats)));
        }

        Commands::Queue => {
            let queue: QueueResponse = get_json(&cli.url, "/api/queue").await?;
            let state = match queue.worker_state {
                WorkerState::Idle => queue.worker_state.as_str().green(),
                WorkerState::Stopped => queue.worker_state.as_str().red(),
                _ => queue.worker_state.as_str().yellow(),
            };
            println!("{}", "Queue".cyan().bold());
            println!();
            println!("  {} {}", "Waiting jobs:".bold(), queue.depth);
            println!("  {} {}", "Worker:".bold(), state);
        }
    }

    Ok(())
}
