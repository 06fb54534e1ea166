// HTML dashboard

use chrono::{DateTime, Utc};
use clipqueue_core::domain::WorkerState;
use clipqueue_core::port::AggregateStats;
use clipqueue_core::format::group_thousands;

const STYLE: &str = r#"
    :root {
        --bg-primary: #0f0f1a;
        --bg-secondary: #1a1a2e;
        --bg-card: rgba(255, 255, 255, 0.05);
        --text-primary: #ffffff;
        --text-secondary: #a0a0b0;
        --accent: #00d4ff;
        --accent-secondary: #7b2cbf;
        --success: #00ff88;
    }
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: system-ui, sans-serif;
        background: linear-gradient(135deg, var(--bg-primary) 0%, var(--bg-secondary) 100%);
        min-height: 100vh;
        color: var(--text-primary);
        padding: 2rem;
    }
    .container { max-width: 1200px; margin: 0 auto; }
    header { text-align: center; margin-bottom: 3rem; }
    h1 { font-size: 2.5rem; color: var(--accent); margin-bottom: 0.5rem; }
    .subtitle, .stat-label, footer { color: var(--text-secondary); }
    .stats-grid {
        display: grid;
        grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
        gap: 1.5rem;
        margin-bottom: 3rem;
    }
    .stat-card {
        background: var(--bg-card);
        border: 1px solid rgba(255, 255, 255, 0.1);
        border-radius: 16px;
        padding: 2rem;
        text-align: center;
    }
    .stat-icon { font-size: 2.5rem; margin-bottom: 1rem; }
    .stat-value { font-size: 2.5rem; font-weight: 700; margin-bottom: 0.5rem; }
    .stat-value.users { color: var(--accent); }
    .stat-value.downloads { color: var(--success); }
    .stat-value.today, .stat-value.queue { color: var(--accent-secondary); }
    .stat-label { text-transform: uppercase; letter-spacing: 1px; }
    .cta-section {
        text-align: center;
        padding: 3rem;
        background: var(--bg-card);
        border-radius: 16px;
        border: 1px solid rgba(255, 255, 255, 0.1);
    }
    .cta-section p { color: var(--text-secondary); margin: 1rem 0 2rem; }
    .telegram-btn {
        display: inline-block;
        background: linear-gradient(90deg, #0088cc, #00aaff);
        color: white;
        text-decoration: none;
        padding: 1rem 2rem;
        border-radius: 50px;
        font-weight: 600;
    }
    footer { text-align: center; margin-top: 3rem; font-size: 0.9rem; }
    .live-indicator { color: var(--success); font-size: 0.9rem; margin-top: 1rem; }
"#;

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn stat_card(icon: &str, class: &str, value: &str, label: &str) -> String {
    format!(
        r#"<div class="stat-card">
                <div class="stat-icon">{icon}</div>
                <div class="stat-value {class}">{value}</div>
                <div class="stat-label">{label}</div>
            </div>"#
    )
}

/// Render the dashboard page; it reloads itself every 30 seconds
pub(crate) fn render_dashboard(
    stats: &AggregateStats,
    queue_depth: usize,
    worker_state: WorkerState,
    bot_link: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let cards = [
        stat_card("👥", "users", &group_thousands(stats.total_users), "Total Users"),
        stat_card(
            "📥",
            "downloads",
            &group_thousands(stats.total_downloads),
            "Total Downloads",
        ),
        stat_card(
            "✅",
            "downloads",
            &group_thousands(stats.successful_downloads),
            "Successful",
        ),
        stat_card(
            "📅",
            "today",
            &group_thousands(stats.today_downloads),
            "Today's Downloads",
        ),
        stat_card("⏳", "queue", &queue_depth.to_string(), "In Queue"),
    ]
    .join("\n            ");

    let cta = match bot_link {
        Some(link) => format!(
            r#"<div class="cta-section">
            <h2>Start Downloading Now!</h2>
            <p>Open the Telegram bot and paste any TikTok video link to get started.</p>
            <a href="{}" class="telegram-btn">Open in Telegram</a>
        </div>"#,
            escape_html(link)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>TikTok Downloader Bot - Dashboard</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <header>
            <h1>🎬 TikTok Downloader Bot</h1>
            <p class="subtitle">Download TikTok videos without watermark via Telegram</p>
            <div class="live-indicator">● Service Online · worker {worker}</div>
        </header>
        <div class="stats-grid">
            {cards}
        </div>
        {cta}
        <footer>
            <p>Last updated: {updated}</p>
        </footer>
    </div>
    <script>
        setTimeout(() => location.reload(), 30000);
    </script>
</body>
</html>"#,
        worker = worker_state.as_str(),
        updated = now.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
