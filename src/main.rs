use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Local};
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use staydash::api::{ApiClient, Role};
use staydash::app::App;
use staydash::calendar::selector::WeekSelector;
use staydash::calendar::{compute_weeks, format_date, month_name, select_week, ReportRange};
use staydash::config::{config_dir, data_dir, AppConfig};
use staydash::stats::worker::StatsWorker;
use staydash::stats::{cancellation_rate, money, percent, thousands};
use staydash::theme::Theme;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        // ── sd weeks [YEAR] [MONTH] ──────────────────────────────────────────
        Some("weeks")     => cmd_weeks(&args[2..]),
        // ── sd stats [YEAR] [MONTH] [WEEK] ───────────────────────────────────
        Some("stats")     => cmd_stats(&args[2..]).await,
        // ── sd homestays ─────────────────────────────────────────────────────
        Some("homestays") => cmd_homestays().await,
        // ── sd policy [HOMESTAY] [DAYS] ──────────────────────────────────────
        Some("policy")    => cmd_policy(&args[2..]).await,
        Some("help") | Some("-h") | Some("--help") => { print_usage(); Ok(()) }
        Some(other)       => {
            print_usage();
            Err(anyhow!("unknown command: {other}"))
        }
        // ── sd (TUI) ─────────────────────────────────────────────────────────
        None => run_tui().await,
    }
}

fn print_usage() {
    println!("usage: sd                           open the dashboard");
    println!("       sd weeks [YEAR] [MONTH]      print the weeks of a month");
    println!("       sd stats [YEAR] [MONTH] [WEEK]  print statistics for one week");
    println!("       sd homestays                 list homestays");
    println!("       sd policy [HOMESTAY] [DAYS]  show a cancellation policy");
}

/// Logging to stderr so it doesn't interfere with command output.
fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn positional<T: FromStr>(args: &[String], idx: usize, name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    args.get(idx)
        .map(|s| s.parse::<T>().with_context(|| format!("invalid {name}: {s}")))
        .transpose()
}

/// Year and month from the arguments, falling back to today.
fn year_month(args: &[String]) -> Result<(i32, u32)> {
    let today = Local::now().date_naive();
    let year  = positional(args, 0, "year")?.unwrap_or(today.year());
    let month = positional(args, 1, "month")?.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        return Err(anyhow!("month must be between 1 and 12, got {month}"));
    }
    Ok((year, month))
}

fn api_client(cfg: &AppConfig) -> Result<ApiClient> {
    let api = cfg.api.as_ref().ok_or_else(|| anyhow!(
        "No [api] section found in {}\nAdd one with base_url = \"https://…\".",
        config_dir().join("config.toml").display()
    ))?;
    Ok(ApiClient::new(api)?)
}

// ─── Weeks command ────────────────────────────────────────────────────────────

fn cmd_weeks(args: &[String]) -> Result<()> {
    init_stderr_logging();
    let (year, month) = year_month(args)?;

    println!("{} {year}", month_name(month));
    for w in compute_weeks(year, month) {
        println!(
            "  Week {}  {} - {}  ({} day{})",
            w.week_number,
            format_date(w.start),
            format_date(w.end),
            w.len_days(),
            if w.len_days() == 1 { "" } else { "s" },
        );
    }
    Ok(())
}

// ─── Stats command ────────────────────────────────────────────────────────────

async fn cmd_stats(args: &[String]) -> Result<()> {
    init_stderr_logging();
    let cfg           = AppConfig::load()?;
    let client        = api_client(&cfg)?;
    let (year, month) = year_month(args)?;
    let week: u32     = positional(args, 2, "week")?.unwrap_or(1);

    let weeks = compute_weeks(year, month);
    let sel   = select_week(&weeks, week).ok_or_else(|| anyhow!(
        "{} {year} has only {} weeks", month_name(month), weeks.len()
    ))?;
    let range = ReportRange::week(&sel).ok_or_else(|| anyhow!("unreadable week range"))?;

    let homestay = cfg.api.as_ref().and_then(|a| a.homestay_id.as_deref());
    let stats    = client.dashboard_stats(&range, homestay).await?;

    let scope = match client.role() {
        Role::Owner => "owner",
        Role::Admin => "admin",
    };
    println!("{} ({scope} dashboard)", range.label());
    println!("  Bookings   {}", thousands(stats.total_bookings));
    println!("  Cancelled  {} ({})", thousands(stats.cancelled_bookings), percent(cancellation_rate(&stats)));
    println!("  Revenue    {}", money(stats.total_revenue));
    println!("  Occupancy  {}", percent(stats.occupancy_rate));
    if let Some(r) = stats.average_rating {
        println!("  Rating     {r:.1}");
    }
    Ok(())
}

// ─── Homestays command ────────────────────────────────────────────────────────

async fn cmd_homestays() -> Result<()> {
    init_stderr_logging();
    let cfg    = AppConfig::load()?;
    let client = api_client(&cfg)?;

    let homestays = client.homestays().await?;
    if homestays.is_empty() {
        println!("No homestays.");
    }
    for h in homestays {
        println!(
            "{:<12} {:<28} {:>3} guests  {:>12}  {:?}",
            h.id.as_deref().unwrap_or("-"),
            h.name,
            h.max_guests,
            money(h.base_price),
            h.status,
        );
    }
    Ok(())
}

// ─── Policy command ───────────────────────────────────────────────────────────

async fn cmd_policy(args: &[String]) -> Result<()> {
    init_stderr_logging();
    let cfg    = AppConfig::load()?;
    let client = api_client(&cfg)?;

    let homestay = match args.first() {
        Some(id) => id.clone(),
        None     => cfg.api.as_ref().and_then(|a| a.homestay_id.clone())
            .ok_or_else(|| anyhow!("no homestay given and no homestay_id in config.toml"))?,
    };
    let days: Option<u32> = positional(args, 1, "days")?;

    let policy = client.cancellation_policy(&homestay).await?;
    println!("Cancellation policy for {homestay}");
    for tier in &policy.tiers {
        println!("  {:>3}+ days before check-in  {:>3}% refund", tier.days_before, tier.refund_percent);
    }
    if let Some(d) = days {
        println!("Cancelling {d} days before check-in refunds {}%", policy.refund_for(d));
    }
    Ok(())
}

// ─── TUI ─────────────────────────────────────────────────────────────────────

async fn run_tui() -> Result<()> {
    let log_dir = data_dir();
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "staydash.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!("Starting staydash");

    let cfg   = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("config.toml ignored: {e}");
        AppConfig::default()
    });
    let theme = Theme::load()?;

    let client = match cfg.api.as_ref().map(ApiClient::new).transpose() {
        Ok(c)  => c,
        Err(e) => {
            tracing::error!("API client: {e}");
            None
        }
    };
    let homestay = cfg.api.as_ref().and_then(|a| a.homestay_id.clone());
    let worker   = StatsWorker::spawn(client, homestay);

    let selector = WeekSelector::today(cfg.year_bounds());
    let mut app  = App::new(theme, selector, cfg.default_period());
    app.attach_stats_worker(worker);

    app.run().await?;
    Ok(())
}
