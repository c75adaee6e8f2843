use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use pulse_bridge::Bridge;
use pulse_pipeline::insight::format_currency;
use pulse_pipeline::{
    DashboardConfig, DashboardReport, DashboardSession, DashboardView, DateOrder, FilterSelection, RecordStore,
    Section,
};

#[derive(Parser, Debug)]
#[command(name = "pulse-server")]
#[command(about = "Sales dashboard over an orders CSV")]
#[command(version)]
struct Args {
    /// Orders CSV (falls back to `data_path` in the config or PULSE_DATA)
    data: Option<PathBuf>,

    /// Regions to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    region: Vec<String>,

    /// Categories to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    category: Vec<String>,

    /// Segments to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    segment: Vec<String>,

    /// Order years to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    year: Vec<i32>,

    /// Clicked map state, e.g. "Texas"
    #[arg(long)]
    state: Option<String>,

    /// Number of top sub-categories to list
    #[arg(long)]
    top: Option<usize>,

    /// Months to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Read slash dates as day/month/year
    #[arg(long)]
    day_first: bool,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the dashboard as JSON
    #[arg(long, conflicts_with = "stdio")]
    json: bool,

    /// Serve bridge requests, one JSON object per line on stdin
    #[arg(long)]
    stdio: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::new()
            .with_regions(self.region.iter().cloned())
            .with_categories(self.category.iter().cloned())
            .with_segments(self.segment.iter().cloned())
            .with_years(self.year.iter().copied());
        if let Some(state) = &self.state {
            selection = selection.with_clicked_state(state.clone());
        }
        selection
    }
}

/// File, then environment, then flags.
fn resolve_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    config.apply_env_overrides().context("applying PULSE_* overrides")?;

    if let Some(data) = &args.data {
        config.data_path = Some(data.clone());
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    if let Some(horizon) = args.horizon {
        config.forecast_horizon = horizon;
    }
    if args.day_first {
        config.date_order = DateOrder::DayFirst;
    }
    config.validate().context("invalid command-line options")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DashboardJson<'a> {
    generated_at: String,
    data_path: &'a Path,
    records_loaded: usize,
    pipeline_ms: u128,
    dashboard: &'a DashboardView,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn print_human(view: &DashboardView, total_records: usize, load_ms: u128, pipeline_ms: u128) {
    println!();
    println!("  \u{2554}{}\u{2557}", "\u{2550}".repeat(62));
    println!("  \u{2551}{:^62}\u{2551}", "SALES PULSE  \u{00b7}  Dashboard");
    println!("  \u{255a}{}\u{255d}", "\u{2550}".repeat(62));
    println!();

    match view {
        DashboardView::NoData { selection, source_rows } => {
            println!("  Filters: {}", selection);
            println!();
            println!("  No data for the current selection ({} records available).", source_rows);
            println!("  Clear a filter to see results.");
        }
        DashboardView::Ready(report) => print_report(report),
    }

    println!();
    println!(
        "  {} records loaded in {}ms \u{00b7} dashboard computed in {}ms",
        total_records, load_ms, pipeline_ms
    );
    println!();
}

fn print_report(report: &DashboardReport) {
    let k = &report.kpis;
    println!("  Filters: {}  \u{00b7}  {} of {} rows", report.selection, report.rows, report.source_rows);
    println!();
    println!(
        "  Total sales {}  \u{00b7}  {} orders  \u{00b7}  avg order {}  \u{00b7}  profit {}",
        format_currency(k.total_sales),
        k.total_orders,
        format_currency(k.average_order_value),
        format_currency(k.total_profit),
    );
    println!();

    println!("  Top sub-categories");
    println!("  {:\u{2500}<64}", "");
    for (i, t) in report.top_sub_categories.iter().enumerate() {
        let share = t.share_pct.map(|s| format!("{s:5.1}%")).unwrap_or_else(|| "   N/A".into());
        println!("  {:>2}. {:24} {:>14}  {}", i + 1, t.key.to_string(), format_currency(t.value), share);
    }
    println!();

    println!("  Monthly sales");
    println!("  {:\u{2500}<64}", "");
    let points = &report.monthly_sales.points;
    let start = points.len().saturating_sub(6);
    for p in &points[start..] {
        println!("  {:>10}  {:>14}", p.period.to_string(), format_currency(p.value));
    }
    println!();

    println!("  Forecast");
    println!("  {:\u{2500}<64}", "");
    match &report.forecast {
        Section::Ready(fc) => {
            for p in &fc.points {
                println!(
                    "  {:>10}  {:>14}  [{} .. {}]",
                    p.period.to_string(),
                    format_currency(p.projection),
                    format_currency(p.lower),
                    format_currency(p.upper),
                );
            }
        }
        Section::InsufficientData { required, available } => {
            println!("  Not enough history: {} months needed, {} available.", required, available);
        }
        Section::NoData => println!("  N/A"),
    }
    println!();

    if !report.state_map.unmapped.is_empty() {
        println!("  Not on map: {}", report.state_map.unmapped.join(", "));
        println!();
    }

    println!("  Insights");
    println!("  {:\u{2500}<64}", "");
    for line in &report.insights {
        println!("  \u{2022} {}", line);
    }
}

// ---------------------------------------------------------------------------
// Stdio bridge
// ---------------------------------------------------------------------------

fn serve_stdio(mut bridge: Bridge) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = bridge.handle_line(&line)?;
        writeln!(out, "{}", response)?;
        out.flush()?;
    }
    info!(requests = bridge.audit_log.len(), "stdin closed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = resolve_config(&args)?;
    let Some(data_path) = config.data_path.clone() else {
        bail!("no orders CSV given: pass a path, set PULSE_DATA, or set data_path in the config");
    };

    let load_start = Instant::now();
    let store = RecordStore::load(&data_path, config.date_order)
        .with_context(|| format!("loading {}", data_path.display()))?;
    let load_ms = load_start.elapsed().as_millis();
    let total_records = store.len();
    info!(records = total_records, ms = load_ms as u64, "loaded orders");

    let mut session = DashboardSession::new(Arc::new(store), &config);

    if args.stdio {
        return serve_stdio(Bridge::new(session));
    }

    let pipeline_start = Instant::now();
    let view = session.select(args.selection());
    let pipeline_ms = pipeline_start.elapsed().as_millis();

    if args.json {
        let out = DashboardJson {
            generated_at: Utc::now().to_rfc3339(),
            data_path: &data_path,
            records_loaded: total_records,
            pipeline_ms,
            dashboard: &view,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_human(&view, total_records, load_ms, pipeline_ms);
    }
    Ok(())
}
