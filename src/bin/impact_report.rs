//! Impact Report Binary - runs analytics reports and prints them as JSON
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin impact_report                      # every report
//! cargo run --release --bin impact_report -- system_metrics claims_feed
//! cargo run --release --bin impact_report -- --list
//! ```
//!
//! ## Environment Variables
//!
//! - FOODFLOW_DB_PATH - SQLite database path (default: data/food_wastage.db)
//! - STORE_BUSY_TIMEOUT_MS - Busy timeout per connection (default: 5000)
//! - ACTIVE_PROVIDER_RULE - non_expired_listing | any_listing (default: non_expired_listing)
//! - ACTIVE_RECEIVER_RULE - any_claim | claimed_within_days:<N> (default: any_claim)
//! - PERCENTAGE_SUM_TOLERANCE - Distribution sum tolerance (default: 0.1)
//! - EXPIRING_SOON_DAYS - Inventory overview horizon (default: 2)
//! - REPORT_AS_OF - Reference date YYYY-MM-DD (default: today)
//! - RUST_LOG - Logging level (optional, default: info)

use foodflow::{AggregationEngine, AnalyticsConfig, AnalyticsError, ReportKind, SqliteStore};
use serde_json::json;
use std::env;
use std::sync::Arc;

fn requested_reports(args: &[String]) -> Result<Vec<ReportKind>, AnalyticsError> {
    if args.is_empty() {
        return Ok(ReportKind::all().to_vec());
    }
    args.iter()
        .map(|name| ReportKind::from_str(name).ok_or_else(|| AnalyticsError::UnknownReport(name.clone())))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--list") {
        for kind in ReportKind::all() {
            println!("{}", kind);
        }
        return Ok(());
    }

    let reports = requested_reports(&args)?;
    let config = AnalyticsConfig::from_env()?;

    log::info!("🚀 Starting Impact Report");
    log::info!("   Database: {}", config.db_path);
    log::info!("   Report date: {}", config.as_of);
    log::info!("   Active providers: {:?}", config.active_provider_rule);
    log::info!("   Active receivers: {:?}", config.active_receiver_rule);
    log::info!("   Reports: {}", reports.len());

    let store = SqliteStore::open(&config.db_path, config.busy_timeout)?;
    let engine = AggregationEngine::new(Arc::new(store), config);

    let mut handles = Vec::with_capacity(reports.len());
    for kind in reports {
        let engine = engine.clone();
        handles.push((kind, tokio::task::spawn_blocking(move || engine.run(kind))));
    }

    let mut output = Vec::with_capacity(handles.len());
    for (kind, handle) in handles {
        let result = handle.await??;
        output.push(json!({ "report": kind.as_str(), "result": result }));
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    log::info!("✅ {} reports written", output.len());

    Ok(())
}
