//! Leadboard: channel attribution and KPI reporting for lead-generation
//! dashboards.
//!
//! Loads the leads and investment exports, applies the selection given on
//! the command line and prints the Global / Google Ads / Meta Ads / SEO views
//! as JSON on stdout.

use anyhow::Context;
use clap::Parser;
use leadboard_cache::{DatasetCache, DatasetSource, TableLoader};
use leadboard_core::config::AppConfig;
use leadboard_core::types::Channel;
use leadboard_reporting::{ChannelClassifier, FilterSelection, LeadDashboard, PeriodRange};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "leadboard")]
#[command(about = "Channel attribution and KPI reporting for lead-generation dashboards")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./leadboard.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leads export (overrides config)
    #[arg(long, env = "LEADBOARD__DATA__LEADS_PATH")]
    leads: Option<PathBuf>,

    /// Investment export (overrides config)
    #[arg(long, env = "LEADBOARD__DATA__INVESTMENT_PATH")]
    investment: Option<PathBuf>,

    /// Period selection: `all`, `YYYY-MM` or `YYYY-MM..YYYY-MM`
    #[arg(long, default_value = "all", conflicts_with_all = ["from", "to"])]
    period: PeriodRange,

    /// First month of an inclusive range
    #[arg(long, requires = "to")]
    from: Option<String>,

    /// Last month of an inclusive range
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Center of origin to include (repeatable; all centers when omitted)
    #[arg(long = "center")]
    centers: Vec<String>,

    /// Channel to include (repeatable; all channels when omitted)
    #[arg(long = "channel")]
    channels: Vec<Channel>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadboard=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            return Err(e).context("Failed to load configuration file");
        }
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }
    };

    let source = DatasetSource::new(
        cli.leads
            .unwrap_or_else(|| PathBuf::from(&config.data.leads_path)),
        cli.investment
            .unwrap_or_else(|| PathBuf::from(&config.data.investment_path)),
    );
    info!(
        leads = %source.leads_path.display(),
        investment = %source.investment_path.display(),
        "Configuration loaded"
    );

    let cache = DatasetCache::new(TableLoader::new(config.statuses.clone()));
    let dataset = cache.get_or_load(&source).with_context(|| {
        format!(
            "Failed to load dataset from {} and {}",
            source.leads_path.display(),
            source.investment_path.display()
        )
    })?;

    let classifier = ChannelClassifier::new(&config.attribution);
    let dashboard = LeadDashboard::new(&dataset, &classifier);

    let periods = match (cli.from, cli.to) {
        (Some(from), Some(to)) => PeriodRange::between(from.parse()?, to.parse()?)?,
        _ => cli.period,
    };
    let centers = if cli.centers.is_empty() {
        dashboard.available_centers()
    } else {
        cli.centers
    };
    let channels = if cli.channels.is_empty() {
        Channel::ALL.to_vec()
    } else {
        cli.channels
    };
    let selection = FilterSelection::new(periods, centers, channels);

    let views = dashboard.channel_views(&selection);
    info!(periods = %selection.periods, views = views.len(), "Report ready");

    let output = if cli.pretty {
        serde_json::to_string_pretty(&views)?
    } else {
        serde_json::to_string(&views)?
    };
    println!("{output}");

    Ok(())
}
