use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use biblestudy_sdk::{reward, Address, BibleApiClient, ChainQuery, SuiRpcClient, VerseLookup};
use biblestudy_types::calendar;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use biblestudy_watcher::{create_example_config, ClaimTracker, TrackerSettings, WatcherConfig};

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Parser, Debug)]
#[command(name = "biblestudy-watcher")]
#[command(about = "Bible study claim ledger watcher")]
struct Cli {
    /// Path to watcher configuration file
    #[arg(short, long, default_value = "watcher.toml", global = true)]
    config: String,

    /// Identity (Sui address) to watch
    #[arg(short, long, global = true)]
    address: Option<String>,

    /// Override the configured RPC URL
    #[arg(short, long, global = true)]
    rpc_url: Option<String>,

    /// Override log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show today's claim status, gas and reward
    Status,
    /// Show this week's claims
    Week,
    /// Show the claims of one month
    Month {
        /// Month 1-12, defaults to the current month
        #[arg(long)]
        month: Option<u32>,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Show claim counts per month of a year
    Year {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Poll the claim status until Ctrl+C
    Watch,
    /// Write an example configuration file
    InitConfig {
        #[arg(short, long, default_value = "watcher.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| if cli.verbose { "debug" } else { "info" }.to_string());
    init_logging(&log_level, cli.json_logs);

    if let Command::InitConfig { output } = &cli.command {
        create_example_config(output)?;
        info!("Example configuration written to {}", output);
        return Ok(());
    }

    // Load configuration
    let mut config = if Path::new(&cli.config).exists() {
        WatcherConfig::load(&cli.config)?
    } else {
        warn!("Config file not found, using defaults: {}", cli.config);
        WatcherConfig::default()
    };

    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(address) = cli.address {
        config.identity = Some(address.parse().context("invalid --address")?);
    }
    config
        .validate()
        .context("invalid configuration (run `biblestudy-watcher init-config` for a template)")?;

    let Some(identity) = config.identity else {
        bail!("no identity to watch: pass --address or set `identity` in the config");
    };

    info!("RPC URL: {}", config.rpc_url);
    info!("Package: {}", config.package_id);

    let tracker = build_tracker(&config);
    tracker.connect(identity).await?;

    let result = run_command(&tracker, identity, cli.command).await;
    tracker.shutdown().await;
    result
}

fn init_logging(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "biblestudy_watcher={0},biblestudy_sdk={0}",
            log_level
        )
        .into()
    });

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_tracker(config: &WatcherConfig) -> ClaimTracker {
    let chain: Arc<dyn ChainQuery> = Arc::new(SuiRpcClient::new(
        config.rpc_url.clone(),
        config.ledger_objects(),
        config.request_timeout(),
    ));
    let verses: Arc<dyn VerseLookup> = Arc::new(BibleApiClient::new(
        config.verse.api_url.clone(),
        config.verse.translation.clone(),
        config.request_timeout(),
    ));

    // signing happens in the wallet; this binary only reads
    ClaimTracker::new(chain, verses, None, TrackerSettings::from_config(config))
}

async fn run_command(tracker: &ClaimTracker, identity: Address, command: Command) -> Result<()> {
    match command {
        Command::Status => print_status(tracker, identity).await,
        Command::Week => print_week(tracker).await,
        Command::Month { month, year } => {
            let now = tracker.now().await;
            let (current_year, current_month) = calendar::year_month(now.epoch_day)?;
            let month = month.unwrap_or(current_month);
            let year = year.unwrap_or(current_year);

            let view = tracker.load_month(month, year).await?;
            let name = month
                .checked_sub(1)
                .and_then(|index| MONTH_NAMES.get(index as usize))
                .copied()
                .unwrap_or("?");
            println!("{} {}: {} claims", name, year, view.claims.len());
            for claim in &view.claims {
                let date = claim
                    .record
                    .claim_date()
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| format!("day {}", claim.record.claim_day));
                println!(
                    "  {}  {:<20} {:>4} tokens  {}",
                    date,
                    claim.verse_reference,
                    claim.record.whole_tokens(),
                    claim.version
                );
                if !claim.verse_text.is_empty() {
                    println!("      {}", claim.verse_text);
                }
            }
            Ok(())
        }
        Command::Year { year } => {
            let view = tracker.load_year(year).await?;
            println!("{}: {} claims", view.year, view.total());
            for (name, count) in MONTH_NAMES.iter().zip(view.counts.iter()) {
                println!("  {:<10} {:>3}", name, count);
            }
            Ok(())
        }
        Command::Watch => {
            info!(%identity, "Watching claim status. Press Ctrl+C to stop.");
            print_status(tracker, identity).await?;
            signal::ctrl_c().await?;
            info!("Received shutdown signal");
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

async fn print_status(tracker: &ClaimTracker, identity: Address) -> Result<()> {
    let state = tracker.state().await;
    let now = match state.today() {
        Some(now) => now,
        None => tracker.now().await,
    };
    let day_name = DAY_NAMES
        .get(usize::from(now.day_of_week))
        .copied()
        .unwrap_or("?");
    let date = calendar::epoch_day_to_date(now.epoch_day)?;
    let completed = state.is_today_completed(now.day_of_week);

    println!("Identity:   {}", identity);
    println!(
        "Date:       {} ({}, week {}, {:?} clock)",
        date, day_name, now.week_number, now.source
    );
    println!("Status:     {:?}", state.status());
    if completed {
        println!(
            "Today:      completed, {} tokens",
            state.todays_claim_amount(now.day_of_week)
        );
    } else {
        println!(
            "Today:      open, next claim pays {} tokens",
            reward::to_whole_tokens(reward::next_claim_amount(state.weekly()))
        );
    }
    println!("Gas:        {:?}", state.gas());
    println!("This week:  {} days", reward::current_streak(state.weekly()));
    Ok(())
}

async fn print_week(tracker: &ClaimTracker) -> Result<()> {
    let state = tracker.state().await;
    let now = match state.today() {
        Some(now) => now,
        None => tracker.now().await,
    };

    println!("Week {}", now.week_number);
    for (day_of_week, name) in (0u8..).zip(DAY_NAMES.iter()) {
        let date = now.date_for_day_of_week(day_of_week)?;
        let marker = if day_of_week == now.day_of_week { "*" } else { " " };
        match state.weekly().get(day_of_week) {
            Some(claim) => println!(
                "{} {:<9} {}  {:<20} {:>4} tokens  streak {}",
                marker,
                name,
                date,
                claim.verse_reference,
                claim.record.whole_tokens(),
                claim.record.streak_at_claim
            ),
            None => println!("{} {:<9} {}  -", marker, name, date),
        }
    }
    Ok(())
}
