//! Synstation command-line runner
//!
//! `sweep` runs the binary-market fee simulation across fee rates.
//! `route` prices (and optionally executes) a basket trade at its optimal split.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use amm::constants::DEFAULT_SCAN_POINTS;
use amm::{ExecutedSplit, PoolSnapshot, Router, SplitQuote};
use simulation::{sweep_fee_rates, FeeRateSummary};
use synstation_core::{AppConfig, SplitSearch, TradeKind, TradeSide};

/// Synstation market simulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults apply to anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate fee revenue of a binary market at each configured fee rate
    Sweep {
        /// Runs per fee rate
        #[arg(long)]
        runs: Option<usize>,
        /// Simulated days per run
        #[arg(long)]
        days: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Find the cheapest split for a basket trade
    Route {
        /// Index of the outcome being traded
        #[arg(long, default_value_t = 0)]
        outcome: usize,
        /// Outcome tokens to buy or sell
        #[arg(long)]
        amount: f64,
        #[arg(long, value_enum, default_value_t = Side::Buy)]
        side: Side,
        /// Commit the trade and report pool states afterwards
        #[arg(long)]
        execute: bool,
        /// Scan a grid instead of ternary search
        #[arg(long)]
        grid: bool,
        #[arg(long, default_value_t = DEFAULT_SCAN_POINTS)]
        grid_points: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Side {
    Buy,
    Sell,
}

impl From<Side> for TradeSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => TradeSide::Buy,
            Side::Sell => TradeSide::Sell,
        }
    }
}

#[derive(Serialize)]
struct RouteReport {
    probabilities: Vec<f64>,
    quote: SplitQuote,
    before: Vec<PoolSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    executed: Option<ExecutedSplit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<Vec<PoolSnapshot>>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("synstation=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    info!("Starting Synstation v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    match args.command {
        Command::Sweep { runs, days, seed } => {
            let mut sim = config.simulation;
            if let Some(runs) = runs {
                sim.runs = runs;
            }
            if let Some(days) = days {
                sim.period_days = days;
            }
            if let Some(seed) = seed {
                sim.seed = seed;
            }
            info!(
                fee_rates = sim.fee_rates_bps.len(),
                runs = sim.runs,
                ticks = sim.ticks(),
                "Running fee sweep"
            );
            let summaries: Vec<FeeRateSummary> = sweep_fee_rates(&sim)?;
            for summary in &summaries {
                info!("{}", summary);
            }
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Command::Route {
            outcome,
            amount,
            side,
            execute,
            grid,
            grid_points,
        } => {
            let mut router_config = config.router;
            if grid {
                router_config.search = SplitSearch::GridScan {
                    points: grid_points,
                };
            }
            let mut router = Router::from_basket(&config.basket, router_config)?;
            let side = TradeSide::from(side);

            let before: Vec<PoolSnapshot> = router.pools().iter().map(|p| p.snapshot()).collect();
            for (i, snapshot) in before.iter().enumerate() {
                info!("#{} {}", i, snapshot);
            }

            let quote = router.quote_best(outcome, amount, side)?;
            info!(
                direct = quote.direct_amount,
                synthetic = quote.synthetic_amount,
                delta_y = quote.delta_y,
                improvement = quote.improvement(),
                "Optimal split"
            );

            let (executed, after) = if execute {
                let executed = router.execute_best(outcome, amount, side, TradeKind::Noise)?;
                let after = router.pools().iter().map(|p| p.snapshot()).collect();
                (Some(executed), Some(after))
            } else {
                (None, None)
            };

            let report = RouteReport {
                probabilities: before.iter().map(|s| s.probability).collect(),
                quote,
                before,
                executed,
                after,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}
