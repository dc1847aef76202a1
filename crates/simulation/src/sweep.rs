//! Fee-rate sweep: repeated seeded runs of the binary-market simulation at
//! each configured fee rate.

use serde::{Deserialize, Serialize};
use std::fmt;

use synstation_core::{FeeBps, Result, SimulationConfig};

use crate::context::{SimulationContext, SimulationReport};
use crate::ticks::{GbmPoissonTicks, TickSource};

/// Mean and population standard deviation of run results at one fee rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRateSummary {
    pub fee_bps: u32,
    pub runs: usize,
    pub pnl_mean: f64,
    pub pnl_std: f64,
    pub fees_mean: f64,
    pub fees_std: f64,
}

impl fmt::Display for FeeRateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} bps | PnL {:>12.4} ± {:<10.4} | fees {:>12.4} ± {:.4}",
            self.fee_bps, self.pnl_mean, self.pnl_std, self.fees_mean, self.fees_std
        )
    }
}

/// Run `config.runs` simulations per fee rate and summarise them.
pub fn sweep_fee_rates(config: &SimulationConfig) -> Result<Vec<FeeRateSummary>> {
    config.validate()?;
    config
        .fee_rates_bps
        .iter()
        .map(|&fee| {
            let reports = (0..config.runs)
                .map(|run| simulate_once(config, fee, run))
                .collect::<Result<Vec<_>>>()?;
            let summary = summarize(fee, &reports);
            tracing::info!(
                fee_bps = summary.fee_bps,
                pnl_mean = summary.pnl_mean,
                fees_mean = summary.fees_mean,
                "Fee rate simulated"
            );
            Ok(summary)
        })
        .collect()
}

/// One run at `fee`, seeded from the config seed, fee rate and run index.
pub fn simulate_once(
    config: &SimulationConfig,
    fee: FeeBps,
    run: usize,
) -> Result<SimulationReport> {
    let seed = run_seed(config.seed, fee, run);
    let ticks = GbmPoissonTicks::from_config(config, seed)?;
    let mut ctx = SimulationContext::from_config(config, fee, !seed)?;
    tracing::debug!(fee_bps = fee.bps(), run, seed, ticks = ticks.len(), "Starting run");
    ctx.run(&ticks)
}

fn run_seed(base: u64, fee: FeeBps, run: usize) -> u64 {
    base ^ (u64::from(fee.bps()) << 32) ^ run as u64
}

fn summarize(fee: FeeBps, reports: &[SimulationReport]) -> FeeRateSummary {
    let pnl: Vec<f64> = reports.iter().map(|r| r.pnl).collect();
    let fees: Vec<f64> = reports.iter().map(|r| r.fees).collect();
    let (pnl_mean, pnl_std) = mean_std(&pnl);
    let (fees_mean, fees_std) = mean_std(&fees);
    FeeRateSummary {
        fee_bps: fee.bps(),
        runs: reports.len(),
        pnl_mean,
        pnl_std,
        fees_mean,
        fees_std,
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
