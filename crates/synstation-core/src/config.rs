//! Configuration types for Synstation

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_PRECISION};
use crate::errors::{CurveError, Result};
use crate::FeeBps;

/// How the buy-side fee is charged on top of the curve cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyFee {
    /// fee = dy * f / (1 - f), so the quoted amount already includes the fee
    #[default]
    GrossUp,
    /// fee = dy * f
    Net,
}

/// Where the sell-side fee is taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellFee {
    /// Deducted from the outcome tokens before they reach the curve
    #[default]
    PreCurve,
    /// Whole amount hits the curve; fee deducted from the base-asset proceeds
    PostCurve,
}

/// Upper bound on how many outcome tokens a single buy may take from a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyCap {
    /// reserve_x * (1 - precision)
    #[default]
    Precision,
    /// reserve_x * (1 - fee rate)
    FeeAdjusted,
}

/// Fee-application policy, fixed when a pool is constructed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    #[serde(default)]
    pub buy_fee: BuyFee,
    #[serde(default)]
    pub sell_fee: SellFee,
    #[serde(default)]
    pub buy_cap: BuyCap,
}

/// Construction parameters for one bonding-curve pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Initial outcome-token reserve
    pub initial_reserve: f64,
    /// Initial implied probability, strictly inside (0, 1)
    pub initial_probability: f64,
    pub fee_bps: FeeBps,
    #[serde(default)]
    pub fee_policy: FeePolicy,
    #[serde(default = "default_precision")]
    pub precision: f64,
}

fn default_precision() -> f64 {
    DEFAULT_PRECISION
}

impl PoolConfig {
    pub fn new(initial_reserve: f64, initial_probability: f64, fee_bps: FeeBps) -> Self {
        Self {
            initial_reserve,
            initial_probability,
            fee_bps,
            fee_policy: FeePolicy::default(),
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.initial_reserve.is_finite() || self.initial_reserve <= 0.0 {
            return Err(CurveError::config(format!(
                "initial_reserve must be positive, got {}",
                self.initial_reserve
            )));
        }
        let p = self.initial_probability;
        if !p.is_finite() || p <= 0.0 || p >= 1.0 {
            return Err(CurveError::config(format!(
                "initial_probability must be strictly inside (0, 1), got {}",
                p
            )));
        }
        validate_precision(self.precision)
    }
}

/// Unit in which noise-trade sizes are expressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseUnit {
    /// Size is an amount of base asset paid in or taken out
    #[default]
    Base,
    /// Size is an amount of outcome tokens bought or sold
    Outcome,
}

/// Search procedure used to pick the direct-leg amount of a basket trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitSearch {
    /// Ternary search; requires a unimodal composite cost
    #[default]
    Ternary,
    /// Evaluate `points` evenly spaced candidates and keep the best
    GridScan { points: usize },
}

/// Basket router settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_precision")]
    pub precision: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub search: SplitSearch,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            search: SplitSearch::default(),
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        validate_precision(self.precision)?;
        if self.max_iterations == 0 {
            return Err(CurveError::config("max_iterations must be at least 1"));
        }
        if let SplitSearch::GridScan { points } = self.search {
            if points < 2 {
                return Err(CurveError::config(format!(
                    "grid scan needs at least 2 points, got {}",
                    points
                )));
            }
        }
        Ok(())
    }
}

fn validate_precision(precision: f64) -> Result<()> {
    if !precision.is_finite() || precision <= 0.0 || precision >= 1.0 {
        return Err(CurveError::config(format!(
            "precision must be inside (0, 1), got {}",
            precision
        )));
    }
    Ok(())
}

/// Basket of outcome pools sharing one base asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketConfig {
    pub pools: Vec<PoolConfig>,
}

impl Default for BasketConfig {
    fn default() -> Self {
        let fee = FeeBps::new(10).unwrap_or(FeeBps::ZERO);
        Self {
            pools: (0..3)
                .map(|_| PoolConfig::new(10_000.0, 1.0 / 3.0, fee))
                .collect(),
        }
    }
}

/// Parameters for the binary-market fee simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Initial bid for proposing a new market (split across both legs)
    pub bid: f64,
    /// Fee rates to sweep
    pub fee_rates_bps: Vec<FeeBps>,
    pub fee_policy: FeePolicy,
    pub noise_unit: NoiseUnit,
    /// Expected noise trades per day
    pub daily_transactions: f64,
    pub min_trade_size: f64,
    pub max_trade_size: f64,
    /// Initial price of the underlying asset
    pub initial_price: f64,
    pub daily_volatility: f64,
    pub block_time_secs: f64,
    pub period_days: f64,
    /// Independent runs per fee rate
    pub runs: usize,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let fee_rates_bps = [1, 5, 10, 20, 30, 50, 100]
            .into_iter()
            .filter_map(|bps| FeeBps::new(bps).ok())
            .collect();
        Self {
            bid: 10_000.0,
            fee_rates_bps,
            fee_policy: FeePolicy::default(),
            noise_unit: NoiseUnit::default(),
            daily_transactions: 200.0,
            min_trade_size: 1.0,
            max_trade_size: 100.0,
            initial_price: 4000.0,
            daily_volatility: 0.01,
            block_time_secs: 2.0,
            period_days: 30.0,
            runs: 20,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    /// Number of blocks (ticks) in one run
    pub fn ticks(&self) -> u64 {
        (self.period_days * 86_400.0 / self.block_time_secs) as u64
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bid.is_finite() || self.bid <= 0.0 {
            return Err(CurveError::config(format!("bid must be positive, got {}", self.bid)));
        }
        if self.block_time_secs <= 0.0 || self.period_days <= 0.0 {
            return Err(CurveError::config("block_time_secs and period_days must be positive"));
        }
        if self.min_trade_size < 0.0 || self.max_trade_size < self.min_trade_size {
            return Err(CurveError::config(format!(
                "trade size range [{}, {}] is invalid",
                self.min_trade_size, self.max_trade_size
            )));
        }
        if self.daily_transactions < 0.0 || self.daily_volatility < 0.0 {
            return Err(CurveError::config(
                "daily_transactions and daily_volatility must be non-negative",
            ));
        }
        if self.initial_price <= 0.0 {
            return Err(CurveError::config("initial_price must be positive"));
        }
        if self.runs == 0 {
            return Err(CurveError::config("runs must be at least 1"));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub basket: BasketConfig,
}
