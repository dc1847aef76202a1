//! AMM State Types
//!
//! Data structures for pool snapshots, fee ledgers, and split quotes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

use synstation_core::{TradeKind, TradeSide};

/// Fees collected by a pool, in the asset they were charged in
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeTotals {
    /// Fees charged in outcome tokens (pre-curve sells)
    pub in_x: f64,
    /// Fees charged in base asset
    pub in_y: f64,
}

impl FeeTotals {
    /// Value both fee buckets in base asset at `price`
    pub fn value(&self, price: f64) -> f64 {
        self.in_y + self.in_x * price
    }
}

impl Add for FeeTotals {
    type Output = FeeTotals;

    fn add(self, rhs: FeeTotals) -> FeeTotals {
        FeeTotals {
            in_x: self.in_x + rhs.in_x,
            in_y: self.in_y + rhs.in_y,
        }
    }
}

impl AddAssign for FeeTotals {
    fn add_assign(&mut self, rhs: FeeTotals) {
        self.in_x += rhs.in_x;
        self.in_y += rhs.in_y;
    }
}

/// Fee totals split by who paid them
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeLedger {
    pub noise: FeeTotals,
    pub arbitrage: FeeTotals,
}

impl FeeLedger {
    pub fn total(&self) -> FeeTotals {
        self.noise + self.arbitrage
    }

    pub fn by_kind(&self, kind: TradeKind) -> FeeTotals {
        match kind {
            TradeKind::Noise => self.noise,
            TradeKind::Arbitrage => self.arbitrage,
        }
    }

    pub(crate) fn record(&mut self, kind: TradeKind, fee: FeeTotals) {
        match kind {
            TradeKind::Noise => self.noise += fee,
            TradeKind::Arbitrage => self.arbitrage += fee,
        }
    }
}

impl Add for FeeLedger {
    type Output = FeeLedger;

    fn add(self, rhs: FeeLedger) -> FeeLedger {
        FeeLedger {
            noise: self.noise + rhs.noise,
            arbitrage: self.arbitrage + rhs.arbitrage,
        }
    }
}

/// Fully computed single-pool trade, ready to commit
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TradePlan {
    pub side: TradeSide,
    /// Outcome tokens exchanged by the taker (after any clamp)
    pub delta_x: f64,
    /// Base asset paid (buy) or received (sell) by the taker
    pub delta_y: f64,
    pub new_reserve_x: f64,
    pub new_reserve_y: f64,
    pub fee: FeeTotals,
}

/// Read-only view of a pool for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub reserve_x: f64,
    pub reserve_y: f64,
    pub liquidity: f64,
    pub fee_bps: u32,
    pub probability: f64,
    pub fees: FeeLedger,
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool | X: {:.4} | Y: {:.4} | P: {:.6} | fee: {} bps",
            self.reserve_x, self.reserve_y, self.probability, self.fee_bps
        )
    }
}

/// Result of moving a pool toward an external price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOutcome {
    /// Direction the arbitrageur traded, `None` when inside the no-arb band
    pub side: Option<TradeSide>,
    /// Outcome tokens moved
    pub delta_x: f64,
    /// Base asset moved
    pub delta_y: f64,
    /// Fee charged in base asset
    pub fee: f64,
    pub probability_before: f64,
    pub probability_after: f64,
}

impl ArbitrageOutcome {
    pub fn is_noop(&self) -> bool {
        self.side.is_none()
    }
}

/// Optimal split of a basket trade, computed without touching pool state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitQuote {
    pub outcome: usize,
    pub side: TradeSide,
    /// Total outcome tokens requested
    pub amount: f64,
    /// Amount traded directly against the outcome's own pool
    pub direct_amount: f64,
    /// Amount routed through mint/burn across the other pools
    pub synthetic_amount: f64,
    /// Base asset paid (buy) or received (sell) at the optimal split
    pub delta_y: f64,
    /// Base asset for routing everything through the direct pool, `None`
    /// when that pool cannot fill the whole trade
    pub direct_only: Option<f64>,
    /// Base asset for routing everything through mint/burn, `None` when the
    /// other pools cannot fill the whole trade
    pub synthetic_only: Option<f64>,
}

impl SplitQuote {
    /// Improvement over the better feasible single-path route, in base asset.
    ///
    /// `None` when neither single path can fill the trade.
    pub fn improvement(&self) -> Option<f64> {
        let feasible = self.direct_only.into_iter().chain(self.synthetic_only);
        match self.side {
            TradeSide::Buy => feasible.reduce(f64::min).map(|best| best - self.delta_y),
            TradeSide::Sell => feasible.reduce(f64::max).map(|best| self.delta_y - best),
        }
    }
}

/// A committed basket trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedSplit {
    pub outcome: usize,
    pub side: TradeSide,
    pub amount: f64,
    pub direct_amount: f64,
    pub delta_y: f64,
    /// Implied probabilities after the trade, one per pool
    pub probabilities: Vec<f64>,
}
