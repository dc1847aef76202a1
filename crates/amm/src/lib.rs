//! Bonding-Curve Outcome Markets
//!
//! Pools that price one outcome token against a shared base asset on the
//! curve `(x + L) * y = L^2`, a two-leg binary market built from them, and a
//! router that splits basket trades between direct and mint/burn paths.

pub mod calculator;
pub mod constants;
pub mod market;
pub mod pool;
pub mod router;
pub mod state;

// Re-exports
pub use calculator::{
    base_reserve, implied_probability, liquidity_parameter, outcome_reserve,
    reserves_at_probability,
};
pub use market::{BinaryMarket, Leg, MarketArbitrage, NoiseTrade};
pub use pool::BondingCurvePool;
pub use router::Router;
pub use state::{
    ArbitrageOutcome, ExecutedSplit, FeeLedger, FeeTotals, PoolSnapshot, SplitQuote,
};
