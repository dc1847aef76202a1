//! Core type definitions for Synstation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CurveError;

/// Basis-point denominator (100% = 10_000 bps)
pub const BPS_DENOM: u32 = 10_000;

/// Fee rate in basis points, validated to lie in `[0, 10_000]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeeBps(u32);

impl FeeBps {
    pub const ZERO: FeeBps = FeeBps(0);

    pub fn new(bps: u32) -> Result<Self, CurveError> {
        if bps > BPS_DENOM {
            return Err(CurveError::InvalidConfiguration {
                reason: format!("fee_bps must be within [0, {}], got {}", BPS_DENOM, bps),
            });
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Fee as a fraction, e.g. 30 bps -> 0.003
    pub fn rate(&self) -> f64 {
        self.0 as f64 / BPS_DENOM as f64
    }
}

impl TryFrom<u32> for FeeBps {
    type Error = CurveError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeBps> for u32 {
    fn from(value: FeeBps) -> Self {
        value.0
    }
}

impl fmt::Display for FeeBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// Direction of a trade, from the taker's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Taker pays base asset, receives outcome tokens
    Buy,
    /// Taker pays outcome tokens, receives base asset
    Sell,
}

impl TradeSide {
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who initiated a trade, used to attribute collected fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    /// Uninformed flow (noise traders, routed user trades)
    Noise,
    /// Trades that move a pool toward an external price
    Arbitrage,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Noise => "noise",
            Self::Arbitrage => "arbitrage",
        }
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constants
pub mod constants {
    /// Default numeric tolerance for curve invariants and the split search
    pub const DEFAULT_PRECISION: f64 = 1e-6;

    /// Default iteration cap for the split search
    pub const DEFAULT_MAX_ITERATIONS: usize = 500;

    /// Floor for a pool's base-asset reserve when targeting a probability
    pub const MIN_BASE_RESERVE: f64 = 1.0;
}
