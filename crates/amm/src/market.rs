//! Binary Market
//!
//! A Yes/No pair of bonding-curve pools opened at 50/50 from a single bid.
//! Both legs are always driven with complementary external prices.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use synstation_core::{
    ensure_amount, ensure_probability, FeeBps, FeePolicy, NoiseUnit, PoolConfig, Result,
    TradeKind, TradeSide,
};

use crate::constants::NOISE_LEG_PROBABILITY;
use crate::pool::BondingCurvePool;
use crate::state::{ArbitrageOutcome, FeeLedger};

/// Opening probability of each leg
const OPENING_PROBABILITY: f64 = 0.5;

/// One side of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Yes,
    No,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// A noise trade applied to one leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseTrade {
    pub leg: Leg,
    pub side: TradeSide,
    /// Requested size, in the market's noise unit
    pub size: f64,
    /// Amount on the other side of the trade (outcome tokens for a base-sized
    /// trade, base asset for an outcome-sized one)
    pub filled: f64,
}

/// Both legs' arbitrage results for one external price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketArbitrage {
    pub yes: ArbitrageOutcome,
    pub no: ArbitrageOutcome,
}

#[derive(Debug, Clone)]
pub struct BinaryMarket {
    yes_pool: BondingCurvePool,
    no_pool: BondingCurvePool,
    noise_unit: NoiseUnit,
}

impl BinaryMarket {
    /// Open a market with `bid` split evenly across both legs.
    pub fn new(bid: f64, fee_bps: u32) -> Result<Self> {
        Self::with_policy(bid, FeeBps::new(fee_bps)?, FeePolicy::default())
    }

    pub fn with_policy(bid: f64, fee: FeeBps, policy: FeePolicy) -> Result<Self> {
        let config =
            PoolConfig::new(bid / 2.0, OPENING_PROBABILITY, fee).with_fee_policy(policy);
        Ok(Self {
            yes_pool: BondingCurvePool::from_config(&config)?,
            no_pool: BondingCurvePool::from_config(&config)?,
            noise_unit: NoiseUnit::default(),
        })
    }

    pub fn with_noise_unit(mut self, noise_unit: NoiseUnit) -> Self {
        self.noise_unit = noise_unit;
        self
    }

    pub fn noise_unit(&self) -> NoiseUnit {
        self.noise_unit
    }

    pub fn yes_pool(&self) -> &BondingCurvePool {
        &self.yes_pool
    }

    pub fn no_pool(&self) -> &BondingCurvePool {
        &self.no_pool
    }

    pub fn pool(&self, leg: Leg) -> &BondingCurvePool {
        match leg {
            Leg::Yes => &self.yes_pool,
            Leg::No => &self.no_pool,
        }
    }

    fn pool_mut(&mut self, leg: Leg) -> &mut BondingCurvePool {
        match leg {
            Leg::Yes => &mut self.yes_pool,
            Leg::No => &mut self.no_pool,
        }
    }

    /// Implied probabilities of (yes, no)
    pub fn probabilities(&self) -> (f64, f64) {
        (
            self.yes_pool.implied_probability(),
            self.no_pool.implied_probability(),
        )
    }

    /// Arbitrage the yes leg to `p_ext` and the no leg to `1 - p_ext`.
    pub fn arbitrage(&mut self, p_ext: f64) -> Result<MarketArbitrage> {
        ensure_probability("p_ext", p_ext)?;
        let yes = self.yes_pool.arbitrage(p_ext)?;
        let no = self.no_pool.arbitrage(1.0 - p_ext)?;
        Ok(MarketArbitrage { yes, no })
    }

    /// Apply a noise trade of `size` to a chosen leg and direction.
    pub fn apply_trade(&mut self, leg: Leg, side: TradeSide, size: f64) -> Result<NoiseTrade> {
        ensure_amount("size", size)?;
        let unit = self.noise_unit;
        let pool = self.pool_mut(leg);
        let filled = match unit {
            NoiseUnit::Base => pool.execute_base(size, side, TradeKind::Noise)?,
            NoiseUnit::Outcome => pool.execute(size, side, TradeKind::Noise)?,
        };
        Ok(NoiseTrade {
            leg,
            side,
            size,
            filled,
        })
    }

    /// Pick yes-buy, yes-sell, no-buy or no-sell uniformly and trade `size`.
    pub fn noise_trade<R: Rng + ?Sized>(&mut self, size: f64, rng: &mut R) -> Result<NoiseTrade> {
        let draw: f64 = rng.gen();
        let bucket = ((draw / NOISE_LEG_PROBABILITY) as usize).min(3);
        let (leg, side) = match bucket {
            0 => (Leg::Yes, TradeSide::Buy),
            1 => (Leg::Yes, TradeSide::Sell),
            2 => (Leg::No, TradeSide::Buy),
            _ => (Leg::No, TradeSide::Sell),
        };
        self.apply_trade(leg, side, size)
    }

    /// Value of both pools with the yes leg priced at `p_ext`
    pub fn total_value(&self, p_ext: f64) -> f64 {
        self.yes_pool.value(p_ext) + self.no_pool.value(1.0 - p_ext)
    }

    /// Fees of both legs combined, per trade kind
    pub fn fees_collected(&self) -> FeeLedger {
        self.yes_pool.fees_collected() + self.no_pool.fees_collected()
    }

    /// Total fee revenue in base asset, pricing outcome-token fees at `p_ext`
    pub fn fee_revenue(&self, p_ext: f64) -> f64 {
        self.yes_pool.fees_collected().total().value(p_ext)
            + self.no_pool.fees_collected().total().value(1.0 - p_ext)
    }
}
