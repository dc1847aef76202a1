//! Bonding Curve Pool
//!
//! One outcome token priced against the base asset on the curve
//! `(x + L) * y = L^2`. `L` is fixed at construction; every mutating call
//! moves both reserves together so the invariant holds after each commit.
//!
//! Pure quotes clamp out-of-range sizes. Committing calls reject them, since
//! a silent clamp would break the accounting the basket router relies on.

use synstation_core::constants::MIN_BASE_RESERVE;
use synstation_core::{
    ensure_amount, ensure_probability, CurveError, FeeBps, FeePolicy, PoolConfig,
    Result, SellFee, TradeKind, TradeSide,
};

use crate::calculator::{
    base_reserve, buy_fee, implied_probability, invariant_error, liquidity_parameter, max_buy,
    outcome_reserve, position_value, reserves_at_probability,
};
use crate::constants::CAP_TOLERANCE;
use crate::state::{ArbitrageOutcome, FeeLedger, FeeTotals, PoolSnapshot, TradePlan};

#[derive(Debug, Clone)]
pub struct BondingCurvePool {
    reserve_x: f64,
    reserve_y: f64,
    liquidity: f64,
    fee: FeeBps,
    policy: FeePolicy,
    precision: f64,
    fees: FeeLedger,
}

impl BondingCurvePool {
    /// Create a pool with the default fee policy and precision.
    pub fn new(initial_reserve: f64, initial_probability: f64, fee_bps: u32) -> Result<Self> {
        let config = PoolConfig::new(initial_reserve, initial_probability, FeeBps::new(fee_bps)?);
        Self::from_config(&config)
    }

    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        config.validate()?;
        let liquidity = liquidity_parameter(config.initial_reserve, config.initial_probability);
        Ok(Self {
            reserve_x: config.initial_reserve,
            reserve_y: base_reserve(config.initial_reserve, liquidity),
            liquidity,
            fee: config.fee_bps,
            policy: config.fee_policy,
            precision: config.precision,
            fees: FeeLedger::default(),
        })
    }

    pub fn reserve_x(&self) -> f64 {
        self.reserve_x
    }

    pub fn reserve_y(&self) -> f64 {
        self.reserve_y
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn fee(&self) -> FeeBps {
        self.fee
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.policy
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn implied_probability(&self) -> f64 {
        implied_probability(self.reserve_x, self.reserve_y, self.liquidity)
    }

    /// Pool holdings valued at an external outcome price
    pub fn value(&self, external_price: f64) -> f64 {
        position_value(self.reserve_x, self.reserve_y, external_price)
    }

    pub fn fees_collected(&self) -> FeeLedger {
        self.fees
    }

    /// Relative deviation of `(x + L) * y` from `L^2`
    pub fn invariant_error(&self) -> f64 {
        invariant_error(self.reserve_x, self.reserve_y, self.liquidity)
    }

    /// Most outcome tokens a single buy can take
    pub fn max_buy(&self) -> f64 {
        max_buy(self.reserve_x, self.fee, self.policy.buy_cap, self.precision)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            reserve_x: self.reserve_x,
            reserve_y: self.reserve_y,
            liquidity: self.liquidity,
            fee_bps: self.fee.bps(),
            probability: self.implied_probability(),
            fees: self.fees,
        }
    }

    /// Base asset paid (buy) or received (sell) for `delta_x` outcome tokens.
    ///
    /// Never mutates. Buys are clamped to `[0, max_buy]`, sells to `[0, inf)`.
    pub fn quote(&self, delta_x: f64, side: TradeSide) -> f64 {
        let delta_x = if delta_x > 0.0 { delta_x } else { 0.0 };
        let delta_x = match side {
            TradeSide::Buy => delta_x.min(self.max_buy()),
            TradeSide::Sell => delta_x,
        };
        self.simulate(delta_x, side).delta_y
    }

    /// Trade `delta_x` outcome tokens against the pool and commit the result.
    ///
    /// Returns the same amount `quote` would have returned on this state.
    pub fn execute(&mut self, delta_x: f64, side: TradeSide, kind: TradeKind) -> Result<f64> {
        match self.plan(delta_x, side) {
            Ok(plan) => Ok(self.commit(plan, kind)),
            Err(e) => {
                tracing::warn!(side = %side, kind = %kind, delta_x, "Rejected pool trade: {}", e);
                Err(e)
            }
        }
    }

    /// Trade a base-asset amount: a buy pays `delta_y` in, a sell takes
    /// `delta_y` out. The base reserve is clipped to `[1, L]`.
    ///
    /// Returns the outcome tokens received (buy) or paid (sell).
    pub fn execute_base(&mut self, delta_y: f64, side: TradeSide, kind: TradeKind) -> Result<f64> {
        ensure_amount("delta_y", delta_y)?;
        let target_y = match side {
            TradeSide::Buy => self.reserve_y + delta_y,
            TradeSide::Sell => self.reserve_y - delta_y,
        };
        let new_reserve_y = target_y.clamp(self.base_floor(), self.liquidity);
        let new_reserve_x = outcome_reserve(new_reserve_y, self.liquidity).max(0.0);
        let moved_y = (new_reserve_y - self.reserve_y).abs();

        let plan = TradePlan {
            side,
            delta_x: (self.reserve_x - new_reserve_x).abs(),
            delta_y: moved_y,
            new_reserve_x,
            new_reserve_y,
            fee: FeeTotals {
                in_x: 0.0,
                in_y: moved_y * self.fee.rate(),
            },
        };
        let delta_x = plan.delta_x;
        self.commit(plan, kind);
        Ok(delta_x)
    }

    /// Move the pool toward `external_price` when it sits outside the
    /// fee-adjusted no-arbitrage band.
    ///
    /// The post-trade price lands on the edge of the band:
    /// `external_price / (1 + f)` after a buy, `external_price * (1 + f)`
    /// after a sell. Target reserves are computed in closed form.
    pub fn arbitrage(&mut self, external_price: f64) -> Result<ArbitrageOutcome> {
        ensure_probability("external_price", external_price)?;
        let rate = self.fee.rate();
        let before = self.implied_probability();

        let (side, target) = if external_price > before * (1.0 + rate) {
            (TradeSide::Buy, external_price / (1.0 + rate))
        } else if external_price * (1.0 + rate) < before {
            (TradeSide::Sell, external_price * (1.0 + rate))
        } else {
            return Ok(ArbitrageOutcome {
                side: None,
                delta_x: 0.0,
                delta_y: 0.0,
                fee: 0.0,
                probability_before: before,
                probability_after: before,
            });
        };

        let (new_reserve_x, new_reserve_y) = reserves_at_probability(target, self.liquidity);
        let moved_y = (new_reserve_y - self.reserve_y).abs();
        let plan = TradePlan {
            side,
            delta_x: (self.reserve_x - new_reserve_x).abs(),
            delta_y: moved_y,
            new_reserve_x: new_reserve_x.max(0.0),
            new_reserve_y,
            fee: FeeTotals {
                in_x: 0.0,
                in_y: moved_y * rate,
            },
        };
        self.commit(plan, TradeKind::Arbitrage);

        let after = self.implied_probability();
        tracing::debug!(external_price, before, after, side = %side, "Arbitraged pool");
        Ok(ArbitrageOutcome {
            side: Some(side),
            delta_x: plan.delta_x,
            delta_y: plan.delta_y,
            fee: plan.fee.in_y,
            probability_before: before,
            probability_after: after,
        })
    }

    /// Validate a committing trade and compute its effect without applying it.
    pub(crate) fn plan(&self, delta_x: f64, side: TradeSide) -> Result<TradePlan> {
        ensure_amount("delta_x", delta_x)?;
        let delta_x = match side {
            TradeSide::Buy => {
                let cap = self.max_buy();
                if delta_x > cap * (1.0 + CAP_TOLERANCE) {
                    return Err(CurveError::InsufficientReserve {
                        requested: delta_x,
                        available: cap,
                    });
                }
                delta_x.min(cap)
            }
            TradeSide::Sell => delta_x,
        };

        let plan = self.simulate(delta_x, side);
        if !plan.delta_y.is_finite() {
            return Err(CurveError::InvalidAmount {
                message: format!("{} of {} has no finite price at {}", side, delta_x, self.fee),
            });
        }
        Ok(plan)
    }

    /// Apply a plan computed against the current state.
    pub(crate) fn commit(&mut self, plan: TradePlan, kind: TradeKind) -> f64 {
        self.reserve_x = plan.new_reserve_x;
        self.reserve_y = plan.new_reserve_y;
        self.fees.record(kind, plan.fee);

        tracing::debug!(
            side = %plan.side,
            kind = %kind,
            delta_x = plan.delta_x,
            delta_y = plan.delta_y,
            reserve_x = self.reserve_x,
            reserve_y = self.reserve_y,
            "Committed pool trade"
        );
        plan.delta_y
    }

    /// Curve math for an in-range `delta_x`.
    fn simulate(&self, delta_x: f64, side: TradeSide) -> TradePlan {
        let rate = self.fee.rate();
        match side {
            TradeSide::Buy => {
                let new_reserve_x = self.reserve_x - delta_x;
                let new_reserve_y = base_reserve(new_reserve_x, self.liquidity);
                let curve_cost = new_reserve_y - self.reserve_y;
                let fee = buy_fee(curve_cost, self.fee, self.policy.buy_fee);
                TradePlan {
                    side,
                    delta_x,
                    delta_y: curve_cost + fee,
                    new_reserve_x,
                    new_reserve_y,
                    fee: FeeTotals { in_x: 0.0, in_y: fee },
                }
            }
            TradeSide::Sell => match self.policy.sell_fee {
                SellFee::PreCurve => {
                    let fee_x = delta_x * rate;
                    let new_reserve_x = self.reserve_x + delta_x - fee_x;
                    let new_reserve_y = base_reserve(new_reserve_x, self.liquidity);
                    TradePlan {
                        side,
                        delta_x,
                        delta_y: self.reserve_y - new_reserve_y,
                        new_reserve_x,
                        new_reserve_y,
                        fee: FeeTotals { in_x: fee_x, in_y: 0.0 },
                    }
                }
                SellFee::PostCurve => {
                    let new_reserve_x = self.reserve_x + delta_x;
                    let new_reserve_y = base_reserve(new_reserve_x, self.liquidity);
                    let gross = self.reserve_y - new_reserve_y;
                    let fee_y = gross * rate;
                    TradePlan {
                        side,
                        delta_x,
                        delta_y: gross - fee_y,
                        new_reserve_x,
                        new_reserve_y,
                        fee: FeeTotals { in_x: 0.0, in_y: fee_y },
                    }
                }
            },
        }
    }

    fn base_floor(&self) -> f64 {
        MIN_BASE_RESERVE.min(self.liquidity)
    }
}
