//! Basket Router: Optimal Split Across Outcome Pools
//!
//! Every pool in the basket pairs one outcome token with the same base asset.
//! One unit of base asset mints one unit of every outcome (and a complete set
//! burns back into one unit of base asset), so an outcome can be bought either
//! directly from its own pool or synthetically: mint, then sell the unwanted
//! outcomes into their pools. Selling mirrors this with buy-and-burn.
//!
//! The router finds the split between the two paths that minimises cost (buy)
//! or maximises proceeds (sell), then commits all legs in one step.
//!
//! # Unimodality
//!
//! For a buy, the composite cost in the direct amount `d` is
//! `buy_i(d) + (dx - d) - sum_j sell_j(dx - d)`. Pool buy cost is convex in
//! the amount bought and sell proceeds are concave in the amount sold, under
//! every `FeePolicy` (each fee is a non-negative multiple of a convex/concave
//! curve term, or a linear shrink of the traded amount). The sum is therefore
//! convex on the bracket, where no buy cap binds. The sell case is the concave
//! mirror. `SplitSearch::GridScan` is available for fee schedules outside that
//! family.

use synstation_core::{
    ensure_amount, ensure_probability, BasketConfig, CurveError, Result, RouterConfig,
    SplitSearch, TradeKind, TradeSide,
};

use crate::constants::{CAP_TOLERANCE, MIN_BASKET_SIZE};
use crate::pool::BondingCurvePool;
use crate::state::{ArbitrageOutcome, ExecutedSplit, FeeLedger, SplitQuote, TradePlan};

#[derive(Debug, Clone)]
pub struct Router {
    pools: Vec<BondingCurvePool>,
    config: RouterConfig,
}

impl Router {
    /// Build a router with default search settings.
    pub fn new(pools: Vec<BondingCurvePool>) -> Result<Self> {
        Self::with_config(pools, RouterConfig::default())
    }

    pub fn with_config(pools: Vec<BondingCurvePool>, config: RouterConfig) -> Result<Self> {
        config.validate()?;
        if pools.len() < MIN_BASKET_SIZE {
            return Err(CurveError::InvalidConfiguration {
                reason: format!(
                    "a basket needs at least {} pools, got {}",
                    MIN_BASKET_SIZE,
                    pools.len()
                ),
            });
        }
        Ok(Self { pools, config })
    }

    pub fn from_basket(basket: &BasketConfig, config: RouterConfig) -> Result<Self> {
        let pools = basket
            .pools
            .iter()
            .map(BondingCurvePool::from_config)
            .collect::<Result<Vec<_>>>()?;
        Self::with_config(pools, config)
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn pools(&self) -> &[BondingCurvePool] {
        &self.pools
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn pool(&self, outcome: usize) -> Result<&BondingCurvePool> {
        self.check_outcome(outcome)?;
        Ok(&self.pools[outcome])
    }

    /// Implied probability of each outcome, in basket order
    pub fn probabilities(&self) -> Vec<f64> {
        self.pools.iter().map(|p| p.implied_probability()).collect()
    }

    /// Sum of implied probabilities (1.0 for a consistently priced basket)
    pub fn probability_sum(&self) -> f64 {
        self.pools.iter().map(|p| p.implied_probability()).sum()
    }

    /// Value of every pool at the given outcome prices
    pub fn total_value(&self, prices: &[f64]) -> Result<f64> {
        self.check_prices(prices)?;
        Ok(self
            .pools
            .iter()
            .zip(prices)
            .map(|(pool, &price)| pool.value(price))
            .sum())
    }

    /// Fees of all pools combined
    pub fn fees_collected(&self) -> FeeLedger {
        self.pools
            .iter()
            .fold(FeeLedger::default(), |acc, p| acc + p.fees_collected())
    }

    /// Arbitrage each pool against its own external price.
    ///
    /// All prices are validated before any pool moves.
    pub fn arbitrage(&mut self, prices: &[f64]) -> Result<Vec<ArbitrageOutcome>> {
        self.check_prices(prices)?;
        for &price in prices {
            ensure_probability("external_price", price)?;
        }
        self.pools
            .iter_mut()
            .zip(prices)
            .map(|(pool, &price)| pool.arbitrage(price))
            .collect()
    }

    /// Base asset paid (buy) or received (sell) for `dx` of outcome `i` when
    /// `dx_i` goes through pool `i` and the rest through mint/burn.
    ///
    /// Rejects the same inputs `execute_split` rejects.
    pub fn composite_quote(&self, i: usize, dx: f64, dx_i: f64, side: TradeSide) -> Result<f64> {
        self.check_split(i, dx, dx_i)?;
        Ok(self.composite(i, dx, dx_i, side))
    }

    /// Search interval `[left, right]` for the direct-leg amount.
    ///
    /// Buy: `[precision, min(dx, cap_i)]`. Sell: the lower end keeps the
    /// synthetic leg within what the thinnest other pool can release.
    pub fn bracket(&self, i: usize, dx: f64, side: TradeSide) -> Result<(f64, f64)> {
        self.check_outcome(i)?;
        let precision = self.config.precision;
        Ok(match side {
            TradeSide::Buy => (precision, dx.min(self.pools[i].max_buy())),
            TradeSide::Sell => {
                let thinnest = self
                    .others(i)
                    .map(|(_, pool)| pool.max_buy())
                    .fold(f64::INFINITY, f64::min);
                (precision.max(dx - thinnest), dx)
            }
        })
    }

    /// Direct-leg amount that minimises cost (buy) or maximises proceeds (sell).
    pub fn find_optimal_split(&self, i: usize, dx: f64, side: TradeSide) -> Result<f64> {
        ensure_amount("dx", dx)?;
        let (left, right) = self.bracket(i, dx, side)?;
        if right <= left {
            return Ok(right.max(0.0));
        }

        let dx_i = match self.config.search {
            SplitSearch::Ternary => self.ternary_search(i, dx, side, left, right)?,
            SplitSearch::GridScan { points } => self.grid_scan(i, dx, side, left, right, points),
        };

        tracing::debug!(
            outcome = i,
            side = %side,
            amount = dx,
            direct = dx_i,
            synthetic = dx - dx_i,
            "Found optimal split"
        );
        Ok(dx_i)
    }

    /// Optimal split plus the single-path alternatives, without mutation.
    ///
    /// A single-path alternative is `None` when the pools cannot fill the
    /// whole trade that way.
    pub fn quote_best(&self, i: usize, dx: f64, side: TradeSide) -> Result<SplitQuote> {
        let dx_i = self.find_optimal_split(i, dx, side)?;
        let (direct_fits, synthetic_fits) = match side {
            TradeSide::Buy => (fits_buy(&self.pools[i], dx), true),
            TradeSide::Sell => (true, self.others(i).all(|(_, pool)| fits_buy(pool, dx))),
        };
        Ok(SplitQuote {
            outcome: i,
            side,
            amount: dx,
            direct_amount: dx_i,
            synthetic_amount: dx - dx_i,
            delta_y: self.composite(i, dx, dx_i, side),
            direct_only: direct_fits.then(|| self.composite(i, dx, dx, side)),
            synthetic_only: synthetic_fits.then(|| self.composite(i, dx, 0.0, side)),
        })
    }

    /// Commit a basket trade with a caller-chosen split, recording every
    /// leg's fee under `kind`.
    ///
    /// Every leg is validated before any pool is touched; on error no pool
    /// changes. The return value equals `composite_quote` on the prior state.
    pub fn execute_split(
        &mut self,
        i: usize,
        dx: f64,
        dx_i: f64,
        side: TradeSide,
        kind: TradeKind,
    ) -> Result<f64> {
        self.check_split(i, dx, dx_i)?;
        let synthetic = dx - dx_i;

        let (direct, legs) = match self.plan_legs(i, dx_i, synthetic, side) {
            Ok(planned) => planned,
            Err(e) => {
                tracing::warn!(
                    outcome = i,
                    side = %side,
                    amount = dx,
                    "Rejected basket trade: {}",
                    e
                );
                return Err(e);
            }
        };

        let others_total: f64 = legs.iter().map(|(_, plan)| plan.delta_y).sum();
        let delta_y = combine(direct.delta_y, synthetic, others_total);

        self.pools[i].commit(direct, kind);
        for (j, plan) in legs {
            self.pools[j].commit(plan, kind);
        }

        tracing::debug!(
            outcome = i,
            side = %side,
            amount = dx,
            direct = dx_i,
            kind = %kind,
            delta_y,
            "Executed basket trade"
        );
        Ok(delta_y)
    }

    /// Search for the optimal split and commit it.
    pub fn execute_best(
        &mut self,
        i: usize,
        dx: f64,
        side: TradeSide,
        kind: TradeKind,
    ) -> Result<ExecutedSplit> {
        let dx_i = self.find_optimal_split(i, dx, side)?;
        let delta_y = self.execute_split(i, dx, dx_i, side, kind)?;
        Ok(ExecutedSplit {
            outcome: i,
            side,
            amount: dx,
            direct_amount: dx_i,
            delta_y,
            probabilities: self.probabilities(),
        })
    }

    /// Plan the direct leg and every synthetic leg without touching any pool.
    fn plan_legs(
        &self,
        i: usize,
        dx_i: f64,
        synthetic: f64,
        side: TradeSide,
    ) -> Result<(TradePlan, Vec<(usize, TradePlan)>)> {
        let direct = self.pools[i].plan(dx_i, side)?;
        let legs = self
            .others(i)
            .map(|(j, pool)| pool.plan(synthetic, side.opposite()).map(|plan| (j, plan)))
            .collect::<Result<Vec<_>>>()?;
        Ok((direct, legs))
    }

    fn composite(&self, i: usize, dx: f64, dx_i: f64, side: TradeSide) -> f64 {
        let synthetic = dx - dx_i;
        let direct = self.pools[i].quote(dx_i, side);
        let others_total: f64 = self
            .others(i)
            .map(|(_, pool)| pool.quote(synthetic, side.opposite()))
            .sum();
        combine(direct, synthetic, others_total)
    }

    fn ternary_search(
        &self,
        i: usize,
        dx: f64,
        side: TradeSide,
        mut left: f64,
        mut right: f64,
    ) -> Result<f64> {
        let precision = self.config.precision;
        let mut iterations = 0;

        while right / left > 1.0 + precision {
            if iterations >= self.config.max_iterations {
                tracing::warn!(
                    outcome = i,
                    side = %side,
                    iterations,
                    left,
                    right,
                    "Split search did not converge"
                );
                return Err(CurveError::NumericConvergenceFailure {
                    iterations,
                    left,
                    right,
                });
            }
            iterations += 1;

            let third = (right - left) / 3.0;
            let mid1 = left + third;
            let mid2 = right - third;
            let f1 = self.composite(i, dx, mid1, side);
            let f2 = self.composite(i, dx, mid2, side);

            // Drop the third on the side of the worse sample
            if is_better(side, f2, f1) {
                left = mid1;
            } else {
                right = mid2;
            }
            tracing::trace!(iterations, left, right, "Split search step");
        }

        Ok((left + right) / 2.0)
    }

    fn grid_scan(
        &self,
        i: usize,
        dx: f64,
        side: TradeSide,
        left: f64,
        right: f64,
        points: usize,
    ) -> f64 {
        let step = (right - left) / (points - 1) as f64;
        let mut best_at = left;
        let mut best = self.composite(i, dx, left, side);
        for k in 1..points {
            let at = left + step * k as f64;
            let value = self.composite(i, dx, at, side);
            if is_better(side, value, best) {
                best = value;
                best_at = at;
            }
        }
        best_at
    }

    fn others(&self, i: usize) -> impl Iterator<Item = (usize, &BondingCurvePool)> {
        self.pools.iter().enumerate().filter(move |(j, _)| *j != i)
    }

    fn check_outcome(&self, i: usize) -> Result<()> {
        if i >= self.pools.len() {
            return Err(CurveError::UnknownOutcome {
                index: i,
                outcomes: self.pools.len(),
            });
        }
        Ok(())
    }

    fn check_split(&self, i: usize, dx: f64, dx_i: f64) -> Result<()> {
        self.check_outcome(i)?;
        ensure_amount("dx", dx)?;
        ensure_amount("dx_i", dx_i)?;
        if dx_i > dx {
            return Err(CurveError::InvalidAmount {
                message: format!("direct amount {} exceeds trade size {}", dx_i, dx),
            });
        }
        Ok(())
    }

    fn check_prices(&self, prices: &[f64]) -> Result<()> {
        if prices.len() != self.pools.len() {
            return Err(CurveError::InvalidAmount {
                message: format!(
                    "expected {} prices, got {}",
                    self.pools.len(),
                    prices.len()
                ),
            });
        }
        Ok(())
    }
}

/// Direct leg, plus the minted/burned complete sets, minus the other legs.
fn combine(direct: f64, synthetic: f64, others_total: f64) -> f64 {
    direct + synthetic - others_total
}

/// Whether one buy of `amount` stays within the pool's cap
fn fits_buy(pool: &BondingCurvePool, amount: f64) -> bool {
    amount <= pool.max_buy() * (1.0 + CAP_TOLERANCE)
}

/// Whether `a` is a strictly better base-asset amount than `b`.
fn is_better(side: TradeSide, a: f64, b: f64) -> bool {
    match side {
        TradeSide::Buy => a < b,
        TradeSide::Sell => a > b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FeeTotals;
    use synstation_core::{BuyCap, BuyFee, FeeBps, FeePolicy, PoolConfig, SellFee};

    fn uniform_basket() -> Router {
        let pools = (0..3)
            .map(|_| BondingCurvePool::new(10_000.0, 1.0 / 3.0, 10).unwrap())
            .collect();
        Router::new(pools).unwrap()
    }

    fn uneven_basket() -> Router {
        let pools = vec![
            BondingCurvePool::new(10_000.0, 0.2, 30).unwrap(),
            BondingCurvePool::new(25_000.0, 0.5, 30).unwrap(),
            BondingCurvePool::new(4_000.0, 0.3, 30).unwrap(),
        ];
        Router::new(pools).unwrap()
    }

    fn two_outcome_basket() -> Router {
        let pools = vec![
            BondingCurvePool::new(50_000.0, 0.6, 100).unwrap(),
            BondingCurvePool::new(20_000.0, 0.4, 100).unwrap(),
        ];
        Router::new(pools).unwrap()
    }

    fn uneven_basket_with(policy: FeePolicy) -> Router {
        let fee = FeeBps::new(100).unwrap();
        let pools = [(10_000.0, 0.2), (25_000.0, 0.5), (4_000.0, 0.3)]
            .iter()
            .map(|&(reserve, p)| {
                let config = PoolConfig::new(reserve, p, fee).with_fee_policy(policy);
                BondingCurvePool::from_config(&config).unwrap()
            })
            .collect();
        Router::new(pools).unwrap()
    }

    fn all_policies() -> Vec<FeePolicy> {
        let mut policies = Vec::new();
        for buy_fee in [BuyFee::GrossUp, BuyFee::Net] {
            for sell_fee in [SellFee::PreCurve, SellFee::PostCurve] {
                for buy_cap in [BuyCap::Precision, BuyCap::FeeAdjusted] {
                    policies.push(FeePolicy {
                        buy_fee,
                        sell_fee,
                        buy_cap,
                    });
                }
            }
        }
        policies
    }

    fn best_on_grid(router: &Router, i: usize, dx: f64, side: TradeSide) -> f64 {
        let (left, right) = router.bracket(i, dx, side).unwrap();
        (0..=2_000)
            .map(|k| left + (right - left) * k as f64 / 2_000.0)
            .map(|at| router.composite_quote(i, dx, at, side).unwrap())
            .fold(None, |best: Option<f64>, v| match best {
                Some(b) if !is_better(side, v, b) => Some(b),
                _ => Some(v),
            })
            .unwrap()
    }

    // -- Construction --

    #[test]
    fn test_basket_needs_two_pools() {
        let single = vec![BondingCurvePool::new(10_000.0, 0.5, 10).unwrap()];
        let err = Router::new(single).unwrap_err();
        assert_eq!(err.error_code(), "invalid_configuration");
    }

    #[test]
    fn test_from_basket_config() {
        let basket = BasketConfig::default();
        let router = Router::from_basket(&basket, RouterConfig::default()).unwrap();
        assert_eq!(router.len(), 3);
        assert!((router.probability_sum() - 1.0).abs() < 1e-12);

        let bad = BasketConfig {
            pools: vec![
                PoolConfig::new(10_000.0, 0.5, FeeBps::new(10).unwrap()),
                PoolConfig::new(10_000.0, 1.5, FeeBps::new(10).unwrap()),
            ],
        };
        assert!(Router::from_basket(&bad, RouterConfig::default()).is_err());
    }

    #[test]
    fn test_unknown_outcome() {
        let router = uniform_basket();
        let err = router.find_optimal_split(3, 100.0, TradeSide::Buy).unwrap_err();
        assert_eq!(
            err,
            CurveError::UnknownOutcome {
                index: 3,
                outcomes: 3
            }
        );
        assert!(router.composite_quote(7, 100.0, 50.0, TradeSide::Sell).is_err());
    }

    // -- Composite quote --

    #[test]
    fn test_composite_quote_matches_leg_sum() {
        let router = uniform_basket();
        let pools = router.pools();
        let expected = pools[0].quote(1_000.0, TradeSide::Buy) + 2_000.0
            - pools[1].quote(2_000.0, TradeSide::Sell)
            - pools[2].quote(2_000.0, TradeSide::Sell);
        let got = router.composite_quote(0, 3_000.0, 1_000.0, TradeSide::Buy).unwrap();
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn test_composite_buy_cost_is_non_negative() {
        let router = uneven_basket();
        let (left, right) = router.bracket(2, 6_000.0, TradeSide::Buy).unwrap();
        for k in 0..=50 {
            let at = left + (right - left) * k as f64 / 50.0;
            let cost = router.composite_quote(2, 6_000.0, at, TradeSide::Buy).unwrap();
            assert!(cost >= 0.0, "cost {} at {}", cost, at);
        }
    }

    // -- Bracket --

    #[test]
    fn test_sell_bracket_respects_thinnest_pool() {
        let router = uneven_basket();
        let (left, right) = router.bracket(0, 8_000.0, TradeSide::Sell).unwrap();
        let thinnest = router.pools()[2].max_buy();
        assert!((left - (8_000.0 - thinnest)).abs() < 1e-9);
        assert_eq!(right, 8_000.0);

        let (left, _) = router.bracket(0, 100.0, TradeSide::Sell).unwrap();
        assert_eq!(left, router.config().precision);
    }

    #[test]
    fn test_buy_bracket_capped_by_own_pool() {
        let router = uneven_basket();
        let (left, right) = router.bracket(2, 6_000.0, TradeSide::Buy).unwrap();
        assert_eq!(left, 1e-6);
        assert!((right - router.pools()[2].max_buy()).abs() < 1e-12);
    }

    // -- Optimal split --

    #[test]
    fn test_uniform_buy_split_is_interior_and_beats_single_paths() {
        let router = uniform_basket();
        let dx_0 = router.find_optimal_split(0, 3_000.0, TradeSide::Buy).unwrap();
        assert!(dx_0 > 1.0 && dx_0 < 2_999.0, "boundary solution {}", dx_0);

        let at_opt = router.composite_quote(0, 3_000.0, dx_0, TradeSide::Buy).unwrap();
        let direct = router.composite_quote(0, 3_000.0, 3_000.0, TradeSide::Buy).unwrap();
        let synthetic = router.composite_quote(0, 3_000.0, 0.0, TradeSide::Buy).unwrap();
        assert!(at_opt <= direct);
        assert!(at_opt <= synthetic);
    }

    #[test]
    fn test_uniform_sell_split_is_interior_and_beats_single_paths() {
        let router = uniform_basket();
        let dx_0 = router.find_optimal_split(0, 3_000.0, TradeSide::Sell).unwrap();
        assert!(dx_0 > 1.0 && dx_0 < 2_999.0, "boundary solution {}", dx_0);

        let at_opt = router.composite_quote(0, 3_000.0, dx_0, TradeSide::Sell).unwrap();
        let direct = router.composite_quote(0, 3_000.0, 3_000.0, TradeSide::Sell).unwrap();
        let synthetic = router.composite_quote(0, 3_000.0, 0.0, TradeSide::Sell).unwrap();
        assert!(at_opt >= direct);
        assert!(at_opt >= synthetic);
    }

    #[test]
    fn test_search_matches_fine_grid() {
        for router in [uniform_basket(), uneven_basket(), two_outcome_basket()] {
            for side in [TradeSide::Buy, TradeSide::Sell] {
                for i in 0..router.len() {
                    let dx_i = router.find_optimal_split(i, 8_000.0, side).unwrap();
                    let found = router.composite_quote(i, 8_000.0, dx_i, side).unwrap();
                    let grid = best_on_grid(&router, i, 8_000.0, side);
                    let tolerance = 1e-6 * grid.abs().max(1.0);
                    assert!(
                        !is_better(side, grid, found) || (grid - found).abs() <= tolerance,
                        "{} outcome {}: search {} vs grid {}",
                        side,
                        i,
                        found,
                        grid
                    );
                }
            }
        }
    }

    #[test]
    fn test_search_matches_fine_grid_under_every_fee_policy() {
        for policy in all_policies() {
            let router = uneven_basket_with(policy);
            for side in [TradeSide::Buy, TradeSide::Sell] {
                for i in 0..router.len() {
                    let dx_i = router.find_optimal_split(i, 8_000.0, side).unwrap();
                    let found = router.composite_quote(i, 8_000.0, dx_i, side).unwrap();
                    let grid = best_on_grid(&router, i, 8_000.0, side);
                    let tolerance = 1e-6 * grid.abs().max(1.0);
                    assert!(
                        !is_better(side, grid, found) || (grid - found).abs() <= tolerance,
                        "{:?} {} outcome {}: search {} vs grid {}",
                        policy,
                        side,
                        i,
                        found,
                        grid
                    );
                }
            }
        }
    }

    #[test]
    fn test_grid_scan_agrees_with_ternary() {
        let ternary = uneven_basket();
        let config = RouterConfig {
            search: SplitSearch::GridScan { points: 4_001 },
            ..RouterConfig::default()
        };
        let scan = Router::with_config(ternary.pools().to_vec(), config).unwrap();

        for side in [TradeSide::Buy, TradeSide::Sell] {
            let a = ternary.find_optimal_split(1, 5_000.0, side).unwrap();
            let b = scan.find_optimal_split(1, 5_000.0, side).unwrap();
            let qa = ternary.composite_quote(1, 5_000.0, a, side).unwrap();
            let qb = scan.composite_quote(1, 5_000.0, b, side).unwrap();
            assert!((qa - qb).abs() < 1e-3, "{}: {} vs {}", side, qa, qb);
        }
    }

    #[test]
    fn test_convergence_failure_is_reported() {
        let config = RouterConfig {
            max_iterations: 3,
            ..RouterConfig::default()
        };
        let router = Router::with_config(uniform_basket().pools().to_vec(), config).unwrap();
        let err = router.find_optimal_split(0, 3_000.0, TradeSide::Buy).unwrap_err();
        match err {
            CurveError::NumericConvergenceFailure { iterations, left, right } => {
                assert_eq!(iterations, 3);
                assert!(left < right);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_tiny_trade_skips_search() {
        let router = uniform_basket();
        let dx_i = router.find_optimal_split(0, 5e-7, TradeSide::Buy).unwrap();
        assert_eq!(dx_i, 5e-7);
        let dx_i = router.find_optimal_split(0, 5e-7, TradeSide::Sell).unwrap();
        assert_eq!(dx_i, 5e-7);
        assert_eq!(router.find_optimal_split(0, 0.0, TradeSide::Buy).unwrap(), 0.0);
        assert!(router.find_optimal_split(0, -1.0, TradeSide::Buy).is_err());
    }

    // -- Execution --

    #[test]
    fn test_execute_split_matches_composite_quote() {
        for side in [TradeSide::Buy, TradeSide::Sell] {
            let mut router = uneven_basket();
            let dx_i = router.find_optimal_split(0, 6_000.0, side).unwrap();
            let quoted = router.composite_quote(0, 6_000.0, dx_i, side).unwrap();
            let executed = router.execute_split(0, 6_000.0, dx_i, side, TradeKind::Noise).unwrap();
            assert!((quoted - executed).abs() < 1e-9, "{}: {} vs {}", side, quoted, executed);

            for pool in router.pools() {
                assert!(pool.invariant_error() < 1e-6);
            }
        }
    }

    #[test]
    fn test_execute_split_moves_prices() {
        let mut router = uniform_basket();
        let result = router.execute_best(0, 3_000.0, TradeSide::Buy, TradeKind::Noise).unwrap();
        assert!(result.delta_y > 0.0);
        assert!(result.probabilities[0] > 1.0 / 3.0);
        assert!(result.probabilities[1] < 1.0 / 3.0);
        assert!((result.probabilities[1] - result.probabilities[2]).abs() < 1e-12);
        assert!(router.fees_collected().noise.in_y > 0.0);
        assert!(router.fees_collected().noise.in_x > 0.0);
    }

    #[test]
    fn test_execute_split_is_atomic_on_failure() {
        let mut router = uneven_basket();
        let before: Vec<_> = router.pools().iter().map(|p| p.snapshot()).collect();

        // Synthetic leg asks the thin pool for more than it holds
        let err = router
            .execute_split(0, 8_000.0, 1_000.0, TradeSide::Sell, TradeKind::Noise)
            .unwrap_err();
        assert_eq!(err.error_code(), "insufficient_reserve");

        // Direct leg beyond its own pool
        let err = router
            .execute_split(2, 6_000.0, 5_000.0, TradeSide::Buy, TradeKind::Noise)
            .unwrap_err();
        assert_eq!(err.error_code(), "insufficient_reserve");

        for (pool, snap) in router.pools().iter().zip(&before) {
            assert_eq!(pool.reserve_x(), snap.reserve_x);
            assert_eq!(pool.reserve_y(), snap.reserve_y);
            assert_eq!(pool.fees_collected(), snap.fees);
        }
    }

    #[test]
    fn test_execute_split_rejects_direct_above_total() {
        let mut router = uniform_basket();
        let err = router
            .execute_split(0, 100.0, 150.0, TradeSide::Buy, TradeKind::Noise)
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_amount");
    }

    #[test]
    fn test_composite_quote_rejects_bad_split() {
        let router = uniform_basket();
        for (dx, dx_i) in [(100.0, 500.0), (-100.0, 0.0), (100.0, f64::NAN), (f64::INFINITY, 1.0)] {
            let err = router
                .composite_quote(0, dx, dx_i, TradeSide::Buy)
                .unwrap_err();
            assert_eq!(err.error_code(), "invalid_amount", "dx {} dx_i {}", dx, dx_i);
        }
    }

    #[test]
    fn test_execute_split_records_fees_under_kind() {
        let mut router = uniform_basket();
        router
            .execute_split(0, 3_000.0, 1_500.0, TradeSide::Buy, TradeKind::Arbitrage)
            .unwrap();
        let fees = router.fees_collected();
        assert_eq!(fees.noise, FeeTotals::default());
        assert!(fees.arbitrage.in_y > 0.0);
        assert!(fees.arbitrage.in_x > 0.0);
    }

    #[test]
    fn test_quote_best_drops_single_paths_the_pools_cannot_fill() {
        let router = uneven_basket();

        // Pool 2 holds 4_000 outcome tokens, so 6_000 cannot all go direct
        let quote = router.quote_best(2, 6_000.0, TradeSide::Buy).unwrap();
        assert!(quote.direct_only.is_none());
        let synthetic = quote.synthetic_only.unwrap();
        assert!(quote.delta_y <= synthetic);
        assert!(quote.improvement().unwrap() >= 0.0);

        // Burning 9_000 complete sets would buy 9_000 from pool 2
        let quote = router.quote_best(0, 9_000.0, TradeSide::Sell).unwrap();
        assert!(quote.synthetic_only.is_none());
        let direct = quote.direct_only.unwrap();
        assert!(quote.delta_y >= direct);
        assert!(quote.improvement().unwrap() >= 0.0);

        // Both alternatives fit when the trade is small
        let quote = router.quote_best(0, 500.0, TradeSide::Buy).unwrap();
        assert!(quote.direct_only.is_some() && quote.synthetic_only.is_some());
    }

    #[test]
    fn test_execute_best_sell_near_thin_pool_limit() {
        let mut router = uneven_basket();
        let quote = router.quote_best(0, 9_000.0, TradeSide::Sell).unwrap();
        assert!(quote.synthetic_amount <= router.pools()[2].max_buy() * (1.0 + 1e-12));
        let result = router.execute_best(0, 9_000.0, TradeSide::Sell, TradeKind::Noise).unwrap();
        assert!((result.delta_y - quote.delta_y).abs() < 1e-9);
    }

    #[test]
    fn test_quote_best_reports_improvement() {
        let router = uniform_basket();
        let quote = router.quote_best(0, 3_000.0, TradeSide::Buy).unwrap();
        assert!(quote.improvement().unwrap() >= 0.0);
        assert!((quote.direct_amount + quote.synthetic_amount - 3_000.0).abs() < 1e-9);
        let json = serde_json::to_string(&quote).unwrap();
        assert!(json.contains("\"side\":\"buy\""));
    }

    // -- Reporting --

    #[test]
    fn test_total_value_and_arbitrage() {
        let mut router = uniform_basket();
        assert!(router.total_value(&[0.5, 0.5]).is_err());
        let value = router.total_value(&[0.2, 0.3, 0.5]).unwrap();
        let expected: f64 = router
            .pools()
            .iter()
            .zip([0.2, 0.3, 0.5])
            .map(|(p, price)| p.value(price))
            .sum();
        assert!((value - expected).abs() < 1e-9);

        assert!(router.arbitrage(&[0.2, 0.3, 1.5]).is_err());
        assert!((router.probability_sum() - 1.0).abs() < 1e-12);

        let outcomes = router.arbitrage(&[0.2, 0.3, 0.5]).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].side, Some(TradeSide::Sell));
        assert_eq!(outcomes[2].side, Some(TradeSide::Buy));
        assert!(router.fees_collected().arbitrage.in_y > 0.0);
    }
}
