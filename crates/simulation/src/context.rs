//! Simulation Context
//!
//! Owns one binary market, the tick counter and the noise trader's RNG.
//! Every tick runs the arbitrageur first and the noise trader second.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use amm::{BinaryMarket, FeeLedger, MarketArbitrage, NoiseTrade};
use synstation_core::{FeeBps, Result, SimulationConfig};

use crate::ticks::{TickEvent, TickSource};

/// Probability both legs open at
const OPENING_PRICE: f64 = 0.5;

/// What happened in one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub arbitrage: MarketArbitrage,
    pub trade: Option<NoiseTrade>,
}

/// Result of a full pass over a tick source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Change in market value, final value at the last external price minus
    /// opening value at even odds
    pub pnl: f64,
    /// Fee revenue in base asset
    pub fees: f64,
    pub fee_ledger: FeeLedger,
    pub trades: u64,
    /// Noise trades the market could not fill
    pub rejected_trades: u64,
    pub ticks: u64,
    /// Implied yes probability after the last tick
    pub final_probability: f64,
}

#[derive(Debug)]
pub struct SimulationContext {
    market: BinaryMarket,
    rng: StdRng,
    tick: u64,
    trades: u64,
    rejected_trades: u64,
    opening_value: f64,
    last_price: f64,
}

impl SimulationContext {
    pub fn new(market: BinaryMarket, seed: u64) -> Self {
        Self {
            opening_value: market.total_value(OPENING_PRICE),
            market,
            rng: StdRng::seed_from_u64(seed),
            tick: 0,
            trades: 0,
            rejected_trades: 0,
            last_price: OPENING_PRICE,
        }
    }

    /// Open a market from the simulation parameters at the given fee rate.
    pub fn from_config(config: &SimulationConfig, fee: FeeBps, seed: u64) -> Result<Self> {
        let market = BinaryMarket::with_policy(config.bid, fee, config.fee_policy)?
            .with_noise_unit(config.noise_unit);
        Ok(Self::new(market, seed))
    }

    pub fn market(&self) -> &BinaryMarket {
        &self.market
    }

    /// Ticks processed so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Arbitrage toward the tick's external price, then apply its noise trade.
    ///
    /// A noise trade the market cannot fill is skipped and counted; the tick
    /// still advances.
    pub fn step(&mut self, event: &TickEvent) -> Result<StepOutcome> {
        let arbitrage = self.market.arbitrage(event.external_price)?;
        self.last_price = event.external_price;

        let trade = match event.trade_size {
            Some(size) => match self.market.noise_trade(size, &mut self.rng) {
                Ok(trade) => {
                    self.trades += 1;
                    Some(trade)
                }
                Err(e) => {
                    tracing::warn!(tick = event.tick, size, "Skipped noise trade: {}", e);
                    self.rejected_trades += 1;
                    None
                }
            },
            None => None,
        };

        self.tick += 1;
        Ok(StepOutcome { arbitrage, trade })
    }

    /// Step through every tick of `source` and report.
    pub fn run<S: TickSource + ?Sized>(&mut self, source: &S) -> Result<SimulationReport> {
        for event in source.ticks() {
            self.step(&event)?;
        }
        let report = self.report();
        tracing::info!(
            ticks = report.ticks,
            trades = report.trades,
            pnl = report.pnl,
            fees = report.fees,
            "Simulation run complete"
        );
        Ok(report)
    }

    /// Current results, valued at the last external price seen
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            pnl: self.market.total_value(self.last_price) - self.opening_value,
            fees: self.market.fee_revenue(self.last_price),
            fee_ledger: self.market.fees_collected(),
            trades: self.trades,
            rejected_trades: self.rejected_trades,
            ticks: self.tick,
            final_probability: self.market.probabilities().0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::FixedTicks;
    use synstation_core::{NoiseUnit, TradeSide};

    fn market(fee_bps: u32) -> BinaryMarket {
        BinaryMarket::new(10_000.0, fee_bps).unwrap()
    }

    #[test]
    fn test_quiet_run_has_no_pnl() {
        let source = FixedTicks::from_prices(&[0.5; 10], &[]);
        let mut ctx = SimulationContext::new(market(30), 1);
        let report = ctx.run(&source).unwrap();
        assert_eq!(report.ticks, 10);
        assert_eq!(report.trades, 0);
        assert!(report.pnl.abs() < 1e-9);
        assert_eq!(report.fees, 0.0);
        assert!((report.final_probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_arbitrage_runs_before_noise() {
        let source = FixedTicks::from_prices(&[0.7], &[(0, 50.0)]);

        let mut ctx = SimulationContext::new(market(30), 9);
        let outcome = ctx.step(&source.events()[0]).unwrap();
        let trade = outcome.trade.unwrap();

        // Replay by hand: arbitrage first, then the same noise trade
        let mut expected = market(30);
        expected.arbitrage(0.7).unwrap();
        let (yes, no) = expected.probabilities();
        assert!((yes - 0.7 / 1.003).abs() < 1e-9);
        assert!((no - 0.3 * 1.003).abs() < 1e-9);
        let replayed = expected.apply_trade(trade.leg, trade.side, 50.0).unwrap();

        assert_eq!(replayed.filled, trade.filled);
        assert_eq!(ctx.market().probabilities(), expected.probabilities());
        assert_eq!(outcome.arbitrage.yes.side, Some(TradeSide::Buy));
    }

    #[test]
    fn test_arbitrage_earns_fees_on_moving_price() {
        let prices: Vec<f64> = (0..50).map(|i| 0.5 + 0.3 * (i as f64 * 0.4).sin()).collect();
        let source = FixedTicks::from_prices(&prices, &[]);
        let mut ctx = SimulationContext::new(market(30), 1);
        let report = ctx.run(&source).unwrap();
        assert!(report.fee_ledger.arbitrage.in_y > 0.0);
        assert_eq!(report.fee_ledger.noise.in_y, 0.0);
        assert!((report.fees - report.fee_ledger.total().in_y).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_trade_is_counted() {
        let market = market(30).with_noise_unit(NoiseUnit::Outcome);
        let source = FixedTicks::from_prices(&[0.5, 0.5], &[(0, 1e9), (1, 10.0)]);
        let mut ctx = SimulationContext::new(market, 4);
        let report = ctx.run(&source).unwrap();
        // Selling 1e9 always fills; buying it never does
        assert_eq!(report.trades + report.rejected_trades, 2);
        assert_eq!(report.ticks, 2);
    }

    #[test]
    fn test_same_seed_same_report() {
        let prices: Vec<f64> = (0..200).map(|i| 0.5 + 0.2 * (i as f64 * 0.1).cos()).collect();
        let trades: Vec<(u64, f64)> = (0..200).step_by(3).map(|t| (t, 40.0)).collect();
        let source = FixedTicks::from_prices(&prices, &trades);

        let a = SimulationContext::new(market(10), 21).run(&source).unwrap();
        let b = SimulationContext::new(market(10), 21).run(&source).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trades, trades.len() as u64);
    }

    #[test]
    fn test_bad_price_aborts_run() {
        let source = FixedTicks::from_prices(&[0.5, 1.2], &[]);
        let mut ctx = SimulationContext::new(market(30), 1);
        assert!(ctx.run(&source).is_err());
        assert_eq!(ctx.tick(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let ctx = SimulationContext::new(market(30), 1);
        let json = serde_json::to_string(&ctx.report()).unwrap();
        let parsed: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.ticks, 0);
        assert!(json.contains("\"rejected_trades\":0"));
    }
}
