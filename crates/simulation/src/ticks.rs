//! Tick Sources
//!
//! A tick source yields one `TickEvent` per simulated block: the external
//! probability the arbitrageur trades toward, and the size of the noise trade
//! arriving in that block, if any. Sources are finite and restartable; each
//! call to `ticks` starts the same sequence again from the first block.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use synstation_core::{CurveError, Result, SimulationConfig};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Width of the underlying-price band mapped onto [0, 1], in standard
/// deviations over the whole period
const PRICE_BAND_SIGMAS: f64 = 2.0;

/// One simulated block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub tick: u64,
    /// External probability of the yes outcome, in [0, 1]
    pub external_price: f64,
    /// Noise trade arriving in this block
    pub trade_size: Option<f64>,
}

pub trait TickSource {
    /// A fresh pass over the sequence, starting at the first block.
    fn ticks(&self) -> Box<dyn Iterator<Item = TickEvent> + '_>;

    /// Number of blocks in one pass
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fixed, pre-computed sequence of ticks
#[derive(Debug, Clone, Default)]
pub struct FixedTicks {
    events: Vec<TickEvent>,
}

impl FixedTicks {
    pub fn new(events: Vec<TickEvent>) -> Self {
        Self { events }
    }

    /// One tick per price, with trades placed at the given ticks.
    ///
    /// Trades past the end of the price path are dropped.
    pub fn from_prices(prices: &[f64], trades: &[(u64, f64)]) -> Self {
        let mut events: Vec<TickEvent> = prices
            .iter()
            .enumerate()
            .map(|(tick, &external_price)| TickEvent {
                tick: tick as u64,
                external_price,
                trade_size: None,
            })
            .collect();
        for &(tick, size) in trades {
            if let Some(event) = events.get_mut(tick as usize) {
                event.trade_size = Some(size);
            }
        }
        Self { events }
    }

    pub fn events(&self) -> &[TickEvent] {
        &self.events
    }
}

impl TickSource for FixedTicks {
    fn ticks(&self) -> Box<dyn Iterator<Item = TickEvent> + '_> {
        Box::new(self.events.iter().copied())
    }

    fn len(&self) -> u64 {
        self.events.len() as u64
    }
}

/// Geometric Brownian motion price path with Poisson noise-trade arrivals.
///
/// The underlying price `S` follows `S0 * exp(W)` with per-block volatility
/// `sigma * sqrt(block_time / day)`. It is mapped to a probability linearly
/// over `[S0 * exp(-2 sigma sqrt(T)), 2 S0 - lower]` and clipped to [0, 1].
/// Each block carries a trade with probability `1 - exp(-lambda)`, sized
/// uniformly in `[min_size, max_size]`.
#[derive(Debug, Clone)]
pub struct GbmPoissonTicks {
    ticks: u64,
    initial_price: f64,
    step_volatility: f64,
    band_low: f64,
    band_high: f64,
    arrival_probability: f64,
    min_size: f64,
    max_size: f64,
    seed: u64,
}

impl GbmPoissonTicks {
    pub fn from_config(config: &SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let band_low = config.initial_price
            * (-config.daily_volatility * config.period_days.sqrt() * PRICE_BAND_SIGMAS).exp();
        let band_high = 2.0 * config.initial_price - band_low;
        if band_high <= band_low {
            return Err(CurveError::InvalidConfiguration {
                reason: "daily_volatility must be positive to map prices onto [0, 1]".to_string(),
            });
        }

        let arrival_rate = config.daily_transactions / SECONDS_PER_DAY * config.block_time_secs;
        Ok(Self {
            ticks: config.ticks(),
            initial_price: config.initial_price,
            step_volatility: config.daily_volatility
                * (config.block_time_secs / SECONDS_PER_DAY).sqrt(),
            band_low,
            band_high,
            arrival_probability: 1.0 - (-arrival_rate).exp(),
            min_size: config.min_trade_size,
            max_size: config.max_trade_size,
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Probability a given block carries a noise trade
    pub fn arrival_probability(&self) -> f64 {
        self.arrival_probability
    }

    fn to_probability(&self, price: f64) -> f64 {
        ((price - self.band_low) / (self.band_high - self.band_low)).clamp(0.0, 1.0)
    }
}

impl TickSource for GbmPoissonTicks {
    fn ticks(&self) -> Box<dyn Iterator<Item = TickEvent> + '_> {
        Box::new(GbmPoissonIter {
            source: self,
            rng: StdRng::seed_from_u64(self.seed),
            tick: 0,
            log_return: 0.0,
        })
    }

    fn len(&self) -> u64 {
        self.ticks
    }
}

struct GbmPoissonIter<'a> {
    source: &'a GbmPoissonTicks,
    rng: StdRng,
    tick: u64,
    log_return: f64,
}

impl Iterator for GbmPoissonIter<'_> {
    type Item = TickEvent;

    fn next(&mut self) -> Option<TickEvent> {
        let source = self.source;
        if self.tick >= source.ticks {
            return None;
        }

        let shock: f64 = self.rng.sample(StandardNormal);
        self.log_return += source.step_volatility * shock;
        let price = source.initial_price * self.log_return.exp();

        let trade_size = if self.rng.gen::<f64>() < source.arrival_probability {
            Some(if source.max_size > source.min_size {
                self.rng.gen_range(source.min_size..source.max_size)
            } else {
                source.min_size
            })
        } else {
            None
        };

        let event = TickEvent {
            tick: self.tick,
            external_price: source.to_probability(price),
            trade_size,
        };
        self.tick += 1;
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.source.ticks - self.tick) as usize;
        (remaining, Some(remaining))
    }
}
