//! Fee-Revenue Simulation
//!
//! Drives a binary market through a sequence of blocks. Each block an
//! arbitrageur pulls both legs toward the external probability, then a noise
//! trader may arrive with a random trade.

pub mod context;
pub mod sweep;
pub mod ticks;

// Re-exports
pub use context::{SimulationContext, SimulationReport, StepOutcome};
pub use sweep::{simulate_once, sweep_fee_rates, FeeRateSummary};
pub use ticks::{FixedTicks, GbmPoissonTicks, TickEvent, TickSource};
