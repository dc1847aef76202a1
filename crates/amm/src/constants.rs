//! AMM Constants
//!
//! Tolerances and defaults shared by pools and the basket router.

/// Relative slack allowed above a pool's buy cap before a committing trade
/// is rejected. Absorbs float rounding at the edge of the router's bracket.
pub const CAP_TOLERANCE: f64 = 1e-12;

/// Minimum number of pools in a routable basket
pub const MIN_BASKET_SIZE: usize = 2;

/// Grid resolution for `SplitSearch::GridScan` when none is given
pub const DEFAULT_SCAN_POINTS: usize = 1_000;

/// Probability each leg/direction of a binary market's noise trade is picked
pub const NOISE_LEG_PROBABILITY: f64 = 0.25;
