//! Bonding Curve Calculator
//!
//! Pure math for the invariant curve `(x + L) * y = L^2`. No state, no fees
//! beyond the closed-form helpers at the bottom.
//!
//! `x` is the outcome-token reserve, `y` the base-asset reserve and `L` the
//! liquidity parameter. The implied probability is `y / (x + L)`, which on
//! the curve equals `(y / L)^2`.

use synstation_core::constants::MIN_BASE_RESERVE;
use synstation_core::{BuyCap, BuyFee, FeeBps};

/// Liquidity parameter for a pool seeded with `reserve_x` at probability `p`.
///
/// Formula: L = x * sqrt(p) / (1 - sqrt(p))
pub fn liquidity_parameter(reserve_x: f64, probability: f64) -> f64 {
    let root = probability.sqrt();
    reserve_x * root / (1.0 - root)
}

/// Base-asset reserve on the curve for a given outcome reserve.
///
/// Formula: y = L^2 / (x + L)
pub fn base_reserve(reserve_x: f64, liquidity: f64) -> f64 {
    liquidity * liquidity / (reserve_x + liquidity)
}

/// Outcome reserve on the curve for a given base-asset reserve.
///
/// Formula: x = L^2 / y - L
pub fn outcome_reserve(reserve_y: f64, liquidity: f64) -> f64 {
    liquidity * liquidity / reserve_y - liquidity
}

/// Implied probability `y / (x + L)`, clamped to `[0, 1]`
pub fn implied_probability(reserve_x: f64, reserve_y: f64, liquidity: f64) -> f64 {
    let denom = reserve_x + liquidity;
    if denom <= 0.0 {
        return 0.0;
    }
    (reserve_y / denom).clamp(0.0, 1.0)
}

/// Reserves `(x, y)` at which the curve prices the outcome at `probability`.
///
/// y = clip(L * sqrt(p), 1, L), x = L^2 / y - L
pub fn reserves_at_probability(probability: f64, liquidity: f64) -> (f64, f64) {
    let floor = MIN_BASE_RESERVE.min(liquidity);
    let reserve_y = (liquidity * probability.max(0.0).sqrt()).clamp(floor, liquidity);
    (outcome_reserve(reserve_y, liquidity), reserve_y)
}

/// Deviation of `(x + L) * y` from `L^2`, relative to `L^2`
pub fn invariant_error(reserve_x: f64, reserve_y: f64, liquidity: f64) -> f64 {
    let k = liquidity * liquidity;
    if k == 0.0 {
        return 0.0;
    }
    ((reserve_x + liquidity) * reserve_y - k).abs() / k
}

/// Fee charged on top of a buy that moves the base reserve by `curve_cost`.
pub fn buy_fee(curve_cost: f64, fee: FeeBps, convention: BuyFee) -> f64 {
    let rate = fee.rate();
    match convention {
        BuyFee::GrossUp => {
            if rate >= 1.0 {
                return f64::INFINITY;
            }
            curve_cost * rate / (1.0 - rate)
        }
        BuyFee::Net => curve_cost * rate,
    }
}

/// Largest number of outcome tokens one buy may take out of `reserve_x`.
pub fn max_buy(reserve_x: f64, fee: FeeBps, cap: BuyCap, precision: f64) -> f64 {
    let margin = match cap {
        BuyCap::Precision => precision,
        BuyCap::FeeAdjusted => fee.rate(),
    };
    (reserve_x * (1.0 - margin)).max(0.0)
}

/// Mark-to-market value of a position: `y + x * price`
pub fn position_value(reserve_x: f64, reserve_y: f64, price: f64) -> f64 {
    reserve_y + reserve_x * price
}
