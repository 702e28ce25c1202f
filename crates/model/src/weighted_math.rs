// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Weighted-pool formulas with contract-equivalent rounding.
//!
//! Each function evaluates one closed-form expression of a Balancer-style weighted pool using
//! the `bmath` primitives in the same order as the contract, so the result is identical to the
//! amount a transaction would settle to. Balances and amounts are raw token units, weights are
//! denormalized 18-decimal values and the swap fee is an 18-decimal fraction.

use alloy_primitives::{I256, U256};
use defi_sdk_math::{
    BMathError,
    bmath::{self, BONE},
};

/// Smallest base accepted by [`bounded_pow`] (one wei).
pub const MIN_BPOW_BASE: I256 = I256::from_raw(U256::from_limbs([1, 0, 0, 0]));

/// Largest base accepted by [`bounded_pow`] (`2 * BONE - 1`).
pub const MAX_BPOW_BASE: I256 =
    I256::from_raw(U256::from_limbs([1_999_999_999_999_999_999, 0, 0, 0]));

/// Maximum fraction of the input balance a single swap or join may add.
pub const MAX_IN_RATIO: I256 = I256::from_raw(U256::from_limbs([500_000_000_000_000_000, 0, 0, 0]));

/// Maximum fraction of the output balance a single swap or exit may remove.
pub const MAX_OUT_RATIO: I256 =
    I256::from_raw(U256::from_limbs([333_333_333_333_333_334, 0, 0, 0]));

/// Lowest swap fee a pool accepts (0.0001%).
pub const MIN_FEE: I256 = I256::from_raw(U256::from_limbs([1_000_000_000_000, 0, 0, 0]));

/// Highest swap fee a pool accepts (10%).
pub const MAX_FEE: I256 = I256::from_raw(U256::from_limbs([100_000_000_000_000_000, 0, 0, 0]));

/// Fee charged on pool exits, zero for the supported pools.
pub const EXIT_FEE: I256 = I256::ZERO;

/// Raises `base` to `exp` after checking the base lies in `[MIN_BPOW_BASE, MAX_BPOW_BASE]`.
///
/// The series used for the fractional part of the exponent only converges inside that range.
///
/// # Errors
///
/// Returns [`BMathError::BaseOutOfRange`] if `base` is outside the accepted range, or any
/// error of [`bmath::pow`].
pub fn bounded_pow(base: I256, exp: I256) -> Result<I256, BMathError> {
    if !(MIN_BPOW_BASE..=MAX_BPOW_BASE).contains(&base) {
        return Err(BMathError::BaseOutOfRange(base));
    }
    bmath::pow(base, exp)
}

/// Calculates the spot price of `token_out` in units of `token_in`, including the swap fee.
///
/// `spot = (balance_in / weight_in) / (balance_out / weight_out) * 1 / (1 - swap_fee)`
///
/// # Errors
///
/// Returns an error if a weight or balance is zero, or `swap_fee >= BONE`.
pub fn calc_spot_price(
    balance_in: I256,
    weight_in: I256,
    balance_out: I256,
    weight_out: I256,
    swap_fee: I256,
) -> Result<I256, BMathError> {
    let numer = bmath::div(balance_in, weight_in)?;
    let denom = bmath::div(balance_out, weight_out)?;
    let ratio = bmath::div(numer, denom)?;
    let scale = bmath::div(BONE, bmath::sub(BONE, swap_fee)?)?;
    bmath::mul(ratio, scale)
}

/// Calculates the amount of `token_out` received for swapping in `amount_in`.
///
/// `out = balance_out * (1 - (balance_in / (balance_in + amount_in * (1 - fee))) ^ (weight_in / weight_out))`
///
/// # Errors
///
/// Returns an error if a weight is zero or an intermediate falls outside the engine's domain.
pub fn calc_out_given_in(
    balance_in: I256,
    weight_in: I256,
    balance_out: I256,
    weight_out: I256,
    amount_in: I256,
    swap_fee: I256,
) -> Result<I256, BMathError> {
    let weight_ratio = bmath::div(weight_in, weight_out)?;
    let adjusted_in = bmath::mul(amount_in, bmath::sub(BONE, swap_fee)?)?;
    let y = bmath::div(balance_in, bmath::add(balance_in, adjusted_in)?)?;
    let foo = bounded_pow(y, weight_ratio)?;
    let bar = bmath::sub(BONE, foo)?;
    bmath::mul(balance_out, bar)
}

/// Calculates the amount of `token_in` required to receive exactly `amount_out`.
///
/// `in = balance_in * ((balance_out / (balance_out - amount_out)) ^ (weight_out / weight_in) - 1) / (1 - fee)`
///
/// # Errors
///
/// Returns an error if `amount_out` is not below `balance_out`, a weight is zero, or the
/// balance ratio leaves the range accepted by [`bounded_pow`].
pub fn calc_in_given_out(
    balance_in: I256,
    weight_in: I256,
    balance_out: I256,
    weight_out: I256,
    amount_out: I256,
    swap_fee: I256,
) -> Result<I256, BMathError> {
    let weight_ratio = bmath::div(weight_out, weight_in)?;
    let diff = bmath::sub(balance_out, amount_out)?;
    let y = bmath::div(balance_out, diff)?;
    let foo = bmath::sub(bounded_pow(y, weight_ratio)?, BONE)?;
    let fee_complement = bmath::sub(BONE, swap_fee)?;
    bmath::div(bmath::mul(balance_in, foo)?, fee_complement)
}

/// Calculates the pool tokens minted for a single-asset join of `amount_in`.
///
/// Only the share of the deposit that would have to be swapped into the other assets
/// (`1 - normalized_weight`) pays the swap fee.
///
/// # Errors
///
/// Returns an error if `total_weight` or `balance_in` is zero or the growth ratio leaves the
/// range accepted by [`bounded_pow`].
pub fn calc_pool_out_given_single_in(
    balance_in: I256,
    weight_in: I256,
    pool_supply: I256,
    total_weight: I256,
    amount_in: I256,
    swap_fee: I256,
) -> Result<I256, BMathError> {
    let normalized_weight = bmath::div(weight_in, total_weight)?;
    let zaz = bmath::mul(bmath::sub(BONE, normalized_weight)?, swap_fee)?;
    let amount_in_after_fee = bmath::mul(amount_in, bmath::sub(BONE, zaz)?)?;

    let new_balance_in = bmath::add(balance_in, amount_in_after_fee)?;
    let balance_in_ratio = bmath::div(new_balance_in, balance_in)?;

    let pool_ratio = bounded_pow(balance_in_ratio, normalized_weight)?;
    let new_pool_supply = bmath::mul(pool_ratio, pool_supply)?;
    bmath::sub(new_pool_supply, pool_supply)
}

/// Calculates the amount of a single asset received for burning `pool_amount_in`.
///
/// # Errors
///
/// Returns an error if `pool_amount_in` exceeds `pool_supply`, a weight or the supply is
/// zero, or the supply ratio leaves the range accepted by [`bounded_pow`].
pub fn calc_single_out_given_pool_in(
    balance_out: I256,
    weight_out: I256,
    pool_supply: I256,
    total_weight: I256,
    pool_amount_in: I256,
    swap_fee: I256,
) -> Result<I256, BMathError> {
    let normalized_weight = bmath::div(weight_out, total_weight)?;
    let pool_amount_in_after_exit_fee = bmath::mul(pool_amount_in, bmath::sub(BONE, EXIT_FEE)?)?;
    let new_pool_supply = bmath::sub(pool_supply, pool_amount_in_after_exit_fee)?;
    let pool_ratio = bmath::div(new_pool_supply, pool_supply)?;

    let token_out_ratio = bounded_pow(pool_ratio, bmath::div(BONE, normalized_weight)?)?;
    let new_balance_out = bmath::mul(token_out_ratio, balance_out)?;
    let amount_out_before_fee = bmath::sub(balance_out, new_balance_out)?;

    let zaz = bmath::mul(bmath::sub(BONE, normalized_weight)?, swap_fee)?;
    bmath::mul(amount_out_before_fee, bmath::sub(BONE, zaz)?)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn int(value: i128) -> I256 {
        I256::try_from(value).unwrap()
    }

    fn units(value: i128) -> I256 {
        bmath::from_units(value).unwrap()
    }

    fn fee() -> I256 {
        int(3_000_000_000_000_000)
    }

    #[rstest]
    fn test_ratio_constants() {
        assert_eq!(MAX_BPOW_BASE, bmath::sub(units(2), int(1)).unwrap());
        assert_eq!(MAX_IN_RATIO, bmath::div(BONE, units(2)).unwrap());
        assert_eq!(
            MAX_OUT_RATIO,
            bmath::add(bmath::div(BONE, units(3)).unwrap(), int(1)).unwrap()
        );
    }

    #[rstest]
    #[case(I256::ZERO)]
    #[case(units(2))]
    #[case(int(-1))]
    fn test_bounded_pow_rejects_base(#[case] base: I256) {
        assert_eq!(
            bounded_pow(base, int(500_000_000_000_000_000)),
            Err(BMathError::BaseOutOfRange(base))
        );
    }

    #[rstest]
    fn test_bounded_pow_accepts_upper_bound() {
        assert!(bounded_pow(MAX_BPOW_BASE, BONE).is_ok());
    }

    #[rstest]
    #[case(units(100), units(5), units(200), units(5))]
    #[case(units(1000), units(8), units(500), units(2))]
    fn test_spot_price(
        #[case] balance_in: I256,
        #[case] weight_in: I256,
        #[case] balance_out: I256,
        #[case] weight_out: I256,
    ) {
        let price = calc_spot_price(balance_in, weight_in, balance_out, weight_out, fee()).unwrap();
        assert_eq!(price, int(501_504_513_540_621_866));
    }

    #[rstest]
    fn test_spot_price_mixed_decimals() {
        // 2,000,000 USDC (6 decimals) against 1,000 WETH (18 decimals)
        let price = calc_spot_price(
            int(2_000_000_000_000),
            units(5),
            units(1000),
            units(5),
            fee(),
        )
        .unwrap();
        assert_eq!(price, int(2_006_018_054));
    }

    #[rstest]
    fn test_spot_price_zero_weight_errors() {
        let result = calc_spot_price(units(100), I256::ZERO, units(100), units(5), fee());
        assert!(matches!(result, Err(BMathError::DivisionByZero(_))));
    }

    #[rstest]
    #[case(units(5), units(5), int(1_974_316_068_794_122_600))]
    #[case(units(3), units(2), int(2_954_153_426_482_567_800))]
    fn test_out_given_in(
        #[case] weight_in: I256,
        #[case] weight_out: I256,
        #[case] expected: I256,
    ) {
        let out =
            calc_out_given_in(units(100), weight_in, units(200), weight_out, units(1), fee())
                .unwrap();
        assert_eq!(out, expected);
    }

    #[rstest]
    fn test_out_given_in_mixed_decimals() {
        // 2,000 USDC in for WETH
        let out = calc_out_given_in(
            int(2_000_000_000_000),
            units(5),
            units(1000),
            units(5),
            int(2_000_000_000),
            fee(),
        )
        .unwrap();
        assert_eq!(out, int(996_006_981_039_903_000));
    }

    #[rstest]
    fn test_out_given_in_zero_amount() {
        let out =
            calc_out_given_in(units(100), units(5), units(200), units(5), I256::ZERO, fee())
                .unwrap();
        assert_eq!(out, I256::ZERO);
    }

    #[rstest]
    #[case(units(5), units(5), int(1_013_140_431_395_195_687))]
    #[case(units(3), units(2), int(674_294_946_720_042_628))]
    fn test_in_given_out(
        #[case] weight_in: I256,
        #[case] weight_out: I256,
        #[case] expected: I256,
    ) {
        let amount_in =
            calc_in_given_out(units(100), weight_in, units(200), weight_out, units(2), fee())
                .unwrap();
        assert_eq!(amount_in, expected);
    }

    #[rstest]
    fn test_in_given_out_draining_balance_errors() {
        let result = calc_in_given_out(units(100), units(5), units(200), units(5), units(200), fee());
        assert_eq!(result, Err(BMathError::DivisionByZero("div")));
    }

    #[rstest]
    fn test_in_given_out_exceeds_pow_range() {
        // balance_out / (balance_out - amount_out) == 2
        let result = calc_in_given_out(units(100), units(5), units(200), units(5), units(100), fee());
        assert!(matches!(result, Err(BMathError::BaseOutOfRange(_))));
    }

    #[rstest]
    fn test_pool_out_given_single_in() {
        let out = calc_pool_out_given_single_in(
            units(100),
            units(5),
            units(100),
            units(10),
            units(10),
            fee(),
        )
        .unwrap();
        assert_eq!(out, int(4_873_733_603_880_249_500));
    }

    #[rstest]
    fn test_single_out_given_pool_in() {
        let out = calc_single_out_given_pool_in(
            units(200),
            units(5),
            units(100),
            units(10),
            units(5),
            fee(),
        )
        .unwrap();
        assert_eq!(out, int(19_470_750_000_000_000_000));
    }

    #[rstest]
    fn test_single_out_given_pool_in_more_than_supply_errors() {
        let result = calc_single_out_given_pool_in(
            units(200),
            units(5),
            units(100),
            units(10),
            units(101),
            fee(),
        );
        assert!(matches!(result, Err(BMathError::Underflow(_))));
    }
}
