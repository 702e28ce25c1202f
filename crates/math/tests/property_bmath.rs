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

//! Property-based tests for the fixed-point engine.
//!
//! These tests verify algebraic properties that must hold for every non-negative operand,
//! matching the token amounts, balances and rewards the engine is used with:
//! - `BONE` is the identity for `mul` and `div`
//! - `div` undoes `mul` within one wei
//! - `to_int` floors
//! - `sub_sign` always returns a non-negative magnitude

use alloy_primitives::{I256, U256};
use defi_sdk_math::bmath::{self, BONE};
use proptest::prelude::*;
use rstest::rstest;

fn bnum(value: u128) -> I256 {
    I256::from_raw(U256::from(value))
}

/// Non-negative amounts up to 10^12 whole units.
fn amount_strategy() -> impl Strategy<Value = I256> {
    (0u128..=1_000_000_000_000_000_000_000_000_000_000u128).prop_map(bnum)
}

/// Divisors between one and a million whole units.
fn divisor_strategy() -> impl Strategy<Value = I256> {
    (1_000_000_000_000_000_000u128..=1_000_000_000_000_000_000_000_000u128).prop_map(bnum)
}

proptest! {
    #[rstest]
    fn mul_by_one_is_identity(a in amount_strategy()) {
        prop_assert_eq!(bmath::mul(a, BONE).unwrap(), a);
    }

    #[rstest]
    fn mul_exact_matches_mul_for_non_negative(a in amount_strategy(), b in amount_strategy()) {
        prop_assert_eq!(bmath::mul_exact(a, b).unwrap(), bmath::mul(a, b).unwrap());
    }

    #[rstest]
    fn div_by_one_is_identity(a in amount_strategy()) {
        prop_assert_eq!(bmath::div(a, BONE).unwrap(), a);
    }

    #[rstest]
    fn div_undoes_mul_within_one_wei(a in amount_strategy(), b in divisor_strategy()) {
        let product = bmath::mul(a, b).unwrap();
        let back = bmath::div(product, b).unwrap();
        let (error, _) = bmath::sub_sign(back, a).unwrap();
        prop_assert!(error <= I256::ONE, "a={}, b={}, back={}", a, b, back);
    }

    #[rstest]
    fn to_int_floors(units in 0u64..=1_000_000_000, remainder in 0u64..1_000_000_000_000_000_000) {
        let value = bnum(u128::from(units) * 1_000_000_000_000_000_000 + u128::from(remainder));
        prop_assert_eq!(bmath::to_int(value), bnum(u128::from(units)));
        prop_assert_eq!(bmath::floor(value).unwrap(), bnum(u128::from(units) * 1_000_000_000_000_000_000));
    }

    #[rstest]
    fn sub_sign_magnitude_is_non_negative(a in amount_strategy(), b in amount_strategy()) {
        let (magnitude, negative) = bmath::sub_sign(a, b).unwrap();
        prop_assert!(!magnitude.is_negative());
        prop_assert_eq!(negative, b > a);
        if negative {
            prop_assert_eq!(magnitude, b - a);
        } else {
            prop_assert_eq!(magnitude, a - b);
        }
    }

    #[rstest]
    fn pow_int_zero_is_one(a in amount_strategy()) {
        prop_assert_eq!(bmath::pow_int(a, 0).unwrap(), BONE);
    }

    #[rstest]
    fn pow_with_whole_one_is_identity(a in amount_strategy()) {
        prop_assert_eq!(bmath::pow(a, BONE).unwrap(), a);
    }

    #[rstest]
    fn pow_fraction_stays_between_base_and_one(
        base in 500_000_000_000_000_000u128..1_500_000_000_000_000_000u128,
        exp in 1u128..1_000_000_000_000_000_000u128,
    ) {
        // For 0 < exp < 1 the result lies between base and one (within rounding).
        let base = bnum(base);
        let result = bmath::pow(base, bnum(exp)).unwrap();
        let tolerance = bnum(1_000_000_000);
        let low = bmath::min(base, BONE) - tolerance;
        let high = bmath::max(base, BONE) + tolerance;
        prop_assert!(result >= low && result <= high, "base={}, result={}", base, result);
    }
}
