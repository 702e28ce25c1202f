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

//! Conversions between fixed-point integers, raw on-chain amounts and human-readable decimals.
//!
//! All conversions use integer arithmetic only; nothing passes through `f64`.

use std::str::FromStr;

use alloy_primitives::{I256, Sign, U256};
use rust_decimal::Decimal;

use crate::{bmath, error::BMathError};

/// The number of decimals of the fixed-point representation.
pub const BNUM_DECIMALS: u32 = 18;

/// Converts a raw unsigned on-chain value into the signed fixed-point domain.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if `value` exceeds `I256::MAX`.
pub fn u256_to_bnum(value: U256) -> Result<I256, BMathError> {
    I256::checked_from_sign_and_abs(Sign::Positive, value).ok_or(BMathError::Overflow("u256_to_bnum"))
}

/// Converts a non-negative fixed-point value back to a raw unsigned on-chain value.
///
/// # Errors
///
/// Returns [`BMathError::Underflow`] if `value` is negative.
pub fn bnum_to_u256(value: I256) -> Result<U256, BMathError> {
    if value.is_negative() {
        return Err(BMathError::Underflow("bnum_to_u256"));
    }
    Ok(value.unsigned_abs())
}

/// Renders `value / 10^decimals` as an exact decimal string.
///
/// Trailing fractional zeros are trimmed and the `.` is dropped for whole values.
///
/// # Examples
/// - value=1_000_000_000_000_000_000, decimals=18 -> "1"
/// - value=-12345, decimals=6 -> "-0.012345"
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if `decimals` exceeds 76.
pub fn to_decimal_string(value: I256, decimals: u8) -> Result<String, BMathError> {
    let sign = if value.is_negative() { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    if decimals == 0 {
        return Ok(format!("{sign}{magnitude}"));
    }

    let denom = bmath::pow10(u32::from(decimals))?.unsigned_abs();
    let int_part = magnitude / denom;
    let frac = magnitude % denom;

    let digits = frac.to_string();
    let width = usize::from(decimals);
    let mut frac_str = String::with_capacity(width);
    for _ in digits.len()..width {
        frac_str.push('0');
    }
    frac_str.push_str(&digits);

    let frac_str = frac_str.trim_end_matches('0');
    if frac_str.is_empty() {
        Ok(format!("{sign}{int_part}"))
    } else {
        Ok(format!("{sign}{int_part}.{frac_str}"))
    }
}

/// Parses a decimal string such as `"1.25"` into an integer scaled by `10^decimals`.
///
/// # Errors
///
/// Returns an error if:
/// - `s` is empty or contains anything other than an optional sign, digits and one `.`.
/// - `s` has more than `decimals` fractional digits.
/// - The scaled value does not fit in 256 bits.
pub fn parse_decimal_str(s: &str, decimals: u8) -> Result<I256, BMathError> {
    let trimmed = s.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (Sign::Negative, rest),
        None => (
            Sign::Positive,
            trimmed.strip_prefix('+').unwrap_or(trimmed),
        ),
    };
    let (int_str, frac_str) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if int_str.is_empty() && frac_str.is_empty() {
        return Err(BMathError::InvalidDecimal(format!("'{s}' has no digits")));
    }
    if !int_str.bytes().all(|b| b.is_ascii_digit()) || !frac_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(BMathError::InvalidDecimal(format!("'{s}' is not a decimal number")));
    }
    if frac_str.len() > usize::from(decimals) {
        return Err(BMathError::InvalidDecimal(format!(
            "'{s}' has more than {decimals} fractional digits"
        )));
    }

    let mut combined = String::with_capacity(int_str.len() + usize::from(decimals));
    combined.push_str(int_str);
    combined.push_str(frac_str);
    for _ in frac_str.len()..usize::from(decimals) {
        combined.push('0');
    }

    let magnitude = U256::from_str(&combined)
        .map_err(|_| BMathError::Overflow("parse_decimal_str"))?;
    I256::checked_from_sign_and_abs(sign, magnitude).ok_or(BMathError::Overflow("parse_decimal_str"))
}

/// Converts a [`Decimal`] (e.g. a USD price) to an 18-decimal fixed-point value.
///
/// Digits beyond the 18th decimal are floored away.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the rescaled mantissa does not fit in 256 bits.
pub fn decimal_to_bnum(value: Decimal) -> Result<I256, BMathError> {
    let mantissa =
        I256::try_from(value.mantissa()).map_err(|_| BMathError::Overflow("decimal_to_bnum"))?;
    let places = BNUM_DECIMALS as i32 - value.scale() as i32;
    bmath::scale(mantissa, places)
}

/// Converts an 18-decimal fixed-point value to a normalized [`Decimal`].
///
/// # Errors
///
/// Returns an error if `value` exceeds the 96-bit mantissa of [`Decimal`].
pub fn bnum_to_decimal(value: I256) -> Result<Decimal, BMathError> {
    let mantissa = i128::try_from(value).map_err(|_| BMathError::Overflow("bnum_to_decimal"))?;
    Decimal::try_from_i128_with_scale(mantissa, BNUM_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| BMathError::InvalidDecimal(e.to_string()))
}

/// Renders a fixed-point value as a decimal string with 18 decimals of precision.
///
/// # Errors
///
/// See [`to_decimal_string`].
pub fn format_bnum(value: I256) -> Result<String, BMathError> {
    to_decimal_string(value, BNUM_DECIMALS as u8)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    fn bn(value: &str) -> I256 {
        I256::from_str(value).unwrap()
    }

    #[rstest]
    #[case("1000000000000000000", 18, "1")]
    #[case("12345", 6, "0.012345")]
    #[case("-12345", 6, "-0.012345")]
    #[case("120000", 5, "1.2")]
    #[case("42", 10, "0.0000000042")]
    #[case("42", 0, "42")]
    #[case("0", 18, "0")]
    fn test_to_decimal_string(#[case] value: &str, #[case] decimals: u8, #[case] expected: &str) {
        assert_eq!(to_decimal_string(bn(value), decimals).unwrap(), expected);
    }

    #[rstest]
    #[case("1.25", 18, "1250000000000000000")]
    #[case("0.000001", 6, "1")]
    #[case("-3", 2, "-300")]
    #[case("+7.5", 1, "75")]
    #[case(".5", 1, "5")]
    #[case("10.", 1, "100")]
    fn test_parse_decimal_str(#[case] s: &str, #[case] decimals: u8, #[case] expected: &str) {
        assert_eq!(parse_decimal_str(s, decimals).unwrap(), bn(expected));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("1.2.3")]
    #[case("abc")]
    #[case("1.0000001")]
    fn test_parse_decimal_str_invalid(#[case] s: &str) {
        assert!(matches!(
            parse_decimal_str(s, 6),
            Err(BMathError::InvalidDecimal(_))
        ));
    }

    #[rstest]
    fn test_parse_then_format_is_stable() {
        let value = parse_decimal_str("1234.5678", 18).unwrap();
        assert_eq!(format_bnum(value).unwrap(), "1234.5678");
    }

    #[rstest]
    fn test_u256_conversions() {
        let raw = U256::from(1_000_000u64);
        let value = u256_to_bnum(raw).unwrap();
        assert_eq!(value, bn("1000000"));
        assert_eq!(bnum_to_u256(value).unwrap(), raw);
        assert_eq!(
            bnum_to_u256(bn("-1")),
            Err(BMathError::Underflow("bnum_to_u256"))
        );
        assert_eq!(
            u256_to_bnum(U256::MAX),
            Err(BMathError::Overflow("u256_to_bnum"))
        );
    }

    #[rstest]
    #[case(dec!(1.5), "1500000000000000000")]
    #[case(dec!(0.000000000000000001), "1")]
    #[case(dec!(-2), "-2000000000000000000")]
    #[case(dec!(0.0000000000000000015), "1")]
    fn test_decimal_to_bnum(#[case] value: Decimal, #[case] expected: &str) {
        assert_eq!(decimal_to_bnum(value).unwrap(), bn(expected));
    }

    #[rstest]
    fn test_bnum_to_decimal() {
        assert_eq!(bnum_to_decimal(bn("1500000000000000000")).unwrap(), dec!(1.5));
        assert_eq!(bnum_to_decimal(bn("-250000000000000000")).unwrap(), dec!(-0.25));
        assert!(bnum_to_decimal(I256::MAX).is_err());
    }
}
