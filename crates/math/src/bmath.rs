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

//! The 18-decimal fixed-point engine.
//!
//! Every function reproduces the rounding of the Balancer `BNum` library: multiplication and
//! division round half-up at the 18th decimal and the final integer division floors toward
//! negative infinity. Products are formed in 512-bit precision before narrowing back to
//! [`I256`], so intermediate overflow cannot occur.

use alloy_primitives::{I256, Signed, U256, U512};

use crate::error::BMathError;

/// The fixed-point representation of one unit (10^18).
pub const BONE: I256 = I256::from_raw(U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]));

/// The default convergence bound for [`pow_approx`] (`BONE / 10^10`).
pub const BPOW_PRECISION: I256 = I256::from_raw(U256::from_limbs([100_000_000, 0, 0, 0]));

/// The largest power of ten representable by [`I256`] is `10^76`.
const MAX_SCALE_EXPONENT: u32 = 76;

type I512 = Signed<512, 8>;

const fn wide(value: u64) -> I512 {
    I512::from_raw(U512::from_limbs([value, 0, 0, 0, 0, 0, 0, 0]))
}

const BONE_WIDE: I512 = wide(1_000_000_000_000_000_000);
const HALF_BONE_WIDE: I512 = wide(500_000_000_000_000_000);
const TWO_WIDE: I512 = wide(2);

fn widen(value: I256) -> I512 {
    let magnitude = I512::from_raw(U512::from(value.unsigned_abs()));
    if value.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

fn narrow(value: I512, op: &'static str) -> Result<I256, BMathError> {
    let (sign, abs) = value.into_sign_and_abs();
    if abs > U512::from(U256::MAX) {
        return Err(BMathError::Overflow(op));
    }
    I256::checked_from_sign_and_abs(sign, U256::from(abs)).ok_or(BMathError::Overflow(op))
}

/// Integer division rounding toward negative infinity.
fn floor_div(a: I512, b: I512, op: &'static str) -> Result<I512, BMathError> {
    if b.is_zero() {
        return Err(BMathError::DivisionByZero(op));
    }
    let quotient = a.checked_div(b).ok_or(BMathError::Overflow(op))?;
    let remainder = a.checked_rem(b).ok_or(BMathError::Overflow(op))?;
    if !remainder.is_zero() && remainder.is_negative() != b.is_negative() {
        quotient
            .checked_sub(I512::ONE)
            .ok_or(BMathError::Overflow(op))
    } else {
        Ok(quotient)
    }
}

/// Integer division truncating toward zero.
fn trunc_div(a: I512, b: I512, op: &'static str) -> Result<I512, BMathError> {
    if b.is_zero() {
        return Err(BMathError::DivisionByZero(op));
    }
    a.checked_div(b).ok_or(BMathError::Overflow(op))
}

fn product(a: I256, b: I256, op: &'static str) -> Result<I512, BMathError> {
    widen(a)
        .checked_mul(widen(b))
        .ok_or(BMathError::Overflow(op))
}

/// Returns the whole-unit part of `a`, i.e. `floor(a / BONE)`.
///
/// Negative values round down (`-1.5` becomes `-2`), not toward zero.
#[must_use]
pub fn to_int(a: I256) -> I256 {
    let quotient = a / BONE;
    if (a % BONE).is_negative() {
        quotient - I256::ONE
    } else {
        quotient
    }
}

/// Rounds `a` down to the nearest whole unit, keeping the fixed-point scale.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the floored value is below `I256::MIN`.
pub fn floor(a: I256) -> Result<I256, BMathError> {
    to_int(a)
        .checked_mul(BONE)
        .ok_or(BMathError::Overflow("floor"))
}

/// Returns `(|a - b|, b > a)`.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the absolute difference exceeds 256 bits.
pub fn sub_sign(a: I256, b: I256) -> Result<(I256, bool), BMathError> {
    let diff = widen(a)
        .checked_sub(widen(b))
        .ok_or(BMathError::Overflow("sub_sign"))?;
    let negative = diff.is_negative();
    let magnitude = if negative { -diff } else { diff };
    Ok((narrow(magnitude, "sub_sign")?, negative))
}

/// Adds two fixed-point values.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the sum does not fit in 256 bits.
pub fn add(a: I256, b: I256) -> Result<I256, BMathError> {
    a.checked_add(b).ok_or(BMathError::Overflow("add"))
}

/// Subtracts `b` from `a` under the contract's unsigned semantics.
///
/// # Errors
///
/// Returns [`BMathError::Underflow`] if `b > a`.
pub fn sub(a: I256, b: I256) -> Result<I256, BMathError> {
    match sub_sign(a, b)? {
        (_, true) => Err(BMathError::Underflow("sub")),
        (c, false) => Ok(c),
    }
}

/// Multiplies two fixed-point values, rounding half-up: `floor((a * b + BONE / 2) / BONE)`.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the result does not fit in 256 bits.
pub fn mul(a: I256, b: I256) -> Result<I256, BMathError> {
    let c0 = product(a, b, "mul")?;
    let c1 = c0
        .checked_add(HALF_BONE_WIDE)
        .ok_or(BMathError::Overflow("mul"))?;
    narrow(floor_div(c1, BONE_WIDE, "mul")?, "mul")
}

/// Multiplies like [`mul`] but truncates toward zero in the final division.
///
/// For the non-negative operands used by every pool and campaign calculation the two
/// functions are identical; they only diverge when the rounded product is negative.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the result does not fit in 256 bits.
pub fn mul_exact(a: I256, b: I256) -> Result<I256, BMathError> {
    let c0 = product(a, b, "mul_exact")?;
    let c1 = c0
        .checked_add(HALF_BONE_WIDE)
        .ok_or(BMathError::Overflow("mul_exact"))?;
    narrow(trunc_div(c1, BONE_WIDE, "mul_exact")?, "mul_exact")
}

/// Divides two fixed-point values, rounding half-up: `floor((a * BONE + floor(b / 2)) / b)`.
///
/// # Errors
///
/// Returns an error if:
/// - `b` is zero ([`BMathError::DivisionByZero`]).
/// - The quotient does not fit in 256 bits ([`BMathError::Overflow`]).
pub fn div(a: I256, b: I256) -> Result<I256, BMathError> {
    if b.is_zero() {
        return Err(BMathError::DivisionByZero("div"));
    }
    let divisor = widen(b);
    let c0 = widen(a)
        .checked_mul(BONE_WIDE)
        .ok_or(BMathError::Overflow("div"))?;
    let c1 = c0
        .checked_add(floor_div(divisor, TWO_WIDE, "div")?)
        .ok_or(BMathError::Overflow("div"))?;
    narrow(floor_div(c1, divisor, "div")?, "div")
}

/// Raises `a` to the whole power `n` by repeated squaring.
///
/// The squaring order matches the contract exactly: the accumulator starts at `a` for odd
/// `n` (otherwise `BONE`), then each halving of `n` squares `a` and folds it into the
/// accumulator when the remaining `n` is odd.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if an intermediate square does not fit in 256 bits.
pub fn pow_int(a: I256, n: u64) -> Result<I256, BMathError> {
    let mut base = a;
    let mut z = if n % 2 == 0 { BONE } else { a };
    let mut n = n / 2;
    while n != 0 {
        base = mul(base, base)?;
        if n % 2 != 0 {
            z = mul(z, base)?;
        }
        n /= 2;
    }
    Ok(z)
}

/// One term of the binomial series used by [`pow_approx`].
#[derive(Clone, Copy, Debug)]
struct SeriesTerm {
    k: u64,
    magnitude: I256,
    negative: bool,
}

impl SeriesTerm {
    const FIRST: Self = Self {
        k: 0,
        magnitude: BONE,
        negative: false,
    };

    /// Derives term `k + 1` from this one.
    ///
    /// The sign of the new term is this term's sign flipped once for a negative base offset
    /// and once more for a negative binomial factor.
    fn next(self, exp: I256, x: I256, x_negative: bool) -> Result<Self, BMathError> {
        let k = self.k + 1;
        let big_k = I256::from_raw(U256::from(k))
            .checked_mul(BONE)
            .ok_or(BMathError::Overflow("pow_approx"))?;
        let (c, c_negative) = sub_sign(exp, sub(big_k, BONE)?)?;
        let magnitude = div(mul(self.magnitude, mul(c, x)?)?, big_k)?;
        Ok(Self {
            k,
            magnitude,
            negative: self.negative ^ x_negative ^ c_negative,
        })
    }
}

/// Approximates `base^exp` for a fractional `exp` with the binomial series around
/// `base - BONE`.
///
/// Terms are accumulated until one rounds to zero or the previous term fell below
/// `precision`. The series only converges for `0 < base < 2 * BONE`.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the series diverges past 256 bits.
pub fn pow_approx(base: I256, exp: I256, precision: I256) -> Result<I256, BMathError> {
    let (x, x_negative) = sub_sign(base, BONE)?;
    let mut term = SeriesTerm::FIRST;
    let mut sum = BONE;

    while term.magnitude >= precision {
        let next = term.next(exp, x, x_negative)?;
        if next.magnitude.is_zero() {
            break;
        }
        sum = if next.negative {
            sum.checked_sub(next.magnitude)
        } else {
            sum.checked_add(next.magnitude)
        }
        .ok_or(BMathError::Overflow("pow_approx"))?;
        term = next;
    }

    log::trace!("pow_approx({base}, {exp}) summed {} terms", term.k);
    Ok(sum)
}

/// Raises `base` to the fixed-point power `exp`.
///
/// The whole part of `exp` is handled by [`pow_int`]; a non-zero fractional remainder is
/// approximated by [`pow_approx`] at [`BPOW_PRECISION`] and multiplied in. An exponent with
/// no fractional part skips the approximation entirely.
///
/// # Errors
///
/// Returns an error if:
/// - `exp` is negative ([`BMathError::NegativeExponent`]).
/// - Any intermediate step overflows ([`BMathError::Overflow`]).
pub fn pow(base: I256, exp: I256) -> Result<I256, BMathError> {
    if exp.is_negative() {
        return Err(BMathError::NegativeExponent(exp));
    }
    let whole = floor(exp)?;
    let remain = exp
        .checked_sub(whole)
        .ok_or(BMathError::Overflow("pow"))?;

    let whole_units = to_int(whole).unsigned_abs();
    if whole_units > U256::from(u64::MAX) {
        return Err(BMathError::Overflow("pow"));
    }
    let whole_pow = pow_int(base, whole_units.to::<u64>())?;

    if remain.is_zero() {
        return Ok(whole_pow);
    }

    let partial_result = pow_approx(base, remain, BPOW_PRECISION)?;
    mul(whole_pow, partial_result)
}

/// Returns `10^exponent` as an [`I256`].
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if `exponent` exceeds 76.
pub fn pow10(exponent: u32) -> Result<I256, BMathError> {
    if exponent > MAX_SCALE_EXPONENT {
        return Err(BMathError::Overflow("pow10"));
    }
    let ten = I256::from_raw(U256::from(10u8));
    let mut p = I256::ONE;
    for _ in 0..exponent {
        p = p.checked_mul(ten).ok_or(BMathError::Overflow("pow10"))?;
    }
    Ok(p)
}

/// Rescales `value` by `10^decimal_places`.
///
/// Positive places multiply, negative places floor-divide, e.g. a 6-decimal stablecoin
/// amount is brought to 18 decimals with `scale(amount, 12)`.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the scale factor or the result does not fit in
/// 256 bits.
pub fn scale(value: I256, decimal_places: i32) -> Result<I256, BMathError> {
    let factor = pow10(decimal_places.unsigned_abs())?;
    if decimal_places >= 0 {
        value
            .checked_mul(factor)
            .ok_or(BMathError::Overflow("scale"))
    } else {
        narrow(floor_div(widen(value), widen(factor), "scale")?, "scale")
    }
}

/// Returns the smaller of `a` and `b`.
#[must_use]
pub fn min(a: I256, b: I256) -> I256 {
    a.min(b)
}

/// Returns the larger of `a` and `b`.
#[must_use]
pub fn max(a: I256, b: I256) -> I256 {
    a.max(b)
}

/// Returns `units` whole units in fixed-point form.
///
/// # Errors
///
/// Returns [`BMathError::Overflow`] if the scaled value does not fit in 256 bits.
pub fn from_units(units: i128) -> Result<I256, BMathError> {
    I256::try_from(units)
        .map_err(|_| BMathError::Overflow("from_units"))?
        .checked_mul(BONE)
        .ok_or(BMathError::Overflow("from_units"))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
