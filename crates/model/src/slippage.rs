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

//! Slippage bounds for swaps and joins.

use std::fmt::{Display, Formatter};

use alloy_primitives::{I256, U256};
use defi_sdk_math::{
    BMathError,
    bmath::{self, BONE},
};
use serde::{Deserialize, Serialize};

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// A slippage tolerance expressed in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlippageTolerance {
    bps: u32,
    fraction: I256,
}

impl SlippageTolerance {
    /// Creates a new [`SlippageTolerance`] from basis points (50 = 0.5%).
    ///
    /// # Errors
    ///
    /// Returns an error if `bps` exceeds [`BPS_DENOMINATOR`].
    pub fn from_bps(bps: u32) -> anyhow::Result<Self> {
        anyhow::ensure!(
            bps <= BPS_DENOMINATOR,
            "Slippage {bps} bps exceeds {BPS_DENOMINATOR} bps"
        );
        let fraction = bmath::div(
            bmath::from_units(i128::from(bps))?,
            bmath::from_units(i128::from(BPS_DENOMINATOR))?,
        )?;
        Ok(Self { bps, fraction })
    }

    /// Returns the tolerance in basis points.
    #[must_use]
    pub fn bps(&self) -> u32 {
        self.bps
    }

    /// Returns the tolerance as an 18-decimal fraction.
    #[must_use]
    pub fn fraction(&self) -> I256 {
        self.fraction
    }

    /// Returns the smallest acceptable output for a quoted `amount`: `amount * (1 - tolerance)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product overflows.
    pub fn min_amount_out(&self, amount: I256) -> Result<I256, BMathError> {
        bmath::mul(amount, bmath::sub(BONE, self.fraction)?)
    }

    /// Returns the largest acceptable input for a quoted `amount`: `amount * (1 + tolerance)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product overflows.
    pub fn max_amount_in(&self, amount: I256) -> Result<I256, BMathError> {
        bmath::mul(amount, bmath::add(BONE, self.fraction)?)
    }

    /// Returns the worst acceptable spot price after a trade quoted at `spot_price`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product overflows.
    pub fn max_price(&self, spot_price: I256) -> Result<I256, BMathError> {
        self.max_amount_in(spot_price)
    }
}

impl Default for SlippageTolerance {
    /// Creates a new default [`SlippageTolerance`] of 50 bps.
    fn default() -> Self {
        Self {
            bps: 50,
            fraction: I256::from_raw(U256::from_limbs([5_000_000_000_000_000, 0, 0, 0])),
        }
    }
}

impl TryFrom<u32> for SlippageTolerance {
    type Error = anyhow::Error;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps)
    }
}

impl From<SlippageTolerance> for u32 {
    fn from(value: SlippageTolerance) -> Self {
        value.bps
    }
}

impl Display for SlippageTolerance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.bps)
    }
}

/// Caps `amount` at the caller's available `balance`.
#[must_use]
pub fn clamp_to_balance(amount: I256, balance: I256) -> I256 {
    bmath::min(amount, balance)
}
