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

use std::fmt::{Display, Formatter};

use alloy_primitives::{Address, I256, U256};
use anyhow::Context;
use defi_sdk_math::{BMathError, bmath, convert::u256_to_bnum};
use serde::{Deserialize, Serialize};

use crate::{
    token::{PriceMap, Token},
    weighted_math::{
        MAX_FEE, MAX_IN_RATIO, MAX_OUT_RATIO, MIN_FEE, calc_in_given_out, calc_out_given_in,
        calc_pool_out_given_single_in, calc_single_out_given_pool_in, calc_spot_price,
    },
};

/// Minimum number of tokens bound to a weighted pool.
pub const MIN_BOUND_TOKENS: usize = 2;

/// Maximum number of tokens bound to a weighted pool.
pub const MAX_BOUND_TOKENS: usize = 8;

/// A token bound to a weighted pool together with its balance and weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolToken {
    /// The bound token.
    pub token: Token,
    /// The pool's balance in raw token units.
    pub balance: I256,
    /// The denormalized weight as an 18-decimal value.
    pub denorm_weight: I256,
}

impl PoolToken {
    /// Creates a new [`PoolToken`] instance with the specified properties.
    #[must_use]
    pub fn new(token: Token, balance: I256, denorm_weight: I256) -> Self {
        Self {
            token,
            balance,
            denorm_weight,
        }
    }

    /// Creates a [`PoolToken`] from the `uint256` values returned by the pool contract.
    ///
    /// # Errors
    ///
    /// Returns an error if either value does not fit the signed representation.
    pub fn from_raw(token: Token, balance: U256, denorm_weight: U256) -> Result<Self, BMathError> {
        Ok(Self::new(
            token,
            u256_to_bnum(balance)?,
            u256_to_bnum(denorm_weight)?,
        ))
    }
}

/// A snapshot of a weighted pool's on-chain state.
///
/// All quotes are computed with the pool's own formulas, so an amount quoted here equals the
/// amount the pool would settle for the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WeightedPoolFields")]
pub struct WeightedPool {
    /// The blockchain address of the pool contract (also the pool token).
    pub address: Address,
    /// The bound tokens.
    pub tokens: Vec<PoolToken>,
    /// The swap fee as an 18-decimal fraction.
    pub swap_fee: I256,
    /// The total supply of pool tokens (18 decimals).
    pub total_supply: I256,
}

/// The serialized form of a [`WeightedPool`], validated through [`WeightedPool::new`].
#[derive(Debug, Deserialize)]
struct WeightedPoolFields {
    address: Address,
    tokens: Vec<PoolToken>,
    swap_fee: I256,
    total_supply: I256,
}

impl TryFrom<WeightedPoolFields> for WeightedPool {
    type Error = anyhow::Error;

    fn try_from(fields: WeightedPoolFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.address,
            fields.tokens,
            fields.swap_fee,
            fields.total_supply,
        )
    }
}

impl WeightedPool {
    /// Creates a new [`WeightedPool`] instance, validating its bound tokens and fee.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The number of tokens is outside `[MIN_BOUND_TOKENS, MAX_BOUND_TOKENS]`.
    /// - A token is bound twice.
    /// - A weight is not positive or a balance is negative.
    /// - `swap_fee` is outside `[MIN_FEE, MAX_FEE]`.
    /// - `total_supply` is negative.
    pub fn new(
        address: Address,
        tokens: Vec<PoolToken>,
        swap_fee: I256,
        total_supply: I256,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            (MIN_BOUND_TOKENS..=MAX_BOUND_TOKENS).contains(&tokens.len()),
            "Pool {address} must bind between {MIN_BOUND_TOKENS} and {MAX_BOUND_TOKENS} tokens, was {}",
            tokens.len()
        );

        for (i, bound) in tokens.iter().enumerate() {
            if tokens[..i]
                .iter()
                .any(|other| other.token.address == bound.token.address)
            {
                anyhow::bail!("Pool {address} binds {} more than once", bound.token);
            }
            anyhow::ensure!(
                bound.denorm_weight.is_positive(),
                "Pool {address} weight for {} must be positive, was {}",
                bound.token,
                bound.denorm_weight
            );
            anyhow::ensure!(
                !bound.balance.is_negative(),
                "Pool {address} balance for {} must not be negative, was {}",
                bound.token,
                bound.balance
            );
        }

        anyhow::ensure!(
            is_valid_fee(swap_fee),
            "Pool {address} swap fee {swap_fee} outside [{MIN_FEE}, {MAX_FEE}]"
        );
        anyhow::ensure!(
            !total_supply.is_negative(),
            "Pool {address} total supply must not be negative, was {total_supply}"
        );

        Ok(Self {
            address,
            tokens,
            swap_fee,
            total_supply,
        })
    }

    /// Returns the ticker for this pool, e.g. `WETH/USDC`.
    #[must_use]
    pub fn ticker(&self) -> String {
        self.tokens
            .iter()
            .map(|bound| bound.token.symbol.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns the bound token for `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not bound to this pool.
    pub fn token(&self, address: &Address) -> anyhow::Result<&PoolToken> {
        self.tokens
            .iter()
            .find(|bound| bound.token.address == *address)
            .with_context(|| format!("Token {address} is not bound to pool {}", self.address))
    }

    /// Returns the sum of all denormalized weights.
    ///
    /// # Errors
    ///
    /// Returns an error if the sum overflows.
    pub fn total_weight(&self) -> Result<I256, BMathError> {
        self.tokens
            .iter()
            .try_fold(I256::ZERO, |acc, bound| bmath::add(acc, bound.denorm_weight))
    }

    /// Returns the weight of `token` as a fraction of the total weight.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not bound to this pool.
    pub fn normalized_weight(&self, token: &Address) -> anyhow::Result<I256> {
        let bound = self.token(token)?;
        Ok(bmath::div(bound.denorm_weight, self.total_weight()?)?)
    }

    /// Returns the spot price of `token_out` in raw units of `token_in`, including the fee.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is not bound or a balance is zero.
    pub fn spot_price(&self, token_in: &Address, token_out: &Address) -> anyhow::Result<I256> {
        let bound_in = self.token(token_in)?;
        let bound_out = self.token(token_out)?;
        let price = calc_spot_price(
            bound_in.balance,
            bound_in.denorm_weight,
            bound_out.balance,
            bound_out.denorm_weight,
            self.swap_fee,
        )?;
        Ok(price)
    }

    /// Returns the spot price of one whole `token_out` in whole units of `token_in`.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is not bound or a balance is zero.
    pub fn normalized_spot_price(
        &self,
        token_in: &Address,
        token_out: &Address,
    ) -> anyhow::Result<I256> {
        let decimals_in = i32::from(self.token(token_in)?.token.decimals);
        let decimals_out = i32::from(self.token(token_out)?.token.decimals);
        let price = self.spot_price(token_in, token_out)?;
        Ok(bmath::scale(price, decimals_out - decimals_in)?)
    }

    /// Quotes the amount of `token_out` received for swapping in `amount_in`.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is not bound, `amount_in` exceeds `MAX_IN_RATIO` of
    /// the input balance, or the swap formula fails.
    pub fn quote_out_given_in(
        &self,
        token_in: &Address,
        token_out: &Address,
        amount_in: I256,
    ) -> anyhow::Result<I256> {
        let bound_in = self.token(token_in)?;
        let bound_out = self.token(token_out)?;

        let max_in = bmath::mul(bound_in.balance, MAX_IN_RATIO)?;
        anyhow::ensure!(
            amount_in <= max_in,
            "Amount in {amount_in} of {} exceeds max in ratio ({max_in})",
            bound_in.token
        );

        let amount_out = calc_out_given_in(
            bound_in.balance,
            bound_in.denorm_weight,
            bound_out.balance,
            bound_out.denorm_weight,
            amount_in,
            self.swap_fee,
        )
        .with_context(|| format!("Failed to quote {} -> {}", bound_in.token, bound_out.token))?;

        log::trace!(
            "Quoted {amount_in} {} -> {amount_out} {} on pool {}",
            bound_in.token.symbol,
            bound_out.token.symbol,
            self.address
        );
        Ok(amount_out)
    }

    /// Quotes the amount of `token_in` required to receive exactly `amount_out`.
    ///
    /// # Errors
    ///
    /// Returns an error if either token is not bound, `amount_out` exceeds `MAX_OUT_RATIO` of
    /// the output balance, or the swap formula fails.
    pub fn quote_in_given_out(
        &self,
        token_in: &Address,
        token_out: &Address,
        amount_out: I256,
    ) -> anyhow::Result<I256> {
        let bound_in = self.token(token_in)?;
        let bound_out = self.token(token_out)?;

        let max_out = bmath::mul(bound_out.balance, MAX_OUT_RATIO)?;
        anyhow::ensure!(
            amount_out <= max_out,
            "Amount out {amount_out} of {} exceeds max out ratio ({max_out})",
            bound_out.token
        );

        let amount_in = calc_in_given_out(
            bound_in.balance,
            bound_in.denorm_weight,
            bound_out.balance,
            bound_out.denorm_weight,
            amount_out,
            self.swap_fee,
        )
        .with_context(|| format!("Failed to quote {} <- {}", bound_in.token, bound_out.token))?;

        log::trace!(
            "Quoted {amount_in} {} <- {amount_out} {} on pool {}",
            bound_in.token.symbol,
            bound_out.token.symbol,
            self.address
        );
        Ok(amount_in)
    }

    /// Quotes the pool tokens minted for a single-asset join of `amount_in`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not bound, `amount_in` exceeds `MAX_IN_RATIO` of the
    /// balance, or the join formula fails.
    pub fn quote_join_single_in(&self, token_in: &Address, amount_in: I256) -> anyhow::Result<I256> {
        let bound_in = self.token(token_in)?;

        let max_in = bmath::mul(bound_in.balance, MAX_IN_RATIO)?;
        anyhow::ensure!(
            amount_in <= max_in,
            "Amount in {amount_in} of {} exceeds max in ratio ({max_in})",
            bound_in.token
        );

        Ok(calc_pool_out_given_single_in(
            bound_in.balance,
            bound_in.denorm_weight,
            self.total_supply,
            self.total_weight()?,
            amount_in,
            self.swap_fee,
        )?)
    }

    /// Quotes the amount of `token_out` received for burning `pool_amount_in` pool tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not bound, the result exceeds `MAX_OUT_RATIO` of the
    /// balance, or the exit formula fails.
    pub fn quote_exit_single_out(
        &self,
        token_out: &Address,
        pool_amount_in: I256,
    ) -> anyhow::Result<I256> {
        let bound_out = self.token(token_out)?;

        let amount_out = calc_single_out_given_pool_in(
            bound_out.balance,
            bound_out.denorm_weight,
            self.total_supply,
            self.total_weight()?,
            pool_amount_in,
            self.swap_fee,
        )?;

        let max_out = bmath::mul(bound_out.balance, MAX_OUT_RATIO)?;
        anyhow::ensure!(
            amount_out <= max_out,
            "Amount out {amount_out} of {} exceeds max out ratio ({max_out})",
            bound_out.token
        );
        Ok(amount_out)
    }

    /// Returns the fraction of the pool owned by `lp_balance` pool tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool has no supply or `lp_balance` is outside `[0, total_supply]`.
    pub fn pool_share(&self, lp_balance: I256) -> anyhow::Result<I256> {
        anyhow::ensure!(
            self.total_supply.is_positive(),
            "Pool {} has no supply",
            self.address
        );
        anyhow::ensure!(
            !lp_balance.is_negative() && lp_balance <= self.total_supply,
            "LP balance {lp_balance} outside [0, {}]",
            self.total_supply
        );
        Ok(bmath::div(lp_balance, self.total_supply)?)
    }

    /// Returns the raw amount of each bound token redeemable for `lp_balance` pool tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if [`WeightedPool::pool_share`] fails.
    pub fn underlying_amounts(&self, lp_balance: I256) -> anyhow::Result<Vec<(Address, I256)>> {
        let share = self.pool_share(lp_balance)?;
        self.tokens
            .iter()
            .map(|bound| -> anyhow::Result<(Address, I256)> {
                Ok((bound.token.address, bmath::mul(share, bound.balance)?))
            })
            .collect()
    }

    /// Returns the USD value of all pool balances.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound token has no price in `prices` or the sum overflows.
    pub fn total_value(&self, prices: &PriceMap) -> anyhow::Result<I256> {
        let mut total = I256::ZERO;
        for bound in &self.tokens {
            let price = prices
                .get(&bound.token.address)
                .with_context(|| format!("No price for {}", bound.token))?;
            total = bmath::add(total, bound.token.usd_value(bound.balance, *price)?)?;
        }
        Ok(total)
    }

    /// Returns the USD price of one whole pool token.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool has no supply or [`WeightedPool::total_value`] fails.
    pub fn pool_token_price(&self, prices: &PriceMap) -> anyhow::Result<I256> {
        anyhow::ensure!(
            self.total_supply.is_positive(),
            "Pool {} has no supply",
            self.address
        );
        let total_value = self.total_value(prices)?;
        Ok(bmath::div(total_value, self.total_supply)?)
    }

    /// Returns the pool token as a [`Token`] (pool tokens always have 18 decimals).
    #[must_use]
    pub fn pool_token(&self) -> Token {
        Token::new(self.address, format!("BPT-{}", self.ticker()), 18)
    }
}

impl Display for WeightedPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WeightedPool(address={}, tokens={}, swap_fee={})",
            self.address,
            self.ticker(),
            self.swap_fee
        )
    }
}

/// Returns true if a fee lies in the range accepted by a weighted pool.
#[must_use]
pub fn is_valid_fee(fee: I256) -> bool {
    (MIN_FEE..=MAX_FEE).contains(&fee)
}
