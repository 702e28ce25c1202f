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

//! Liquidity-mining campaigns and their yield.
//!
//! A campaign streams one or more reward tokens at a constant rate to everyone staking its
//! staking token between `start` and `end`. Timestamps are UNIX seconds as reported by block
//! headers.

use std::fmt::{Display, Formatter};

use alloy_primitives::{Address, I256};
use anyhow::Context;
use defi_sdk_math::{
    BMathError,
    bmath::{self, BONE},
};
use serde::{Deserialize, Serialize};

use crate::token::{PriceMap, Token};

/// Seconds in a (365 day) year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Seconds in a day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Compounding periods per year for daily compounding.
pub const DAILY_COMPOUNDING: u64 = 365;

/// A reward token emitted by a campaign at a constant rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSchedule {
    /// The reward token.
    pub token: Token,
    /// The emission rate in raw token units per second.
    pub rate_per_second: I256,
}

impl RewardSchedule {
    /// Creates a new [`RewardSchedule`] instance.
    #[must_use]
    pub fn new(token: Token, rate_per_second: I256) -> Self {
        Self {
            token,
            rate_per_second,
        }
    }

    /// Returns the raw amount emitted over `seconds`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount overflows.
    pub fn emitted_over(&self, seconds: u64) -> Result<I256, BMathError> {
        // mul by a whole number of units is exact
        bmath::mul(self.rate_per_second, bmath::from_units(i128::from(seconds))?)
    }
}

/// A liquidity-mining campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CampaignFields")]
pub struct Campaign {
    /// The blockchain address of the campaign contract.
    pub address: Address,
    /// The token staked to earn rewards.
    pub staking_token: Token,
    /// The reward tokens and their emission rates.
    pub rewards: Vec<RewardSchedule>,
    /// UNIX timestamp (seconds) at which rewards start accruing.
    pub start: u64,
    /// UNIX timestamp (seconds) at which rewards stop accruing.
    pub end: u64,
    /// The total amount staked, in raw units of the staking token.
    pub total_staked: I256,
}

/// The serialized form of a [`Campaign`], validated through [`Campaign::new`].
#[derive(Debug, Deserialize)]
struct CampaignFields {
    address: Address,
    staking_token: Token,
    rewards: Vec<RewardSchedule>,
    start: u64,
    end: u64,
    total_staked: I256,
}

impl TryFrom<CampaignFields> for Campaign {
    type Error = anyhow::Error;

    fn try_from(fields: CampaignFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.address,
            fields.staking_token,
            fields.rewards,
            fields.start,
            fields.end,
            fields.total_staked,
        )
    }
}

impl Campaign {
    /// Creates a new [`Campaign`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `end` is not after `start`, a reward rate is negative, or
    /// `total_staked` is negative.
    pub fn new(
        address: Address,
        staking_token: Token,
        rewards: Vec<RewardSchedule>,
        start: u64,
        end: u64,
        total_staked: I256,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(
            end > start,
            "Campaign {address} must end after it starts (start={start}, end={end})"
        );
        if let Some(schedule) = rewards.iter().find(|s| s.rate_per_second.is_negative()) {
            anyhow::bail!(
                "Campaign {address} reward rate for {} is negative: {}",
                schedule.token,
                schedule.rate_per_second
            );
        }
        anyhow::ensure!(
            !total_staked.is_negative(),
            "Campaign {address} total staked must not be negative, was {total_staked}"
        );

        Ok(Self {
            address,
            staking_token,
            rewards,
            start,
            end,
            total_staked,
        })
    }

    /// Returns the campaign length in seconds.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if rewards accrue at `now`.
    #[must_use]
    pub fn is_active(&self, now: u64) -> bool {
        self.start <= now && now < self.end
    }

    /// Returns true if the campaign is over at `now`.
    #[must_use]
    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.end
    }

    /// Returns the seconds of emission left at `now`; the full duration before the start.
    #[must_use]
    pub fn remaining_duration(&self, now: u64) -> u64 {
        self.end.saturating_sub(now.max(self.start))
    }

    /// Returns the raw amount of each reward token still to be emitted at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount overflows.
    pub fn remaining_rewards(&self, now: u64) -> Result<Vec<(Address, I256)>, BMathError> {
        self.rewards_over(self.remaining_duration(now))
    }

    /// Returns the raw amount of each reward token emitted over `seconds`.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount overflows.
    pub fn rewards_over(&self, seconds: u64) -> Result<Vec<(Address, I256)>, BMathError> {
        self.rewards
            .iter()
            .map(|schedule| -> Result<(Address, I256), BMathError> {
                Ok((schedule.token.address, schedule.emitted_over(seconds)?))
            })
            .collect()
    }

    /// Returns the raw amount of each reward token emitted per year.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount overflows.
    pub fn rewards_per_year(&self) -> Result<Vec<(Address, I256)>, BMathError> {
        self.rewards_over(SECONDS_PER_YEAR)
    }

    /// Returns the fraction of the campaign owned by `staked`, zero if nothing is staked.
    ///
    /// # Errors
    ///
    /// Returns an error if the division overflows.
    pub fn user_share(&self, staked: I256) -> Result<I256, BMathError> {
        if self.total_staked.is_zero() {
            return Ok(I256::ZERO);
        }
        bmath::div(staked, self.total_staked)
    }

    /// Returns the raw per-second reward rate of each token earned by `staked`.
    ///
    /// # Errors
    ///
    /// Returns an error if a rate overflows.
    pub fn user_reward_rates(&self, staked: I256) -> Result<Vec<(Address, I256)>, BMathError> {
        let share = self.user_share(staked)?;
        self.rewards
            .iter()
            .map(|schedule| -> Result<(Address, I256), BMathError> {
                Ok((
                    schedule.token.address,
                    bmath::mul(share, schedule.rate_per_second)?,
                ))
            })
            .collect()
    }

    /// Returns the USD value of all rewards emitted over `seconds`.
    ///
    /// # Errors
    ///
    /// Returns an error if a reward token has no price in `prices` or the value overflows.
    pub fn rewards_value(&self, seconds: u64, prices: &PriceMap) -> anyhow::Result<I256> {
        let mut total = I256::ZERO;
        for schedule in &self.rewards {
            let price = prices
                .get(&schedule.token.address)
                .with_context(|| format!("No price for reward token {}", schedule.token))?;
            let emitted = schedule.emitted_over(seconds)?;
            total = bmath::add(total, schedule.token.usd_value(emitted, *price)?)?;
        }
        Ok(total)
    }

    /// Returns the USD value locked in the campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if the staking token has no price in `prices` or the value overflows.
    pub fn tvl(&self, prices: &PriceMap) -> anyhow::Result<I256> {
        let price = prices
            .get(&self.staking_token.address)
            .with_context(|| format!("No price for staking token {}", self.staking_token))?;
        Ok(self.staking_token.usd_value(self.total_staked, *price)?)
    }

    /// Returns the annual percentage rate as an 18-decimal fraction (`BONE` is 100%).
    ///
    /// A campaign with nothing staked has an APR of zero.
    ///
    /// # Errors
    ///
    /// Returns an error if a token has no price in `prices` or the value overflows.
    pub fn apr(&self, prices: &PriceMap) -> anyhow::Result<I256> {
        let tvl = self.tvl(prices)?;
        if !tvl.is_positive() {
            log::warn!("Campaign {} has no value staked, APR is zero", self.address);
            return Ok(I256::ZERO);
        }
        let yearly = self.rewards_value(SECONDS_PER_YEAR, prices)?;
        Ok(bmath::div(yearly, tvl)?)
    }
}

impl Display for Campaign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Campaign(address={}, staking_token={}, start={}, end={})",
            self.address, self.staking_token.symbol, self.start, self.end
        )
    }
}

/// Converts an APR into an APY compounded `compounding_periods` times per year.
///
/// `apy = (1 + apr / periods) ^ periods - 1`
///
/// # Errors
///
/// Returns an error if `compounding_periods` is zero or the power overflows.
pub fn apy(apr: I256, compounding_periods: u64) -> Result<I256, BMathError> {
    let periods = bmath::from_units(i128::from(compounding_periods))?;
    let per_period = bmath::add(BONE, bmath::div(apr, periods)?)?;
    bmath::sub(bmath::pow_int(per_period, compounding_periods)?, BONE)
}
