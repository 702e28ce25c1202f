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

//! Campaign yield summaries priced through the [`PriceCache`].

use std::fmt::{Display, Formatter};

use alloy_primitives::{Address, I256};
use anyhow::Context;
use defi_sdk_math::{
    BMathError,
    convert::{bnum_to_decimal, decimal_to_bnum, format_bnum},
};
use defi_sdk_model::{
    Campaign, PriceMap, WeightedPool,
    campaign::{DAILY_COMPOUNDING, SECONDS_PER_DAY, apy},
};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::{
    config::SdkConfig,
    price::{PriceCache, PriceKey, PriceSource},
};

/// The yield of a campaign at a point in time.
///
/// Monetary values are 18-decimal fixed-point numbers in the aggregator's quote currency;
/// rates are 18-decimal fractions where `BONE` is 100%.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSummary {
    /// The campaign contract address.
    pub campaign: Address,
    /// If rewards accrue at the summary time.
    pub active: bool,
    /// The value of all staked tokens.
    pub tvl_usd: I256,
    /// The annual percentage rate.
    pub apr: I256,
    /// The annual percentage yield.
    pub apy: I256,
    /// The value of rewards emitted per day.
    pub rewards_per_day_usd: I256,
}

impl CampaignSummary {
    /// Returns the TVL as a [`Decimal`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit a [`Decimal`].
    pub fn tvl_usd_decimal(&self) -> Result<Decimal, BMathError> {
        bnum_to_decimal(self.tvl_usd)
    }

    /// Returns the daily reward value as a [`Decimal`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit a [`Decimal`].
    pub fn rewards_per_day_usd_decimal(&self) -> Result<Decimal, BMathError> {
        bnum_to_decimal(self.rewards_per_day_usd)
    }

    /// Returns the APR in percent, e.g. `12.5`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit a [`Decimal`].
    pub fn apr_percent(&self) -> Result<Decimal, BMathError> {
        Ok(bnum_to_decimal(self.apr)? * Decimal::ONE_HUNDRED)
    }

    /// Returns the APY in percent.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit a [`Decimal`].
    pub fn apy_percent(&self) -> Result<Decimal, BMathError> {
        Ok(bnum_to_decimal(self.apy)? * Decimal::ONE_HUNDRED)
    }
}

impl Display for CampaignSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let render = |value: I256| format_bnum(value).map_err(|_| std::fmt::Error);
        write!(
            f,
            "CampaignSummary(campaign={}, active={}, tvl_usd={}, apr={}, apy={}, rewards_per_day_usd={})",
            self.campaign,
            self.active,
            render(self.tvl_usd)?,
            render(self.apr)?,
            render(self.apy)?,
            render(self.rewards_per_day_usd)?,
        )
    }
}

/// Summarizes campaigns using prices from a shared [`PriceCache`].
#[derive(Debug)]
pub struct CampaignAggregator<S> {
    prices: PriceCache<S>,
    chain_id: u64,
    vs_currency: Ustr,
    compounding_periods: u64,
}

impl<S: PriceSource> CampaignAggregator<S> {
    /// Creates a new [`CampaignAggregator`] instance compounding daily.
    #[must_use]
    pub fn new(prices: PriceCache<S>, chain_id: u64, vs_currency: Ustr) -> Self {
        Self {
            prices,
            chain_id,
            vs_currency,
            compounding_periods: DAILY_COMPOUNDING,
        }
    }

    /// Creates a new [`CampaignAggregator`] instance from configuration.
    #[must_use]
    pub fn from_config(prices: PriceCache<S>, config: &SdkConfig) -> Self {
        Self::new(prices, config.chain_id, config.price_cache.vs_currency)
    }

    /// Sets the number of compounding periods per year used for APY.
    #[must_use]
    pub fn with_compounding_periods(mut self, compounding_periods: u64) -> Self {
        self.compounding_periods = compounding_periods;
        self
    }

    /// Returns the price cache.
    #[must_use]
    pub fn prices(&self) -> &PriceCache<S> {
        &self.prices
    }

    /// Returns fixed-point prices for `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if a price cannot be fetched or converted.
    pub async fn price_map(
        &self,
        tokens: impl IntoIterator<Item = Address>,
    ) -> anyhow::Result<PriceMap> {
        let keys = tokens
            .into_iter()
            .map(|token| PriceKey::new(self.chain_id, token, self.vs_currency));
        let prices = self.prices.get_many(keys).await?;

        let mut map = PriceMap::with_capacity(prices.len());
        for (key, price) in prices {
            let value = decimal_to_bnum(price)
                .with_context(|| format!("Failed to convert price {price} for {key}"))?;
            map.insert(key.token, value);
        }
        Ok(map)
    }

    /// Summarizes `campaign` at `now` (UNIX seconds).
    ///
    /// When the staking token is a weighted pool token, pass the pool as `staking_pool` so it
    /// is priced from the pool's balances.
    ///
    /// # Errors
    ///
    /// Returns an error if `staking_pool` is not the campaign's staking token, a price cannot
    /// be fetched, or a computation fails.
    pub async fn summarize(
        &self,
        campaign: &Campaign,
        staking_pool: Option<&WeightedPool>,
        now: u64,
    ) -> anyhow::Result<CampaignSummary> {
        let mut tokens: Vec<Address> = campaign
            .rewards
            .iter()
            .map(|schedule| schedule.token.address)
            .collect();

        match staking_pool {
            Some(pool) => {
                anyhow::ensure!(
                    pool.address == campaign.staking_token.address,
                    "Campaign {} stakes {}, not pool {}",
                    campaign.address,
                    campaign.staking_token,
                    pool.address
                );
                tokens.extend(pool.tokens.iter().map(|bound| bound.token.address));
            }
            None => tokens.push(campaign.staking_token.address),
        }

        let mut prices = self
            .price_map(tokens)
            .await
            .with_context(|| format!("Failed to price {campaign}"))?;

        if let Some(pool) = staking_pool {
            let pool_token_price = pool.pool_token_price(&prices)?;
            log::debug!("Priced pool token {} at {pool_token_price}", pool.address);
            prices.insert(pool.address, pool_token_price);
        }

        let tvl_usd = campaign.tvl(&prices)?;
        let active = campaign.is_active(now);
        let (apr, rewards_per_day_usd) = if active {
            (
                campaign.apr(&prices)?,
                campaign.rewards_value(SECONDS_PER_DAY, &prices)?,
            )
        } else {
            log::debug!("{campaign} is not active at {now}");
            (I256::ZERO, I256::ZERO)
        };
        let apy = apy(apr, self.compounding_periods)?;

        Ok(CampaignSummary {
            campaign: campaign.address,
            active,
            tvl_usd,
            apr,
            apy,
            rewards_per_day_usd,
        })
    }

    /// Summarizes several campaigns concurrently, sharing price fetches between them.
    pub async fn summarize_all(
        &self,
        campaigns: &[(Campaign, Option<WeightedPool>)],
        now: u64,
    ) -> Vec<anyhow::Result<CampaignSummary>> {
        join_all(
            campaigns
                .iter()
                .map(|(campaign, pool)| self.summarize(campaign, pool.as_ref(), now)),
        )
        .await
    }
}
