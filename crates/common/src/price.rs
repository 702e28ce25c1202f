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

//! A TTL price cache with single-flight request deduplication.
//!
//! Prices come from an external [`PriceSource`] (for example a market data HTTP API). The
//! [`PriceCache`] serves a fetched price until its time-to-live elapses and guarantees that at
//! most one request per [`PriceKey`] is in flight: concurrent callers for the same key await
//! one shared fetch. Failed fetches are returned to every waiter but never cached.

use std::{
    fmt::{Debug, Display, Formatter},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use ahash::{AHashMap, AHashSet};
use alloy_primitives::Address;
use dashmap::DashMap;
use futures::{
    FutureExt,
    future::{BoxFuture, Shared, try_join_all},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::config::PriceCacheConfig;

/// Identifies the price of a token on a chain in a quote currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceKey {
    /// The chain ID the token lives on.
    pub chain_id: u64,
    /// The token contract address.
    pub token: Address,
    /// The quote currency, e.g. `usd`.
    pub vs_currency: Ustr,
}

impl PriceKey {
    /// Creates a new [`PriceKey`] instance.
    #[must_use]
    pub fn new(chain_id: u64, token: Address, vs_currency: Ustr) -> Self {
        Self {
            chain_id,
            token,
            vs_currency,
        }
    }
}

impl Display for PriceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.chain_id, self.token, self.vs_currency)
    }
}

/// An error fetching a price.
///
/// Clonable so one failed fetch can be handed to every caller waiting on it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The source has no price for the key.
    #[error("No price available for {0}")]
    NotFound(PriceKey),
    /// The source failed to answer.
    #[error("Price source failed for {key}: {message}")]
    Source { key: PriceKey, message: String },
    /// The source returned a negative price.
    #[error("Invalid price {price} for {key}")]
    Invalid { key: PriceKey, price: Decimal },
}

/// A source of token prices.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync + 'static {
    /// Fetches the current price for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotFound`] if the source does not list the token, or
    /// [`PriceError::Source`] if the request fails.
    async fn fetch_price(&self, key: &PriceKey) -> Result<Decimal, PriceError>;
}

type SharedFetch = Shared<BoxFuture<'static, Result<Decimal, PriceError>>>;

#[derive(Clone, Copy, Debug)]
struct CachedPrice {
    price: Decimal,
    fetched_at: Instant,
}

struct PriceCacheInner<S> {
    source: S,
    ttl: Duration,
    entries: DashMap<PriceKey, CachedPrice>,
    in_flight: Mutex<AHashMap<PriceKey, SharedFetch>>,
}

impl<S> PriceCacheInner<S> {
    fn fresh(&self, key: &PriceKey) -> Option<Decimal> {
        self.entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.price)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, AHashMap<PriceKey, SharedFetch>> {
        // The map is never left half-updated, poisoning is ignored
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A TTL cache over a [`PriceSource`] which deduplicates concurrent fetches.
///
/// Cloning is cheap and clones share the same entries.
pub struct PriceCache<S> {
    inner: Arc<PriceCacheInner<S>>,
}

impl<S> Clone for PriceCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Debug for PriceCache<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(PriceCache))
            .field("ttl", &self.inner.ttl)
            .field("entries", &self.inner.entries.len())
            .field("in_flight", &self.inner.lock_in_flight().len())
            .finish()
    }
}

impl<S: PriceSource> PriceCache<S> {
    /// Creates a new [`PriceCache`] instance serving prices for `ttl`.
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(PriceCacheInner {
                source,
                ttl,
                entries: DashMap::new(),
                in_flight: Mutex::new(AHashMap::new()),
            }),
        }
    }

    /// Creates a new [`PriceCache`] instance from configuration.
    #[must_use]
    pub fn from_config(source: S, config: &PriceCacheConfig) -> Self {
        Self::new(source, config.ttl())
    }

    /// Returns the underlying price source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Returns the time-to-live of cached prices.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Returns the price for `key`, fetching it if no fresh price is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the source returns a negative price.
    pub async fn get(&self, key: PriceKey) -> Result<Decimal, PriceError> {
        if let Some(price) = self.inner.fresh(&key) {
            log::trace!("Price cache hit for {key}");
            return Ok(price);
        }

        let fetch = {
            let mut in_flight = self.inner.lock_in_flight();

            // A fetch may have completed between the first check and taking the lock
            if let Some(price) = self.inner.fresh(&key) {
                return Ok(price);
            }

            match in_flight.get(&key) {
                Some(fetch) => {
                    log::debug!("Joining in-flight price fetch for {key}");
                    fetch.clone()
                }
                None => {
                    log::debug!("Price cache miss for {key}, fetching");
                    let fetch = self.shared_fetch(key);
                    in_flight.insert(key, fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    fn shared_fetch(&self, key: PriceKey) -> SharedFetch {
        let inner = Arc::clone(&self.inner);
        async move {
            let result = match inner.source.fetch_price(&key).await {
                Ok(price) if price.is_sign_negative() => Err(PriceError::Invalid { key, price }),
                other => other,
            };

            match &result {
                Ok(price) => {
                    inner.entries.insert(
                        key,
                        CachedPrice {
                            price: *price,
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(e) => log::warn!("Failed to fetch price for {key}: {e}"),
            }

            inner.lock_in_flight().remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    /// Returns the prices for all `keys`, fetching those not cached concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error of any key.
    pub async fn get_many(
        &self,
        keys: impl IntoIterator<Item = PriceKey>,
    ) -> Result<AHashMap<PriceKey, Decimal>, PriceError> {
        let unique: AHashSet<PriceKey> = keys.into_iter().collect();
        let prices = try_join_all(
            unique
                .into_iter()
                .map(|key| async move { self.get(key).await.map(|price| (key, price)) }),
        )
        .await?;
        Ok(prices.into_iter().collect())
    }

    /// Inserts a price for `key`, replacing any cached price.
    pub fn insert(&self, key: PriceKey, price: Decimal) {
        self.inner.entries.insert(
            key,
            CachedPrice {
                price,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Removes the cached price for `key`, returning true if one was cached.
    pub fn invalidate(&self, key: &PriceKey) -> bool {
        self.inner.entries.remove(key).is_some()
    }

    /// Removes all cached prices.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Returns the number of cached prices, including stale ones not yet refreshed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if no prices are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}
