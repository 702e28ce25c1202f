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

//! Price cache behavior under a multi-threaded runtime.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy_primitives::Address;
use defi_sdk_common::{PriceCache, PriceError, PriceKey, PriceSource, SdkConfig};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use ustr::Ustr;

/// Quotes every token at its last address byte after a short delay.
#[derive(Debug, Default)]
struct SlowSource {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl PriceSource for SlowSource {
    async fn fetch_price(&self, key: &PriceKey) -> Result<Decimal, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(25)).await;
        match key.token.0[19] {
            0 => Err(PriceError::NotFound(*key)),
            byte => Ok(Decimal::from(byte)),
        }
    }
}

fn key(byte: u8) -> PriceKey {
    PriceKey::new(1, Address::with_last_byte(byte), Ustr::from("usd"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = SlowSource {
        calls: Arc::clone(&calls),
    };
    let cache = PriceCache::from_config(source, &SdkConfig::default().price_cache);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let cache = cache.clone();
            // Two distinct keys requested by many tasks at once
            let key = key(1 + (i % 2));
            tokio::spawn(async move { cache.get(key).await })
        })
        .collect();

    for handle in handles {
        let price = handle.await.unwrap().unwrap();
        assert!(price == dec!(1) || price == dec!(2));
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_fetch_is_shared_then_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = SlowSource {
        calls: Arc::clone(&calls),
    };
    let cache = PriceCache::new(source, Duration::from_secs(60));

    let (a, b) = tokio::join!(cache.get(key(0)), cache.get(key(0)));
    assert_eq!(a, Err(PriceError::NotFound(key(0))));
    assert_eq!(a, b);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Failures are not cached, a later request fetches again
    assert!(cache.get(key(0)).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(cache.is_empty());
}
