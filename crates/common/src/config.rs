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

//! SDK configuration loaded from TOML.

use std::{path::Path, time::Duration};

use anyhow::Context;
use defi_sdk_model::SlippageTolerance;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

/// Configuration for the SDK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// The chain ID of the network the SDK reads from.
    pub chain_id: u64,
    /// The default slippage tolerance in basis points.
    pub slippage_bps: u32,
    /// The configuration for the price cache.
    pub price_cache: PriceCacheConfig,
}

impl Default for SdkConfig {
    /// Creates a new default [`SdkConfig`] instance.
    fn default() -> Self {
        Self {
            chain_id: 1,
            slippage_bps: 50,
            price_cache: PriceCacheConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Creates a new [`SdkConfig`] instance.
    #[must_use]
    pub const fn new(chain_id: u64, slippage_bps: u32, price_cache: PriceCacheConfig) -> Self {
        Self {
            chain_id,
            slippage_bps,
            price_cache,
        }
    }

    /// Parses and validates a configuration from a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails [`SdkConfig::validate`].
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse SDK config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`SdkConfig::from_toml_str`] fails.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SDK config from {}", path.display()))?;
        let config = Self::from_toml_str(&contents)?;
        log::debug!("Loaded SDK config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Checks the configuration values are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain ID is zero, the slippage is invalid, or the price cache
    /// configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.chain_id != 0, "`chain_id` must be non-zero");
        self.slippage().context("Invalid `slippage_bps`")?;
        self.price_cache.validate()
    }

    /// Returns the configured slippage tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error if `slippage_bps` exceeds 10,000.
    pub fn slippage(&self) -> anyhow::Result<SlippageTolerance> {
        SlippageTolerance::from_bps(self.slippage_bps)
    }
}

/// Configuration for `PriceCache` instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceCacheConfig {
    /// How long (seconds) a fetched price is served from the cache.
    pub ttl_secs: u64,
    /// The quote currency prices are requested in.
    pub vs_currency: Ustr,
}

impl Default for PriceCacheConfig {
    /// Creates a new default [`PriceCacheConfig`] instance.
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            vs_currency: Ustr::from("usd"),
        }
    }
}

impl PriceCacheConfig {
    /// Returns the cache time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Checks the configuration values are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `vs_currency` is empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.vs_currency.is_empty(),
            "`price_cache.vs_currency` must not be empty"
        );
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_default() {
        let config = SdkConfig::default();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.slippage_bps, 50);
        assert_eq!(config.price_cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.price_cache.vs_currency.as_str(), "usd");
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_empty_document_uses_defaults() {
        assert_eq!(SdkConfig::from_toml_str("").unwrap(), SdkConfig::default());
    }

    #[rstest]
    fn test_partial_document() {
        let config = SdkConfig::from_toml_str(
            r#"
            chain_id = 137
            slippage_bps = 100

            [price_cache]
            vs_currency = "eur"
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            SdkConfig::new(
                137,
                100,
                PriceCacheConfig {
                    ttl_secs: 60,
                    vs_currency: Ustr::from("eur"),
                },
            )
        );
        assert_eq!(config.slippage().unwrap().bps(), 100);
    }

    #[rstest]
    #[case("slippage_bps = 10001", "slippage_bps")]
    #[case("chain_id = 0", "chain_id")]
    #[case("[price_cache]\nvs_currency = \"\"", "vs_currency")]
    fn test_invalid_values(#[case] document: &str, #[case] field: &str) {
        let err = SdkConfig::from_toml_str(document).unwrap_err();
        assert!(format!("{err:#}").contains(field), "{err:#}");
    }

    #[rstest]
    fn test_malformed_document() {
        let err = SdkConfig::from_toml_str("chain_id = \"mainnet\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse SDK config"));
    }

    #[rstest]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain_id = 10\n[price_cache]\nttl_secs = 5").unwrap();

        let config = SdkConfig::from_file(file.path()).unwrap();
        assert_eq!(config.chain_id, 10);
        assert_eq!(config.price_cache.ttl(), Duration::from_secs(5));
    }

    #[rstest]
    fn test_from_missing_file() {
        let err = SdkConfig::from_file("/nonexistent/defi-sdk.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read SDK config"));
    }
}
