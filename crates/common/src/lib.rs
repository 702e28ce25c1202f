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

//! Configuration, price caching and campaign aggregation for the DeFi SDK.
//!
//! The `defi-sdk-common` crate holds the pieces shared by SDK front-ends:
//!
//! - [`config`]: the TOML-backed [`SdkConfig`].
//! - [`price`]: the [`PriceCache`] over an external [`PriceSource`].
//! - [`aggregation`]: campaign TVL, APR and APY summaries.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregation;
pub mod config;
pub mod price;

pub use crate::{
    aggregation::{CampaignAggregator, CampaignSummary},
    config::{PriceCacheConfig, SdkConfig},
    price::{PriceCache, PriceError, PriceKey, PriceSource},
};
