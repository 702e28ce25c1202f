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

//! Pool, campaign and token model for the DeFi SDK.
//!
//! The `defi-sdk-model` crate describes the on-chain state the SDK reads (weighted pools,
//! liquidity-mining campaigns and their tokens) and evaluates it with the fixed-point engine
//! from `defi-sdk-math`, so quotes, pool shares and yields agree with contract settlement.
//!
//! Raw token balances stay in token units as they are stored on-chain. Values which are
//! expressed per whole token (USD prices, TVL, APR) are 18-decimal fixed-point numbers.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod campaign;
pub mod pool;
pub mod slippage;
pub mod token;
pub mod weighted_math;

pub use crate::{
    campaign::{Campaign, RewardSchedule},
    pool::{PoolToken, WeightedPool},
    slippage::SlippageTolerance,
    token::{PriceMap, Token},
};
