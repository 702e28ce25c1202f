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

//! Fixed-point arithmetic matching on-chain integer math.
//!
//! The `defi-sdk-math` crate reproduces the 18-decimal fixed-point routines used by
//! Balancer-style smart contracts (`bmul`, `bdiv`, `bpow`, ...) so that values computed
//! off-chain (pool ratios, APY, slippage bounds) agree bit-for-bit with what a transaction
//! settles to.
//!
//! Values are `alloy_primitives::I256` integers scaled by [`bmath::BONE`] (10^18). Every
//! intermediate product is evaluated in 512-bit precision and narrowed back with an
//! explicit overflow check, so the only failure modes are those of the contract itself:
//! division by zero and results which no longer fit in 256 bits.
//!
//! # Modules
//!
//! - [`bmath`]: the fixed-point engine.
//! - [`convert`]: conversions between scaled integers, decimal strings and `rust_decimal`.
//! - [`error`]: the [`BMathError`] type.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bmath;
pub mod convert;
pub mod error;

pub use crate::error::BMathError;
