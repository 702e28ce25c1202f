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

//! Errors raised by the fixed-point engine.

use alloy_primitives::I256;

/// Represents a failure of a fixed-point operation.
///
/// Each variant mirrors a revert condition of the equivalent on-chain library, so a caller
/// never receives a silently wrong financial quantity.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BMathError {
    #[error("Division by zero in `{0}`")]
    DivisionByZero(&'static str),
    #[error("Arithmetic overflow in `{0}`")]
    Overflow(&'static str),
    #[error("Arithmetic underflow in `{0}`")]
    Underflow(&'static str),
    #[error("Negative exponent is not supported, was {0}")]
    NegativeExponent(I256),
    #[error("Base {0} is outside the supported `pow` range")]
    BaseOutOfRange(I256),
    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),
}
