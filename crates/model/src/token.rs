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

use ahash::AHashMap;
use alloy_primitives::{Address, I256, U256};
use defi_sdk_math::{
    BMathError, bmath,
    convert::{BNUM_DECIMALS, bnum_to_u256, parse_decimal_str, to_decimal_string, u256_to_bnum},
};
use serde::{Deserialize, Serialize};

/// USD prices per whole token as 18-decimal fixed-point values, keyed by token address.
pub type PriceMap = AHashMap<Address, I256>;

/// Represents an ERC-20 token taking part in a pool or campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// The blockchain address of the token contract.
    pub address: Address,
    /// The token's ticker symbol.
    pub symbol: String,
    /// The number of decimal places used to represent fractional token amounts.
    pub decimals: u8,
}

impl Token {
    /// Creates a new [`Token`] instance with the specified properties.
    #[must_use]
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }

    fn decimal_shift(&self) -> i32 {
        BNUM_DECIMALS as i32 - i32::from(self.decimals)
    }

    /// Rescales a raw amount in token units to an 18-decimal fixed-point value.
    ///
    /// Tokens with more than 18 decimals lose their extra precision (floored).
    ///
    /// # Errors
    ///
    /// Returns an error if the rescaled amount overflows.
    pub fn normalize(&self, raw: I256) -> Result<I256, BMathError> {
        bmath::scale(raw, self.decimal_shift())
    }

    /// Rescales an on-chain `uint256` amount to an 18-decimal fixed-point value.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` does not fit the signed representation or the rescaled
    /// amount overflows.
    pub fn normalize_u256(&self, raw: U256) -> Result<I256, BMathError> {
        self.normalize(u256_to_bnum(raw)?)
    }

    /// Rescales an 18-decimal fixed-point value back to raw token units, flooring any
    /// precision the token cannot represent.
    ///
    /// # Errors
    ///
    /// Returns an error if the rescaled amount overflows.
    pub fn denormalize(&self, value: I256) -> Result<I256, BMathError> {
        bmath::scale(value, -self.decimal_shift())
    }

    /// Rescales an 18-decimal fixed-point value to an on-chain `uint256` amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative or the rescaled amount overflows.
    pub fn denormalize_u256(&self, value: I256) -> Result<U256, BMathError> {
        bnum_to_u256(self.denormalize(value)?)
    }

    /// Formats a raw amount as a human-readable decimal string, e.g. `1.5`.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount cannot be formatted.
    pub fn format_amount(&self, raw: I256) -> Result<String, BMathError> {
        to_decimal_string(raw, self.decimals)
    }

    /// Parses a human-readable amount such as `"2.5"` into raw token units.
    ///
    /// # Errors
    ///
    /// Returns an error if `s` is malformed or has more fractional digits than the token.
    pub fn parse_amount(&self, s: &str) -> Result<I256, BMathError> {
        parse_decimal_str(s, self.decimals)
    }

    /// Returns the USD value of a raw amount given the USD price of one whole token.
    ///
    /// # Errors
    ///
    /// Returns an error if the computation overflows.
    pub fn usd_value(&self, raw: I256, price: I256) -> Result<I256, BMathError> {
        bmath::mul(self.normalize(raw)?, price)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(symbol={}, address={})", self.symbol, self.address)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
pub(crate) mod tests {
    use alloy_primitives::address;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    pub(crate) fn usdc() -> Token {
        Token::new(
            address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            "USDC",
            6,
        )
    }

    #[fixture]
    pub(crate) fn weth() -> Token {
        Token::new(
            address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            "WETH",
            18,
        )
    }

    fn int(value: i128) -> I256 {
        I256::try_from(value).unwrap()
    }

    #[rstest]
    fn test_normalize_six_decimals(usdc: Token) {
        // 2.5 USDC
        let value = usdc.normalize(int(2_500_000)).unwrap();
        assert_eq!(value, int(2_500_000_000_000_000_000));
    }

    #[rstest]
    fn test_normalize_eighteen_decimals_is_identity(weth: Token) {
        let raw = int(1_234_567_890_123_456_789);
        assert_eq!(weth.normalize(raw).unwrap(), raw);
    }

    #[rstest]
    fn test_denormalize_floors(usdc: Token) {
        let value = int(1_999_999_999_999_999_999);
        assert_eq!(usdc.denormalize(value).unwrap(), int(1_999_999));
    }

    #[rstest]
    fn test_normalize_more_than_eighteen_decimals() {
        let token = Token::new(Address::ZERO, "WIDE", 24);
        assert_eq!(token.normalize(int(1_500_000)).unwrap(), int(1));
    }

    #[rstest]
    fn test_u256_round_trip(usdc: Token) {
        let raw = U256::from(42_000_000u64);
        let value = usdc.normalize_u256(raw).unwrap();
        assert_eq!(usdc.denormalize_u256(value).unwrap(), raw);
    }

    #[rstest]
    fn test_denormalize_u256_negative_fails(weth: Token) {
        assert!(weth.denormalize_u256(int(-1)).is_err());
    }

    #[rstest]
    #[case("1", 1_000_000)]
    #[case("0.5", 500_000)]
    #[case("1234.000001", 1_234_000_001)]
    fn test_parse_amount(usdc: Token, #[case] input: &str, #[case] expected: i128) {
        assert_eq!(usdc.parse_amount(input).unwrap(), int(expected));
    }

    #[rstest]
    fn test_parse_amount_too_precise(usdc: Token) {
        assert!(usdc.parse_amount("0.0000001").is_err());
    }

    #[rstest]
    fn test_format_amount(usdc: Token) {
        assert_eq!(usdc.format_amount(int(1_250_000)).unwrap(), "1.25");
    }

    #[rstest]
    fn test_usd_value(usdc: Token) {
        // 3 USDC at 0.999 USD
        let price = int(999_000_000_000_000_000);
        let value = usdc.usd_value(int(3_000_000), price).unwrap();
        assert_eq!(value, int(2_997_000_000_000_000_000));
    }

    #[rstest]
    fn test_display(weth: Token) {
        assert_eq!(
            weth.to_string(),
            "Token(symbol=WETH, address=0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2)"
        );
    }
}
