//! A market is just a free-form string identifier: any name the caller
//! registers is valid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A free-form market identifier, e.g. `"BTC-USD"` or `"ETH-USD"`.
///
/// Stored and compared case-sensitively, uppercased on construction so that
/// `"btc-usd"` and `"BTC-USD"` name the same market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market(String);

impl Market {
    pub fn new(name: impl Into<String>) -> Self {
        Market(name.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Market {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Market::new(s))
    }
}

impl From<&str> for Market {
    fn from(s: &str) -> Self {
        Market::new(s)
    }
}

impl From<String> for Market {
    fn from(s: String) -> Self {
        Market::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markets_compare_case_insensitively() {
        assert_eq!(Market::new("btc-usd"), Market::new("BTC-USD"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let m: Market = "eth-usd".parse().unwrap();
        assert_eq!(m.to_string(), "ETH-USD");
    }
}
