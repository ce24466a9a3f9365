use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Amount of native currency, in wei.
pub type Wei = U256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid chain id '{input}': expected a decimal number or a 0x-prefixed hex string")]
pub struct ChainIdParseError {
    pub input: String,
}

/// Identifier of a ledger network.
///
/// Wallets report chain ids as `0x`-prefixed hex strings (`eth_chainId`) while configuration
/// usually carries them as decimal numbers. Both forms are parsed into the same canonical
/// value, so comparing two [`ChainId`]s never depends on the representation they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    /// Celo Alfajores testnet.
    pub const ALFAJORES: ChainId = ChainId(44787);
    /// Celo mainnet.
    pub const CELO: ChainId = ChainId(42220);
    /// Polygon Mumbai testnet.
    pub const MUMBAI: ChainId = ChainId(80001);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ChainIdParseError { input: s.to_string() };

        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => u64::from_str_radix(hex, 16),
            Some(_) => return Err(err()),
            None => trimmed.parse::<u64>(),
        };

        parsed.map(ChainId).map_err(|_| err())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ledger-assigned identifier of an event. Immutable once the creating transaction is mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub B256);

impl EventId {
    pub const fn new(id: B256) -> Self {
        Self(id)
    }
}

impl From<B256> for EventId {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<EventId> for B256 {
    fn from(value: EventId) -> Self {
        value.0
    }
}

impl FromStr for EventId {
    type Err = alloy_primitives::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        B256::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0xaef3", 44787)]
    #[case("0xAEF3", 44787)]
    #[case("44787", 44787)]
    #[case(" 0xa4ec ", 42220)]
    #[case("0x1", 1)]
    fn parses_hex_and_decimal_chain_ids(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(input.parse::<ChainId>().unwrap(), ChainId::new(expected));
    }

    #[rstest]
    #[case("")]
    #[case("0x")]
    #[case("alfajores")]
    #[case("0xzz")]
    #[case("-5")]
    fn rejects_malformed_chain_ids(#[case] input: &str) {
        assert_eq!(input.parse::<ChainId>(), Err(ChainIdParseError { input: input.to_string() }));
    }

    #[test]
    fn hex_and_decimal_forms_compare_equal_once_parsed() {
        let from_wallet: ChainId = "0xaef3".parse().unwrap();
        let from_config: ChainId = "44787".parse().unwrap();
        assert_eq!(from_wallet, from_config);
        assert_eq!(from_wallet, ChainId::ALFAJORES);
        assert_eq!(from_wallet.to_string(), "0xaef3");
    }

    #[test]
    fn chain_id_serde_uses_hex_string() {
        let json = serde_json::to_string(&ChainId::CELO).unwrap();
        assert_eq!(json, "\"0xa4ec\"");
        let back: ChainId = serde_json::from_str("\"42220\"").unwrap();
        assert_eq!(back, ChainId::CELO);
    }

    #[test]
    fn event_id_round_trips_through_display() {
        let id = EventId::new(B256::repeat_byte(0xab));
        let parsed: EventId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
