//! Type-safe wallet address.
//!
//! [`WalletAddress`] is a validated, lowercase-normalized EVM address so
//! that the same wallet always maps to the same cache and subscription
//! keys regardless of how the client capitalized it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GatewayError;

/// An EVM account address (`0x` followed by 40 hex digits), stored
/// lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parses and normalizes an address.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidAddress`] if the input is not `0x`
    /// followed by exactly 40 hex digits.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        else {
            return Err(GatewayError::InvalidAddress(raw.to_string()));
        };
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GatewayError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    /// Returns the normalized address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Referral code derived from the address: the six hex digits after
    /// the `0x` prefix, uppercased.
    #[must_use]
    pub fn referral_code(&self) -> String {
        self.0.get(2..8).unwrap_or_default().to_ascii_uppercase()
    }

    /// Last six characters of the address, used in session identifiers.
    #[must_use]
    pub fn suffix(&self) -> &str {
        self.0.get(self.0.len().saturating_sub(6)..).unwrap_or_default()
    }

    /// Shortened display form, e.g. `0x2d60...d335`.
    #[must_use]
    pub fn short(&self) -> String {
        let head = self.0.get(..6).unwrap_or_default();
        let tail = self.0.get(self.0.len().saturating_sub(4)..).unwrap_or_default();
        format!("{head}...{tail}")
    }

    /// Converts to an alloy [`alloy_primitives::Address`] for ABI encoding.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidAddress`] if the conversion fails,
    /// which cannot happen for a value built via [`WalletAddress::parse`].
    pub fn to_alloy(&self) -> Result<alloy_primitives::Address, GatewayError> {
        alloy_primitives::Address::from_str(&self.0)
            .map_err(|_| GatewayError::InvalidAddress(self.0.clone()))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ADDR: &str = "0x2D6048916FD4017D9348563d442a3476a710D335";

    fn addr() -> WalletAddress {
        let Ok(a) = WalletAddress::parse(ADDR) else {
            panic!("valid address");
        };
        a
    }

    #[test]
    fn parse_normalizes_to_lowercase() {
        assert_eq!(addr().as_str(), ADDR.to_ascii_lowercase());
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(WalletAddress::parse("2D6048916FD4017D9348563d442a3476a710D335").is_err());
        assert!(WalletAddress::parse("0x1234").is_err());
        assert!(WalletAddress::parse("0xZZ6048916FD4017D9348563d442a3476a710D335").is_err());
        assert!(WalletAddress::parse("").is_err());
    }

    #[test]
    fn referral_code_is_uppercased_prefix() {
        assert_eq!(addr().referral_code(), "2D6048");
    }

    #[test]
    fn suffix_and_short_forms() {
        let a = addr();
        assert_eq!(a.suffix(), "10d335");
        assert_eq!(a.short(), "0x2d60...d335");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<WalletAddress, _> = serde_json::from_str(&format!("\"{ADDR}\""));
        assert!(ok.is_ok());
        let bad: Result<WalletAddress, _> = serde_json::from_str("\"0xnope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn converts_to_alloy_address() {
        assert!(addr().to_alloy().is_ok());
    }
}
