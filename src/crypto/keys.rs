//! Account keys and Ethereum addresses
//!
//! Keys come from BIP-39 seed phrases along the BIP-44 Ethereum path
//! `m/44'/60'/0'/0/<index>`, so any wallet importing the phrase sees the same
//! accounts. Addresses are the last 20 bytes of the Keccak-256 digest of the
//! uncompressed public key.

use bip32::{ChildNumber, DerivationPath, XPrv};
use bip39::Mnemonic;
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// External chain of the first Ethereum account, parent of every derived key
pub const ETH_ACCOUNT_ROOT: &str = "m/44'/60'/0'/0";

/// Key and address errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidAddressLength(usize),
    #[error("Invalid address encoding: {0}")]
    InvalidAddressEncoding(String),
    #[error("Invalid seed phrase: {0}")]
    InvalidMnemonic(String),
    #[error("Key derivation failed: {0}")]
    Derivation(String),
}

/// 20-byte Ethereum account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    /// Lowercase hex without the `0x` prefix, as used for genesis alloc keys
    pub fn to_plain_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress(0x{})", self.to_plain_hex())
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_plain_hex())
    }
}

impl FromStr for EthAddress {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| KeyError::InvalidAddressEncoding(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(KeyError::InvalidAddressLength(bytes.len()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(EthAddress(arr))
    }
}

impl Serialize for EthAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A parsed seed phrase, positioned at `m/44'/60'/0'/0`
#[derive(Clone)]
pub struct SeedPhrase {
    root: XPrv,
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeedPhrase([REDACTED])")
    }
}

impl SeedPhrase {
    /// Parse an English BIP-39 phrase (empty passphrase)
    pub fn parse(phrase: &str) -> Result<Self, KeyError> {
        let mnemonic = Mnemonic::parse_normalized(phrase.trim())
            .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
        let path: DerivationPath = ETH_ACCOUNT_ROOT
            .parse()
            .map_err(|e: bip32::Error| KeyError::Derivation(e.to_string()))?;
        let root = XPrv::derive_from_path(mnemonic.to_seed(""), &path)
            .map_err(|e| KeyError::Derivation(e.to_string()))?;
        Ok(SeedPhrase { root })
    }

    /// Key of account `index`
    pub fn account(&self, index: u32) -> Result<AccountKey, KeyError> {
        let child = ChildNumber::new(index, false)
            .and_then(|number| self.root.derive_child(number))
            .map_err(|e| KeyError::Derivation(e.to_string()))?;
        Ok(AccountKey(child.private_key().clone()))
    }
}

/// Private key for a derived account
#[derive(Clone)]
pub struct AccountKey(SigningKey);

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey([REDACTED])")
    }
}

impl AccountKey {
    /// Address controlled by this key
    pub fn address(&self) -> EthAddress {
        let point = self.0.verifying_key().to_encoded_point(false);
        let digest = Keccak256::digest(&point.as_bytes()[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest[12..]);
        EthAddress(addr)
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDHAT: &str = "test test test test test test test test test test test junk";

    fn address(phrase: &str, index: u32) -> EthAddress {
        SeedPhrase::parse(phrase).unwrap().account(index).unwrap().address()
    }

    #[test]
    fn test_known_bip44_addresses() {
        assert_eq!(
            address(HARDHAT, 0).to_string(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(
            address(HARDHAT, 1).to_string(),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = SeedPhrase::parse(HARDHAT).unwrap();
        let a = seed.account(3).unwrap();
        let b = seed.account(3).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn test_phrase_whitespace_is_ignored() {
        assert_eq!(address(&format!("  {} ", HARDHAT), 0), address(HARDHAT, 0));
    }

    #[test]
    fn test_invalid_phrase_is_rejected() {
        assert!(matches!(
            SeedPhrase::parse("great awesome fun seed"),
            Err(KeyError::InvalidMnemonic(_))
        ));
        // Valid words, wrong checksum.
        assert!(matches!(
            SeedPhrase::parse("test test test test test test test test test test test test"),
            Err(KeyError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_address_display_and_parse() {
        let addr = address(HARDHAT, 7);
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 42);
        assert_eq!(text.parse::<EthAddress>().unwrap(), addr);
        assert_eq!(addr.to_plain_hex().parse::<EthAddress>().unwrap(), addr);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            "0xabcd".parse::<EthAddress>(),
            Err(KeyError::InvalidAddressLength(2))
        );
        assert!(matches!(
            "0xzz".parse::<EthAddress>(),
            Err(KeyError::InvalidAddressEncoding(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let seed = SeedPhrase::parse(HARDHAT).unwrap();
        assert_eq!(format!("{:?}", seed), "SeedPhrase([REDACTED])");
        assert_eq!(format!("{:?}", seed.account(0).unwrap()), "AccountKey([REDACTED])");
    }
}
