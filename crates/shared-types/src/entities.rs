//! # Core Value Types
//!
//! ## Clusters
//!
//! - **Addresses**: `EthAddress` (foreign chain), `AccountAddress` (local
//!   accounts, bech32 encoded), `ValidatorAddress` (operator identity)
//! - **Amounts**: `Coin` (local denomination), `Erc20Token` (foreign contract)

use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::AddressError;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte hash (SHA-256 fingerprints, Keccak-256 checkpoints).
pub type Hash = [u8; 32];

// =============================================================================
// CLUSTER A: ADDRESSES
// =============================================================================

/// A 20-byte address on the foreign chain.
///
/// Displayed and parsed as `0x` followed by 40 hex digits. Ordering is
/// byte-wise, which matches lowercase hex string ordering.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct EthAddress([u8; 20]);

impl EthAddress {
    /// The all-zero address, used as "no token" in reward settings.
    pub const ZERO: EthAddress = EthAddress([0u8; 20]);

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for EthAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::InvalidEthAddress(s.to_string()))?;
        if digits.len() != 40 {
            return Err(AddressError::InvalidEthAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressError::InvalidEthAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({})", self)
    }
}

/// Longest accepted bech32 string.
const MAX_ADDRESS_LEN: usize = 90;

fn map_bech32_error(input: &str, err: bech32::Error) -> AddressError {
    match err {
        bech32::Error::MissingSeparator => AddressError::MissingSeparator(input.to_string()),
        bech32::Error::InvalidChecksum => AddressError::InvalidChecksum(input.to_string()),
        bech32::Error::InvalidLength => AddressError::InvalidLength {
            length: input.len(),
        },
        bech32::Error::InvalidChar(character) => AddressError::InvalidCharacter { character },
        bech32::Error::MixedCase => AddressError::MixedCase(input.to_string()),
        _ => AddressError::InvalidPadding(input.to_string()),
    }
}

fn check_payload(input: &str, bytes: &[u8]) -> Result<(), AddressError> {
    if bytes.is_empty() {
        return Err(AddressError::EmptyPayload(input.to_string()));
    }
    Ok(())
}

/// A local account address in bech32 form (`<prefix>1<data><checksum>`).
///
/// Parsing validates the alphabet, the checksum and the 5-to-8 bit padding,
/// and rejects an empty payload, so a value of this type always names a
/// well-formed account. The prefix is kept so that receivers on other chains
/// (different prefix) can be recognised.
#[derive(
    Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct AccountAddress {
    encoded: String,
    prefix_len: usize,
}

impl AccountAddress {
    /// Encode raw account bytes under `prefix`. The payload must not be empty.
    pub fn encode(prefix: &str, bytes: &[u8]) -> Result<Self, AddressError> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(AddressError::MissingSeparator(prefix));
        }
        check_payload(&prefix, bytes)?;
        let encoded = bech32::encode(&prefix, bytes.to_base32(), Variant::Bech32)
            .map_err(|err| map_bech32_error(&prefix, err))?;
        if encoded.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::InvalidLength {
                length: encoded.len(),
            });
        }
        Ok(Self {
            prefix_len: prefix.len(),
            encoded,
        })
    }

    /// Parse and require a specific prefix.
    pub fn parse_with_prefix(s: &str, expected: &str) -> Result<Self, AddressError> {
        let address: AccountAddress = s.parse()?;
        if address.prefix() != expected {
            return Err(AddressError::WrongPrefix {
                expected: expected.to_string(),
                actual: address.prefix().to_string(),
            });
        }
        Ok(address)
    }

    /// Human-readable prefix.
    pub fn prefix(&self) -> &str {
        &self.encoded[..self.prefix_len]
    }

    /// Full encoded form.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl FromStr for AccountAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::InvalidLength { length: s.len() });
        }
        let (prefix, data, variant) = bech32::decode(s).map_err(|err| map_bech32_error(s, err))?;
        if variant != Variant::Bech32 {
            return Err(AddressError::UnsupportedVariant(s.to_string()));
        }
        let bytes = Vec::<u8>::from_base32(&data).map_err(|err| map_bech32_error(s, err))?;
        check_payload(s, &bytes)?;

        Ok(Self {
            prefix_len: prefix.len(),
            encoded: s.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.encoded)
    }
}

/// Operator identity of a bonded validator.
///
/// Opaque to the bridge: it is whatever the voting-power source uses to key
/// its validators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorAddress(pub String);

impl ValidatorAddress {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ValidatorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: AMOUNTS
// =============================================================================

/// An amount of a local denomination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination name.
    pub denom: String,
    /// Amount in base units.
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// An amount of a foreign-chain token, identified by its contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Erc20Token {
    /// Token contract on the foreign chain.
    pub contract: EthAddress,
    /// Amount in base units.
    pub amount: U256,
}

impl Erc20Token {
    pub fn new(contract: EthAddress, amount: impl Into<U256>) -> Self {
        Self {
            contract,
            amount: amount.into(),
        }
    }
}
