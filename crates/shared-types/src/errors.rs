//! # Error Types
//!
//! Parse errors for the shared value types.

use thiserror::Error;

/// Errors raised while parsing addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Foreign-chain address is not `0x` followed by 40 hex digits.
    #[error("Invalid foreign address: {0}")]
    InvalidEthAddress(String),

    /// Account address has no human-readable prefix or no separator.
    #[error("Missing prefix separator in account address: {0}")]
    MissingSeparator(String),

    /// Account address mixes upper and lower case.
    #[error("Mixed case account address: {0}")]
    MixedCase(String),

    /// Account address contains a character outside the data alphabet.
    #[error("Invalid character {character:?} in account address")]
    InvalidCharacter { character: char },

    /// Account address length is outside the accepted range.
    #[error("Invalid account address length: {length}")]
    InvalidLength { length: usize },

    /// Account address checksum does not verify.
    #[error("Invalid checksum for account address: {0}")]
    InvalidChecksum(String),

    /// Account address decodes to zero bytes.
    #[error("Empty account address payload: {0}")]
    EmptyPayload(String),

    /// Account address data does not convert cleanly to whole bytes.
    #[error("Invalid padding in account address: {0}")]
    InvalidPadding(String),

    /// Account address uses the bech32m checksum.
    #[error("Unsupported bech32 variant: {0}")]
    UnsupportedVariant(String),

    /// Account address has a different prefix than required.
    #[error("Wrong prefix: expected {expected}, got {actual}")]
    WrongPrefix { expected: String, actual: String },
}

