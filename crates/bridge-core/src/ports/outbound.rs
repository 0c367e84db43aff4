//! # Outbound Ports
//!
//! Capabilities the core consumes but does not implement. All of them are
//! synchronous: a unit of work either completes or fails inside the call that
//! started it.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::{AccountAddress, Coin, ValidatorAddress, U256};
use thiserror::Error;

/// Module account holding escrowed bridge funds.
pub const BRIDGE_MODULE: &str = "gravity";

/// Module account backing the community pool.
pub const COMMUNITY_POOL_MODULE: &str = "distribution";

/// Module account escrowing funds handed to the forwarder.
pub const TRANSFER_MODULE: &str = "transfer";

/// Something that can hold a balance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Holder {
    /// A named module account.
    Module(String),
    /// A user account.
    Account(AccountAddress),
}

impl Holder {
    pub fn module(name: &str) -> Self {
        Holder::Module(name.to_string())
    }
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Module(name) => write!(f, "module:{}", name),
            Holder::Account(addr) => write!(f, "{}", addr),
        }
    }
}

/// Ledger failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Holder balance too low.
    #[error("insufficient funds in {holder}: need {needed} {denom}, have {available}")]
    InsufficientFunds {
        holder: String,
        denom: String,
        needed: U256,
        available: U256,
    },

    /// Minting would overflow the supply.
    #[error("supply overflow for {0}")]
    SupplyOverflow(String),

    /// Account is not allowed to receive funds.
    #[error("{0} is not allowed to receive funds")]
    BlockedAddress(AccountAddress),
}

/// One entry of a denom's unit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
}

/// Governance-approved metadata for a local denomination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DenomMetadata {
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
}

/// Balance ledger.
pub trait Ledger: Send + Sync {
    /// Create `coin` inside `module`.
    fn mint(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError>;

    /// Destroy `coin` held by `module`.
    fn burn(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError>;

    /// Move `coin` from a module to a user account.
    fn transfer_to_account(
        &mut self,
        module: &str,
        to: &AccountAddress,
        coin: &Coin,
    ) -> Result<(), LedgerError>;

    /// Move `coin` from a user account into a module.
    fn transfer_from_account(
        &mut self,
        from: &AccountAddress,
        module: &str,
        coin: &Coin,
    ) -> Result<(), LedgerError>;

    /// Move `coin` between two module accounts.
    fn transfer_between_pools(&mut self, from: &str, to: &str, coin: &Coin)
        -> Result<(), LedgerError>;

    fn balance_of(&self, holder: &Holder, denom: &str) -> U256;

    fn supply_of(&self, denom: &str) -> U256;

    fn denom_metadata(&self, denom: &str) -> Option<DenomMetadata>;

    /// True if the account must not receive funds.
    fn is_blocked(&self, account: &AccountAddress) -> bool;
}

/// Slashing fraction as `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fraction {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `value * self`, truncating.
    pub fn apply(&self, value: u64) -> u64 {
        if self.denominator == 0 {
            return 0;
        }
        let scaled = u128::from(value) * u128::from(self.numerator) / u128::from(self.denominator);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

/// Bonded stake per validator.
pub trait VotingPower: Send + Sync {
    /// Current bonded power of `validator`, zero if unknown.
    fn bonded_power_of(&self, validator: &ValidatorAddress) -> u64;

    /// Sum of all bonded power.
    fn total_bonded_power(&self) -> u64;

    /// True if the validator exists in the staking set.
    fn is_validator(&self, validator: &ValidatorAddress) -> bool;

    fn is_jailed(&self, validator: &ValidatorAddress) -> bool;

    fn jail(&mut self, validator: &ValidatorAddress);

    /// Slash the validator's stake by `fraction`.
    fn slash(&mut self, validator: &ValidatorAddress, fraction: Fraction);
}

/// Forwarding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error("no route for channel {0}")]
    UnknownChannel(String),

    #[error("forward rejected: {0}")]
    Rejected(String),
}

/// Cross-chain forwarding of delivered deposits.
pub trait Forwarder: Send + Sync {
    /// Send `coin` (already escrowed in [`TRANSFER_MODULE`]) to `receiver`
    /// over `channel`.
    fn forward(
        &mut self,
        receiver: &AccountAddress,
        coin: &Coin,
        channel: &str,
    ) -> Result<(), ForwardError>;
}

/// Community-pool fallback for undeliverable funds.
pub trait CommunityPool: Send + Sync {
    /// Move `coins` held by `from_module` into the community pool.
    fn deposit_to_community_pool(
        &mut self,
        ledger: &mut dyn Ledger,
        from_module: &str,
        coins: &[Coin],
    ) -> Result<(), LedgerError>;
}
