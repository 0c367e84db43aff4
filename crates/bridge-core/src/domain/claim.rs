//! # Claims
//!
//! A claim is one validator's statement that a foreign-chain event happened.
//! Identical statements from different validators hash to the same
//! fingerprint and are aggregated into one attestation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Erc20Token, EthAddress, Hash, U256};

use super::valset::ValsetMember;

/// Claim discriminant, used for logging and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Deposit,
    BatchExecuted,
    TokenDeployed,
    ValidatorSetUpdated,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Deposit => "CLAIM_TYPE_DEPOSIT",
            ClaimType::BatchExecuted => "CLAIM_TYPE_BATCH_EXECUTED",
            ClaimType::TokenDeployed => "CLAIM_TYPE_TOKEN_DEPLOYED",
            ClaimType::ValidatorSetUpdated => "CLAIM_TYPE_VALSET_UPDATED",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            ClaimType::Deposit => 1,
            ClaimType::BatchExecuted => 2,
            ClaimType::TokenDeployed => 3,
            ClaimType::ValidatorSetUpdated => 4,
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Funds locked in the foreign bridge contract for a local receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositClaim {
    pub event_nonce: u64,
    pub foreign_height: u64,
    pub token_contract: EthAddress,
    pub amount: U256,
    pub foreign_sender: EthAddress,
    /// Receiver as written on the foreign chain; may be malformed.
    pub receiver: String,
    pub bridge_balances: Vec<Erc20Token>,
}

/// An outgoing batch was executed on the foreign chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchExecutedClaim {
    pub event_nonce: u64,
    pub foreign_height: u64,
    pub token_contract: EthAddress,
    pub batch_nonce: u64,
    pub bridge_balances: Vec<Erc20Token>,
}

/// A token contract representing a local denom was deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDeployedClaim {
    pub event_nonce: u64,
    pub foreign_height: u64,
    pub local_denom: String,
    pub token_contract: EthAddress,
    pub name: String,
    pub symbol: String,
    pub decimals: u64,
    pub bridge_balances: Vec<Erc20Token>,
}

/// The foreign bridge contract switched to a new validator set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetUpdatedClaim {
    pub event_nonce: u64,
    pub foreign_height: u64,
    pub valset_nonce: u64,
    pub members: Vec<ValsetMember>,
    pub reward_amount: U256,
    pub reward_token: EthAddress,
    pub bridge_balances: Vec<Erc20Token>,
}

/// Closed set of claim kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Claim {
    Deposit(DepositClaim),
    BatchExecuted(BatchExecutedClaim),
    TokenDeployed(TokenDeployedClaim),
    ValidatorSetUpdated(ValsetUpdatedClaim),
}

impl Claim {
    pub fn claim_type(&self) -> ClaimType {
        match self {
            Claim::Deposit(_) => ClaimType::Deposit,
            Claim::BatchExecuted(_) => ClaimType::BatchExecuted,
            Claim::TokenDeployed(_) => ClaimType::TokenDeployed,
            Claim::ValidatorSetUpdated(_) => ClaimType::ValidatorSetUpdated,
        }
    }

    pub fn event_nonce(&self) -> u64 {
        match self {
            Claim::Deposit(c) => c.event_nonce,
            Claim::BatchExecuted(c) => c.event_nonce,
            Claim::TokenDeployed(c) => c.event_nonce,
            Claim::ValidatorSetUpdated(c) => c.event_nonce,
        }
    }

    pub fn foreign_height(&self) -> u64 {
        match self {
            Claim::Deposit(c) => c.foreign_height,
            Claim::BatchExecuted(c) => c.foreign_height,
            Claim::TokenDeployed(c) => c.foreign_height,
            Claim::ValidatorSetUpdated(c) => c.foreign_height,
        }
    }

    /// Monitored token balances of the foreign bridge contract at
    /// [`Claim::foreign_height`].
    pub fn bridge_balances(&self) -> &[Erc20Token] {
        match self {
            Claim::Deposit(c) => &c.bridge_balances,
            Claim::BatchExecuted(c) => &c.bridge_balances,
            Claim::TokenDeployed(c) => &c.bridge_balances,
            Claim::ValidatorSetUpdated(c) => &c.bridge_balances,
        }
    }

    /// SHA-256 over every payload field, prefixed with the claim type.
    ///
    /// Strings are length-prefixed so adjacent fields cannot alias.
    pub fn fingerprint(&self) -> Hash {
        let mut hasher = FieldHasher::new(self.claim_type());
        hasher.u64(self.event_nonce());
        hasher.u64(self.foreign_height());
        match self {
            Claim::Deposit(c) => {
                hasher.address(&c.token_contract);
                hasher.u256(&c.amount);
                hasher.address(&c.foreign_sender);
                hasher.string(&c.receiver);
            }
            Claim::BatchExecuted(c) => {
                hasher.address(&c.token_contract);
                hasher.u64(c.batch_nonce);
            }
            Claim::TokenDeployed(c) => {
                hasher.string(&c.local_denom);
                hasher.address(&c.token_contract);
                hasher.string(&c.name);
                hasher.string(&c.symbol);
                hasher.u64(c.decimals);
            }
            Claim::ValidatorSetUpdated(c) => {
                hasher.u64(c.valset_nonce);
                hasher.u64(c.members.len() as u64);
                for member in &c.members {
                    hasher.u64(member.power);
                    hasher.address(&member.eth_address);
                }
                hasher.u256(&c.reward_amount);
                hasher.address(&c.reward_token);
            }
        }
        hasher.u64(self.bridge_balances().len() as u64);
        for balance in self.bridge_balances() {
            hasher.address(&balance.contract);
            hasher.u256(&balance.amount);
        }
        hasher.finish()
    }
}

struct FieldHasher(Sha256);

impl FieldHasher {
    fn new(claim_type: ClaimType) -> Self {
        let mut inner = Sha256::new();
        inner.update([claim_type.tag()]);
        Self(inner)
    }

    fn u64(&mut self, value: u64) {
        self.0.update(value.to_be_bytes());
    }

    fn u256(&mut self, value: &U256) {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        self.0.update(bytes);
    }

    fn address(&mut self, address: &EthAddress) {
        self.0.update(address.as_bytes());
    }

    fn string(&mut self, value: &str) {
        self.u64(value.len() as u64);
        self.0.update(value.as_bytes());
    }

    fn finish(self) -> Hash {
        self.0.finalize().into()
    }
}
