//! # Validator Sets and Logic Calls
//!
//! Signed artifacts other than batches. The core only needs them to record
//! their checkpoints and to compare an observed validator set with the copy
//! generated locally.

use serde::{Deserialize, Serialize};
use shared_types::{Erc20Token, EthAddress, U256};

/// One signer of the foreign bridge contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValsetMember {
    pub power: u64,
    pub eth_address: EthAddress,
}

/// A validator set as installed on the foreign bridge contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    pub nonce: u64,
    pub members: Vec<ValsetMember>,
    /// Local height at which the set was generated; zero when observed.
    pub height: u64,
    pub reward_amount: U256,
    pub reward_token: EthAddress,
}

impl Valset {
    /// Equality ignoring `height`, which is only filled in when the set is
    /// generated locally.
    pub fn matches(&self, other: &Valset) -> bool {
        self.nonce == other.nonce
            && self.members == other.members
            && self.reward_amount == other.reward_amount
            && self.reward_token == other.reward_token
    }
}

/// An arbitrary contract call executed by the foreign bridge contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingLogicCall {
    pub transfers: Vec<Erc20Token>,
    pub fees: Vec<Erc20Token>,
    pub logic_contract_address: EthAddress,
    pub payload: Vec<u8>,
    pub timeout: u64,
    /// 32-byte invalidation scope.
    pub invalidation_id: Vec<u8>,
    pub invalidation_nonce: u64,
    pub block: u64,
}
