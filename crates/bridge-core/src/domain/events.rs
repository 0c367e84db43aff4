//! Events emitted by the bridge core.
//!
//! Events are buffered by the service and drained by the host. Events raised
//! while a claim handler runs are staged and only kept if the handler commits.

use serde::{Deserialize, Serialize};
use shared_types::{AccountAddress, Coin, Erc20Token, EthAddress, ValidatorAddress, U256};

use super::attestation::AttestationId;
use super::claim::ClaimType;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// An attestation crossed the threshold and was applied.
    ClaimObserved {
        claim_type: ClaimType,
        event_nonce: u64,
        attestation_id: AttestationId,
    },

    /// A deposit was credited to a local account.
    DepositReceived {
        event_nonce: u64,
        receiver: AccountAddress,
        coin: Coin,
    },

    /// Deposit receiver could not be parsed; funds went to the community pool.
    InvalidDepositReceiver {
        event_nonce: u64,
        receiver: String,
        coin: Coin,
    },

    /// Receiver could not accept funds; they went to the community pool.
    DepositRedirected {
        event_nonce: u64,
        receiver: AccountAddress,
        coin: Coin,
    },

    /// Deposit queued for forwarding to another chain.
    ForwardQueued {
        event_nonce: u64,
        receiver: AccountAddress,
        coin: Coin,
        channel: String,
    },

    ForwardCompleted {
        event_nonce: u64,
        receiver: AccountAddress,
        coin: Coin,
        channel: String,
    },

    /// Forward failed; funds went to the community pool.
    ForwardFailed {
        event_nonce: u64,
        receiver: AccountAddress,
        coin: Coin,
        reason: String,
    },

    TransferEnqueued {
        tx_id: u64,
        sender: AccountAddress,
        dest_address: EthAddress,
        amount: Erc20Token,
        fee: Erc20Token,
    },

    TransferCancelled {
        tx_id: u64,
        sender: AccountAddress,
    },

    BatchCreated {
        token_contract: EthAddress,
        batch_nonce: u64,
        batch_timeout: u64,
        tx_ids: Vec<u64>,
    },

    BatchExecuted {
        token_contract: EthAddress,
        batch_nonce: u64,
    },

    /// Batch dropped; its transactions returned to the pool.
    BatchCancelled {
        token_contract: EthAddress,
        batch_nonce: u64,
    },

    Erc20Deployed {
        denom: String,
        token_contract: EthAddress,
    },

    ValsetObserved {
        valset_nonce: u64,
        reward_amount: U256,
        reward_token: EthAddress,
    },

    /// Consecutive snapshots disagree with the expected balance change.
    BalanceAssertionFailed {
        event_nonce: u64,
        reason: String,
    },

    ValidatorSlashed {
        validator: ValidatorAddress,
        signer: EthAddress,
        checkpoint: String,
    },
}

impl BridgeEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeEvent::ClaimObserved { .. } => "claim_observed",
            BridgeEvent::DepositReceived { .. } => "deposit_received",
            BridgeEvent::InvalidDepositReceiver { .. } => "invalid_deposit_receiver",
            BridgeEvent::DepositRedirected { .. } => "deposit_redirected",
            BridgeEvent::ForwardQueued { .. } => "forward_queued",
            BridgeEvent::ForwardCompleted { .. } => "forward_completed",
            BridgeEvent::ForwardFailed { .. } => "forward_failed",
            BridgeEvent::TransferEnqueued { .. } => "transfer_enqueued",
            BridgeEvent::TransferCancelled { .. } => "transfer_cancelled",
            BridgeEvent::BatchCreated { .. } => "batch_created",
            BridgeEvent::BatchExecuted { .. } => "batch_executed",
            BridgeEvent::BatchCancelled { .. } => "batch_cancelled",
            BridgeEvent::Erc20Deployed { .. } => "erc20_deployed",
            BridgeEvent::ValsetObserved { .. } => "valset_observed",
            BridgeEvent::BalanceAssertionFailed { .. } => "balance_assertion_failed",
            BridgeEvent::ValidatorSlashed { .. } => "validator_slashed",
        }
    }
}
