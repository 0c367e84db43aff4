//! # Domain Errors
//!
//! Three tiers, each its own enum:
//!
//! | Tier | Type | Effect |
//! |------|------|--------|
//! | Rejected input | [`Rejected`] | returned to the caller, nothing written |
//! | Recoverable execution failure | [`ExecutionError`] | logged, overlay discarded, oracle advances |
//! | Fatal invariant violation | [`FatalError`] | processing must stop; the host decides how to halt |

use shared_types::{AccountAddress, AddressError, EthAddress, ValidatorAddress, U256};
use thiserror::Error;

use crate::ports::outbound::LedgerError;

/// Input rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    /// Claim nonce is not the validator's next nonce.
    #[error("non contiguous event nonce: expected {expected}, received {received}")]
    NonContiguousEventNonce { expected: u64, received: u64 },

    /// Validator is not known to the voting-power source.
    #[error("Unknown validator: {0}")]
    UnknownValidator(ValidatorAddress),

    /// Validator already voted on this attestation.
    #[error("Duplicate vote from {validator} on event nonce {event_nonce}")]
    DuplicateVote {
        validator: ValidatorAddress,
        event_nonce: u64,
    },

    /// Amount or fee is zero.
    #[error("Invalid amount: amount and fee must be non-zero")]
    ZeroAmount,

    /// Amount and fee use different denominations.
    #[error("Mismatched denominations: amount {amount}, fee {fee}")]
    MismatchedDenom { amount: String, fee: String },

    /// Denomination has no foreign-chain contract.
    #[error("Denom {0} has no foreign token contract")]
    UnknownToken(String),

    /// Transaction id is not in the unbatched pool.
    #[error("Outgoing tx {0} not found in pool")]
    TxNotInPool(u64),

    /// Transaction id is already part of a batch.
    #[error("Outgoing tx {0} is already batched")]
    TxAlreadyBatched(u64),

    /// Caller is not the transaction's sender.
    #[error("{caller} did not send outgoing tx {id}")]
    NotSender { id: u64, caller: AccountAddress },

    /// Batch size must be at least one.
    #[error("Max elements must be greater than zero")]
    InvalidMaxElements,

    /// The pool has no transactions for this contract.
    #[error("No unbatched transactions for {0}")]
    EmptyPool(EthAddress),

    /// A new batch must carry strictly more fees than the latest one.
    #[error("New batch would not be more profitable: {candidate} <= {existing}")]
    BatchFeesTooLow { existing: U256, candidate: U256 },

    /// Batch does not exist.
    #[error("Batch {batch_nonce} for {token_contract} not found")]
    BatchNotFound {
        token_contract: EthAddress,
        batch_nonce: u64,
    },

    /// Signed checkpoint was produced locally, so it is not a forgery.
    #[error("Checkpoint {0} exists, cannot slash")]
    CheckpointAlreadySigned(String),

    /// Signature cannot be decoded or recovered.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// No validator registered the recovered signer address.
    #[error("Unknown signer {0}")]
    UnknownSigner(EthAddress),

    /// Valset or logic call is malformed.
    #[error("Invalid subject: {0}")]
    InvalidSubject(String),

    /// Address failed to parse.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Ledger refused the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A claim passed sequencing and threshold but its effect could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Supply would not fit in 256 bits.
    #[error("Invalid supply after deposit of {amount} {denom}")]
    SupplyOverflow { denom: String, amount: U256 },

    /// Denom already maps to a foreign contract.
    #[error("Token {token_contract} already registered for denom {denom}")]
    TokenAlreadyRegistered {
        denom: String,
        token_contract: EthAddress,
    },

    /// Denom has no metadata (or an empty base).
    #[error("Denom metadata not found for {0}")]
    MissingMetadata(String),

    /// Deployed token attributes disagree with the denom metadata.
    #[error("Deployed token {field} {claimed} does not match {expected}")]
    MetadataMismatch {
        field: &'static str,
        claimed: String,
        expected: String,
    },

    /// Observed validator set differs from the locally generated one.
    #[error("Observed valset {nonce} does not match the local copy")]
    ValsetMismatch { nonce: u64 },

    /// Ledger refused the operation.
    #[error("Ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    /// Community-pool fallback itself failed.
    #[error("Failed to send to community pool: {0}")]
    CommunityPool(LedgerError),
}

/// Invariant violation; continuing would be unsafe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    /// Observed event nonce would skip, repeat or go backwards.
    #[error("attempting to apply events to state out of order: expected {expected}, got {actual}")]
    EventNonceOutOfOrder { expected: u64, actual: u64 },

    /// Attestation has already been observed.
    #[error("attempting to process observed attestation {0}")]
    AttestationAlreadyObserved(String),

    /// Claim height differs from the stored attestation's claim height.
    #[error("invalid height - this claim's height is {claimed} while the stored height is {stored}")]
    ClaimHeightMismatch { claimed: u64, stored: u64 },

    /// Last observed foreign height would go backwards.
    #[error("last observed foreign height moving backwards: {current} -> {attempted}")]
    ForeignHeightRegression { current: u64, attempted: u64 },

    /// Reported foreign balances do not line up with the monitored token list.
    #[error("invalid reported bridge balances: {0}")]
    InvalidReportedBalances(String),

    /// Foreign-chain balance is lower than what the local ledger implies.
    #[error("unbacked supply for {token_contract}: foreign {foreign}, local {local}")]
    UnbackedSupply {
        token_contract: EthAddress,
        foreign: U256,
        local: U256,
    },

    /// Validator set reward configured with a foreign-originated token.
    #[error("foreign originated reward token {0} is not supported")]
    ForeignOriginatedReward(EthAddress),

    /// Executed batch is not known locally.
    #[error("executed batch {batch_nonce} for {token_contract} not found")]
    UnknownExecutedBatch {
        token_contract: EthAddress,
        batch_nonce: u64,
    },

    /// Journaled ledger writes could not be replayed onto the ledger.
    #[error("failed to commit staged ledger writes: {0}")]
    OverlayCommit(LedgerError),

    /// Attestation referenced by key is missing from the store.
    #[error("attestation {0} missing from store")]
    MissingAttestation(String),
}

/// Top-level error for every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejected),

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("FATAL: {0}")]
    Fatal(#[from] FatalError),
}

impl BridgeError {
    /// True when the host must stop processing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BridgeError::Fatal(_))
    }

    /// Short label used in logs and metrics.
    pub fn tier(&self) -> &'static str {
        match self {
            BridgeError::Rejected(_) => "rejected",
            BridgeError::Execution(_) => "execution",
            BridgeError::Fatal(_) => "fatal",
        }
    }
}

impl From<LedgerError> for BridgeError {
    fn from(err: LedgerError) -> Self {
        BridgeError::Rejected(Rejected::Ledger(err))
    }
}

impl From<AddressError> for BridgeError {
    fn from(err: AddressError) -> Self {
        BridgeError::Rejected(Rejected::Address(err))
    }
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;
