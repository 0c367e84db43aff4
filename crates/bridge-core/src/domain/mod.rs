//! # Domain Module
//!
//! Core domain types for the bridge: claims and attestations, the outgoing
//! pool and batches, signed checkpoints, balance snapshots and the store that
//! holds all of it.

pub mod attestation;
pub mod batch;
pub mod checkpoint;
pub mod claim;
pub mod errors;
pub mod events;
pub mod evidence;
pub mod invariants;
pub mod pool;
pub mod snapshot;
pub mod store;
pub mod valset;

pub use attestation::{required_power, tally, Attestation, AttestationId, VoteTally};
pub use batch::{batch_timeout_height, BlockTimes, LastObservedForeignHeight, OutgoingTxBatch};
pub use checkpoint::{batch_checkpoint, keccak256, logic_call_checkpoint, valset_checkpoint};
pub use claim::{
    BatchExecutedClaim, Claim, ClaimType, DepositClaim, TokenDeployedClaim, ValsetUpdatedClaim,
};
pub use errors::*;
pub use events::BridgeEvent;
pub use evidence::{recover_signer, EthSignature, EvidenceSubject};
pub use invariants::*;
pub use pool::{BatchFees, OutgoingPool, OutgoingTransferTx};
pub use snapshot::BridgeBalanceSnapshot;
pub use store::{BridgeStore, PendingForward, TokenOrigin};
pub use valset::{OutgoingLogicCall, Valset, ValsetMember};
