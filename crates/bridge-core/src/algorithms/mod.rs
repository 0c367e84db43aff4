//! # Algorithms Module
//!
//! Operations over the bridge store: the attestation engine, claim execution,
//! the outgoing pool and batch builder, balance assertions, deposit
//! forwarding and the bad-signature check.

pub mod balances;
pub mod batching;
pub mod claim_handler;
pub mod forwarding;
pub mod oracle;
pub mod slashing;
pub mod transfers;

pub use balances::assert_bridge_balances;
pub use batching::{
    build_batch, cancel_batch, cancel_older_batches, cleanup_timed_out_batches, BatchParams,
};
pub use claim_handler::{execute_claim, ExecutionScope};
pub use forwarding::{process_pending_forwards, ForwardSummary};
pub use oracle::{
    attestation_tally, last_event_nonce_for, prune_attestations, submit_claim, try_attestation,
};
pub use slashing::{check_bad_signature_evidence, EvidenceOutcome};
pub use transfers::{cancel_transfer, enqueue_transfer, TransferRequest};
