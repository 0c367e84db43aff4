//! # Bridge Core
//!
//! Trust core of a two-way bridge between this chain and an external
//! smart-contract chain.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Validators attest to events on the foreign chain; an event takes effect
//!   once attesting power strictly exceeds the threshold.
//! - Outgoing transfers wait in a fee-ordered pool until a batch is built and
//!   signed for relay.
//! - Foreign-reported bridge balances are checked against local supply after
//!   every observed event.
//! - Signatures over checkpoints this chain never produced get the signer
//!   slashed.
//!
//! ## Failure Tiers
//!
//! | Tier | Effect |
//! |------|--------|
//! | Rejected | Returned to the caller, nothing written |
//! | Execution | Claim effects discarded, oracle still advances |
//! | Fatal | Host must halt |
//!
//! ## Module Structure
//!
//! ```text
//! bridge-core/
//! ├── domain/          # Claims, attestations, pool, batches, checkpoints, errors
//! ├── algorithms/      # Oracle, claim handlers, batching, balances, evidence
//! ├── adapters/        # In-memory ledger, staking, forwarder, ledger overlay
//! ├── ports/           # BridgeApi, Ledger, VotingPower, Forwarder, CommunityPool
//! └── service.rs       # BridgeService
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod context;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports
pub use algorithms::{EvidenceOutcome, ForwardSummary, TransferRequest};
pub use config::{BridgeParams, ConfigError};
pub use context::BridgeContext;
pub use domain::{
    Attestation, AttestationId, BatchFees, BridgeError, BridgeEvent, BridgeResult, Claim,
    ClaimType, EvidenceSubject, ExecutionError, FatalError, OutgoingLogicCall, OutgoingTxBatch,
    Rejected, Valset,
};
pub use ports::{BridgeApi, CommunityPool, Forwarder, Ledger, VotingPower};
pub use service::BridgeService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
