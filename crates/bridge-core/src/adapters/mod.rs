//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports, plus the ledger overlay
//! used to stage claim execution.

mod community_pool;
mod forwarder;
mod memory_ledger;
mod overlay;
mod staking;

pub use community_pool::DistributionPool;
pub use forwarder::{ForwardRecord, RecordingForwarder};
pub use memory_ledger::InMemoryLedger;
pub use overlay::{replay, LedgerOp, LedgerOverlay};
pub use staking::InMemoryStaking;
