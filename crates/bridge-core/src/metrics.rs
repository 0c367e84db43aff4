//! # Bridge Metrics
//!
//! Prometheus counters for the oracle, the batch builder and the evidence
//! check.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bridge-core = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `bridge_claim_votes_total` - Counter of accepted claim votes
//! - `bridge_attestations_observed_total` - Counter of observed attestations (by claim type)
//! - `bridge_claim_execution_failures_total` - Counter of discarded claim executions (by claim type)
//! - `bridge_batches_created_total` - Counter of outgoing batches built
//! - `bridge_batches_cancelled_total` - Counter of batches cancelled or timed out
//! - `bridge_validators_slashed_total` - Counter of validators slashed for bad signatures
//! - `bridge_operations_rejected_total` - Counter of rejected operations (by error tier)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total claim votes accepted
    pub static ref CLAIM_VOTES: IntCounter = register_int_counter!(
        "bridge_claim_votes_total",
        "Total number of claim votes accepted"
    )
    .expect("Failed to create CLAIM_VOTES metric");

    /// Observed attestations, labeled by claim type
    pub static ref ATTESTATIONS_OBSERVED: CounterVec = register_counter_vec!(
        "bridge_attestations_observed_total",
        "Total number of attestations observed",
        &["claim_type"]
    )
    .expect("Failed to create ATTESTATIONS_OBSERVED metric");

    /// Claim executions discarded, labeled by claim type
    pub static ref EXECUTION_FAILURES: CounterVec = register_counter_vec!(
        "bridge_claim_execution_failures_total",
        "Total number of claim executions discarded",
        &["claim_type"]
    )
    .expect("Failed to create EXECUTION_FAILURES metric");

    pub static ref BATCHES_CREATED: IntCounter = register_int_counter!(
        "bridge_batches_created_total",
        "Total number of outgoing batches created"
    )
    .expect("Failed to create BATCHES_CREATED metric");

    pub static ref BATCHES_CANCELLED: IntCounter = register_int_counter!(
        "bridge_batches_cancelled_total",
        "Total number of outgoing batches cancelled"
    )
    .expect("Failed to create BATCHES_CANCELLED metric");

    pub static ref VALIDATORS_SLASHED: IntCounter = register_int_counter!(
        "bridge_validators_slashed_total",
        "Total number of validators slashed for bad signatures"
    )
    .expect("Failed to create VALIDATORS_SLASHED metric");

    /// Rejected operations, labeled by error tier
    pub static ref OPERATIONS_REJECTED: CounterVec = register_counter_vec!(
        "bridge_operations_rejected_total",
        "Total number of operations that returned an error",
        &["tier"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_vote() {
    CLAIM_VOTES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_observed(claim_type: &str) {
    ATTESTATIONS_OBSERVED.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_execution_failure(claim_type: &str) {
    EXECUTION_FAILURES.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_batch_created() {
    BATCHES_CREATED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_batches_cancelled(count: u64) {
    BATCHES_CANCELLED.inc_by(count);
}

#[cfg(feature = "metrics")]
pub fn record_slash() {
    VALIDATORS_SLASHED.inc();
}

/// Record an operation error with its tier label
#[cfg(feature = "metrics")]
pub fn record_error(tier: &str) {
    OPERATIONS_REJECTED.with_label_values(&[tier]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_vote() {}

#[cfg(not(feature = "metrics"))]
pub fn record_observed(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_execution_failure(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_batches_cancelled(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_slash() {}

#[cfg(not(feature = "metrics"))]
pub fn record_error(_tier: &str) {}
