//! # Bridge Test Suite
//!
//! Scenarios that drive [`bridge_core::BridgeService`] end to end over the
//! in-memory adapters.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs       # TestChain fixture
//!     ├── attestations.rs  # Ordering, threshold, conflicting claims
//!     ├── deposits.rs      # Receivers, forwarding, community pool
//!     ├── outgoing.rs      # Pool, batches, timeouts
//!     ├── balances.rs      # Module invariant, cross-bridge balances
//!     └── evidence.rs      # Bad signature slashing
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p bridge-tests
//! cargo test -p bridge-tests integration::outgoing::
//! ```

pub mod integration;
