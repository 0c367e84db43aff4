//! # Ports Layer (Hexagonal Architecture)
//!
//! - **Inbound**: [`inbound::BridgeApi`], what the core offers to the host
//! - **Outbound**: ledger, voting power, forwarding and community pool

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
