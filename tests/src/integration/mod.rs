//! Cross-module scenarios.


mod attestations;
mod balances;
mod deposits;
mod evidence;
mod outgoing;
