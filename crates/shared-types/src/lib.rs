//! # Shared Types Crate
//!
//! Value types used across the bridge crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, coins and amounts are defined once
//!   here and never re-declared by the subsystems.
//! - **Validated on Construction**: an [`EthAddress`] or [`AccountAddress`] that
//!   exists has already passed format checks; raw strings coming from the
//!   foreign chain stay as `String` until they are parsed.
//! - **256-bit Amounts**: every amount is a [`U256`], matching the foreign
//!   chain's token arithmetic.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
