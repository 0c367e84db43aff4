//! # Cross-Bridge Balances
//!
//! After every observed claim the local view of each monitored token is
//! captured and compared with the previous capture and with the balances the
//! validators reported for the foreign bridge contract.
//!
//! Local view per token:
//! - foreign-originated: total supply of the voucher denom
//! - bridge-originated: bridge module balance less everything escrowed for
//!   outgoing transfers (batches, pool) and pending forwards
//!
//! The foreign side can legitimately hold more than expected (anyone can send
//! tokens to the contract) but never less.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::{Erc20Token, EthAddress, U256};

use super::errors::FatalError;
use super::store::{BridgeStore, TokenOrigin};
use crate::ports::outbound::{Holder, Ledger, BRIDGE_MODULE};

/// Local view of every monitored token right after a claim was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeBalanceSnapshot {
    pub event_nonce: u64,
    pub local_height: u64,
    pub foreign_height: u64,
    /// Sorted by contract.
    pub balances: Vec<Erc20Token>,
}

/// Local figure for one monitored token.
pub fn bridged_balance(
    store: &BridgeStore,
    ledger: &dyn Ledger,
    token_contract: &EthAddress,
    foreign_denom_prefix: &str,
) -> U256 {
    let (origin, denom) = store.erc20_to_denom(token_contract, foreign_denom_prefix);
    match origin {
        TokenOrigin::ForeignOriginated => ledger.supply_of(&denom),
        TokenOrigin::BridgeOriginated => {
            let held = ledger.balance_of(&Holder::module(BRIDGE_MODULE), &denom);
            let unaccounted = store
                .outgoing_total_for(token_contract)
                .saturating_add(store.pending_forward_total(&denom));
            held.saturating_sub(unaccounted)
        }
    }
}

/// Local figures for every monitored token, sorted by contract.
pub fn bridged_balances(
    store: &BridgeStore,
    ledger: &dyn Ledger,
    monitored: &[EthAddress],
    foreign_denom_prefix: &str,
) -> Vec<Erc20Token> {
    let contracts: BTreeSet<EthAddress> = monitored.iter().copied().collect();
    contracts
        .into_iter()
        .map(|contract| {
            Erc20Token::new(
                contract,
                bridged_balance(store, ledger, &contract, foreign_denom_prefix),
            )
        })
        .collect()
}

/// Absolute per-token change between two snapshots, zero changes omitted.
pub fn balance_changes(newer: &BridgeBalanceSnapshot, older: &BridgeBalanceSnapshot) -> Vec<Erc20Token> {
    let mut before: BTreeMap<EthAddress, U256> = older
        .balances
        .iter()
        .map(|token| (token.contract, token.amount))
        .collect();
    let mut changes = BTreeMap::new();
    for token in &newer.balances {
        let previous = before.remove(&token.contract).unwrap_or_default();
        let diff = abs_diff(token.amount, previous);
        if !diff.is_zero() {
            changes.insert(token.contract, diff);
        }
    }
    // Tokens that disappeared from the newer snapshot dropped to zero.
    for (contract, previous) in before {
        if !previous.is_zero() {
            changes.insert(contract, previous);
        }
    }
    changes
        .into_iter()
        .map(|(contract, amount)| Erc20Token::new(contract, amount))
        .collect()
}

fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Expected changes restricted to monitored tokens, merged per contract.
fn normalize_expected(expected: &[Erc20Token], monitored: &[EthAddress]) -> Vec<Erc20Token> {
    let mut merged: BTreeMap<EthAddress, U256> = BTreeMap::new();
    for token in expected {
        if token.amount.is_zero() || !monitored.contains(&token.contract) {
            continue;
        }
        let entry = merged.entry(token.contract).or_default();
        *entry = entry.saturating_add(token.amount);
    }
    merged
        .into_iter()
        .map(|(contract, amount)| Erc20Token::new(contract, amount))
        .collect()
}

/// Compare the two most recent snapshots with the change the handler
/// reported. Returns a description of the discrepancy, if any.
pub fn check_snapshot_sanity(
    newer: &BridgeBalanceSnapshot,
    older: &BridgeBalanceSnapshot,
    expected: &[Erc20Token],
    monitored: &[EthAddress],
) -> Result<(), String> {
    let actual = balance_changes(newer, older);
    let expected = normalize_expected(expected, monitored);
    if actual.len() > 1 {
        return Err(format!(
            "too many tokens modified: expected {:?}, actual {:?}",
            expected, actual
        ));
    }
    if actual != expected {
        return Err(format!(
            "unexpected monitored balance change for event {}: expected {:?}, actual {:?}",
            newer.event_nonce, expected, actual
        ));
    }
    Ok(())
}

/// Check the foreign balances reported with a claim against the local figures.
///
/// `reported` must name every monitored token exactly once, and no foreign
/// balance may be below its local figure.
pub fn assert_reported_balances(
    reported: &[Erc20Token],
    local: &[Erc20Token],
    monitored: &[EthAddress],
) -> Result<(), FatalError> {
    if monitored.is_empty() {
        return Ok(());
    }
    let monitored_set: BTreeSet<EthAddress> = monitored.iter().copied().collect();
    if reported.len() != monitored_set.len() {
        return Err(FatalError::InvalidReportedBalances(format!(
            "expected {} reported balances, got {}",
            monitored_set.len(),
            reported.len()
        )));
    }
    let mut seen = BTreeSet::new();
    for token in reported {
        if !monitored_set.contains(&token.contract) {
            return Err(FatalError::InvalidReportedBalances(format!(
                "{} is not a monitored token",
                token.contract
            )));
        }
        if !seen.insert(token.contract) {
            return Err(FatalError::InvalidReportedBalances(format!(
                "{} reported twice",
                token.contract
            )));
        }
    }

    let local: BTreeMap<EthAddress, U256> = local
        .iter()
        .map(|token| (token.contract, token.amount))
        .collect();
    for token in reported {
        let local_amount = local.get(&token.contract).copied().unwrap_or_default();
        if token.amount < local_amount {
            return Err(FatalError::UnbackedSupply {
                token_contract: token.contract,
                foreign: token.amount,
                local: local_amount,
            });
        }
    }
    Ok(())
}
