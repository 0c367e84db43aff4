//! # Domain Invariants
//!
//! Ordering rules for the oracle and the accounting rule for the bridge
//! module account.

use std::collections::BTreeSet;
use std::fmt;

use shared_types::{EthAddress, U256};

use super::errors::{FatalError, Rejected};
use super::store::{BridgeStore, TokenOrigin};
use crate::ports::outbound::{Holder, Ledger, BRIDGE_MODULE};

/// Invariant: a validator's claims arrive with consecutive nonces.
pub fn invariant_validator_nonce(last: u64, received: u64) -> Result<(), Rejected> {
    let expected = last.saturating_add(1);
    if received != expected {
        return Err(Rejected::NonContiguousEventNonce { expected, received });
    }
    Ok(())
}

/// Invariant: the observed event nonce moves by exactly one.
pub fn invariant_next_event_nonce(last_observed: u64, nonce: u64) -> Result<(), FatalError> {
    let expected = last_observed.saturating_add(1);
    if nonce != expected {
        return Err(FatalError::EventNonceOutOfOrder {
            expected,
            actual: nonce,
        });
    }
    Ok(())
}

/// Invariant: the last observed foreign height never decreases.
pub fn invariant_foreign_height_monotonic(current: u64, attempted: u64) -> Result<(), FatalError> {
    if attempted < current {
        return Err(FatalError::ForeignHeightRegression { current, attempted });
    }
    Ok(())
}

/// Bridge module holdings disagree with what the store says it escrows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBalanceViolation {
    pub token_contract: EthAddress,
    pub denom: String,
    pub origin: TokenOrigin,
    pub module_balance: U256,
    pub escrowed: U256,
}

impl fmt::Display for ModuleBalanceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bridge module holds {} {} but escrows {} ({:?}, {})",
            self.module_balance, self.denom, self.escrowed, self.origin, self.token_contract
        )
    }
}

/// Invariant: the bridge module balance accounts for everything escrowed.
///
/// For foreign-originated tokens the module holds exactly the outgoing
/// transfers (batched or not) and pending forwards. For bridge-originated
/// tokens it holds at least that, plus whatever is locked on the foreign side.
pub fn module_balance_invariant(
    store: &BridgeStore,
    ledger: &dyn Ledger,
    foreign_denom_prefix: &str,
) -> Result<(), ModuleBalanceViolation> {
    let mut contracts: BTreeSet<EthAddress> = store.pool().contracts().copied().collect();
    contracts.extend(store.batches().map(|batch| batch.token_contract));
    contracts.extend(store.registered_contracts().copied());
    contracts.extend(
        store
            .pending_forwards()
            .filter_map(|forward| store.denom_to_erc20(&forward.coin.denom, foreign_denom_prefix))
            .map(|(_, contract)| contract),
    );

    let module = Holder::module(BRIDGE_MODULE);
    for contract in contracts {
        let (origin, denom) = store.erc20_to_denom(&contract, foreign_denom_prefix);
        let module_balance = ledger.balance_of(&module, &denom);
        let escrowed = store
            .outgoing_total_for(&contract)
            .saturating_add(store.pending_forward_total(&denom));
        let holds = match origin {
            TokenOrigin::ForeignOriginated => module_balance == escrowed,
            TokenOrigin::BridgeOriginated => module_balance >= escrowed,
        };
        if !holds {
            return Err(ModuleBalanceViolation {
                token_contract: contract,
                denom,
                origin,
                module_balance,
                escrowed,
            });
        }
    }
    Ok(())
}
