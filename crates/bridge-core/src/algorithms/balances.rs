//! # Cross-Bridge Balance Assertor
//!
//! Runs after every observed claim, against committed state.

use shared_types::Erc20Token;
use tracing::{debug, error};

use crate::config::BridgeParams;
use crate::domain::snapshot::{assert_reported_balances, bridged_balances, check_snapshot_sanity};
use crate::domain::{BridgeBalanceSnapshot, BridgeEvent, BridgeStore, Claim, FatalError};
use crate::ports::outbound::Ledger;

/// Snapshot the monitored tokens, compare with the previous snapshot and check
/// the foreign balances reported with `claim`.
///
/// A snapshot discrepancy is reported through [`BridgeEvent::BalanceAssertionFailed`].
/// Foreign balances below the local figure are fatal.
pub fn assert_bridge_balances(
    store: &mut BridgeStore,
    ledger: &dyn Ledger,
    events: &mut Vec<BridgeEvent>,
    params: &BridgeParams,
    local_height: u64,
    claim: &Claim,
    expected: &[Erc20Token],
) -> Result<(), FatalError> {
    let monitored = &params.monitored_token_addresses;
    if monitored.is_empty() {
        return Ok(());
    }

    let local = bridged_balances(store, ledger, monitored, &params.foreign_denom_prefix);
    store.set_snapshot(BridgeBalanceSnapshot {
        event_nonce: claim.event_nonce(),
        local_height,
        foreign_height: claim.foreign_height(),
        balances: local.clone(),
    });

    if let (Some(newer), Some(older)) = store.latest_snapshots() {
        if let Err(reason) = check_snapshot_sanity(newer, older, expected, monitored) {
            error!(
                event_nonce = claim.event_nonce(),
                claim_type = %claim.claim_type(),
                %reason,
                "Bridge balance snapshot check failed"
            );
            events.push(BridgeEvent::BalanceAssertionFailed {
                event_nonce: claim.event_nonce(),
                reason,
            });
        }
    }

    assert_reported_balances(claim.bridge_balances(), &local, monitored)?;

    if let Some(keep) = params.snapshot_retention {
        let pruned = store.prune_snapshots(keep);
        if pruned > 0 {
            debug!(pruned, keep, "Pruned balance snapshots");
        }
    }
    Ok(())
}
