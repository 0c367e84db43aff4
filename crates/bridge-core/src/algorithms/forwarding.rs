//! # Deposit Forwarding
//!
//! Deposits addressed to another chain are queued while the claim executes
//! and handed to the forwarder at end of block. Funds stay in the bridge
//! module until then.

use tracing::{debug, warn};

use crate::domain::{BridgeEvent, BridgeStore};
use crate::ports::outbound::{CommunityPool, Forwarder, Ledger, BRIDGE_MODULE, TRANSFER_MODULE};

/// Outcome counts of one forwarding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub forwarded: usize,
    pub failed: usize,
}

/// Release up to `max` pending forwards in arrival order.
///
/// A forward that fails is sent to the community pool. If that fails too,
/// the funds stay in the module escrow and the forward is requeued at the
/// back so the next pass retries it.
pub fn process_pending_forwards(
    store: &mut BridgeStore,
    ledger: &mut dyn Ledger,
    forwarder: &mut dyn Forwarder,
    community_pool: &mut dyn CommunityPool,
    events: &mut Vec<BridgeEvent>,
    max: usize,
) -> ForwardSummary {
    let mut summary = ForwardSummary::default();
    let mut retry = Vec::new();

    for _ in 0..max {
        let Some(pending) = store.pop_pending_forward() else {
            break;
        };
        let sent = match ledger.transfer_between_pools(BRIDGE_MODULE, TRANSFER_MODULE, &pending.coin) {
            Err(err) => Err(err.to_string()),
            Ok(()) => match forwarder.forward(&pending.receiver, &pending.coin, &pending.channel) {
                Ok(()) => Ok(()),
                Err(err) => {
                    if let Err(revert) =
                        ledger.transfer_between_pools(TRANSFER_MODULE, BRIDGE_MODULE, &pending.coin)
                    {
                        warn!(event_nonce = pending.event_nonce, error = %revert, "Failed to release forward escrow");
                    }
                    Err(err.to_string())
                }
            },
        };

        match sent {
            Ok(()) => {
                debug!(
                    event_nonce = pending.event_nonce,
                    receiver = %pending.receiver,
                    channel = %pending.channel,
                    "Deposit forwarded"
                );
                summary.forwarded += 1;
                events.push(BridgeEvent::ForwardCompleted {
                    event_nonce: pending.event_nonce,
                    receiver: pending.receiver,
                    coin: pending.coin,
                    channel: pending.channel,
                });
            }
            Err(reason) => {
                warn!(
                    event_nonce = pending.event_nonce,
                    receiver = %pending.receiver,
                    %reason,
                    "Forward failed, sending to community pool"
                );
                summary.failed += 1;
                let fallback = community_pool.deposit_to_community_pool(
                    ledger,
                    BRIDGE_MODULE,
                    std::slice::from_ref(&pending.coin),
                );
                match fallback {
                    Ok(()) => events.push(BridgeEvent::ForwardFailed {
                        event_nonce: pending.event_nonce,
                        receiver: pending.receiver,
                        coin: pending.coin,
                        reason,
                    }),
                    Err(err) => {
                        warn!(event_nonce = pending.event_nonce, error = %err, "Community pool fallback failed");
                        retry.push(pending);
                    }
                }
            }
        }
    }

    for pending in retry {
        store.push_pending_forward(pending);
    }
    summary
}
