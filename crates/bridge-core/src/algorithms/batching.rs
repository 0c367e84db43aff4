//! # Batch Builder
//!
//! Greedy batch assembly over the fee-ordered pool, plus batch cancellation.
//!
//! Selection takes the first `max_elements` pool entries for a contract. The
//! pool index is already ordered by (fee DESC, id DESC), so this is exactly
//! the highest-fee set with ties going to earlier transfers.

use shared_types::EthAddress;
use tracing::{debug, info};

use crate::domain::{
    batch_checkpoint, batch_timeout_height, BlockTimes, BridgeEvent, BridgeStore, OutgoingTxBatch,
    Rejected,
};
use crate::metrics;

/// Inputs to [`build_batch`] that come from configuration and the block.
#[derive(Debug, Clone, Copy)]
pub struct BatchParams<'a> {
    pub bridge_id: &'a [u8; 32],
    pub times: BlockTimes,
    pub local_height: u64,
}

/// Build a batch of up to `max_elements` transfers for `token_contract`.
///
/// Fails without touching the store if the pool is empty for the contract or
/// the new batch would not carry strictly more fees than the latest one.
pub fn build_batch(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    params: BatchParams<'_>,
    token_contract: EthAddress,
    max_elements: usize,
) -> Result<OutgoingTxBatch, Rejected> {
    if max_elements == 0 {
        return Err(Rejected::InvalidMaxElements);
    }

    let quote = store.pool().batch_fees(&token_contract, max_elements);
    if quote.tx_count == 0 {
        return Err(Rejected::EmptyPool(token_contract));
    }
    if let Some(latest) = store.latest_batch_for(&token_contract) {
        let existing = latest.total_fees();
        if quote.total_fees <= existing {
            return Err(Rejected::BatchFeesTooLow {
                existing,
                candidate: quote.total_fees,
            });
        }
    }

    let transactions = store.pool_take_top(&token_contract, max_elements);
    let batch_nonce = store.allocate_batch_nonce();
    let batch_timeout = batch_timeout_height(
        store.last_observed_foreign_height(),
        params.local_height,
        params.times,
    );
    let batch = OutgoingTxBatch {
        batch_nonce,
        batch_timeout,
        transactions,
        token_contract,
        local_block_created: params.local_height,
    };

    store.record_checkpoint(batch_checkpoint(params.bridge_id, &batch));
    store.insert_batch(batch.clone());

    info!(
        %token_contract,
        batch_nonce,
        batch_timeout,
        tx_count = batch.transactions.len(),
        total_fees = %batch.total_fees(),
        "Outgoing batch created"
    );
    metrics::record_batch_created();
    events.push(BridgeEvent::BatchCreated {
        token_contract,
        batch_nonce,
        batch_timeout,
        tx_ids: batch.tx_ids(),
    });
    Ok(batch)
}

/// Delete a batch and return its transfers to the pool.
pub fn cancel_batch(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    token_contract: EthAddress,
    batch_nonce: u64,
) -> Result<OutgoingTxBatch, Rejected> {
    let batch = store
        .remove_batch(&token_contract, batch_nonce)
        .ok_or(Rejected::BatchNotFound {
            token_contract,
            batch_nonce,
        })?;
    for tx in &batch.transactions {
        store.pool_insert(tx.clone());
    }
    debug!(%token_contract, batch_nonce, tx_count = batch.transactions.len(), "Batch cancelled");
    events.push(BridgeEvent::BatchCancelled {
        token_contract,
        batch_nonce,
    });
    Ok(batch)
}

/// Cancel every batch for `token_contract` with a nonce below `batch_nonce`.
pub fn cancel_older_batches(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    token_contract: EthAddress,
    batch_nonce: u64,
) -> usize {
    let stale: Vec<u64> = store
        .batches_for(&token_contract)
        .map(|batch| batch.batch_nonce)
        .filter(|nonce| *nonce < batch_nonce)
        .collect();
    stale
        .into_iter()
        .filter(|nonce| cancel_batch(store, events, token_contract, *nonce).is_ok())
        .count()
}

/// Cancel every batch whose timeout is below the last observed foreign height.
pub fn cleanup_timed_out_batches(store: &mut BridgeStore, events: &mut Vec<BridgeEvent>) -> usize {
    let foreign_height = store.last_observed_foreign_height().foreign_height;
    let expired: Vec<(EthAddress, u64)> = store
        .batches()
        .filter(|batch| batch.batch_timeout < foreign_height)
        .map(|batch| (batch.token_contract, batch.batch_nonce))
        .collect();
    let cancelled = expired
        .into_iter()
        .filter(|(contract, nonce)| cancel_batch(store, events, *contract, *nonce).is_ok())
        .count();
    if cancelled > 0 {
        metrics::record_batches_cancelled(cancelled as u64);
        info!(cancelled, foreign_height, "Timed out batches cancelled");
    }
    cancelled
}
