//! Outgoing transaction batches and timeout projection.

use serde::{Deserialize, Serialize};
use shared_types::{EthAddress, U256};

use super::pool::OutgoingTransferTx;

/// A group of same-token transfers signed and relayed as one unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTxBatch {
    pub batch_nonce: u64,
    /// Foreign height after which the batch can no longer execute.
    pub batch_timeout: u64,
    pub transactions: Vec<OutgoingTransferTx>,
    pub token_contract: EthAddress,
    /// Local height at creation.
    pub local_block_created: u64,
}

impl OutgoingTxBatch {
    /// Sum of the fees of every transaction.
    pub fn total_fees(&self) -> U256 {
        self.transactions
            .iter()
            .fold(U256::zero(), |acc, tx| acc.saturating_add(tx.erc20_fee.amount))
    }

    /// Sum of amount + fee of every transaction.
    pub fn total(&self) -> U256 {
        self.transactions
            .iter()
            .fold(U256::zero(), |acc, tx| acc.saturating_add(tx.total()))
    }

    pub fn tx_ids(&self) -> Vec<u64> {
        self.transactions.iter().map(|tx| tx.id).collect()
    }

    pub fn contains_tx(&self, id: u64) -> bool {
        self.transactions.iter().any(|tx| tx.id == id)
    }
}

/// The pair recorded each time a claim is observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastObservedForeignHeight {
    pub foreign_height: u64,
    pub local_height: u64,
}

/// Timing parameters used to project foreign heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockTimes {
    pub average_block_time_ms: u64,
    pub average_foreign_block_time_ms: u64,
    pub target_batch_timeout_ms: u64,
}

/// Foreign height at which a batch created at `current_local_height` times out.
///
/// Returns 0 when nothing has been observed yet, or when either block time is
/// zero, so that the batch is considered timed out by the first observation.
pub fn batch_timeout_height(
    observed: LastObservedForeignHeight,
    current_local_height: u64,
    times: BlockTimes,
) -> u64 {
    if observed.foreign_height == 0
        || observed.local_height == 0
        || times.average_foreign_block_time_ms == 0
    {
        return 0;
    }
    let elapsed_blocks = u128::from(current_local_height.saturating_sub(observed.local_height));
    let elapsed_ms = elapsed_blocks * u128::from(times.average_block_time_ms);
    let foreign_time = u128::from(times.average_foreign_block_time_ms);
    let projected = u128::from(observed.foreign_height) + elapsed_ms / foreign_time;
    let timeout_blocks = u128::from(times.target_batch_timeout_ms) / foreign_time;
    u64::try_from(projected + timeout_blocks).unwrap_or(u64::MAX)
}
