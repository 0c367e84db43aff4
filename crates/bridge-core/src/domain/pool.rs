//! # Outgoing Transfer Pool
//!
//! Pending transfers to the foreign chain, waiting to be batched.
//!
//! ## Data Structures
//!
//! - `by_id`: O(log n) lookup of unbatched transfers
//! - `by_fee`: per-contract ordered index keyed by (fee DESC, id DESC), so
//!   the first `n` entries of a contract are exactly what a batch takes.
//!   Among equal fees the most recent transfer goes first.
//!
//! Transfers that are in a batch live in the batch, not here.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::{AccountAddress, Erc20Token, EthAddress, U256};

/// A pending transfer to the foreign chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingTransferTx {
    pub id: u64,
    pub sender: AccountAddress,
    pub dest_address: EthAddress,
    pub erc20_token: Erc20Token,
    pub erc20_fee: Erc20Token,
}

impl OutgoingTransferTx {
    pub fn token_contract(&self) -> EthAddress {
        self.erc20_token.contract
    }

    /// Amount plus fee, the value escrowed for this transfer.
    pub fn total(&self) -> U256 {
        self.erc20_token.amount.saturating_add(self.erc20_fee.amount)
    }
}

/// Index entry ordering transfers by priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeKey {
    pub fee: U256,
    pub id: u64,
}

impl Ord for FeeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher fee first
        other
            .fee
            .cmp(&self.fee)
            // Later id first for equal fees
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for FeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending fees for the next batch of one contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFees {
    pub token: EthAddress,
    pub total_fees: U256,
    pub tx_count: u64,
}

/// Unbatched outgoing transfers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutgoingPool {
    by_id: BTreeMap<u64, OutgoingTransferTx>,
    by_fee: BTreeMap<EthAddress, BTreeSet<FeeKey>>,
}

impl OutgoingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&OutgoingTransferTx> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Insert a transfer. Returns `false` if the id is already present.
    pub fn insert(&mut self, tx: OutgoingTransferTx) -> bool {
        if self.by_id.contains_key(&tx.id) {
            return false;
        }
        self.by_fee
            .entry(tx.token_contract())
            .or_default()
            .insert(FeeKey {
                fee: tx.erc20_fee.amount,
                id: tx.id,
            });
        self.by_id.insert(tx.id, tx);
        true
    }

    pub fn remove(&mut self, id: u64) -> Option<OutgoingTransferTx> {
        let tx = self.by_id.remove(&id)?;
        let contract = tx.token_contract();
        if let Some(index) = self.by_fee.get_mut(&contract) {
            index.remove(&FeeKey {
                fee: tx.erc20_fee.amount,
                id: tx.id,
            });
            if index.is_empty() {
                self.by_fee.remove(&contract);
            }
        }
        Some(tx)
    }

    /// Transfers for `contract` in priority order.
    pub fn iter_by_fee<'a>(
        &'a self,
        contract: &EthAddress,
    ) -> impl Iterator<Item = &'a OutgoingTransferTx> + 'a {
        self.by_fee
            .get(contract)
            .into_iter()
            .flat_map(|index| index.iter())
            .filter_map(move |key| self.by_id.get(&key.id))
    }

    /// Ids of the first `max` transfers for `contract`.
    pub fn top_ids(&self, contract: &EthAddress, max: usize) -> Vec<u64> {
        self.iter_by_fee(contract).take(max).map(|tx| tx.id).collect()
    }

    /// Remove and return the first `max` transfers for `contract`.
    pub fn take_top(&mut self, contract: &EthAddress, max: usize) -> Vec<OutgoingTransferTx> {
        let ids = self.top_ids(contract, max);
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Fee total of what [`OutgoingPool::take_top`] would return.
    pub fn batch_fees(&self, contract: &EthAddress, max: usize) -> BatchFees {
        let mut total_fees = U256::zero();
        let mut tx_count = 0u64;
        for tx in self.iter_by_fee(contract).take(max) {
            total_fees = total_fees.saturating_add(tx.erc20_fee.amount);
            tx_count += 1;
        }
        BatchFees {
            token: *contract,
            total_fees,
            tx_count,
        }
    }

    /// Fee quotes for every contract with pending transfers, sorted by contract.
    pub fn all_batch_fees(&self, max: usize) -> Vec<BatchFees> {
        self.by_fee
            .keys()
            .map(|contract| self.batch_fees(contract, max))
            .collect()
    }

    /// Sum of amount + fee over unbatched transfers for `contract`.
    pub fn total_for(&self, contract: &EthAddress) -> U256 {
        self.iter_by_fee(contract)
            .fold(U256::zero(), |acc, tx| acc.saturating_add(tx.total()))
    }

    pub fn contracts(&self) -> impl Iterator<Item = &EthAddress> {
        self.by_fee.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutgoingTransferTx> {
        self.by_id.values()
    }
}
