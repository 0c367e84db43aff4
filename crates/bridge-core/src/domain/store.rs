//! # Bridge Store
//!
//! All bridge state in one value. Every iterated collection is ordered, so
//! two nodes holding the same store iterate it identically.
//!
//! ## Journal
//!
//! While a journal is open every write records its inverse. Rolling back
//! replays those inverses newest first, so a failed claim handler leaves the
//! store exactly as it found it. Journals do not nest.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use shared_types::{AccountAddress, Coin, EthAddress, Hash, ValidatorAddress, U256};

use super::attestation::{Attestation, AttestationId};
use super::batch::{LastObservedForeignHeight, OutgoingTxBatch};
use super::pool::{OutgoingPool, OutgoingTransferTx};
use super::snapshot::BridgeBalanceSnapshot;
use super::valset::{OutgoingLogicCall, Valset};

/// Which chain a token was first issued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenOrigin {
    /// Issued locally; the foreign token is a representation.
    BridgeOriginated,
    /// Issued on the foreign chain; the local denom is a voucher.
    ForeignOriginated,
}

/// A deposit waiting to be forwarded to another chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingForward {
    pub event_nonce: u64,
    pub receiver: AccountAddress,
    pub coin: Coin,
    pub channel: String,
}

/// Inverse of one store write.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreUndo {
    Attestation(AttestationId, Option<Attestation>),
    ValidatorNonce(ValidatorAddress, Option<u64>),
    ObservedEventNonce(u64),
    ObservedForeignHeight(LastObservedForeignHeight),
    ObservedValset(Option<Valset>),
    NextTxId(u64),
    PoolInserted(u64),
    PoolRemoved(OutgoingTransferTx),
    Batch((EthAddress, u64), Option<OutgoingTxBatch>),
    LastBatchNonce(u64),
    Snapshot(u64, Option<BridgeBalanceSnapshot>),
    DenomToContract(String, Option<EthAddress>),
    ContractToDenom(EthAddress, Option<String>),
    CheckpointAdded(Hash),
    Valset(u64, Option<Valset>),
    LogicCall((Vec<u8>, u64), Option<OutgoingLogicCall>),
    Orchestrator(EthAddress, Option<ValidatorAddress>),
    ForwardPushed,
    ForwardPopped(PendingForward),
}

fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStore {
    attestations: BTreeMap<AttestationId, Attestation>,
    last_event_nonce_by_validator: BTreeMap<ValidatorAddress, u64>,
    last_observed_event_nonce: u64,
    last_observed_foreign_height: LastObservedForeignHeight,
    last_observed_valset: Option<Valset>,

    pool: OutgoingPool,
    next_tx_id: u64,
    batches: BTreeMap<(EthAddress, u64), OutgoingTxBatch>,
    last_batch_nonce: u64,

    snapshots: BTreeMap<u64, BridgeBalanceSnapshot>,

    denom_to_contract: BTreeMap<String, EthAddress>,
    contract_to_denom: BTreeMap<EthAddress, String>,

    past_checkpoints: BTreeSet<Hash>,
    valsets: BTreeMap<u64, Valset>,
    logic_calls: BTreeMap<(Vec<u8>, u64), OutgoingLogicCall>,
    orchestrators: BTreeMap<EthAddress, ValidatorAddress>,

    pending_forwards: VecDeque<PendingForward>,

    journal: Option<Vec<StoreUndo>>,
}

impl BridgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // JOURNAL
    // =========================================================================

    /// Start recording inverses. Any journal already open is discarded.
    pub fn begin_journal(&mut self) {
        self.journal = Some(Vec::new());
    }

    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    /// Keep every write made since [`begin_journal`](Self::begin_journal).
    /// Returns the number of writes kept.
    pub fn commit_journal(&mut self) -> usize {
        self.journal.take().map_or(0, |undo| undo.len())
    }

    /// Undo every write made since [`begin_journal`](Self::begin_journal).
    /// Returns the number of writes undone.
    pub fn rollback_journal(&mut self) -> usize {
        let Some(undo) = self.journal.take() else {
            return 0;
        };
        let undone = undo.len();
        for entry in undo.into_iter().rev() {
            self.undo(entry);
        }
        undone
    }

    fn record(&mut self, entry: StoreUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(entry);
        }
    }

    fn undo(&mut self, entry: StoreUndo) {
        match entry {
            StoreUndo::Attestation(id, previous) => restore(&mut self.attestations, id, previous),
            StoreUndo::ValidatorNonce(validator, previous) => {
                restore(&mut self.last_event_nonce_by_validator, validator, previous)
            }
            StoreUndo::ObservedEventNonce(nonce) => self.last_observed_event_nonce = nonce,
            StoreUndo::ObservedForeignHeight(height) => self.last_observed_foreign_height = height,
            StoreUndo::ObservedValset(valset) => self.last_observed_valset = valset,
            StoreUndo::NextTxId(id) => self.next_tx_id = id,
            StoreUndo::PoolInserted(id) => {
                self.pool.remove(id);
            }
            StoreUndo::PoolRemoved(tx) => {
                self.pool.insert(tx);
            }
            StoreUndo::Batch(key, previous) => restore(&mut self.batches, key, previous),
            StoreUndo::LastBatchNonce(nonce) => self.last_batch_nonce = nonce,
            StoreUndo::Snapshot(nonce, previous) => restore(&mut self.snapshots, nonce, previous),
            StoreUndo::DenomToContract(denom, previous) => {
                restore(&mut self.denom_to_contract, denom, previous)
            }
            StoreUndo::ContractToDenom(contract, previous) => {
                restore(&mut self.contract_to_denom, contract, previous)
            }
            StoreUndo::CheckpointAdded(checkpoint) => {
                self.past_checkpoints.remove(&checkpoint);
            }
            StoreUndo::Valset(nonce, previous) => restore(&mut self.valsets, nonce, previous),
            StoreUndo::LogicCall(key, previous) => restore(&mut self.logic_calls, key, previous),
            StoreUndo::Orchestrator(eth_address, previous) => {
                restore(&mut self.orchestrators, eth_address, previous)
            }
            StoreUndo::ForwardPushed => {
                self.pending_forwards.pop_back();
            }
            StoreUndo::ForwardPopped(forward) => self.pending_forwards.push_front(forward),
        }
    }

    // =========================================================================
    // ATTESTATIONS
    // =========================================================================

    pub fn attestation(&self, id: &AttestationId) -> Option<&Attestation> {
        self.attestations.get(id)
    }

    pub fn set_attestation(&mut self, attestation: Attestation) {
        let id = attestation.id();
        let previous = self.attestations.insert(id, attestation);
        self.record(StoreUndo::Attestation(id, previous));
    }

    /// Every attestation for `event_nonce`, ordered by fingerprint.
    pub fn attestations_at(&self, event_nonce: u64) -> Vec<&Attestation> {
        let start = AttestationId::new(event_nonce, [0u8; 32]);
        let end = AttestationId::new(event_nonce, [0xff; 32]);
        self.attestations
            .range(start..=end)
            .map(|(_, attestation)| attestation)
            .collect()
    }

    pub fn attestation_count(&self) -> usize {
        self.attestations.len()
    }

    /// Remove attestations with a nonce strictly below `nonce`.
    pub fn remove_attestations_below(&mut self, nonce: u64) -> usize {
        let keep = self
            .attestations
            .split_off(&AttestationId::new(nonce, [0u8; 32]));
        let removed = std::mem::replace(&mut self.attestations, keep);
        let count = removed.len();
        for (id, attestation) in removed {
            self.record(StoreUndo::Attestation(id, Some(attestation)));
        }
        count
    }

    pub fn last_event_nonce_by_validator(&self, validator: &ValidatorAddress) -> Option<u64> {
        self.last_event_nonce_by_validator.get(validator).copied()
    }

    pub fn set_last_event_nonce_by_validator(&mut self, validator: ValidatorAddress, nonce: u64) {
        let previous = self.last_event_nonce_by_validator.insert(validator.clone(), nonce);
        self.record(StoreUndo::ValidatorNonce(validator, previous));
    }

    pub fn last_observed_event_nonce(&self) -> u64 {
        self.last_observed_event_nonce
    }

    pub fn set_last_observed_event_nonce(&mut self, nonce: u64) {
        let previous = std::mem::replace(&mut self.last_observed_event_nonce, nonce);
        self.record(StoreUndo::ObservedEventNonce(previous));
    }

    pub fn last_observed_foreign_height(&self) -> LastObservedForeignHeight {
        self.last_observed_foreign_height
    }

    pub fn set_last_observed_foreign_height(&mut self, height: LastObservedForeignHeight) {
        let previous = std::mem::replace(&mut self.last_observed_foreign_height, height);
        self.record(StoreUndo::ObservedForeignHeight(previous));
    }

    pub fn last_observed_valset(&self) -> Option<&Valset> {
        self.last_observed_valset.as_ref()
    }

    pub fn set_last_observed_valset(&mut self, valset: Valset) {
        let previous = self.last_observed_valset.replace(valset);
        self.record(StoreUndo::ObservedValset(previous));
    }

    // =========================================================================
    // POOL AND BATCHES
    // =========================================================================

    pub fn pool(&self) -> &OutgoingPool {
        &self.pool
    }

    /// Add a transfer to the pool. Returns `false` if the id is already there.
    pub fn pool_insert(&mut self, tx: OutgoingTransferTx) -> bool {
        let id = tx.id;
        let inserted = self.pool.insert(tx);
        if inserted {
            self.record(StoreUndo::PoolInserted(id));
        }
        inserted
    }

    pub fn pool_remove(&mut self, id: u64) -> Option<OutgoingTransferTx> {
        let tx = self.pool.remove(id)?;
        self.record(StoreUndo::PoolRemoved(tx.clone()));
        Some(tx)
    }

    /// Remove and return up to `max` transfers for `contract` in priority order.
    pub fn pool_take_top(&mut self, contract: &EthAddress, max: usize) -> Vec<OutgoingTransferTx> {
        let taken = self.pool.take_top(contract, max);
        for tx in &taken {
            self.record(StoreUndo::PoolRemoved(tx.clone()));
        }
        taken
    }

    /// Allocate the next transfer id, starting at 1.
    pub fn allocate_tx_id(&mut self) -> u64 {
        self.record(StoreUndo::NextTxId(self.next_tx_id));
        self.next_tx_id += 1;
        self.next_tx_id
    }

    pub fn batch(&self, token_contract: &EthAddress, batch_nonce: u64) -> Option<&OutgoingTxBatch> {
        self.batches.get(&(*token_contract, batch_nonce))
    }

    pub fn insert_batch(&mut self, batch: OutgoingTxBatch) {
        let key = (batch.token_contract, batch.batch_nonce);
        let previous = self.batches.insert(key, batch);
        self.record(StoreUndo::Batch(key, previous));
    }

    pub fn remove_batch(
        &mut self,
        token_contract: &EthAddress,
        batch_nonce: u64,
    ) -> Option<OutgoingTxBatch> {
        let key = (*token_contract, batch_nonce);
        let batch = self.batches.remove(&key)?;
        self.record(StoreUndo::Batch(key, Some(batch.clone())));
        Some(batch)
    }

    /// Batches for one contract, ascending by nonce.
    pub fn batches_for<'a>(
        &'a self,
        token_contract: &EthAddress,
    ) -> impl Iterator<Item = &'a OutgoingTxBatch> + 'a {
        let contract = *token_contract;
        self.batches
            .range((contract, 0)..=(contract, u64::MAX))
            .map(|(_, batch)| batch)
    }

    /// Most recent batch for a contract.
    pub fn latest_batch_for(&self, token_contract: &EthAddress) -> Option<&OutgoingTxBatch> {
        self.batches_for(token_contract).last()
    }

    pub fn batches(&self) -> impl Iterator<Item = &OutgoingTxBatch> {
        self.batches.values()
    }

    /// True if any batch holds transfer `id`.
    pub fn is_batched(&self, id: u64) -> bool {
        self.batches.values().any(|batch| batch.contains_tx(id))
    }

    /// Allocate the next batch nonce, shared across contracts.
    pub fn allocate_batch_nonce(&mut self) -> u64 {
        self.record(StoreUndo::LastBatchNonce(self.last_batch_nonce));
        self.last_batch_nonce += 1;
        self.last_batch_nonce
    }

    pub fn last_batch_nonce(&self) -> u64 {
        self.last_batch_nonce
    }

    /// Amount + fee locked for `token_contract` in batches and the pool.
    pub fn outgoing_total_for(&self, token_contract: &EthAddress) -> U256 {
        let batched = self
            .batches_for(token_contract)
            .fold(U256::zero(), |acc, batch| acc.saturating_add(batch.total()));
        batched.saturating_add(self.pool.total_for(token_contract))
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    pub fn set_snapshot(&mut self, snapshot: BridgeBalanceSnapshot) {
        let nonce = snapshot.event_nonce;
        let previous = self.snapshots.insert(nonce, snapshot);
        self.record(StoreUndo::Snapshot(nonce, previous));
    }

    pub fn snapshot(&self, event_nonce: u64) -> Option<&BridgeBalanceSnapshot> {
        self.snapshots.get(&event_nonce)
    }

    /// The two most recent snapshots, newest first.
    pub fn latest_snapshots(&self) -> (Option<&BridgeBalanceSnapshot>, Option<&BridgeBalanceSnapshot>) {
        let mut newest = self.snapshots.values().rev();
        (newest.next(), newest.next())
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Keep only the `keep` most recent snapshots.
    pub fn prune_snapshots(&mut self, keep: usize) -> usize {
        let excess = self.snapshots.len().saturating_sub(keep);
        let doomed: Vec<u64> = self.snapshots.keys().take(excess).copied().collect();
        for nonce in &doomed {
            let removed = self.snapshots.remove(nonce);
            self.record(StoreUndo::Snapshot(*nonce, removed));
        }
        doomed.len()
    }

    // =========================================================================
    // DENOM REGISTRY
    // =========================================================================

    /// Register a bridge-originated denom and its foreign representation.
    pub fn set_token_mapping(&mut self, denom: String, token_contract: EthAddress) {
        let previous_denom = self.contract_to_denom.insert(token_contract, denom.clone());
        self.record(StoreUndo::ContractToDenom(token_contract, previous_denom));
        let previous_contract = self.denom_to_contract.insert(denom.clone(), token_contract);
        self.record(StoreUndo::DenomToContract(denom, previous_contract));
    }

    pub fn registered_contract(&self, denom: &str) -> Option<EthAddress> {
        self.denom_to_contract.get(denom).copied()
    }

    pub fn registered_denom(&self, token_contract: &EthAddress) -> Option<&str> {
        self.contract_to_denom.get(token_contract).map(String::as_str)
    }

    /// Local denom for a foreign contract. Unregistered contracts are
    /// foreign-originated with denom `<prefix><contract>`.
    pub fn erc20_to_denom(&self, token_contract: &EthAddress, prefix: &str) -> (TokenOrigin, String) {
        match self.registered_denom(token_contract) {
            Some(denom) => (TokenOrigin::BridgeOriginated, denom.to_string()),
            None => (
                TokenOrigin::ForeignOriginated,
                format!("{}{}", prefix, token_contract),
            ),
        }
    }

    /// Foreign contract for a local denom, if one exists.
    pub fn denom_to_erc20(&self, denom: &str, prefix: &str) -> Option<(TokenOrigin, EthAddress)> {
        if let Some(contract) = self.registered_contract(denom) {
            return Some((TokenOrigin::BridgeOriginated, contract));
        }
        let contract: EthAddress = denom.strip_prefix(prefix)?.parse().ok()?;
        // A registered contract cannot also be foreign-originated.
        if self.contract_to_denom.contains_key(&contract) {
            return None;
        }
        Some((TokenOrigin::ForeignOriginated, contract))
    }

    /// Every registered (bridge-originated) contract.
    pub fn registered_contracts(&self) -> impl Iterator<Item = &EthAddress> {
        self.contract_to_denom.keys()
    }

    // =========================================================================
    // SIGNED ARTIFACTS
    // =========================================================================

    pub fn record_checkpoint(&mut self, checkpoint: Hash) {
        if self.past_checkpoints.insert(checkpoint) {
            self.record(StoreUndo::CheckpointAdded(checkpoint));
        }
    }

    pub fn has_checkpoint(&self, checkpoint: &Hash) -> bool {
        self.past_checkpoints.contains(checkpoint)
    }

    pub fn set_valset(&mut self, valset: Valset) {
        let nonce = valset.nonce;
        let previous = self.valsets.insert(nonce, valset);
        self.record(StoreUndo::Valset(nonce, previous));
    }

    pub fn valset(&self, nonce: u64) -> Option<&Valset> {
        self.valsets.get(&nonce)
    }

    pub fn set_logic_call(&mut self, call: OutgoingLogicCall) {
        let key = (call.invalidation_id.clone(), call.invalidation_nonce);
        let previous = self.logic_calls.insert(key.clone(), call);
        self.record(StoreUndo::LogicCall(key, previous));
    }

    pub fn logic_call(&self, invalidation_id: &[u8], invalidation_nonce: u64) -> Option<&OutgoingLogicCall> {
        self.logic_calls
            .get(&(invalidation_id.to_vec(), invalidation_nonce))
    }

    pub fn set_orchestrator(&mut self, eth_address: EthAddress, validator: ValidatorAddress) {
        let previous = self.orchestrators.insert(eth_address, validator);
        self.record(StoreUndo::Orchestrator(eth_address, previous));
    }

    pub fn validator_for_eth_address(&self, eth_address: &EthAddress) -> Option<&ValidatorAddress> {
        self.orchestrators.get(eth_address)
    }

    // =========================================================================
    // PENDING FORWARDS
    // =========================================================================

    pub fn push_pending_forward(&mut self, forward: PendingForward) {
        self.pending_forwards.push_back(forward);
        self.record(StoreUndo::ForwardPushed);
    }

    pub fn pop_pending_forward(&mut self) -> Option<PendingForward> {
        let forward = self.pending_forwards.pop_front()?;
        self.record(StoreUndo::ForwardPopped(forward.clone()));
        Some(forward)
    }

    pub fn pending_forwards(&self) -> impl Iterator<Item = &PendingForward> {
        self.pending_forwards.iter()
    }

    /// Amount of `denom` waiting to be forwarded.
    pub fn pending_forward_total(&self, denom: &str) -> U256 {
        self.pending_forwards
            .iter()
            .filter(|forward| forward.coin.denom == denom)
            .fold(U256::zero(), |acc, forward| acc.saturating_add(forward.coin.amount))
    }
}
