//! Bridge Service - Core business logic
//!
//! Owns the bridge store and the pending event buffer. Host capabilities
//! arrive per call through [`BridgeContext`].

use parking_lot::RwLock;
use shared_types::{AccountAddress, Coin, EthAddress, ValidatorAddress, U256};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::algorithms::{self, BatchParams, EvidenceOutcome, ForwardSummary, TransferRequest};
use crate::config::{BridgeParams, ConfigError};
use crate::context::BridgeContext;
use crate::domain::{
    logic_call_checkpoint, module_balance_invariant, valset_checkpoint, Attestation,
    AttestationId, BatchFees, BlockTimes, BridgeBalanceSnapshot, BridgeError, BridgeEvent,
    BridgeResult, BridgeStore, Claim, EvidenceSubject, LastObservedForeignHeight,
    ModuleBalanceViolation, OutgoingLogicCall, OutgoingTransferTx, OutgoingTxBatch, Rejected,
    TokenOrigin, Valset,
};
use crate::metrics;
use crate::ports::inbound::BridgeApi;
use crate::ports::outbound::Ledger;

/// Internal state guarded by the service lock
struct BridgeServiceState {
    store: BridgeStore,
    /// Events raised since the last drain
    events: Vec<BridgeEvent>,
}

impl BridgeServiceState {
    fn new() -> Self {
        Self {
            store: BridgeStore::new(),
            events: Vec::new(),
        }
    }
}

/// Bridge trust core.
pub struct BridgeService {
    params: BridgeParams,
    bridge_id: [u8; 32],
    state: Arc<RwLock<BridgeServiceState>>,
}

impl BridgeService {
    /// Create a service with validated parameters and an empty store.
    pub fn new(params: BridgeParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let bridge_id = params.bridge_id_bytes();
        info!(
            bridge_id = %params.bridge_id,
            threshold_pct = params.attestation_threshold_pct,
            "Bridge service initialized"
        );
        Ok(Self {
            params,
            bridge_id,
            state: Arc::new(RwLock::new(BridgeServiceState::new())),
        })
    }

    pub fn params(&self) -> &BridgeParams {
        &self.params
    }

    fn block_times(&self) -> BlockTimes {
        BlockTimes {
            average_block_time_ms: self.params.average_block_time_ms,
            average_foreign_block_time_ms: self.params.average_foreign_block_time_ms,
            target_batch_timeout_ms: self.params.target_batch_timeout_ms,
        }
    }

    /// Log and count an error before handing it back.
    /// Stamp the configured relaying reward onto a freshly generated set.
    /// The reward must be a bridge-originated token the foreign contract
    /// already knows.
    fn with_valset_reward(&self, store: &BridgeStore, mut valset: Valset) -> Result<Valset, Rejected> {
        valset.reward_amount = U256::zero();
        valset.reward_token = EthAddress::ZERO;
        let Some(reward) = self.params.valset_reward.as_ref().filter(|coin| !coin.is_zero()) else {
            return Ok(valset);
        };
        match store.denom_to_erc20(&reward.denom, &self.params.foreign_denom_prefix) {
            Some((TokenOrigin::BridgeOriginated, contract)) => {
                valset.reward_amount = reward.amount;
                valset.reward_token = contract;
                Ok(valset)
            }
            Some((TokenOrigin::ForeignOriginated, _)) => Err(Rejected::InvalidSubject(format!(
                "valset reward {} is not a bridge-originated token",
                reward.denom
            ))),
            None => Err(Rejected::UnknownToken(reward.denom.clone())),
        }
    }

    fn track<T>(&self, operation: &'static str, result: BridgeResult<T>) -> BridgeResult<T> {
        if let Err(err) = &result {
            metrics::record_error(err.tier());
            if err.is_fatal() {
                error!(operation, error = %err, "Bridge invariant violated, halt required");
            } else {
                warn!(operation, error = %err, "Bridge operation failed");
            }
        }
        result
    }
}

impl BridgeApi for BridgeService {
    fn submit_claim(
        &self,
        ctx: &mut BridgeContext<'_>,
        validator: ValidatorAddress,
        claim: Claim,
    ) -> BridgeResult<AttestationId> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::submit_claim(
            &mut state.store,
            &mut state.events,
            &self.params,
            ctx,
            validator,
            claim,
        );
        self.track("submit_claim", result)
    }

    fn try_attestation(&self, ctx: &mut BridgeContext<'_>, id: AttestationId) -> BridgeResult<bool> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result =
            algorithms::try_attestation(&mut state.store, &mut state.events, &self.params, ctx, id);
        self.track("try_attestation", result)
    }

    fn attestation_tally(&self, ctx: &mut BridgeContext<'_>) -> BridgeResult<usize> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result =
            algorithms::attestation_tally(&mut state.store, &mut state.events, &self.params, ctx);
        self.track("attestation_tally", result)
    }

    fn prune_attestations(&self) -> usize {
        let mut state = self.state.write();
        algorithms::prune_attestations(&mut state.store, self.params.event_retention)
    }

    fn enqueue_transfer(
        &self,
        ctx: &mut BridgeContext<'_>,
        sender: AccountAddress,
        dest_address: EthAddress,
        amount: Coin,
        fee: Coin,
    ) -> BridgeResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::enqueue_transfer(
            &mut state.store,
            &mut *ctx.ledger,
            &mut state.events,
            &self.params.foreign_denom_prefix,
            TransferRequest {
                sender,
                dest_address,
                amount,
                fee,
            },
        )
        .map_err(BridgeError::from);
        self.track("enqueue_transfer", result)
    }

    fn cancel_transfer(
        &self,
        ctx: &mut BridgeContext<'_>,
        id: u64,
        caller: &AccountAddress,
    ) -> BridgeResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::cancel_transfer(
            &mut state.store,
            &mut *ctx.ledger,
            &mut state.events,
            &self.params.foreign_denom_prefix,
            id,
            caller,
        )
        .map_err(BridgeError::from);
        self.track("cancel_transfer", result)
    }

    fn build_batch(
        &self,
        ctx: &mut BridgeContext<'_>,
        token_contract: EthAddress,
        max_elements: usize,
    ) -> BridgeResult<OutgoingTxBatch> {
        let params = BatchParams {
            bridge_id: &self.bridge_id,
            times: self.block_times(),
            local_height: ctx.block_height,
        };
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::build_batch(
            &mut state.store,
            &mut state.events,
            params,
            token_contract,
            max_elements,
        )
        .map_err(BridgeError::from);
        self.track("build_batch", result)
    }

    fn batch_fee_by_token(&self, token_contract: EthAddress, max_elements: usize) -> BatchFees {
        self.state.read().store.pool().batch_fees(&token_contract, max_elements)
    }

    fn all_batch_fees(&self, max_elements: usize) -> Vec<BatchFees> {
        self.state.read().store.pool().all_batch_fees(max_elements)
    }

    fn cancel_outgoing_batch(&self, token_contract: EthAddress, batch_nonce: u64) -> BridgeResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::cancel_batch(
            &mut state.store,
            &mut state.events,
            token_contract,
            batch_nonce,
        )
        .map(|_| ())
        .map_err(BridgeError::from);
        if result.is_ok() {
            metrics::record_batches_cancelled(1);
        }
        self.track("cancel_outgoing_batch", result)
    }

    fn cleanup_timed_out_batches(&self) -> usize {
        let mut guard = self.state.write();
        let state = &mut *guard;
        algorithms::cleanup_timed_out_batches(&mut state.store, &mut state.events)
    }

    fn store_valset(&self, valset: Valset) -> BridgeResult<Valset> {
        let mut state = self.state.write();
        let valset = match self.with_valset_reward(&state.store, valset) {
            Ok(valset) => valset,
            Err(err) => return self.track("store_valset", Err(err.into())),
        };
        let checkpoint = valset_checkpoint(&self.bridge_id, &valset);
        state.store.record_checkpoint(checkpoint);
        state.store.set_valset(valset.clone());
        Ok(valset)
    }

    fn store_logic_call(&self, call: OutgoingLogicCall) -> BridgeResult<()> {
        let checkpoint = match logic_call_checkpoint(&self.bridge_id, &call) {
            Ok(checkpoint) => checkpoint,
            Err(err) => return self.track("store_logic_call", Err(err.into())),
        };
        let mut state = self.state.write();
        state.store.record_checkpoint(checkpoint);
        state.store.set_logic_call(call);
        Ok(())
    }

    fn set_orchestrator_eth_address(&self, validator: ValidatorAddress, eth_address: EthAddress) {
        self.state.write().store.set_orchestrator(eth_address, validator);
    }

    fn check_bad_signature_evidence(
        &self,
        ctx: &mut BridgeContext<'_>,
        subject: EvidenceSubject,
        signature_hex: &str,
    ) -> BridgeResult<EvidenceOutcome> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let result = algorithms::check_bad_signature_evidence(
            &state.store,
            &mut *ctx.voting,
            &mut state.events,
            &self.bridge_id,
            self.params.slash_fraction_bad_signature,
            &subject,
            signature_hex,
        )
        .map_err(BridgeError::from);
        self.track("check_bad_signature_evidence", result)
    }

    fn process_pending_forwards(&self, ctx: &mut BridgeContext<'_>, max: usize) -> ForwardSummary {
        let mut guard = self.state.write();
        let state = &mut *guard;
        algorithms::process_pending_forwards(
            &mut state.store,
            &mut *ctx.ledger,
            &mut *ctx.forwarder,
            &mut *ctx.community_pool,
            &mut state.events,
            max,
        )
    }

    fn module_balance_invariant(&self, ledger: &dyn Ledger) -> Result<(), ModuleBalanceViolation> {
        let state = self.state.read();
        let result = module_balance_invariant(&state.store, ledger, &self.params.foreign_denom_prefix);
        if let Err(violation) = &result {
            error!(%violation, "Module balance invariant broken");
        }
        result
    }

    fn prune_snapshots(&self, keep: usize) -> usize {
        self.state.write().store.prune_snapshots(keep)
    }

    fn last_observed_event_nonce(&self) -> u64 {
        self.state.read().store.last_observed_event_nonce()
    }

    fn last_observed_foreign_height(&self) -> LastObservedForeignHeight {
        self.state.read().store.last_observed_foreign_height()
    }

    fn last_observed_valset(&self) -> Option<Valset> {
        self.state.read().store.last_observed_valset().cloned()
    }

    fn last_event_nonce_by_validator(&self, validator: &ValidatorAddress) -> u64 {
        algorithms::last_event_nonce_for(&self.state.read().store, validator)
    }

    fn attestation(&self, id: &AttestationId) -> Option<Attestation> {
        self.state.read().store.attestation(id).cloned()
    }

    fn batches_for(&self, token_contract: EthAddress) -> Vec<OutgoingTxBatch> {
        self.state
            .read()
            .store
            .batches_for(&token_contract)
            .cloned()
            .collect()
    }

    fn pool_transactions(&self, token_contract: EthAddress) -> Vec<OutgoingTransferTx> {
        self.state
            .read()
            .store
            .pool()
            .iter_by_fee(&token_contract)
            .cloned()
            .collect()
    }

    fn erc20_to_denom(&self, token_contract: EthAddress) -> (TokenOrigin, String) {
        self.state
            .read()
            .store
            .erc20_to_denom(&token_contract, &self.params.foreign_denom_prefix)
    }

    fn denom_to_erc20(&self, denom: &str) -> Option<(TokenOrigin, EthAddress)> {
        self.state
            .read()
            .store
            .denom_to_erc20(denom, &self.params.foreign_denom_prefix)
    }

    fn snapshot(&self, event_nonce: u64) -> Option<BridgeBalanceSnapshot> {
        self.state.read().store.snapshot(event_nonce).cloned()
    }

    fn drain_events(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.state.write().events)
    }
}
