//! # Inbound Ports
//!
//! API trait defining what the bridge core offers to its host.
//!
//! Every mutating call borrows the host's capabilities through a
//! [`BridgeContext`] for its own duration only.

use shared_types::{AccountAddress, Coin, EthAddress, ValidatorAddress};

use crate::algorithms::{EvidenceOutcome, ForwardSummary};
use crate::context::BridgeContext;
use crate::domain::{
    Attestation, AttestationId, BatchFees, BridgeBalanceSnapshot, BridgeEvent, BridgeResult,
    Claim, EvidenceSubject, LastObservedForeignHeight, ModuleBalanceViolation, OutgoingLogicCall,
    OutgoingTransferTx, OutgoingTxBatch, TokenOrigin, Valset,
};
use crate::ports::outbound::Ledger;

/// Bridge API - inbound port.
pub trait BridgeApi: Send + Sync {
    // =========================================================================
    // ATTESTATION ENGINE
    // =========================================================================

    /// Record a validator's claim and observe whatever became ready.
    fn submit_claim(
        &self,
        ctx: &mut BridgeContext<'_>,
        validator: ValidatorAddress,
        claim: Claim,
    ) -> BridgeResult<AttestationId>;

    /// Tally one attestation; `true` if it was observed.
    fn try_attestation(&self, ctx: &mut BridgeContext<'_>, id: AttestationId) -> BridgeResult<bool>;

    /// Observe consecutive ready attestations. End-block entry point.
    fn attestation_tally(&self, ctx: &mut BridgeContext<'_>) -> BridgeResult<usize>;

    /// Drop attestations older than the configured retention.
    fn prune_attestations(&self) -> usize;

    // =========================================================================
    // OUTGOING POOL & BATCHES
    // =========================================================================

    /// Escrow `amount + fee` and queue a transfer. Returns the transfer id.
    fn enqueue_transfer(
        &self,
        ctx: &mut BridgeContext<'_>,
        sender: AccountAddress,
        dest_address: EthAddress,
        amount: Coin,
        fee: Coin,
    ) -> BridgeResult<u64>;

    /// Refund an unbatched transfer to its sender.
    fn cancel_transfer(
        &self,
        ctx: &mut BridgeContext<'_>,
        id: u64,
        caller: &AccountAddress,
    ) -> BridgeResult<()>;

    fn build_batch(
        &self,
        ctx: &mut BridgeContext<'_>,
        token_contract: EthAddress,
        max_elements: usize,
    ) -> BridgeResult<OutgoingTxBatch>;

    /// Fees `build_batch` would collect for one contract.
    fn batch_fee_by_token(&self, token_contract: EthAddress, max_elements: usize) -> BatchFees;

    /// Fees `build_batch` would collect for every contract, sorted by contract.
    fn all_batch_fees(&self, max_elements: usize) -> Vec<BatchFees>;

    /// Drop a batch and return its transfers to the pool.
    fn cancel_outgoing_batch(&self, token_contract: EthAddress, batch_nonce: u64) -> BridgeResult<()>;

    fn cleanup_timed_out_batches(&self) -> usize;

    // =========================================================================
    // SIGNED ARTIFACTS & EVIDENCE
    // =========================================================================

    /// Record a locally generated validator set and its checkpoint.
    ///
    /// The configured relaying reward replaces whatever reward the set
    /// carried; the stored set is returned.
    fn store_valset(&self, valset: Valset) -> BridgeResult<Valset>;

    /// Record a locally generated logic call and its checkpoint.
    fn store_logic_call(&self, call: OutgoingLogicCall) -> BridgeResult<()>;

    fn set_orchestrator_eth_address(&self, validator: ValidatorAddress, eth_address: EthAddress);

    /// Slash the signer of a checkpoint the chain never produced.
    fn check_bad_signature_evidence(
        &self,
        ctx: &mut BridgeContext<'_>,
        subject: EvidenceSubject,
        signature_hex: &str,
    ) -> BridgeResult<EvidenceOutcome>;

    // =========================================================================
    // END BLOCK
    // =========================================================================

    /// Release up to `max` queued deposit forwards.
    fn process_pending_forwards(&self, ctx: &mut BridgeContext<'_>, max: usize) -> ForwardSummary;

    fn module_balance_invariant(&self, ledger: &dyn Ledger) -> Result<(), ModuleBalanceViolation>;

    /// Keep only the `keep` most recent balance snapshots.
    fn prune_snapshots(&self, keep: usize) -> usize;

    // =========================================================================
    // QUERIES
    // =========================================================================

    fn last_observed_event_nonce(&self) -> u64;

    fn last_observed_foreign_height(&self) -> LastObservedForeignHeight;

    /// Last validator set observed on the foreign chain. This can lag the
    /// live set considerably.
    fn last_observed_valset(&self) -> Option<Valset>;

    fn last_event_nonce_by_validator(&self, validator: &ValidatorAddress) -> u64;

    fn attestation(&self, id: &AttestationId) -> Option<Attestation>;

    /// Batches for a contract, ascending by nonce.
    fn batches_for(&self, token_contract: EthAddress) -> Vec<OutgoingTxBatch>;

    /// Unbatched transfers for a contract in selection order.
    fn pool_transactions(&self, token_contract: EthAddress) -> Vec<OutgoingTransferTx>;

    fn erc20_to_denom(&self, token_contract: EthAddress) -> (TokenOrigin, String);

    fn denom_to_erc20(&self, denom: &str) -> Option<(TokenOrigin, EthAddress)>;

    fn snapshot(&self, event_nonce: u64) -> Option<BridgeBalanceSnapshot>;

    /// Take every event raised since the last call.
    fn drain_events(&self) -> Vec<BridgeEvent>;
}
