//! # Attestation Engine
//!
//! Claim intake, vote tallying and observation.
//!
//! ## Ordering
//!
//! Each validator submits claims with consecutive nonces. Observation is
//! strictly sequential: only the attestation at `last_observed + 1` is ever
//! tried. Competing attestations at an observed nonce are never tried again.
//!
//! ## Execution
//!
//! When an attestation crosses the threshold the watermark advances first and
//! the claim handler runs against a [`LedgerOverlay`] while the store keeps an
//! undo journal. A handler error discards the overlay and rolls the journal
//! back; the watermark stays advanced.

use shared_types::{Erc20Token, ValidatorAddress};
use tracing::{debug, error, info, trace};

use super::balances::assert_bridge_balances;
use super::claim_handler::{execute_claim, ExecutionScope};
use crate::adapters::{replay, LedgerOverlay};
use crate::config::BridgeParams;
use crate::context::BridgeContext;
use crate::domain::{
    invariant_foreign_height_monotonic, invariant_next_event_nonce, invariant_validator_nonce,
    tally, Attestation, AttestationId, BridgeError, BridgeEvent, BridgeStore, Claim, FatalError,
    LastObservedForeignHeight, Rejected,
};
use crate::metrics;

/// Nonce a validator is expected to have submitted last.
///
/// A validator without a counter starts just below the watermark so that it
/// can still vote on the most recently observed event.
pub fn last_event_nonce_for(store: &BridgeStore, validator: &ValidatorAddress) -> u64 {
    store
        .last_event_nonce_by_validator(validator)
        .unwrap_or_else(|| store.last_observed_event_nonce().max(1) - 1)
}

/// Record `validator`'s vote for `claim`, then observe whatever is ready.
pub fn submit_claim(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    params: &BridgeParams,
    ctx: &mut BridgeContext<'_>,
    validator: ValidatorAddress,
    claim: Claim,
) -> Result<AttestationId, BridgeError> {
    let last = last_event_nonce_for(store, &validator);
    invariant_validator_nonce(last, claim.event_nonce())?;

    if !ctx.voting.is_validator(&validator) || ctx.voting.bonded_power_of(&validator) == 0 {
        return Err(Rejected::UnknownValidator(validator).into());
    }

    let id = AttestationId::of(&claim);
    let mut attestation = match store.attestation(&id) {
        Some(stored) => {
            let stored_height = stored.claim.foreign_height();
            if stored_height != claim.foreign_height() {
                return Err(FatalError::ClaimHeightMismatch {
                    claimed: claim.foreign_height(),
                    stored: stored_height,
                }
                .into());
            }
            stored.clone()
        }
        None => Attestation::new(claim, ctx.block_height),
    };

    if !attestation.add_vote(validator.clone()) {
        return Err(Rejected::DuplicateVote {
            validator,
            event_nonce: id.event_nonce,
        }
        .into());
    }
    let observed = attestation.observed;
    store.set_attestation(attestation);
    store.set_last_event_nonce_by_validator(validator.clone(), id.event_nonce);
    metrics::record_vote();
    debug!(%validator, attestation = %id, observed, "Claim vote recorded");

    if !observed {
        attestation_tally(store, events, params, ctx)?;
    }
    Ok(id)
}

/// Observe consecutive attestations starting at `last_observed + 1` for as
/// long as one of them has enough power. Returns the number observed.
pub fn attestation_tally(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    params: &BridgeParams,
    ctx: &mut BridgeContext<'_>,
) -> Result<usize, BridgeError> {
    let mut observed = 0;
    loop {
        let next = store.last_observed_event_nonce().saturating_add(1);
        let candidates: Vec<AttestationId> = store
            .attestations_at(next)
            .into_iter()
            .filter(|attestation| !attestation.observed)
            .map(Attestation::id)
            .collect();

        let mut advanced = false;
        for id in candidates {
            if try_attestation(store, events, params, ctx, id)? {
                advanced = true;
                break;
            }
        }
        if !advanced {
            return Ok(observed);
        }
        observed += 1;
    }
}

/// Tally one attestation and apply it if it crossed the threshold.
///
/// Returns `Ok(false)` if it did not; nothing is written in that case.
pub fn try_attestation(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    params: &BridgeParams,
    ctx: &mut BridgeContext<'_>,
    id: AttestationId,
) -> Result<bool, BridgeError> {
    let mut attestation = store
        .attestation(&id)
        .cloned()
        .ok_or_else(|| FatalError::MissingAttestation(id.to_string()))?;
    if attestation.observed {
        return Err(FatalError::AttestationAlreadyObserved(id.to_string()).into());
    }

    let result = tally(&attestation, &*ctx.voting, params.attestation_threshold_pct);
    if !result.passed() {
        trace!(attestation = %id, power = result.power, required = result.required, "Below threshold");
        return Ok(false);
    }

    let claim = attestation.claim.clone();
    let current = store.last_observed_foreign_height();
    invariant_next_event_nonce(store.last_observed_event_nonce(), claim.event_nonce())?;
    invariant_foreign_height_monotonic(current.foreign_height, claim.foreign_height())?;

    store.set_last_observed_event_nonce(claim.event_nonce());
    store.set_last_observed_foreign_height(LastObservedForeignHeight {
        foreign_height: claim.foreign_height(),
        local_height: ctx.block_height,
    });
    attestation.observed = true;
    store.set_attestation(attestation);

    let expected = execute_in_overlay(store, events, params, ctx, &claim)?;
    assert_bridge_balances(
        store,
        &*ctx.ledger,
        events,
        params,
        ctx.block_height,
        &claim,
        &expected,
    )?;

    info!(
        claim_type = %claim.claim_type(),
        event_nonce = claim.event_nonce(),
        attestation = %id,
        power = result.power,
        total = result.total,
        "Attestation observed"
    );
    metrics::record_observed(claim.claim_type().as_str());
    events.push(BridgeEvent::ClaimObserved {
        claim_type: claim.claim_type(),
        event_nonce: claim.event_nonce(),
        attestation_id: id,
    });
    Ok(true)
}

/// Run the claim handler with the ledger staged in an overlay and the store
/// journaled, then commit both or roll both back.
///
/// Recoverable failures are logged and yield no expected balance change.
fn execute_in_overlay(
    store: &mut BridgeStore,
    events: &mut Vec<BridgeEvent>,
    params: &BridgeParams,
    ctx: &mut BridgeContext<'_>,
    claim: &Claim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    let mut staged_events = Vec::new();
    store.begin_journal();

    let outcome = {
        let mut overlay = LedgerOverlay::new(&*ctx.ledger);
        let result = {
            let mut scope = ExecutionScope {
                params,
                store: &mut *store,
                ledger: &mut overlay,
                community_pool: &mut *ctx.community_pool,
                events: &mut staged_events,
            };
            execute_claim(&mut scope, claim)
        };
        result.map(|expected| (expected, overlay.into_journal()))
    };

    match outcome {
        Ok((expected, journal)) => {
            if let Err(err) = replay(&journal, &mut *ctx.ledger) {
                store.rollback_journal();
                return Err(FatalError::OverlayCommit(err).into());
            }
            let writes = store.commit_journal();
            trace!(event_nonce = claim.event_nonce(), writes, "Claim effects committed");
            events.append(&mut staged_events);
            Ok(expected)
        }
        Err(err) => {
            let undone = store.rollback_journal();
            if err.is_fatal() {
                return Err(err);
            }
            error!(
                claim_type = %claim.claim_type(),
                event_nonce = claim.event_nonce(),
                error = %err,
                undone,
                "Claim execution failed, effects discarded"
            );
            metrics::record_execution_failure(claim.claim_type().as_str());
            Ok(Vec::new())
        }
    }
}

/// Delete attestations more than `event_retention` nonces behind the watermark.
pub fn prune_attestations(store: &mut BridgeStore, event_retention: u64) -> usize {
    let cutoff = store
        .last_observed_event_nonce()
        .saturating_sub(event_retention);
    let removed = store.remove_attestations_below(cutoff);
    if removed > 0 {
        debug!(removed, cutoff, "Pruned attestations");
    }
    removed
}
