//! # Bad Signature Evidence
//!
//! Anyone may submit a signature over an artifact together with the artifact
//! itself. If the local chain never produced that artifact, the signer's
//! validator is jailed and slashed.

use shared_types::ValidatorAddress;
use tracing::{debug, info};

use crate::domain::{recover_signer, BridgeEvent, BridgeStore, EthSignature, EvidenceSubject, Rejected};
use crate::metrics;
use crate::ports::outbound::{Fraction, VotingPower};

/// Result of accepted evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceOutcome {
    /// The validator was jailed and slashed.
    Slashed(ValidatorAddress),
    /// The validator was already jailed; nothing changed.
    AlreadyJailed(ValidatorAddress),
}

pub fn check_bad_signature_evidence(
    store: &BridgeStore,
    voting: &mut dyn VotingPower,
    events: &mut Vec<BridgeEvent>,
    bridge_id: &[u8; 32],
    slash_fraction: Fraction,
    subject: &EvidenceSubject,
    signature_hex: &str,
) -> Result<EvidenceOutcome, Rejected> {
    let checkpoint = subject.checkpoint(bridge_id)?;
    if store.has_checkpoint(&checkpoint) {
        return Err(Rejected::CheckpointAlreadySigned(hex::encode(checkpoint)));
    }

    let signature = EthSignature::from_hex(signature_hex)?;
    let signer = recover_signer(&checkpoint, &signature)?;
    let validator = store
        .validator_for_eth_address(&signer)
        .cloned()
        .ok_or(Rejected::UnknownSigner(signer))?;

    if voting.is_jailed(&validator) {
        debug!(%validator, %signer, "Bad signature from jailed validator");
        return Ok(EvidenceOutcome::AlreadyJailed(validator));
    }
    voting.jail(&validator);
    voting.slash(&validator, slash_fraction);

    metrics::record_slash();
    info!(%validator, %signer, checkpoint = %hex::encode(checkpoint), "Validator slashed for bad signature");
    events.push(BridgeEvent::ValidatorSlashed {
        validator: validator.clone(),
        signer,
        checkpoint: hex::encode(checkpoint),
    });
    Ok(EvidenceOutcome::Slashed(validator))
}
