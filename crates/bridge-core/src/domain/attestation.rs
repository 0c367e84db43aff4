//! Attestation entity
//!
//! An attestation aggregates every vote for one `(event_nonce, fingerprint)`
//! pair. Votes are counted with the voters' power at tally time, not at vote
//! time, so a slashed validator contributes its reduced power.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_types::{Hash, ValidatorAddress};

use super::claim::Claim;
use crate::ports::outbound::VotingPower;

/// Store key of an attestation. Orders by nonce first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttestationId {
    pub event_nonce: u64,
    pub fingerprint: Hash,
}

impl AttestationId {
    pub fn new(event_nonce: u64, fingerprint: Hash) -> Self {
        Self {
            event_nonce,
            fingerprint,
        }
    }

    pub fn of(claim: &Claim) -> Self {
        Self::new(claim.event_nonce(), claim.fingerprint())
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_nonce, hex::encode(self.fingerprint))
    }
}

/// Aggregated votes for one claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub claim: Claim,
    /// Voters in arrival order, without duplicates.
    pub votes: Vec<ValidatorAddress>,
    /// Set once the claim has been applied; never cleared.
    pub observed: bool,
    /// Local height at which the first vote arrived.
    pub height: u64,
}

impl Attestation {
    pub fn new(claim: Claim, height: u64) -> Self {
        Self {
            claim,
            votes: Vec::new(),
            observed: false,
            height,
        }
    }

    pub fn id(&self) -> AttestationId {
        AttestationId::of(&self.claim)
    }

    pub fn has_vote(&self, validator: &ValidatorAddress) -> bool {
        self.votes.contains(validator)
    }

    /// Append a vote. Returns `false` if the validator already voted.
    pub fn add_vote(&mut self, validator: ValidatorAddress) -> bool {
        if self.has_vote(&validator) {
            return false;
        }
        self.votes.push(validator);
        true
    }
}

/// Power required before an attestation may execute.
///
/// `threshold_pct * total / 100`, truncating. Execution needs strictly more.
pub fn required_power(total_power: u64, threshold_pct: u8) -> u128 {
    u128::from(threshold_pct) * u128::from(total_power) / 100
}

/// Outcome of summing current voter power.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteTally {
    /// Power accumulated up to the crossing point, or all voters if none.
    pub power: u128,
    pub required: u128,
    pub total: u64,
    /// Number of votes consumed when the threshold was crossed.
    pub crossed_at: Option<usize>,
}

impl VoteTally {
    pub fn passed(&self) -> bool {
        self.crossed_at.is_some()
    }
}

/// Sum voter power in vote order, stopping at the first strict crossing.
pub fn tally(
    attestation: &Attestation,
    voting: &dyn VotingPower,
    threshold_pct: u8,
) -> VoteTally {
    let total = voting.total_bonded_power();
    let required = required_power(total, threshold_pct);
    let mut power: u128 = 0;
    for (index, validator) in attestation.votes.iter().enumerate() {
        power += u128::from(voting.bonded_power_of(validator));
        if power > required {
            return VoteTally {
                power,
                required,
                total,
                crossed_at: Some(index + 1),
            };
        }
    }
    VoteTally {
        power,
        required,
        total,
        crossed_at: None,
    }
}
