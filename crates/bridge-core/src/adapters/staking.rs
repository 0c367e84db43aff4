//! In-memory voting power source.

use std::collections::{BTreeMap, BTreeSet};

use shared_types::ValidatorAddress;
use tracing::info;

use crate::ports::outbound::{Fraction, VotingPower};

/// Bonded validator set kept in process. Jailed validators carry no power.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaking {
    powers: BTreeMap<ValidatorAddress, u64>,
    jailed: BTreeSet<ValidatorAddress>,
}

impl InMemoryStaking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(id, power)` pairs.
    pub fn with_validators(validators: &[(&str, u64)]) -> Self {
        let mut staking = Self::new();
        for (id, power) in validators {
            staking.set_power(&ValidatorAddress::new(*id), *power);
        }
        staking
    }

    /// Add a validator or change its power.
    pub fn set_power(&mut self, validator: &ValidatorAddress, power: u64) {
        self.powers.insert(validator.clone(), power);
    }

    /// Stake of a validator, jailed or not.
    pub fn stake_of(&self, validator: &ValidatorAddress) -> u64 {
        self.powers.get(validator).copied().unwrap_or(0)
    }
}

impl VotingPower for InMemoryStaking {
    fn bonded_power_of(&self, validator: &ValidatorAddress) -> u64 {
        if self.jailed.contains(validator) {
            return 0;
        }
        self.stake_of(validator)
    }

    fn total_bonded_power(&self) -> u64 {
        self.powers
            .iter()
            .filter(|(validator, _)| !self.jailed.contains(*validator))
            .fold(0u64, |acc, (_, power)| acc.saturating_add(*power))
    }

    fn is_validator(&self, validator: &ValidatorAddress) -> bool {
        self.powers.contains_key(validator)
    }

    fn is_jailed(&self, validator: &ValidatorAddress) -> bool {
        self.jailed.contains(validator)
    }

    fn jail(&mut self, validator: &ValidatorAddress) {
        if self.is_validator(validator) {
            self.jailed.insert(validator.clone());
        }
    }

    fn slash(&mut self, validator: &ValidatorAddress, fraction: Fraction) {
        if let Some(power) = self.powers.get_mut(validator) {
            let penalty = fraction.apply(*power);
            *power = power.saturating_sub(penalty);
            info!(%validator, penalty, remaining = *power, "Validator slashed");
        }
    }
}
