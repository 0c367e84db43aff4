//! Configuration for the bridge core.
//!
//! Loaded from TOML; every field has a default so a partial file is valid.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shared_types::{Coin, EthAddress};
use thiserror::Error;

use crate::domain::checkpoint::fixed_bytes32;
use crate::ports::outbound::Fraction;

/// Default bridge id.
pub const DEFAULT_BRIDGE_ID: &str = "defaultbridgeid";

/// Bridge parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeParams {
    /// Identifies the foreign bridge contract in every checkpoint (max 32 bytes).
    pub bridge_id: String,

    /// Percentage of total power an attestation must strictly exceed.
    pub attestation_threshold_pct: u8,

    /// Target lifetime of a batch on the foreign chain.
    pub target_batch_timeout_ms: u64,

    /// Average local block time.
    pub average_block_time_ms: u64,

    /// Average foreign block time.
    pub average_foreign_block_time_ms: u64,

    /// Stake slashed for signing a checkpoint the chain never produced.
    pub slash_fraction_bad_signature: Fraction,

    /// Reward paid to the relayer of a validator set update.
    pub valset_reward: Option<Coin>,

    /// Tokens whose foreign balance is reported with every claim.
    pub monitored_token_addresses: Vec<EthAddress>,

    /// Prefix of vouchers for foreign-originated tokens.
    pub foreign_denom_prefix: String,

    /// Bech32 prefix of local accounts.
    pub native_address_prefix: String,

    /// Bech32 prefix -> forwarding channel.
    pub forward_channels: BTreeMap<String, String>,

    /// Observed attestations older than this many nonces are pruned.
    pub event_retention: u64,

    /// Number of balance snapshots to keep; all are kept if unset.
    pub snapshot_retention: Option<usize>,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self {
            bridge_id: DEFAULT_BRIDGE_ID.to_string(),
            attestation_threshold_pct: 66,
            target_batch_timeout_ms: 43_200_000, // 12 hours
            average_block_time_ms: 5_000,
            average_foreign_block_time_ms: 15_000,
            slash_fraction_bad_signature: Fraction::new(1, 1000),
            valset_reward: None,
            monitored_token_addresses: Vec::new(),
            foreign_denom_prefix: "bridge".to_string(),
            native_address_prefix: "gravity".to_string(),
            forward_channels: BTreeMap::new(),
            event_retention: 1000,
            snapshot_retention: None,
        }
    }
}

impl BridgeParams {
    /// Parse TOML and validate.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let params: BridgeParams =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge_id.is_empty() || fixed_bytes32(&self.bridge_id).is_none() {
            return Err(ConfigError::Invalid(
                "bridge_id must be 1 to 32 bytes".to_string(),
            ));
        }
        if self.attestation_threshold_pct == 0 || self.attestation_threshold_pct > 100 {
            return Err(ConfigError::Invalid(
                "attestation_threshold_pct must be in 1..=100".to_string(),
            ));
        }
        if self.average_block_time_ms == 0 || self.average_foreign_block_time_ms == 0 {
            return Err(ConfigError::Invalid(
                "block times must be non-zero".to_string(),
            ));
        }
        let fraction = self.slash_fraction_bad_signature;
        if fraction.denominator == 0 || fraction.numerator > fraction.denominator {
            return Err(ConfigError::Invalid(
                "slash_fraction_bad_signature must be within [0, 1]".to_string(),
            ));
        }
        if self.foreign_denom_prefix.is_empty() || self.native_address_prefix.is_empty() {
            return Err(ConfigError::Invalid("prefixes must be non-empty".to_string()));
        }
        if self.forward_channels.contains_key(&self.native_address_prefix) {
            return Err(ConfigError::Invalid(
                "native prefix cannot have a forward channel".to_string(),
            ));
        }
        if matches!(&self.valset_reward, Some(reward) if reward.denom.is_empty()) {
            return Err(ConfigError::Invalid(
                "valset_reward needs a denom".to_string(),
            ));
        }
        if self.snapshot_retention == Some(0) {
            return Err(ConfigError::Invalid(
                "snapshot_retention must keep at least one snapshot".to_string(),
            ));
        }
        Ok(())
    }

    /// Bridge id as `bytes32`. Call after [`BridgeParams::validate`].
    pub fn bridge_id_bytes(&self) -> [u8; 32] {
        fixed_bytes32(&self.bridge_id).unwrap_or([0u8; 32])
    }

    pub fn forward_channel(&self, prefix: &str) -> Option<&str> {
        self.forward_channels.get(prefix).map(String::as_str)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Config IO error: {0}")]
    Io(String),
    /// Input is not valid TOML for these parameters.
    #[error("Config parse error: {0}")]
    Parse(String),
    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
