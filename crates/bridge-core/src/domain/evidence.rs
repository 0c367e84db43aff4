//! # Bad Signature Evidence
//!
//! A validator's orchestrator key signs checkpoints of artifacts the local
//! chain produced. A valid signature over a checkpoint the chain never
//! produced is evidence of misbehavior.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use shared_types::{EthAddress, Hash};

use super::batch::OutgoingTxBatch;
use super::checkpoint::{batch_checkpoint, keccak256, logic_call_checkpoint, valset_checkpoint};
use super::errors::Rejected;
use super::valset::{OutgoingLogicCall, Valset};

const SIGNATURE_LEN: usize = 65;
const ETH_SIGNED_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// The artifact a submitted signature claims to cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceSubject {
    Batch(OutgoingTxBatch),
    Valset(Valset),
    LogicCall(OutgoingLogicCall),
}

impl EvidenceSubject {
    pub fn checkpoint(&self, bridge_id: &[u8; 32]) -> Result<Hash, Rejected> {
        match self {
            EvidenceSubject::Batch(batch) => Ok(batch_checkpoint(bridge_id, batch)),
            EvidenceSubject::Valset(valset) => Ok(valset_checkpoint(bridge_id, valset)),
            EvidenceSubject::LogicCall(call) => logic_call_checkpoint(bridge_id, call),
        }
    }
}

/// Recoverable secp256k1 signature as `r || s || v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl EthSignature {
    /// Decode 65 hex-encoded bytes, with or without a `0x` prefix.
    pub fn from_hex(signature: &str) -> Result<Self, Rejected> {
        let digits = signature.strip_prefix("0x").unwrap_or(signature);
        let bytes = hex::decode(digits)
            .map_err(|e| Rejected::InvalidSignature(format!("bad hex: {}", e)))?;
        if bytes.len() != SIGNATURE_LEN {
            return Err(Rejected::InvalidSignature(format!(
                "expected {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        bytes.extend_from_slice(&self.r);
        bytes.extend_from_slice(&self.s);
        bytes.push(self.v);
        format!("0x{}", hex::encode(bytes))
    }
}

/// Hash actually signed by an Ethereum key for `checkpoint`.
pub fn eth_signed_message_hash(checkpoint: &Hash) -> Hash {
    let mut message = Vec::with_capacity(ETH_SIGNED_PREFIX.len() + checkpoint.len());
    message.extend_from_slice(ETH_SIGNED_PREFIX);
    message.extend_from_slice(checkpoint);
    keccak256(&message)
}

/// Ethereum address of a public key.
pub fn address_from_key(key: &VerifyingKey) -> EthAddress {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    EthAddress::from_bytes(address)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, Rejected> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(Rejected::InvalidSignature(format!("invalid v {}", v))),
    };
    RecoveryId::from_byte(id).ok_or_else(|| Rejected::InvalidSignature(format!("invalid v {}", v)))
}

/// Recover the Ethereum address that signed `checkpoint`.
pub fn recover_signer(checkpoint: &Hash, signature: &EthSignature) -> Result<EthAddress, Rejected> {
    let recovery_id = parse_recovery_id(signature.v)?;
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&rs)
        .map_err(|e| Rejected::InvalidSignature(e.to_string()))?;
    let digest = eth_signed_message_hash(checkpoint);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|e| Rejected::InvalidSignature(e.to_string()))?;
    Ok(address_from_key(&key))
}
