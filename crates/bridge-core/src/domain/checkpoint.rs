//! # Checkpoints
//!
//! The hash validators sign for each artifact the foreign bridge contract
//! executes: Keccak-256 over `abi.encode` of the artifact, prefixed with the
//! 32-byte bridge id and a method tag.

use ethabi::Token;
use sha3::{Digest, Keccak256};
use shared_types::{EthAddress, Hash, U256};

use super::batch::OutgoingTxBatch;
use super::errors::Rejected;
use super::valset::{OutgoingLogicCall, Valset};

const WORD: usize = 32;

/// Keccak-256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Right-pad a string into a `bytes32`. Returns `None` if it does not fit.
pub fn fixed_bytes32(value: &str) -> Option<[u8; 32]> {
    let bytes = value.as_bytes();
    if bytes.len() > WORD {
        return None;
    }
    let mut out = [0u8; WORD];
    out[..bytes.len()].copy_from_slice(bytes);
    Some(out)
}

fn address(address: &EthAddress) -> Token {
    Token::Address(ethabi::Address::from(*address.as_bytes()))
}

fn uint(value: impl Into<U256>) -> Token {
    Token::Uint(value.into())
}

fn uint_array(values: impl IntoIterator<Item = U256>) -> Token {
    Token::Array(values.into_iter().map(Token::Uint).collect())
}

fn address_array<'a>(addresses: impl IntoIterator<Item = &'a EthAddress>) -> Token {
    Token::Array(addresses.into_iter().map(address).collect())
}

fn method_tag(name: &str) -> Token {
    // Method names are short literals, always under 32 bytes.
    Token::FixedBytes(fixed_bytes32(name).unwrap_or([0u8; WORD]).to_vec())
}

fn checkpoint_of(tokens: &[Token]) -> Hash {
    keccak256(&ethabi::encode(tokens))
}

/// Checkpoint of an outgoing batch.
pub fn batch_checkpoint(bridge_id: &[u8; 32], batch: &OutgoingTxBatch) -> Hash {
    let txs = &batch.transactions;
    checkpoint_of(&[
        Token::FixedBytes(bridge_id.to_vec()),
        method_tag("transactionBatch"),
        uint_array(txs.iter().map(|tx| tx.erc20_token.amount)),
        address_array(txs.iter().map(|tx| &tx.dest_address)),
        uint_array(txs.iter().map(|tx| tx.erc20_fee.amount)),
        uint(batch.batch_nonce),
        address(&batch.token_contract),
        uint(batch.batch_timeout),
    ])
}

/// Checkpoint of a validator set.
pub fn valset_checkpoint(bridge_id: &[u8; 32], valset: &Valset) -> Hash {
    let members = &valset.members;
    checkpoint_of(&[
        Token::FixedBytes(bridge_id.to_vec()),
        method_tag("checkpoint"),
        uint(valset.nonce),
        address_array(members.iter().map(|m| &m.eth_address)),
        uint_array(members.iter().map(|m| U256::from(m.power))),
        uint(valset.reward_amount),
        address(&valset.reward_token),
    ])
}

/// Checkpoint of a logic call. The invalidation id must be exactly 32 bytes.
pub fn logic_call_checkpoint(
    bridge_id: &[u8; 32],
    call: &OutgoingLogicCall,
) -> Result<Hash, Rejected> {
    if call.invalidation_id.len() != WORD {
        return Err(Rejected::InvalidSubject(format!(
            "invalidation id must be 32 bytes, got {}",
            call.invalidation_id.len()
        )));
    }
    Ok(checkpoint_of(&[
        Token::FixedBytes(bridge_id.to_vec()),
        method_tag("logicCall"),
        uint_array(call.transfers.iter().map(|t| t.amount)),
        address_array(call.transfers.iter().map(|t| &t.contract)),
        uint_array(call.fees.iter().map(|t| t.amount)),
        address_array(call.fees.iter().map(|t| &t.contract)),
        address(&call.logic_contract_address),
        Token::Bytes(call.payload.clone()),
        uint(call.timeout),
        Token::FixedBytes(call.invalidation_id.clone()),
        uint(call.invalidation_nonce),
    ]))
}
