//! # Evidence Scenarios
//!
//! Signatures over checkpoints the chain never produced get the signer's
//! validator slashed; signatures over real checkpoints are not evidence.

#[cfg(test)]
mod tests {
    use bridge_core::domain::evidence::{address_from_key, eth_signed_message_hash};
    use bridge_core::domain::{batch_checkpoint, valset_checkpoint, ValsetMember};
    use bridge_core::{
        BridgeApi, BridgeError, BridgeEvent, EvidenceOutcome, EvidenceSubject, OutgoingTxBatch,
        Rejected, Valset, VotingPower,
    };
    use k256::ecdsa::SigningKey;
    use shared_types::{Coin, EthAddress, Hash, ValidatorAddress, U256};

    use crate::integration::harness::{account, token, voucher, TestChain};

    fn orchestrator_key() -> SigningKey {
        SigningKey::from_slice(&[0x5a; 32]).unwrap()
    }

    fn sign(key: &SigningKey, checkpoint: &Hash) -> String {
        let digest = eth_signed_message_hash(checkpoint);
        let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    fn chain_with_orchestrator() -> TestChain {
        let chain = TestChain::with_validators(&[("val-a", 1_000), ("val-b", 1_000)]);
        chain.service.set_orchestrator_eth_address(
            ValidatorAddress::new("val-a"),
            address_from_key(orchestrator_key().verifying_key()),
        );
        chain
    }

    fn bridge_id(chain: &TestChain) -> [u8; 32] {
        chain.service.params().bridge_id_bytes()
    }

    #[test]
    fn test_forged_batch_signature_slashes_once() {
        let mut chain = chain_with_orchestrator();
        let forged = OutgoingTxBatch {
            batch_nonce: 77,
            batch_timeout: 9_999,
            transactions: vec![],
            token_contract: token(0xaa),
            local_block_created: 0,
        };
        let signature = sign(&orchestrator_key(), &batch_checkpoint(&bridge_id(&chain), &forged));
        let subject = EvidenceSubject::Batch(forged);
        let validator = ValidatorAddress::new("val-a");

        let outcome = chain
            .with_ctx(|service, ctx| {
                service.check_bad_signature_evidence(ctx, subject.clone(), &signature)
            })
            .unwrap();
        assert_eq!(outcome, EvidenceOutcome::Slashed(validator.clone()));
        assert!(chain.staking.is_jailed(&validator));
        assert_eq!(chain.staking.stake_of(&validator), 999);
        assert_eq!(chain.staking.total_bonded_power(), 1_000);

        let again = chain
            .with_ctx(|service, ctx| service.check_bad_signature_evidence(ctx, subject, &signature))
            .unwrap();
        assert_eq!(again, EvidenceOutcome::AlreadyJailed(validator.clone()));
        assert_eq!(chain.staking.stake_of(&validator), 999);

        let slashes = chain
            .service
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, BridgeEvent::ValidatorSlashed { .. }))
            .count();
        assert_eq!(slashes, 1);
    }

    #[test]
    fn test_signature_over_real_batch_is_not_evidence() {
        let mut chain = chain_with_orchestrator();
        let sender = account("gravity", 1);
        let denom = voucher(token(0xaa));
        chain.fund(&sender, Coin::new(denom.clone(), 100u64));
        chain
            .with_ctx(|service, ctx| {
                service.enqueue_transfer(
                    ctx,
                    sender.clone(),
                    EthAddress::from_bytes([0x42; 20]),
                    Coin::new(denom.clone(), 10u64),
                    Coin::new(denom, 1u64),
                )
            })
            .unwrap();
        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 5))
            .unwrap();
        let signature = sign(&orchestrator_key(), &batch_checkpoint(&bridge_id(&chain), &batch));

        // Still evidence-proof after the batch leaves the store.
        chain
            .service
            .cancel_outgoing_batch(token(0xaa), batch.batch_nonce)
            .unwrap();
        let err = chain
            .with_ctx(|service, ctx| {
                service.check_bad_signature_evidence(ctx, EvidenceSubject::Batch(batch), &signature)
            })
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Rejected(Rejected::CheckpointAlreadySigned(_))
        ));
        assert!(!chain.staking.is_jailed(&ValidatorAddress::new("val-a")));
    }

    #[test]
    fn test_forged_valset_signature_slashes() {
        let mut chain = chain_with_orchestrator();
        let real = Valset {
            nonce: 1,
            members: vec![ValsetMember {
                power: 4_294_967_295,
                eth_address: address_from_key(orchestrator_key().verifying_key()),
            }],
            height: 5,
            reward_amount: U256::zero(),
            reward_token: EthAddress::ZERO,
        };
        chain.service.store_valset(real.clone()).unwrap();

        let forged = Valset {
            nonce: 2,
            ..real.clone()
        };
        let bridge_id = bridge_id(&chain);
        assert_ne!(
            valset_checkpoint(&bridge_id, &real),
            valset_checkpoint(&bridge_id, &forged)
        );
        let signature = sign(&orchestrator_key(), &valset_checkpoint(&bridge_id, &forged));
        let outcome = chain
            .with_ctx(|service, ctx| {
                service.check_bad_signature_evidence(ctx, EvidenceSubject::Valset(forged), &signature)
            })
            .unwrap();
        assert!(matches!(outcome, EvidenceOutcome::Slashed(_)));
    }

    #[test]
    fn test_malformed_signature_is_rejected() {
        let mut chain = chain_with_orchestrator();
        let forged = OutgoingTxBatch {
            batch_nonce: 3,
            batch_timeout: 1,
            transactions: vec![],
            token_contract: token(0xaa),
            local_block_created: 0,
        };
        let err = chain
            .with_ctx(|service, ctx| {
                service.check_bad_signature_evidence(ctx, EvidenceSubject::Batch(forged), "0xdeadbeef")
            })
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Rejected(Rejected::InvalidSignature(_))
        ));
    }
}
