//! # Attestation Scenarios
//!
//! Claim ordering, the voting threshold and competing claims for one event
//! nonce, driven through the service.

#[cfg(test)]
mod tests {
    use bridge_core::domain::{BatchExecutedClaim, FatalError};
    use bridge_core::{BridgeApi, BridgeError, BridgeEvent, BridgeParams, Claim, Rejected};
    use shared_types::{ValidatorAddress, U256};

    use crate::integration::harness::{account, deposit, token, voucher, TestChain, GENESIS_HEIGHT};

    fn receiver() -> String {
        account("gravity", 1).to_string()
    }

    // =============================================================================
    // CONFLICTING CLAIMS
    // =============================================================================

    #[test]
    fn test_losing_fingerprint_never_executes() {
        let mut chain = TestChain::with_validators(&[("a", 40), ("b", 30), ("c", 30)]);
        let honest = deposit(1, token(0xaa), 100, &receiver());
        let forged = deposit(1, token(0xaa), 999, &receiver());

        let honest_id = chain.submit("a", honest.clone()).unwrap();
        let forged_id = chain.submit("b", forged).unwrap();
        assert_ne!(honest_id, forged_id);
        assert_eq!(chain.service.last_observed_event_nonce(), 0);

        chain.submit("c", honest).unwrap();
        assert_eq!(chain.service.last_observed_event_nonce(), 1);
        let denom = voucher(token(0xaa));
        assert_eq!(chain.balance(&account("gravity", 1), &denom), U256::from(100u8));

        // The forged attestation later gains nominal supermajority.
        chain
            .staking
            .set_power(&ValidatorAddress::new("b"), 1_000);
        let observed = chain.with_ctx(|service, ctx| service.attestation_tally(ctx)).unwrap();
        assert_eq!(observed, 0);
        assert!(!chain.service.attestation(&forged_id).unwrap().observed);

        // Forcing it is an ordering violation, and nothing is applied.
        let err = chain
            .with_ctx(|service, ctx| service.try_attestation(ctx, forged_id))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Fatal(FatalError::EventNonceOutOfOrder { expected: 2, actual: 1 })
        ));
        assert_eq!(chain.balance(&account("gravity", 1), &denom), U256::from(100u8));
        assert_eq!(chain.service.last_observed_event_nonce(), 1);
    }

    #[test]
    fn test_validator_cannot_vote_twice_on_a_nonce() {
        let mut chain = TestChain::with_validators(&[("a", 40), ("b", 60)]);
        chain.submit("a", deposit(1, token(0xaa), 5, &receiver())).unwrap();
        let err = chain
            .submit("a", deposit(1, token(0xaa), 6, &receiver()))
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::Rejected(Rejected::NonContiguousEventNonce {
                expected: 2,
                received: 1
            })
        );
    }

    // =============================================================================
    // ORDERING & WATERMARK
    // =============================================================================

    #[test]
    fn test_watermark_tracks_foreign_and_local_height() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        chain.submit("a", deposit(1, token(0xaa), 5, &receiver())).unwrap();
        chain.advance(3);
        chain.submit("a", deposit(2, token(0xaa), 5, &receiver())).unwrap();

        assert_eq!(chain.service.last_observed_event_nonce(), 2);
        let height = chain.service.last_observed_foreign_height();
        assert_eq!(height.foreign_height, 1_002);
        assert_eq!(height.local_height, GENESIS_HEIGHT + 3);
    }

    #[test]
    fn test_gap_in_validator_nonces_is_rejected() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        chain.submit("a", deposit(1, token(0xaa), 5, &receiver())).unwrap();
        let err = chain
            .submit("a", deposit(3, token(0xaa), 5, &receiver()))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Rejected(Rejected::NonContiguousEventNonce { expected: 2, received: 3 })
        ));
        assert_eq!(
            chain
                .service
                .last_event_nonce_by_validator(&ValidatorAddress::new("a")),
            1
        );
    }

    #[test]
    fn test_new_validator_starts_below_watermark() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let second = deposit(2, token(0xaa), 5, &receiver());
        chain.submit("a", deposit(1, token(0xaa), 5, &receiver())).unwrap();
        let id = chain.submit("a", second.clone()).unwrap();

        let newcomer = ValidatorAddress::new("d");
        chain.staking.set_power(&newcomer, 10);
        assert_eq!(chain.service.last_event_nonce_by_validator(&newcomer), 1);

        // A late vote on the observed event is recorded without re-executing.
        chain.submit("d", second).unwrap();
        assert_eq!(chain.service.attestation(&id).unwrap().votes.len(), 2);
        assert_eq!(
            chain.balance(&account("gravity", 1), &voucher(token(0xaa))),
            U256::from(10u8)
        );
    }

    #[test]
    fn test_unbonded_validator_is_rejected() {
        let mut chain = TestChain::with_validators(&[("a", 100), ("b", 0)]);
        assert!(matches!(
            chain.submit("b", deposit(1, token(0xaa), 5, &receiver())),
            Err(BridgeError::Rejected(Rejected::UnknownValidator(_)))
        ));
    }

    // =============================================================================
    // THRESHOLD
    // =============================================================================

    #[test]
    fn test_exactly_threshold_power_does_not_observe() {
        let mut chain = TestChain::with_validators(&[("a", 33), ("b", 33), ("c", 34)]);
        let claim = deposit(1, token(0xaa), 5, &receiver());
        chain.submit_all(&["a", "b"], &claim);
        assert_eq!(chain.service.last_observed_event_nonce(), 0);

        let id = chain.submit("c", claim).unwrap();
        assert!(chain.service.attestation(&id).unwrap().observed);
        let events = chain.service.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            BridgeEvent::ClaimObserved { event_nonce: 1, .. }
        )));
    }

    #[test]
    fn test_jailed_power_does_not_count() {
        let mut chain = TestChain::with_validators(&[("a", 50), ("b", 50)]);
        let claim = deposit(1, token(0xaa), 5, &receiver());
        chain.submit("a", claim.clone()).unwrap();
        chain.submit("b", claim).unwrap();
        assert_eq!(chain.service.last_observed_event_nonce(), 1);

        // With b jailed, a alone holds all bonded power.
        bridge_core::VotingPower::jail(&mut chain.staking, &ValidatorAddress::new("b"));
        chain.submit("a", deposit(2, token(0xaa), 5, &receiver())).unwrap();
        assert_eq!(chain.service.last_observed_event_nonce(), 2);
    }

    // =============================================================================
    // FAILURE TIERS
    // =============================================================================

    #[test]
    fn test_unknown_executed_batch_halts() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let claim = Claim::BatchExecuted(BatchExecutedClaim {
            event_nonce: 1,
            foreign_height: 50,
            token_contract: token(0xaa),
            batch_nonce: 7,
            bridge_balances: vec![],
        });
        let err = chain.submit("a", claim).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.tier(), "fatal");
    }

    #[test]
    fn test_prune_keeps_recent_attestations() {
        let params = BridgeParams {
            event_retention: 1,
            ..BridgeParams::default()
        };
        let mut chain = TestChain::new(params, &[("a", 100)]);
        let first = chain.submit("a", deposit(1, token(0xaa), 5, &receiver())).unwrap();
        let second = chain.submit("a", deposit(2, token(0xaa), 5, &receiver())).unwrap();
        let third = chain.submit("a", deposit(3, token(0xaa), 5, &receiver())).unwrap();

        assert_eq!(chain.service.prune_attestations(), 1);
        assert!(chain.service.attestation(&first).is_none());
        assert!(chain.service.attestation(&second).is_some());
        assert!(chain.service.attestation(&third).is_some());
    }
}
