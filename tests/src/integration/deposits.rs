//! # Deposit Scenarios
//!
//! Where deposited funds end up: the receiver, the community pool, or a
//! forward to another chain.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bridge_core::adapters::RecordingForwarder;
    use bridge_core::ports::outbound::{BRIDGE_MODULE, TRANSFER_MODULE};
    use bridge_core::{BridgeApi, BridgeEvent, BridgeParams, Ledger};
    use shared_types::U256;

    use crate::integration::harness::{account, deposit, token, voucher, TestChain};

    fn forwarding_chain() -> TestChain {
        let params = BridgeParams {
            forward_channels: BTreeMap::from([("osmo".to_string(), "channel-0".to_string())]),
            ..BridgeParams::default()
        };
        let mut chain = TestChain::new(params, &[("a", 100)]);
        chain.forwarder = RecordingForwarder::with_channels(&["channel-0"]);
        chain
    }

    // =============================================================================
    // INVALID RECEIVERS
    // =============================================================================

    #[test]
    fn test_unparseable_receiver_funds_community_pool() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let denom = voucher(token(0xaa));
        chain
            .submit("a", deposit(1, token(0xaa), 100, "not-an-address"))
            .unwrap();

        assert_eq!(chain.community_pool_balance(&denom), U256::from(100u8));
        assert!(chain.module_balance(BRIDGE_MODULE, &denom).is_zero());
        assert_eq!(chain.ledger.supply_of(&denom), U256::from(100u8));

        let events = chain.service.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            BridgeEvent::InvalidDepositReceiver { event_nonce: 1, receiver, coin }
                if receiver == "not-an-address" && coin.amount == U256::from(100u8)
        )));
    }

    #[test]
    fn test_empty_bech32_payload_funds_community_pool() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let denom = voucher(token(0xaa));
        // Checksum is valid, but the address carries no account bytes.
        chain
            .submit("a", deposit(1, token(0xaa), 50, "gravity1cd4ej5"))
            .unwrap();

        assert_eq!(chain.community_pool_balance(&denom), U256::from(50u8));
        assert!(chain.service.drain_events().iter().any(|event| matches!(
            event,
            BridgeEvent::InvalidDepositReceiver { receiver, .. } if receiver == "gravity1cd4ej5"
        )));
    }

    #[test]
    fn test_foreign_prefix_without_channel_is_invalid() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let receiver = account("cosmos", 3).to_string();
        chain.submit("a", deposit(1, token(0xaa), 40, &receiver)).unwrap();
        assert_eq!(
            chain.community_pool_balance(&voucher(token(0xaa))),
            U256::from(40u8)
        );
    }

    #[test]
    fn test_blocked_receiver_is_redirected() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let alice = account("gravity", 1);
        chain.ledger.block_account(alice.clone());
        chain
            .submit("a", deposit(1, token(0xaa), 25, &alice.to_string()))
            .unwrap();

        let denom = voucher(token(0xaa));
        assert!(chain.balance(&alice, &denom).is_zero());
        assert_eq!(chain.community_pool_balance(&denom), U256::from(25u8));
        assert!(chain
            .service
            .drain_events()
            .iter()
            .any(|event| matches!(event, BridgeEvent::DepositRedirected { .. })));
    }

    #[test]
    fn test_failed_handler_leaves_no_trace() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        chain.community_pool.set_frozen(true);
        chain
            .submit("a", deposit(1, token(0xaa), 100, "not-an-address"))
            .unwrap();

        // The watermark moves even though nothing was minted.
        assert_eq!(chain.service.last_observed_event_nonce(), 1);
        assert!(chain.ledger.supply_of(&voucher(token(0xaa))).is_zero());
        let events = chain.service.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], BridgeEvent::ClaimObserved { .. }));
    }

    // =============================================================================
    // FORWARDING
    // =============================================================================

    #[test]
    fn test_forward_waits_for_end_block() {
        let mut chain = forwarding_chain();
        let receiver = account("osmo", 2);
        let denom = voucher(token(0xaa));
        chain
            .submit("a", deposit(1, token(0xaa), 70, &receiver.to_string()))
            .unwrap();

        assert_eq!(chain.module_balance(BRIDGE_MODULE, &denom), U256::from(70u8));
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());
        assert!(chain.forwarder.sent().is_empty());

        let summary = chain.with_ctx(|service, ctx| service.process_pending_forwards(ctx, 10));
        assert_eq!(summary.forwarded, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(chain.module_balance(TRANSFER_MODULE, &denom), U256::from(70u8));
        assert!(chain.module_balance(BRIDGE_MODULE, &denom).is_zero());
        assert_eq!(chain.forwarder.sent()[0].receiver, receiver);
        assert_eq!(chain.forwarder.sent()[0].channel, "channel-0");
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());
    }

    #[test]
    fn test_failed_forward_goes_to_community_pool() {
        let mut chain = forwarding_chain();
        chain.forwarder.set_failing(true);
        let denom = voucher(token(0xaa));
        chain
            .submit("a", deposit(1, token(0xaa), 70, &account("osmo", 2).to_string()))
            .unwrap();

        let summary = chain.with_ctx(|service, ctx| service.process_pending_forwards(ctx, 10));
        assert_eq!(summary.failed, 1);
        assert_eq!(chain.community_pool_balance(&denom), U256::from(70u8));
        assert!(chain.module_balance(TRANSFER_MODULE, &denom).is_zero());
        assert!(chain
            .service
            .drain_events()
            .iter()
            .any(|event| matches!(event, BridgeEvent::ForwardFailed { event_nonce: 1, .. })));
    }

    #[test]
    fn test_forwards_release_in_arrival_order() {
        let mut chain = forwarding_chain();
        for nonce in 1..=3u64 {
            let receiver = account("osmo", nonce as u8).to_string();
            chain
                .submit("a", deposit(nonce, token(0xaa), 10 * nonce, &receiver))
                .unwrap();
        }

        let summary = chain.with_ctx(|service, ctx| service.process_pending_forwards(ctx, 2));
        assert_eq!(summary.forwarded, 2);
        let amounts: Vec<U256> = chain
            .forwarder
            .sent()
            .iter()
            .map(|record| record.coin.amount)
            .collect();
        assert_eq!(amounts, vec![U256::from(10u8), U256::from(20u8)]);

        chain.with_ctx(|service, ctx| service.process_pending_forwards(ctx, 2));
        assert_eq!(chain.forwarder.sent().len(), 3);
    }
}
