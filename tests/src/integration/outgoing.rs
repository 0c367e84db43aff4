//! # Outgoing Scenarios
//!
//! Transfers to the foreign chain: pool selection, batch building,
//! execution and timeouts.

#[cfg(test)]
mod tests {
    use bridge_core::domain::{BatchExecutedClaim, DepositClaim};
    use bridge_core::ports::outbound::BRIDGE_MODULE;
    use bridge_core::{BridgeApi, BridgeError, BridgeEvent, Claim, Ledger, Rejected};
    use shared_types::{AccountAddress, Coin, EthAddress, U256};

    use crate::integration::harness::{account, token, voucher, TestChain};

    fn sender() -> AccountAddress {
        account("gravity", 1)
    }

    fn destination() -> EthAddress {
        EthAddress::from_bytes([0x42; 20])
    }

    /// Chain where the sender holds 99,999 vouchers of token X.
    fn funded_chain() -> TestChain {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        chain.fund(&sender(), Coin::new(voucher(token(0xaa)), 99_999u64));
        chain
    }

    fn enqueue(chain: &mut TestChain, amount: u64, fee: u64) -> u64 {
        let denom = voucher(token(0xaa));
        chain
            .with_ctx(|service, ctx| {
                service.enqueue_transfer(
                    ctx,
                    sender(),
                    destination(),
                    Coin::new(denom.clone(), amount),
                    Coin::new(denom, fee),
                )
            })
            .unwrap()
    }

    fn pool_ids(chain: &TestChain) -> Vec<u64> {
        chain
            .service
            .pool_transactions(token(0xaa))
            .iter()
            .map(|tx| tx.id)
            .collect()
    }

    fn observe(chain: &mut TestChain, claim: Claim) {
        chain.submit("a", claim).unwrap();
    }

    fn deposit_at(nonce: u64, foreign_height: u64) -> Claim {
        Claim::Deposit(DepositClaim {
            event_nonce: nonce,
            foreign_height,
            token_contract: token(0xbb),
            amount: U256::from(1u8),
            foreign_sender: EthAddress::from_bytes([0xee; 20]),
            receiver: sender().to_string(),
            bridge_balances: vec![],
        })
    }

    // =============================================================================
    // POOL & BATCH SELECTION
    // =============================================================================

    #[test]
    fn test_four_transfers_batch_of_two() {
        let mut chain = funded_chain();
        let ids: Vec<u64> = [(100, 2), (101, 3), (102, 2), (103, 1)]
            .into_iter()
            .map(|(amount, fee)| enqueue(&mut chain, amount, fee))
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let denom = voucher(token(0xaa));
        assert_eq!(chain.balance(&sender(), &denom), U256::from(99_999u64 - 414));
        assert_eq!(chain.module_balance(BRIDGE_MODULE, &denom), U256::from(414u64));

        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        // Fee 3 first, then the newer of the two fee-2 transfers; the
        // fee-2/amount-100 transfer stays behind.
        assert_eq!(batch.tx_ids(), vec![2, 3]);
        assert_eq!(batch.batch_nonce, 1);
        assert_eq!(batch.total_fees(), U256::from(5u8));
        assert_eq!(pool_ids(&chain), vec![1, 4]);
        assert_eq!(
            chain.service.pool_transactions(token(0xaa))[0].erc20_token.amount,
            U256::from(100u8)
        );
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());
    }

    #[test]
    fn test_fee_quotes_match_next_batch() {
        let mut chain = funded_chain();
        enqueue(&mut chain, 100, 2);
        enqueue(&mut chain, 101, 3);
        enqueue(&mut chain, 103, 1);

        let quote = chain.service.batch_fee_by_token(token(0xaa), 2);
        assert_eq!(quote.total_fees, U256::from(5u8));
        assert_eq!(quote.tx_count, 2);

        let all = chain.service.all_batch_fees(10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total_fees, U256::from(6u8));
    }

    #[test]
    fn test_new_batch_must_be_more_profitable() {
        let mut chain = funded_chain();
        for (amount, fee) in [(100, 2), (101, 3), (102, 2), (103, 1)] {
            enqueue(&mut chain, amount, fee);
        }
        chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();

        let err = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Rejected(Rejected::BatchFeesTooLow { .. })
        ));
        assert_eq!(pool_ids(&chain), vec![1, 4]);

        enqueue(&mut chain, 104, 10);
        let second = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        assert_eq!(second.tx_ids(), vec![5, 1]);
        assert_eq!(second.batch_nonce, 2);
        assert_eq!(chain.service.batches_for(token(0xaa)).len(), 2);
    }

    #[test]
    fn test_empty_pool_cannot_batch() {
        let mut chain = funded_chain();
        assert!(matches!(
            chain.with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 5)),
            Err(BridgeError::Rejected(Rejected::EmptyPool(_)))
        ));
    }

    // =============================================================================
    // CANCELLATION
    // =============================================================================

    #[test]
    fn test_cancel_refunds_unbatched_transfer() {
        let mut chain = funded_chain();
        let id = enqueue(&mut chain, 500, 5);
        let stranger = account("gravity", 9);

        let err = chain
            .with_ctx(|service, ctx| service.cancel_transfer(ctx, id, &stranger))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Rejected(Rejected::NotSender { .. })));

        chain
            .with_ctx(|service, ctx| service.cancel_transfer(ctx, id, &sender()))
            .unwrap();
        assert!(pool_ids(&chain).is_empty());
        assert_eq!(
            chain.balance(&sender(), &voucher(token(0xaa))),
            U256::from(99_999u64)
        );
        assert!(chain
            .service
            .drain_events()
            .iter()
            .any(|event| matches!(event, BridgeEvent::TransferCancelled { tx_id, .. } if *tx_id == id)));
    }

    #[test]
    fn test_batched_transfer_cannot_be_cancelled() {
        let mut chain = funded_chain();
        let id = enqueue(&mut chain, 500, 5);
        chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 1))
            .unwrap();
        assert!(matches!(
            chain.with_ctx(|service, ctx| service.cancel_transfer(ctx, id, &sender())),
            Err(BridgeError::Rejected(Rejected::TxAlreadyBatched(_)))
        ));
    }

    #[test]
    fn test_enqueue_rejects_bad_requests() {
        let mut chain = funded_chain();
        let denom = voucher(token(0xaa));
        let zero_fee = chain.with_ctx(|service, ctx| {
            service.enqueue_transfer(
                ctx,
                sender(),
                destination(),
                Coin::new(denom.clone(), 10u64),
                Coin::new(denom.clone(), 0u64),
            )
        });
        assert!(matches!(zero_fee, Err(BridgeError::Rejected(Rejected::ZeroAmount))));

        let unknown = chain.with_ctx(|service, ctx| {
            service.enqueue_transfer(
                ctx,
                sender(),
                destination(),
                Coin::new("uatom", 10u64),
                Coin::new("uatom", 1u64),
            )
        });
        assert!(matches!(unknown, Err(BridgeError::Rejected(Rejected::UnknownToken(_)))));

        let too_much = chain.with_ctx(|service, ctx| {
            service.enqueue_transfer(
                ctx,
                sender(),
                destination(),
                Coin::new(denom.clone(), 99_999u64),
                Coin::new(denom, 1u64),
            )
        });
        assert!(matches!(too_much, Err(BridgeError::Rejected(Rejected::Ledger(_)))));
        assert!(pool_ids(&chain).is_empty());
    }

    // =============================================================================
    // EXECUTION
    // =============================================================================

    #[test]
    fn test_executed_batch_burns_and_releases_older() {
        let mut chain = funded_chain();
        for (amount, fee) in [(100, 2), (101, 3), (102, 2), (103, 1)] {
            enqueue(&mut chain, amount, fee);
        }
        chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        enqueue(&mut chain, 104, 10);
        let second = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();

        let denom = voucher(token(0xaa));
        observe(
            &mut chain,
            Claim::BatchExecuted(BatchExecutedClaim {
                event_nonce: 1,
                foreign_height: 500,
                token_contract: token(0xaa),
                batch_nonce: second.batch_nonce,
                bridge_balances: vec![],
            }),
        );

        // Batch 1 went back to the pool; batch 2 left the chain.
        assert!(chain.service.batches_for(token(0xaa)).is_empty());
        assert_eq!(pool_ids(&chain), vec![2, 3, 4]);
        let burned = 114u64 + 102;
        assert_eq!(chain.ledger.supply_of(&denom), U256::from(99_999u64 - burned));
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());

        let events = chain.service.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            BridgeEvent::BatchCancelled { batch_nonce: 1, .. }
        )));
        assert!(events.iter().any(|event| matches!(
            event,
            BridgeEvent::BatchExecuted { batch_nonce: 2, .. }
        )));
    }

    #[test]
    fn test_explicit_batch_cancel() {
        let mut chain = funded_chain();
        enqueue(&mut chain, 100, 2);
        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        chain
            .service
            .cancel_outgoing_batch(token(0xaa), batch.batch_nonce)
            .unwrap();
        assert_eq!(pool_ids(&chain), vec![1]);
        assert!(chain.service.batches_for(token(0xaa)).is_empty());
    }

    // =============================================================================
    // TIMEOUTS
    // =============================================================================

    #[test]
    fn test_batch_before_first_observation_times_out() {
        let mut chain = funded_chain();
        enqueue(&mut chain, 100, 2);
        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        assert_eq!(batch.batch_timeout, 0);
        assert_eq!(chain.service.cleanup_timed_out_batches(), 0);

        observe(&mut chain, deposit_at(1, 1_001));
        assert_eq!(chain.service.cleanup_timed_out_batches(), 1);
        assert_eq!(pool_ids(&chain), vec![1]);
    }

    #[test]
    fn test_batch_timeout_projects_foreign_height() {
        let mut chain = funded_chain();
        observe(&mut chain, deposit_at(1, 1_001));
        chain.advance(30);
        enqueue(&mut chain, 100, 2);
        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, token(0xaa), 2))
            .unwrap();
        // 30 local blocks of 5s is 10 foreign blocks; 12h is 2880 more.
        assert_eq!(batch.batch_timeout, 1_001 + 10 + 2_880);

        observe(&mut chain, deposit_at(2, 3_891));
        assert_eq!(chain.service.cleanup_timed_out_batches(), 0);
        observe(&mut chain, deposit_at(3, 3_892));
        assert_eq!(chain.service.cleanup_timed_out_batches(), 1);
        assert!(chain.service.batches_for(token(0xaa)).is_empty());
    }
}
