//! # Balance Scenarios
//!
//! The bridge module account invariant and the cross-bridge balance checks,
//! for both token origins.

#[cfg(test)]
mod tests {
    use bridge_core::domain::{
        BatchExecutedClaim, DepositClaim, FatalError, TokenDeployedClaim, TokenOrigin,
        ValsetMember, ValsetUpdatedClaim,
    };
    use bridge_core::ports::outbound::{DenomMetadata, DenomUnit, BRIDGE_MODULE};
    use bridge_core::{BridgeApi, BridgeError, BridgeEvent, BridgeParams, Claim, Ledger, Valset};
    use shared_types::{AccountAddress, Coin, Erc20Token, EthAddress, U256};

    use crate::integration::harness::{account, token, voucher, TestChain};

    fn sender() -> AccountAddress {
        account("gravity", 1)
    }

    fn stake_contract() -> EthAddress {
        token(0xcc)
    }

    fn monitored_deposit(nonce: u64, amount: u64, reported: u64) -> Claim {
        Claim::Deposit(DepositClaim {
            event_nonce: nonce,
            foreign_height: 100 + nonce,
            token_contract: token(0xaa),
            amount: U256::from(amount),
            foreign_sender: EthAddress::from_bytes([0xee; 20]),
            receiver: sender().to_string(),
            bridge_balances: vec![Erc20Token::new(token(0xaa), reported)],
        })
    }

    /// Chain with the local `stake` denom registered on the foreign chain.
    fn chain_with_stake_token() -> TestChain {
        stake_chain(BridgeParams::default())
    }

    fn stake_chain(params: BridgeParams) -> TestChain {
        let mut chain = TestChain::new(params, &[("a", 100)]);
        chain.ledger.set_denom_metadata(DenomMetadata {
            description: "staking token".to_string(),
            denom_units: vec![DenomUnit {
                denom: "stake".to_string(),
                exponent: 0,
            }],
            base: "stake".to_string(),
            display: "stake".to_string(),
            name: "stake".to_string(),
            symbol: "STAKE".to_string(),
        });
        chain
            .submit(
                "a",
                Claim::TokenDeployed(TokenDeployedClaim {
                    event_nonce: 1,
                    foreign_height: 10,
                    local_denom: "stake".to_string(),
                    token_contract: stake_contract(),
                    name: "stake".to_string(),
                    symbol: "stake".to_string(),
                    decimals: 0,
                    bridge_balances: vec![],
                }),
            )
            .unwrap();
        chain.fund(&sender(), Coin::new("stake", 1_000u64));
        chain
    }

    // =============================================================================
    // MODULE BALANCE INVARIANT
    // =============================================================================

    #[test]
    fn test_bridge_originated_round_trip() {
        let mut chain = chain_with_stake_token();
        assert_eq!(
            chain.service.erc20_to_denom(stake_contract()),
            (TokenOrigin::BridgeOriginated, "stake".to_string())
        );
        assert_eq!(
            chain.service.denom_to_erc20("stake"),
            Some((TokenOrigin::BridgeOriginated, stake_contract()))
        );

        chain
            .with_ctx(|service, ctx| {
                service.enqueue_transfer(
                    ctx,
                    sender(),
                    EthAddress::from_bytes([0x42; 20]),
                    Coin::new("stake", 100u64),
                    Coin::new("stake", 1u64),
                )
            })
            .unwrap();
        let batch = chain
            .with_ctx(|service, ctx| service.build_batch(ctx, stake_contract(), 10))
            .unwrap();
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());

        chain
            .submit(
                "a",
                Claim::BatchExecuted(BatchExecutedClaim {
                    event_nonce: 2,
                    foreign_height: 20,
                    token_contract: stake_contract(),
                    batch_nonce: batch.batch_nonce,
                    bridge_balances: vec![],
                }),
            )
            .unwrap();
        // Locked, not burned: the foreign chain now holds the representation.
        assert_eq!(chain.ledger.supply_of("stake"), U256::from(1_000u64));
        assert_eq!(chain.module_balance(BRIDGE_MODULE, "stake"), U256::from(101u8));
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());

        // Coming back releases the lock.
        let receiver = account("gravity", 5);
        chain
            .submit(
                "a",
                Claim::Deposit(DepositClaim {
                    event_nonce: 3,
                    foreign_height: 30,
                    token_contract: stake_contract(),
                    amount: U256::from(60u8),
                    foreign_sender: EthAddress::from_bytes([0xee; 20]),
                    receiver: receiver.to_string(),
                    bridge_balances: vec![],
                }),
            )
            .unwrap();
        assert_eq!(chain.balance(&receiver, "stake"), U256::from(60u8));
        assert_eq!(chain.module_balance(BRIDGE_MODULE, "stake"), U256::from(41u8));
        assert_eq!(chain.ledger.supply_of("stake"), U256::from(1_000u64));
    }

    #[test]
    fn test_module_shortfall_is_reported() {
        let mut chain = chain_with_stake_token();
        chain
            .with_ctx(|service, ctx| {
                service.enqueue_transfer(
                    ctx,
                    sender(),
                    EthAddress::from_bytes([0x42; 20]),
                    Coin::new("stake", 100u64),
                    Coin::new("stake", 1u64),
                )
            })
            .unwrap();
        chain
            .ledger
            .burn(BRIDGE_MODULE, &Coin::new("stake", 2u64))
            .unwrap();

        let violation = chain
            .service
            .module_balance_invariant(&chain.ledger)
            .unwrap_err();
        assert_eq!(violation.token_contract, stake_contract());
        assert_eq!(violation.module_balance, U256::from(99u8));
        assert_eq!(violation.escrowed, U256::from(101u8));
    }

    #[test]
    fn test_foreign_voucher_must_match_escrow_exactly() {
        let mut chain = TestChain::with_validators(&[("a", 100)]);
        let denom = voucher(token(0xaa));
        chain.fund(&sender(), Coin::new(denom.clone(), 50u64));
        chain
            .with_ctx(|service, ctx| {
                service.enqueue_transfer(
                    ctx,
                    sender(),
                    EthAddress::from_bytes([0x42; 20]),
                    Coin::new(denom.clone(), 10u64),
                    Coin::new(denom.clone(), 1u64),
                )
            })
            .unwrap();
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());

        // Stray vouchers in the module break equality.
        chain.ledger.mint(BRIDGE_MODULE, &Coin::new(denom, 3u64)).unwrap();
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_err());
    }

    #[test]
    fn test_relayed_valset_reward_is_minted() {
        let params = BridgeParams {
            valset_reward: Some(Coin::new("stake", 5u64)),
            ..BridgeParams::default()
        };
        let mut chain = stake_chain(params);
        let members = vec![ValsetMember {
            power: 4_294_967_295,
            eth_address: EthAddress::from_bytes([0x77; 20]),
        }];
        let stored = chain
            .service
            .store_valset(Valset {
                nonce: 1,
                members: members.clone(),
                height: chain.height,
                reward_amount: U256::zero(),
                reward_token: EthAddress::ZERO,
            })
            .unwrap();
        assert_eq!(stored.reward_token, stake_contract());

        chain
            .submit(
                "a",
                Claim::ValidatorSetUpdated(ValsetUpdatedClaim {
                    event_nonce: 2,
                    foreign_height: 20,
                    valset_nonce: 1,
                    members,
                    reward_amount: stored.reward_amount,
                    reward_token: stored.reward_token,
                    bridge_balances: vec![],
                }),
            )
            .unwrap();
        assert_eq!(chain.service.last_observed_valset().unwrap().nonce, 1);
        assert_eq!(chain.module_balance(BRIDGE_MODULE, "stake"), U256::from(5u8));
        assert!(chain.service.module_balance_invariant(&chain.ledger).is_ok());
    }

    // =============================================================================
    // CROSS-BRIDGE BALANCES
    // =============================================================================

    fn monitored_chain() -> TestChain {
        let params = BridgeParams {
            monitored_token_addresses: vec![token(0xaa)],
            ..BridgeParams::default()
        };
        TestChain::new(params, &[("a", 100)])
    }

    #[test]
    fn test_reported_balances_are_snapshotted() {
        let mut chain = monitored_chain();
        chain.submit("a", monitored_deposit(1, 100, 100)).unwrap();
        chain.submit("a", monitored_deposit(2, 50, 175)).unwrap();

        let snapshot = chain.service.snapshot(2).unwrap();
        assert_eq!(snapshot.balances, vec![Erc20Token::new(token(0xaa), 150u64)]);
        assert_eq!(snapshot.foreign_height, 102);
        assert!(!chain
            .service
            .drain_events()
            .iter()
            .any(|event| matches!(event, BridgeEvent::BalanceAssertionFailed { .. })));

        assert_eq!(chain.service.prune_snapshots(1), 1);
        assert!(chain.service.snapshot(1).is_none());
    }

    #[test]
    fn test_unbacked_local_supply_halts() {
        let mut chain = monitored_chain();
        chain.submit("a", monitored_deposit(1, 100, 100)).unwrap();
        let err = chain.submit("a", monitored_deposit(2, 100, 150)).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Fatal(FatalError::UnbackedSupply { .. })
        ));
    }

    #[test]
    fn test_supply_change_outside_bridge_is_flagged() {
        let mut chain = monitored_chain();
        chain.submit("a", monitored_deposit(1, 100, 100)).unwrap();
        chain.fund(&sender(), Coin::new(voucher(token(0xaa)), 7u64));
        chain.submit("a", monitored_deposit(2, 10, 500)).unwrap();

        let events = chain.service.drain_events();
        assert!(events.iter().any(|event| matches!(
            event,
            BridgeEvent::BalanceAssertionFailed { event_nonce: 2, .. }
        )));
        // Not fatal: the oracle moved on.
        assert_eq!(chain.service.last_observed_event_nonce(), 2);
    }
}
