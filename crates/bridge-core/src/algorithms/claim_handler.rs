//! # Claim Execution
//!
//! Applies the effect of an observed claim. Runs against a staged ledger and
//! a cloned store; the caller commits both only if this returns `Ok`.
//!
//! On success the handler returns the change it expects in the bridged
//! balance of each affected token. The balance assertor compares that with
//! consecutive snapshots.

use shared_types::{AccountAddress, Coin, Erc20Token, U256};
use tracing::{debug, info, warn};

use super::batching::cancel_older_batches;
use crate::config::BridgeParams;
use crate::domain::{
    BatchExecutedClaim, BridgeError, BridgeEvent, BridgeStore, Claim, DepositClaim,
    ExecutionError, FatalError, PendingForward, TokenDeployedClaim, TokenOrigin, Valset,
    ValsetUpdatedClaim,
};
use crate::ports::outbound::{CommunityPool, Ledger, BRIDGE_MODULE};

/// Everything a claim handler may read or write.
pub struct ExecutionScope<'a> {
    pub params: &'a BridgeParams,
    pub store: &'a mut BridgeStore,
    pub ledger: &'a mut dyn Ledger,
    pub community_pool: &'a mut dyn CommunityPool,
    pub events: &'a mut Vec<BridgeEvent>,
}

/// Apply `claim` and return the expected bridged balance change.
pub fn execute_claim(
    scope: &mut ExecutionScope<'_>,
    claim: &Claim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    match claim {
        Claim::Deposit(deposit) => handle_deposit(scope, deposit),
        Claim::BatchExecuted(executed) => handle_batch_executed(scope, executed),
        Claim::TokenDeployed(deployed) => handle_token_deployed(scope, deployed),
        Claim::ValidatorSetUpdated(updated) => handle_valset_updated(scope, updated),
    }
}

// =============================================================================
// DEPOSIT
// =============================================================================

/// Where a deposit ends up, decided from the receiver string alone.
enum DepositRoute {
    Local(AccountAddress),
    Forward(AccountAddress, String),
    Invalid,
}

fn route_deposit(params: &BridgeParams, receiver: &str) -> DepositRoute {
    let address: AccountAddress = match receiver.parse() {
        Ok(address) => address,
        Err(_) => return DepositRoute::Invalid,
    };
    if address.prefix() == params.native_address_prefix {
        return DepositRoute::Local(address);
    }
    match params.forward_channel(address.prefix()) {
        Some(channel) => DepositRoute::Forward(address, channel.to_string()),
        None => DepositRoute::Invalid,
    }
}

fn handle_deposit(
    scope: &mut ExecutionScope<'_>,
    claim: &DepositClaim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    let (origin, denom) = scope
        .store
        .erc20_to_denom(&claim.token_contract, &scope.params.foreign_denom_prefix);
    let coin = Coin::new(denom, claim.amount);

    // Bridge-originated funds are already held by the module.
    if origin == TokenOrigin::ForeignOriginated {
        let supply = scope.ledger.supply_of(&coin.denom);
        if supply.checked_add(coin.amount).is_none() {
            return Err(ExecutionError::SupplyOverflow {
                denom: coin.denom,
                amount: coin.amount,
            }
            .into());
        }
        scope
            .ledger
            .mint(BRIDGE_MODULE, &coin)
            .map_err(ExecutionError::Ledger)?;
    }

    match route_deposit(scope.params, &claim.receiver) {
        DepositRoute::Local(receiver) => {
            match scope.ledger.transfer_to_account(BRIDGE_MODULE, &receiver, &coin) {
                Ok(()) => {
                    debug!(event_nonce = claim.event_nonce, %receiver, %coin, "Deposit credited");
                    scope.events.push(BridgeEvent::DepositReceived {
                        event_nonce: claim.event_nonce,
                        receiver,
                        coin,
                    });
                }
                Err(err) => {
                    warn!(
                        event_nonce = claim.event_nonce,
                        %receiver,
                        error = %err,
                        "Deposit receiver cannot accept funds, sending to community pool"
                    );
                    send_to_community_pool(scope, &coin)?;
                    scope.events.push(BridgeEvent::DepositRedirected {
                        event_nonce: claim.event_nonce,
                        receiver,
                        coin,
                    });
                }
            }
        }
        DepositRoute::Forward(receiver, channel) => {
            debug!(event_nonce = claim.event_nonce, %receiver, %channel, "Deposit queued for forwarding");
            scope.store.push_pending_forward(PendingForward {
                event_nonce: claim.event_nonce,
                receiver: receiver.clone(),
                coin: coin.clone(),
                channel: channel.clone(),
            });
            scope.events.push(BridgeEvent::ForwardQueued {
                event_nonce: claim.event_nonce,
                receiver,
                coin,
                channel,
            });
        }
        DepositRoute::Invalid => {
            warn!(
                event_nonce = claim.event_nonce,
                receiver = %claim.receiver,
                "Invalid deposit receiver, sending to community pool"
            );
            send_to_community_pool(scope, &coin)?;
            scope.events.push(BridgeEvent::InvalidDepositReceiver {
                event_nonce: claim.event_nonce,
                receiver: claim.receiver.clone(),
                coin,
            });
        }
    }

    Ok(vec![Erc20Token::new(claim.token_contract, claim.amount)])
}

fn send_to_community_pool(scope: &mut ExecutionScope<'_>, coin: &Coin) -> Result<(), ExecutionError> {
    scope
        .community_pool
        .deposit_to_community_pool(&mut *scope.ledger, BRIDGE_MODULE, std::slice::from_ref(coin))
        .map_err(ExecutionError::CommunityPool)
}

// =============================================================================
// BATCH EXECUTED
// =============================================================================

fn handle_batch_executed(
    scope: &mut ExecutionScope<'_>,
    claim: &BatchExecutedClaim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    let batch = scope
        .store
        .batch(&claim.token_contract, claim.batch_nonce)
        .cloned()
        .ok_or(FatalError::UnknownExecutedBatch {
            token_contract: claim.token_contract,
            batch_nonce: claim.batch_nonce,
        })?;
    let total = batch.total();

    let (origin, denom) = scope
        .store
        .erc20_to_denom(&claim.token_contract, &scope.params.foreign_denom_prefix);
    if origin == TokenOrigin::ForeignOriginated {
        scope
            .ledger
            .burn(BRIDGE_MODULE, &Coin::new(denom, total))
            .map_err(ExecutionError::Ledger)?;
    }

    let cancelled = cancel_older_batches(
        scope.store,
        scope.events,
        claim.token_contract,
        claim.batch_nonce,
    );
    scope
        .store
        .remove_batch(&claim.token_contract, claim.batch_nonce);

    info!(
        token_contract = %claim.token_contract,
        batch_nonce = claim.batch_nonce,
        cancelled,
        "Batch executed on foreign chain"
    );
    scope.events.push(BridgeEvent::BatchExecuted {
        token_contract: claim.token_contract,
        batch_nonce: claim.batch_nonce,
    });
    Ok(vec![Erc20Token::new(claim.token_contract, total)])
}

// =============================================================================
// TOKEN DEPLOYED
// =============================================================================

fn handle_token_deployed(
    scope: &mut ExecutionScope<'_>,
    claim: &TokenDeployedClaim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    if let Some(existing) = scope.store.registered_contract(&claim.local_denom) {
        return Err(ExecutionError::TokenAlreadyRegistered {
            denom: claim.local_denom.clone(),
            token_contract: existing,
        }
        .into());
    }
    if let Some(existing) = scope.store.registered_denom(&claim.token_contract) {
        return Err(ExecutionError::TokenAlreadyRegistered {
            denom: existing.to_string(),
            token_contract: claim.token_contract,
        }
        .into());
    }

    let metadata = match scope.ledger.denom_metadata(&claim.local_denom) {
        Some(metadata) if !metadata.base.is_empty() => metadata,
        _ => return Err(ExecutionError::MissingMetadata(claim.local_denom.clone()).into()),
    };
    if claim.name != metadata.display {
        return Err(mismatch("name", &claim.name, &metadata.display));
    }
    if claim.symbol != metadata.display {
        return Err(mismatch("symbol", &claim.symbol, &metadata.display));
    }
    let decimals = metadata
        .denom_units
        .iter()
        .find(|unit| unit.denom == metadata.display)
        .map(|unit| u64::from(unit.exponent))
        .unwrap_or(0);
    if claim.decimals != decimals {
        return Err(mismatch(
            "decimals",
            &claim.decimals.to_string(),
            &decimals.to_string(),
        ));
    }

    scope
        .store
        .set_token_mapping(claim.local_denom.clone(), claim.token_contract);
    info!(denom = %claim.local_denom, token_contract = %claim.token_contract, "Token registered");
    scope.events.push(BridgeEvent::Erc20Deployed {
        denom: claim.local_denom.clone(),
        token_contract: claim.token_contract,
    });
    Ok(Vec::new())
}

fn mismatch(field: &'static str, claimed: &str, expected: &str) -> BridgeError {
    ExecutionError::MetadataMismatch {
        field,
        claimed: claimed.to_string(),
        expected: expected.to_string(),
    }
    .into()
}

// =============================================================================
// VALSET UPDATED
// =============================================================================

fn handle_valset_updated(
    scope: &mut ExecutionScope<'_>,
    claim: &ValsetUpdatedClaim,
) -> Result<Vec<Erc20Token>, BridgeError> {
    let observed = Valset {
        nonce: claim.valset_nonce,
        members: claim.members.clone(),
        height: 0,
        reward_amount: claim.reward_amount,
        reward_token: claim.reward_token,
    };
    let matches = scope
        .store
        .valset(claim.valset_nonce)
        .map(|local| local.matches(&observed))
        .unwrap_or(false);
    if !matches {
        return Err(ExecutionError::ValsetMismatch {
            nonce: claim.valset_nonce,
        }
        .into());
    }
    scope.store.set_last_observed_valset(observed);

    let mut expected = Vec::new();
    if claim.reward_amount > U256::zero() && !claim.reward_token.is_zero() {
        let (origin, denom) = scope
            .store
            .erc20_to_denom(&claim.reward_token, &scope.params.foreign_denom_prefix);
        if origin == TokenOrigin::ForeignOriginated {
            return Err(FatalError::ForeignOriginatedReward(claim.reward_token).into());
        }
        // The foreign contract paid the reward out of its own balance.
        scope
            .ledger
            .mint(BRIDGE_MODULE, &Coin::new(denom, claim.reward_amount))
            .map_err(ExecutionError::Ledger)?;
        expected.push(Erc20Token::new(claim.reward_token, claim.reward_amount));
    }

    scope.events.push(BridgeEvent::ValsetObserved {
        valset_nonce: claim.valset_nonce,
        reward_amount: claim.reward_amount,
        reward_token: claim.reward_token,
    });
    Ok(expected)
}
