//! # Outgoing Transfers
//!
//! Moving funds into and out of the unbatched pool.
//!
//! Amount and fee are escrowed in the bridge module for both token origins.
//! Foreign-originated vouchers are burned only once the batch carrying them
//! is executed on the foreign chain.

use shared_types::{AccountAddress, Coin, Erc20Token, EthAddress};
use tracing::debug;

use crate::domain::{BridgeEvent, BridgeStore, OutgoingTransferTx, Rejected};
use crate::ports::outbound::{Ledger, LedgerError, BRIDGE_MODULE};

/// A user's request to send funds to the foreign chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: AccountAddress,
    pub dest_address: EthAddress,
    pub amount: Coin,
    pub fee: Coin,
}

/// Escrow amount and fee and add the transfer to the pool. Returns its id.
pub fn enqueue_transfer(
    store: &mut BridgeStore,
    ledger: &mut dyn Ledger,
    events: &mut Vec<BridgeEvent>,
    foreign_denom_prefix: &str,
    request: TransferRequest,
) -> Result<u64, Rejected> {
    if request.amount.is_zero() || request.fee.is_zero() {
        return Err(Rejected::ZeroAmount);
    }
    if request.amount.denom != request.fee.denom {
        return Err(Rejected::MismatchedDenom {
            amount: request.amount.denom,
            fee: request.fee.denom,
        });
    }
    let (_, token_contract) = store
        .denom_to_erc20(&request.amount.denom, foreign_denom_prefix)
        .ok_or_else(|| Rejected::UnknownToken(request.amount.denom.clone()))?;

    let total = request
        .amount
        .amount
        .checked_add(request.fee.amount)
        .ok_or_else(|| LedgerError::SupplyOverflow(request.amount.denom.clone()))?;
    ledger.transfer_from_account(
        &request.sender,
        BRIDGE_MODULE,
        &Coin::new(request.amount.denom.clone(), total),
    )?;

    let id = store.allocate_tx_id();
    let tx = OutgoingTransferTx {
        id,
        sender: request.sender,
        dest_address: request.dest_address,
        erc20_token: Erc20Token::new(token_contract, request.amount.amount),
        erc20_fee: Erc20Token::new(token_contract, request.fee.amount),
    };
    debug!(id, sender = %tx.sender, %token_contract, "Outgoing transfer enqueued");
    events.push(BridgeEvent::TransferEnqueued {
        tx_id: id,
        sender: tx.sender.clone(),
        dest_address: tx.dest_address,
        amount: tx.erc20_token,
        fee: tx.erc20_fee,
    });
    store.pool_insert(tx);
    Ok(id)
}

/// Remove an unbatched transfer and refund amount plus fee to its sender.
pub fn cancel_transfer(
    store: &mut BridgeStore,
    ledger: &mut dyn Ledger,
    events: &mut Vec<BridgeEvent>,
    foreign_denom_prefix: &str,
    id: u64,
    caller: &AccountAddress,
) -> Result<(), Rejected> {
    if store.is_batched(id) {
        return Err(Rejected::TxAlreadyBatched(id));
    }
    let tx = store.pool().get(id).ok_or(Rejected::TxNotInPool(id))?;
    if &tx.sender != caller {
        return Err(Rejected::NotSender {
            id,
            caller: caller.clone(),
        });
    }
    let (_, denom) = store.erc20_to_denom(&tx.token_contract(), foreign_denom_prefix);
    let refund = Coin::new(denom, tx.total());
    ledger.transfer_to_account(BRIDGE_MODULE, caller, &refund)?;

    store.pool_remove(id);
    debug!(id, sender = %caller, %refund, "Outgoing transfer cancelled");
    events.push(BridgeEvent::TransferCancelled {
        tx_id: id,
        sender: caller.clone(),
    });
    Ok(())
}
