//! In-memory ledger.
//!
//! Implements `Ledger` for tests and embedding hosts that keep balances in
//! process. Balances and supplies live in ordered maps.

use std::collections::{BTreeMap, BTreeSet};

use shared_types::{AccountAddress, Coin, U256};
use tracing::trace;

use crate::ports::outbound::{DenomMetadata, Holder, Ledger, LedgerError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: BTreeMap<(Holder, String), U256>,
    supply: BTreeMap<String, U256>,
    metadata: BTreeMap<String, DenomMetadata>,
    blocked: BTreeSet<AccountAddress>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register governance metadata for a denom.
    pub fn set_denom_metadata(&mut self, metadata: DenomMetadata) {
        self.metadata.insert(metadata.base.clone(), metadata);
    }

    /// Forbid an account from receiving funds.
    pub fn block_account(&mut self, account: AccountAddress) {
        self.blocked.insert(account);
    }

    /// Mint `coin` straight into a user account.
    pub fn fund_account(&mut self, account: &AccountAddress, coin: &Coin) -> Result<(), LedgerError> {
        self.add_supply(coin)?;
        self.credit(Holder::Account(account.clone()), coin);
        Ok(())
    }

    fn add_supply(&mut self, coin: &Coin) -> Result<(), LedgerError> {
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply
            .checked_add(coin.amount)
            .ok_or_else(|| LedgerError::SupplyOverflow(coin.denom.clone()))?;
        Ok(())
    }

    fn credit(&mut self, holder: Holder, coin: &Coin) {
        let balance = self.balances.entry((holder, coin.denom.clone())).or_default();
        *balance = balance.saturating_add(coin.amount);
    }

    fn debit(&mut self, holder: Holder, coin: &Coin) -> Result<(), LedgerError> {
        let key = (holder, coin.denom.clone());
        let available = self.balances.get(&key).copied().unwrap_or_default();
        if available < coin.amount {
            return Err(LedgerError::InsufficientFunds {
                holder: key.0.to_string(),
                denom: coin.denom.clone(),
                needed: coin.amount,
                available,
            });
        }
        let remaining = available - coin.amount;
        if remaining.is_zero() {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, remaining);
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    fn mint(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError> {
        self.add_supply(coin)?;
        self.credit(Holder::module(module), coin);
        trace!(module, %coin, "mint");
        Ok(())
    }

    fn burn(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(Holder::module(module), coin)?;
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply.saturating_sub(coin.amount);
        trace!(module, %coin, "burn");
        Ok(())
    }

    fn transfer_to_account(
        &mut self,
        module: &str,
        to: &AccountAddress,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        if self.blocked.contains(to) {
            return Err(LedgerError::BlockedAddress(to.clone()));
        }
        self.debit(Holder::module(module), coin)?;
        self.credit(Holder::Account(to.clone()), coin);
        Ok(())
    }

    fn transfer_from_account(
        &mut self,
        from: &AccountAddress,
        module: &str,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        self.debit(Holder::Account(from.clone()), coin)?;
        self.credit(Holder::module(module), coin);
        Ok(())
    }

    fn transfer_between_pools(&mut self, from: &str, to: &str, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(Holder::module(from), coin)?;
        self.credit(Holder::module(to), coin);
        Ok(())
    }

    fn balance_of(&self, holder: &Holder, denom: &str) -> U256 {
        self.balances
            .get(&(holder.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn supply_of(&self, denom: &str) -> U256 {
        self.supply.get(denom).copied().unwrap_or_default()
    }

    fn denom_metadata(&self, denom: &str) -> Option<DenomMetadata> {
        self.metadata.get(denom).cloned()
    }

    fn is_blocked(&self, account: &AccountAddress) -> bool {
        self.blocked.contains(account)
    }
}
