//! # Ledger Overlay
//!
//! Stages ledger writes on top of a read-only base. Reads see staged writes;
//! nothing reaches the base until [`LedgerOverlay::into_journal`] is replayed
//! onto it with [`replay`].
//!
//! Balances and supplies are cached as absolute values the first time they
//! are touched, so replay produces the same result as applying the writes
//! directly.

use std::collections::BTreeMap;

use shared_types::{AccountAddress, Coin, U256};

use crate::ports::outbound::{DenomMetadata, Holder, Ledger, LedgerError};

/// One staged ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    Mint {
        module: String,
        coin: Coin,
    },
    Burn {
        module: String,
        coin: Coin,
    },
    ToAccount {
        module: String,
        to: AccountAddress,
        coin: Coin,
    },
    FromAccount {
        from: AccountAddress,
        module: String,
        coin: Coin,
    },
    BetweenPools {
        from: String,
        to: String,
        coin: Coin,
    },
}

pub struct LedgerOverlay<'a> {
    base: &'a dyn Ledger,
    balances: BTreeMap<(Holder, String), U256>,
    supply: BTreeMap<String, U256>,
    journal: Vec<LedgerOp>,
}

impl<'a> LedgerOverlay<'a> {
    pub fn new(base: &'a dyn Ledger) -> Self {
        Self {
            base,
            balances: BTreeMap::new(),
            supply: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Staged writes in application order.
    pub fn into_journal(self) -> Vec<LedgerOp> {
        self.journal
    }

    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    fn balance(&self, holder: &Holder, denom: &str) -> U256 {
        match self.balances.get(&(holder.clone(), denom.to_string())) {
            Some(balance) => *balance,
            None => self.base.balance_of(holder, denom),
        }
    }

    fn supply(&self, denom: &str) -> U256 {
        match self.supply.get(denom) {
            Some(supply) => *supply,
            None => self.base.supply_of(denom),
        }
    }

    fn credit(&mut self, holder: Holder, coin: &Coin) {
        let balance = self.balance(&holder, &coin.denom).saturating_add(coin.amount);
        self.balances.insert((holder, coin.denom.clone()), balance);
    }

    fn debit(&mut self, holder: Holder, coin: &Coin) -> Result<(), LedgerError> {
        let available = self.balance(&holder, &coin.denom);
        if available < coin.amount {
            return Err(LedgerError::InsufficientFunds {
                holder: holder.to_string(),
                denom: coin.denom.clone(),
                needed: coin.amount,
                available,
            });
        }
        self.balances
            .insert((holder, coin.denom.clone()), available - coin.amount);
        Ok(())
    }
}

impl Ledger for LedgerOverlay<'_> {
    fn mint(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError> {
        let supply = self
            .supply(&coin.denom)
            .checked_add(coin.amount)
            .ok_or_else(|| LedgerError::SupplyOverflow(coin.denom.clone()))?;
        self.supply.insert(coin.denom.clone(), supply);
        self.credit(Holder::module(module), coin);
        self.journal.push(LedgerOp::Mint {
            module: module.to_string(),
            coin: coin.clone(),
        });
        Ok(())
    }

    fn burn(&mut self, module: &str, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(Holder::module(module), coin)?;
        let supply = self.supply(&coin.denom).saturating_sub(coin.amount);
        self.supply.insert(coin.denom.clone(), supply);
        self.journal.push(LedgerOp::Burn {
            module: module.to_string(),
            coin: coin.clone(),
        });
        Ok(())
    }

    fn transfer_to_account(
        &mut self,
        module: &str,
        to: &AccountAddress,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        if self.base.is_blocked(to) {
            return Err(LedgerError::BlockedAddress(to.clone()));
        }
        self.debit(Holder::module(module), coin)?;
        self.credit(Holder::Account(to.clone()), coin);
        self.journal.push(LedgerOp::ToAccount {
            module: module.to_string(),
            to: to.clone(),
            coin: coin.clone(),
        });
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
        self.journal.push(LedgerOp::FromAccount {
            from: from.clone(),
            module: module.to_string(),
            coin: coin.clone(),
        });
        Ok(())
    }

    fn transfer_between_pools(&mut self, from: &str, to: &str, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(Holder::module(from), coin)?;
        self.credit(Holder::module(to), coin);
        self.journal.push(LedgerOp::BetweenPools {
            from: from.to_string(),
            to: to.to_string(),
            coin: coin.clone(),
        });
        Ok(())
    }

    fn balance_of(&self, holder: &Holder, denom: &str) -> U256 {
        self.balance(holder, denom)
    }

    fn supply_of(&self, denom: &str) -> U256 {
        self.supply(denom)
    }

    fn denom_metadata(&self, denom: &str) -> Option<DenomMetadata> {
        self.base.denom_metadata(denom)
    }

    fn is_blocked(&self, account: &AccountAddress) -> bool {
        self.base.is_blocked(account)
    }
}

/// Apply staged writes to `ledger` in order.
pub fn replay(journal: &[LedgerOp], ledger: &mut dyn Ledger) -> Result<(), LedgerError> {
    for op in journal {
        match op {
            LedgerOp::Mint { module, coin } => ledger.mint(module, coin)?,
            LedgerOp::Burn { module, coin } => ledger.burn(module, coin)?,
            LedgerOp::ToAccount { module, to, coin } => ledger.transfer_to_account(module, to, coin)?,
            LedgerOp::FromAccount { from, module, coin } => {
                ledger.transfer_from_account(from, module, coin)?
            }
            LedgerOp::BetweenPools { from, to, coin } => ledger.transfer_between_pools(from, to, coin)?,
        }
    }
    Ok(())
}
