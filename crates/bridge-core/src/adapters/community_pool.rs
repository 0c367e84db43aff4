//! Community pool backed by a module account.

use shared_types::Coin;

use crate::ports::outbound::{CommunityPool, Ledger, LedgerError, COMMUNITY_POOL_MODULE};

/// Deposits funds into the [`COMMUNITY_POOL_MODULE`] account.
#[derive(Debug, Clone, Default)]
pub struct DistributionPool {
    /// When set, every deposit fails.
    frozen: bool,
}

impl DistributionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }
}

impl CommunityPool for DistributionPool {
    fn deposit_to_community_pool(
        &mut self,
        ledger: &mut dyn Ledger,
        from_module: &str,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        for coin in coins {
            if self.frozen {
                return Err(LedgerError::InsufficientFunds {
                    holder: COMMUNITY_POOL_MODULE.to_string(),
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available: Default::default(),
                });
            }
            ledger.transfer_between_pools(from_module, COMMUNITY_POOL_MODULE, coin)?;
        }
        Ok(())
    }
}
