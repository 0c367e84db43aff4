//! Per-call host capabilities.
//!
//! The host owns the ledger, the staking module, the community pool and the
//! forwarder. It lends them to the core for the duration of one call.

use crate::ports::outbound::{CommunityPool, Forwarder, Ledger, VotingPower};

pub struct BridgeContext<'a> {
    /// Current local block height.
    pub block_height: u64,
    pub ledger: &'a mut dyn Ledger,
    pub voting: &'a mut dyn VotingPower,
    pub community_pool: &'a mut dyn CommunityPool,
    pub forwarder: &'a mut dyn Forwarder,
}

impl<'a> BridgeContext<'a> {
    pub fn new(
        block_height: u64,
        ledger: &'a mut dyn Ledger,
        voting: &'a mut dyn VotingPower,
        community_pool: &'a mut dyn CommunityPool,
        forwarder: &'a mut dyn Forwarder,
    ) -> Self {
        Self {
            block_height,
            ledger,
            voting,
            community_pool,
            forwarder,
        }
    }
}
