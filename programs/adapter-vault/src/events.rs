use anchor_lang::prelude::*;

use crate::{governance::Vote, state::FeeKind};

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub governance: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are burned for assets (withdraw and redeem)
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub receiver: Pubkey,
    pub asset_amount: u64,
    pub shares_burned: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted after a rebalance executed its transactions
#[event]
pub struct Rebalanced {
    pub vault: Pubkey,
    pub transactions: u8,
    pub pool_buffer: u64,
    pub total_assets: u64,
    pub timestamp: i64,
}

/// Event emitted when loss detection forces a position's weight to zero
#[event]
pub struct PositionQuarantined {
    pub vault: Pubkey,
    pub position: Pubkey,
    pub last_value: u64,
    pub timestamp: i64,
}

#[event]
pub struct PositionAdded {
    pub vault: Pubkey,
    pub position: Pubkey,
    pub neutral: bool,
    pub weight: u32,
    pub timestamp: i64,
}

#[event]
pub struct PositionRemoved {
    pub vault: Pubkey,
    pub position: Pubkey,
    pub drained: u64,
    pub forced: bool,
    pub timestamp: i64,
}

#[event]
pub struct PositionSwapped {
    pub vault: Pubkey,
    pub old_position: Pubkey,
    pub new_position: Pubkey,
    pub drained: u64,
    pub timestamp: i64,
}

/// Event emitted when accrued fees are paid out
#[event]
pub struct FeesClaimed {
    pub vault: Pubkey,
    pub kind: FeeKind,
    pub recipient: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted when a weight table is written into a vault
#[event]
pub struct StrategyInstalled {
    pub vault: Pubkey,
    pub proposer: Pubkey,
    pub previous_proposer: Pubkey,
    pub proposer_paid: u64,
    pub timestamp: i64,
}

#[event]
pub struct GovernanceChanged {
    pub vault: Pubkey,
    pub old_governance: Pubkey,
    pub new_governance: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct GovernanceInitialized {
    pub governance: Pubkey,
    pub owner: Pubkey,
    pub time_delay: i64,
    pub timestamp: i64,
}

/// Event emitted on any guard registry change, `old_guard` or `new_guard` is default when absent
#[event]
pub struct GuardsUpdated {
    pub governance: Pubkey,
    pub old_guard: Pubkey,
    pub new_guard: Pubkey,
    pub guard_count: u8,
    pub timestamp: i64,
}

/// Event emitted on any pool registry change, `old_pool` or `new_pool` is default when absent
#[event]
pub struct PoolsUpdated {
    pub governance: Pubkey,
    pub old_pool: Pubkey,
    pub new_pool: Pubkey,
    pub pool_count: u8,
    pub timestamp: i64,
}

#[event]
pub struct StrategySubmitted {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub nonce: u64,
    pub proposer: Pubkey,
    pub predicted_yield: u64,
    pub timestamp: i64,
}

#[event]
pub struct StrategyVoted {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub nonce: u64,
    pub guard: Pubkey,
    pub vote: Vote,
    pub timestamp: i64,
}

#[event]
pub struct StrategyActivated {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub nonce: u64,
    pub proposer: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct StrategyWithdrawn {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub nonce: u64,
    pub timestamp: i64,
}

/// Event emitted for each guard vote on a governance migration
#[event]
pub struct GovernanceVoteCast {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub new_governance: Pubkey,
    pub guard: Pubkey,
    pub votes: u8,
    pub timestamp: i64,
}
