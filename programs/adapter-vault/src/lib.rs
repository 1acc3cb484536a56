// Adapter Vault - pooled-capital vault spreading deposits across bounded positions
// Allocation: pure planning engine with loss quarantine, executed against SPL custody accounts
// Governance: guard committee gating weight-table changes behind votes and a time delay

use anchor_lang::prelude::*;

pub mod allocation;
pub mod constants;
pub mod errors;
pub mod events;
pub mod governance;
pub mod instructions;
pub mod ledger;
pub mod position;
pub mod state;

use constants::MAX_POSITIONS;
use governance::{StrategyProposal, Vote};
use instructions::*;
use state::{FeeKind, StrategyWeight};

declare_id!("ADVTbq3hVs8rM6tVfPZ1x9aQNEk2vL4cJ7uYzWgR5Hn");

#[program]
pub mod adapter_vault {
    use super::*;

    /// Initialize a new vault for a given asset token
    ///
    /// Security considerations:
    /// - Validates authority is signer
    /// - Rejects fee rates above 100% combined
    /// - Creates share mint with vault authority PDA as mint authority
    /// - A default governance key makes the owner the governance
    pub fn initialize(
        ctx: Context<Initialize>,
        governance: Pubkey,
        yield_fee_bps: u16,
        proposer_fee_bps: u16,
        min_move: u64,
    ) -> Result<()> {
        instructions::initialize::handler(ctx, governance, yield_fee_bps, proposer_fee_bps, min_move)
    }

    /// Deposit assets into the vault and receive shares
    ///
    /// Security considerations:
    /// - Shares priced before the transfer, fees set aside
    /// - Fails when fewer than `min_shares` would be minted
    /// - Follows checks-effects-interactions pattern
    /// - Rebalances the new cash into positions
    pub fn deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
        amount: u64,
        min_shares: u64,
    ) -> Result<()> {
        instructions::deposit::handler(ctx, amount, min_shares)
    }

    /// Withdraw an exact asset amount by burning shares
    ///
    /// Security considerations:
    /// - Shares burned round up against the caller
    /// - Fails when more than `max_shares` would be burned
    /// - Raises the payout from positions before paying
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        assets: u64,
        max_shares: u64,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, assets, max_shares)
    }

    /// Redeem an exact share count for assets
    pub fn redeem<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        shares: u64,
        min_assets: u64,
    ) -> Result<()> {
        instructions::redeem::handler(ctx, shares, min_assets)
    }

    /// Rebalance positions toward their weights around a buffer target
    ///
    /// Security considerations:
    /// - Authority-only function (has_one constraint)
    /// - Position accounts validated against the vault's slots
    /// - Loss-making positions are quarantined, not an error
    pub fn rebalance<'info>(
        ctx: Context<'_, '_, 'info, 'info, Rebalance<'info>>,
        target_buffer: u64,
        max_tx_count: u8,
        withdraw_only: bool,
    ) -> Result<()> {
        instructions::rebalance::handler(ctx, target_buffer, max_tx_count, withdraw_only)
    }

    /// Add a custody position, weighted from the active strategy
    ///
    /// Security considerations:
    /// - Authority-only function
    /// - Position must be a token account of the asset mint owned by the vault authority
    /// - At most one neutral absorber
    pub fn add_position<'info>(
        ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
        neutral: bool,
    ) -> Result<()> {
        instructions::add_position::handler(ctx, neutral)
    }

    /// Drain and remove a position
    pub fn remove_position<'info>(
        ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
        position: Pubkey,
        force: bool,
    ) -> Result<()> {
        instructions::remove_position::handler(ctx, position, force)
    }

    /// Replace a position in its slot
    pub fn swap_position<'info>(
        ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
        old_position: Pubkey,
    ) -> Result<()> {
        instructions::swap_position::handler(ctx, old_position)
    }

    /// Pay out accrued yield fees to the owner or strategy fees to the proposer
    ///
    /// Security considerations:
    /// - Caller must be the owner or the current proposer
    /// - Recipient is fixed by the fee kind, not by the caller
    pub fn claim_fees<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimFees<'info>>,
        kind: FeeKind,
    ) -> Result<()> {
        instructions::claim_fees::handler(ctx, kind)
    }

    /// Install a weight table directly from the vault's governance key
    pub fn set_strategy<'info>(
        ctx: Context<'_, '_, 'info, 'info, SetStrategy<'info>>,
        weights: [StrategyWeight; MAX_POSITIONS],
        proposer: Pubkey,
        min_proposer_payout: u64,
    ) -> Result<()> {
        instructions::set_strategy::handler(ctx, weights, proposer, min_proposer_payout)
    }

    /// Hand the vault to a new governance key
    pub fn set_governance(ctx: Context<SetGovernance>, new_governance: Pubkey) -> Result<()> {
        instructions::set_governance::handler(ctx, new_governance)
    }

    /// Create a guard committee
    pub fn initialize_governance(
        ctx: Context<InitializeGovernance>,
        time_delay: Option<i64>,
    ) -> Result<()> {
        instructions::initialize_governance::handler(ctx, time_delay)
    }

    pub fn add_guard(ctx: Context<ManageGuards>, guard: Pubkey) -> Result<()> {
        instructions::guard_registry::add_handler(ctx, guard)
    }

    pub fn remove_guard(ctx: Context<ManageGuards>, guard: Pubkey) -> Result<()> {
        instructions::guard_registry::remove_handler(ctx, guard)
    }

    pub fn swap_guard(
        ctx: Context<ManageGuards>,
        old_guard: Pubkey,
        new_guard: Pubkey,
    ) -> Result<()> {
        instructions::guard_registry::swap_handler(ctx, old_guard, new_guard)
    }

    pub fn add_pool(ctx: Context<RegisterPool>) -> Result<()> {
        instructions::pool_registry::add_handler(ctx)
    }

    pub fn remove_pool(ctx: Context<ManagePools>, pool: Pubkey) -> Result<()> {
        instructions::pool_registry::remove_handler(ctx, pool)
    }

    pub fn swap_pool(ctx: Context<RegisterPool>, old_pool: Pubkey) -> Result<()> {
        instructions::pool_registry::swap_handler(ctx, old_pool)
    }

    /// Propose a new weight table for a pool
    ///
    /// Security considerations:
    /// - Pool must be registered and the committee non-empty
    /// - One live proposal per pool
    /// - Predicted yield must beat both the active strategy and the claimed current yield
    pub fn submit_strategy(ctx: Context<SubmitStrategy>, proposal: StrategyProposal) -> Result<()> {
        instructions::submit_strategy::handler(ctx, proposal)
    }

    pub fn endorse_strategy(ctx: Context<VoteStrategy>, nonce: u64) -> Result<()> {
        instructions::vote_strategy::handler(ctx, nonce, Vote::Endorse)
    }

    pub fn reject_strategy(ctx: Context<VoteStrategy>, nonce: u64) -> Result<()> {
        instructions::vote_strategy::handler(ctx, nonce, Vote::Reject)
    }

    /// Activate the pending proposal and install it in the pool
    ///
    /// Security considerations:
    /// - Needs a quorum of endorsements, or the delay with endorsements at least matching rejections
    /// - Previous proposer paid their accrued fee regardless of who calls
    pub fn activate_strategy<'info>(
        ctx: Context<'_, '_, 'info, 'info, ActivateStrategy<'info>>,
        nonce: u64,
    ) -> Result<()> {
        instructions::activate_strategy::handler(ctx, nonce)
    }

    pub fn withdraw_strategy(ctx: Context<WithdrawStrategy>, nonce: u64) -> Result<()> {
        instructions::withdraw_strategy::handler(ctx, nonce)
    }

    /// Vote to move a pool to a new governance, switching once a majority agrees
    pub fn propose_new_governance(
        ctx: Context<ProposeNewGovernance>,
        new_governance: Pubkey,
    ) -> Result<()> {
        instructions::propose_new_governance::handler(ctx, new_governance)
    }
}
