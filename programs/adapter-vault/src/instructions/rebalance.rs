use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    allocation::AllocationPlan,
    constants::*,
    errors::*,
    events::*,
    ledger::AllocationContext,
    position::{load_positions, Custody},
    state::*,
};

/// Move assets between the pool buffer and the positions
///
/// Position accounts of every occupied slot follow in `remaining_accounts`.
#[derive(Accounts)]
pub struct Rebalance<'info> {
    /// Vault owner - only they can trigger a rebalance directly
    /// Security: Must be signer and match vault_state.authority
    pub authority: Signer<'info>,

    /// Vault state PDA
    /// Security: has_one constraint validates authority from state
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = authority @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Pool buffer
    /// Security: Must be correct mint and owned by vault_authority
    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Rebalance<'info>>,
    target_buffer: u64,
    max_tx_count: u8,
    withdraw_only: bool,
) -> Result<()> {
    let custody = Custody::new(
        &ctx.accounts.vault_state,
        ctx.accounts.vault_token_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
    );
    let (mut positions, _) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;

    let vault_state = &mut ctx.accounts.vault_state;
    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;
    let plan = vault_state.rebalance(
        &mut context,
        &mut positions,
        target_buffer,
        (max_tx_count as usize).min(MAX_POSITIONS),
        withdraw_only,
    )?;

    emit_rebalance(vault_state.key(), &plan, &mut context)
}

/// Emit the quarantine and summary events for an executed plan
pub(crate) fn emit_rebalance(
    vault: Pubkey,
    plan: &AllocationPlan,
    context: &mut AllocationContext,
) -> Result<()> {
    let timestamp = Clock::get()?.unix_timestamp;

    for id in plan.quarantined_ids() {
        let last_value = context
            .balances
            .iter()
            .find(|balance| balance.id == *id)
            .map_or(0, |balance| balance.last_value.max(0) as u64);
        emit!(PositionQuarantined {
            vault,
            position: *id,
            last_value,
            timestamp,
        });
    }

    emit!(Rebalanced {
        vault,
        transactions: plan.tx_count() as u8,
        pool_buffer: context.pool_buffer,
        total_assets: context.total_assets()?,
        timestamp,
    });

    Ok(())
}
