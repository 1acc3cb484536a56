use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::rebalance::emit_rebalance,
    position::{load_positions, Custody, Position, TokenPosition},
    state::*,
};

/// Owner-only position management (add, remove, swap)
///
/// Position accounts of every occupied slot follow in `remaining_accounts`,
/// then the incoming position account for add and swap.
#[derive(Accounts)]
pub struct ManagePositions<'info> {
    /// Vault owner - only they can change the position list
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

impl<'info> ManagePositions<'info> {
    pub(crate) fn custody(&self) -> Custody<'info> {
        Custody::new(
            &self.vault_state,
            self.vault_token_account.to_account_info(),
            self.vault_authority.to_account_info(),
            self.token_program.to_account_info(),
        )
    }
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
    neutral: bool,
) -> Result<()> {
    let custody = ctx.accounts.custody();
    let (mut positions, extra) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;
    let account = extra.first().ok_or(VaultError::InvalidPositionAccounts)?;
    let position = TokenPosition::load(account, &custody)?;

    // EFFECTS: New slot, weighted from the active strategy
    let vault_state = &mut ctx.accounts.vault_state;
    let idx = vault_state.add_position(position.id(), neutral)?;
    vault_state.positions[idx].last_value = position.value()?;
    positions.push(position);

    // INTERACTIONS: Bring the new position up to its weight
    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;
    let plan = vault_state.rebalance(&mut context, &mut positions, 0, MAX_POSITIONS, false)?;

    emit!(PositionAdded {
        vault: vault_state.key(),
        position: vault_state.positions[idx].id,
        neutral,
        weight: vault_state.positions[idx].weight,
        timestamp: Clock::get()?.unix_timestamp,
    });
    emit_rebalance(vault_state.key(), &plan, &mut context)
}
