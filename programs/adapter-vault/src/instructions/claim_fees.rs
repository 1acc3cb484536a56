use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::rebalance::emit_rebalance,
    position::{load_positions, Custody},
    state::*,
};

/// Pay out accrued yield or strategy fees
///
/// Yield fees always go to the vault owner and strategy fees to the current
/// proposer, whichever of the two signs. Position accounts of every occupied
/// slot follow in `remaining_accounts`.
#[derive(Accounts)]
pub struct ClaimFees<'info> {
    /// Vault owner or current proposer
    pub claimer: Signer<'info>,

    /// Vault state PDA
    /// Security: Caller role checked in the handler
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        constraint = claimer.key() == vault_state.authority
            || claimer.key() == vault_state.current_proposer @ VaultError::Unauthorized,
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

    /// Fee recipient's asset token account
    /// Security: Owner checked against the fee kind in the handler
    #[account(
        mut,
        constraint = recipient_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub recipient_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimFees<'info>>,
    kind: FeeKind,
) -> Result<()> {
    let recipient = match kind {
        FeeKind::Yield => ctx.accounts.vault_state.authority,
        FeeKind::Strategy => ctx.accounts.vault_state.current_proposer,
    };
    require_keys_eq!(
        ctx.accounts.recipient_account.owner,
        recipient,
        VaultError::InvalidOwner
    );

    let custody = Custody::new(
        &ctx.accounts.vault_state,
        ctx.accounts.vault_token_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
    );
    let (mut positions, _) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;

    let vault_state = &mut ctx.accounts.vault_state;
    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;

    // CHECKS: Something must have accrued
    let amount = vault_state.claimable_fee(kind, context.total_assets()?)?;
    require!(amount > 0, VaultError::ZeroAmount);

    let plan = vault_state.rebalance(&mut context, &mut positions, amount, MAX_POSITIONS, false)?;
    emit_rebalance(vault_state.key(), &plan, &mut context)?;
    require!(context.pool_buffer >= amount, VaultError::InsufficientBalance);

    // EFFECTS: Count the payout before it leaves
    vault_state.record_fee_claim(kind, amount)?;

    // INTERACTIONS: Pay the recipient
    custody.pay_out(&ctx.accounts.recipient_account.to_account_info(), amount)?;
    context.debit_buffer(amount)?;

    emit!(FeesClaimed {
        vault: vault_state.key(),
        kind,
        recipient,
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
