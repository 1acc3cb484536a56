use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::set_strategy::install_strategy,
    position::Custody,
    state::*,
};

/// Activate the pending proposal and install it in the pool
///
/// Anyone may call once the vote or time-delay rule is met. Position accounts
/// of every occupied slot follow in `remaining_accounts`.
#[derive(Accounts)]
pub struct ActivateStrategy<'info> {
    pub caller: Signer<'info>,

    pub governance: Account<'info, Governance>,

    /// Security: Validated by seeds under this governance and pool
    #[account(
        mut,
        seeds = [STRATEGY_SEED, governance.key().as_ref(), vault_state.key().as_ref()],
        bump = strategy_book.bump,
    )]
    pub strategy_book: Account<'info, StrategyBook>,

    /// Pool receiving the strategy
    /// Security: Must be governed by this governance account
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        constraint = vault_state.governance == governance.key() @ VaultError::Unauthorized,
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

    /// Outgoing proposer's asset account, required when a fee settlement is owed
    #[account(mut)]
    pub previous_proposer_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ActivateStrategy<'info>>,
    nonce: u64,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    // CHECKS + EFFECTS: Governance transition first, the install can only follow it
    let strategy = ctx
        .accounts
        .strategy_book
        .activate(&ctx.accounts.governance, nonce, now)?;

    // INTERACTIONS: Settle the outgoing proposer and move funds to the new weights
    let custody = Custody::new(
        &ctx.accounts.vault_state,
        ctx.accounts.vault_token_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
    );
    install_strategy(
        &mut ctx.accounts.vault_state,
        &custody,
        ctx.remaining_accounts,
        ctx.accounts.previous_proposer_account.as_ref(),
        &strategy,
    )?;

    emit!(StrategyActivated {
        governance: ctx.accounts.governance.key(),
        pool: ctx.accounts.vault_state.key(),
        nonce,
        proposer: strategy.proposer,
        timestamp: now,
    });

    Ok(())
}
