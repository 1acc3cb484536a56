use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, MintTo, Token, TokenAccount, Transfer};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::rebalance::emit_rebalance,
    position::{load_positions, Custody},
    state::*,
};

/// Deposit assets into the vault and receive shares
///
/// Position accounts of every occupied slot follow in `remaining_accounts`.
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: User must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Uses checked operations for share calculation
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Checks-effects-interactions pattern
/// ✅ 10. EVENTS: Emits Deposited event
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// User depositing assets
    /// Security: Must be signer
    #[account(mut)]
    pub user: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds, contains share ledger and position slots
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Share mint
    /// Security: Must match vault_state.share_mint
    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// User's asset token account (source)
    /// Security: Must be owned by user and correct mint
    #[account(
        mut,
        constraint = user_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = user_asset_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_asset_account: Account<'info, TokenAccount>,

    /// Receiver's share token account (destination)
    /// Security: Must hold the vault's share mint
    #[account(
        mut,
        constraint = receiver_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub receiver_share_account: Account<'info, TokenAccount>,

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
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    amount: u64,
    min_shares: u64,
) -> Result<()> {
    // CHECKS: Validate amount
    require!(amount > 0, VaultError::ZeroAmount);

    let custody = Custody::new(
        &ctx.accounts.vault_state,
        ctx.accounts.vault_token_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
    );
    let (mut positions, _) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;
    let mut context = ctx
        .accounts
        .vault_state
        .current_snapshot(custody.pool_buffer()?, &positions)?;

    // Shares priced against the pool before the new assets arrive
    let shares_to_mint = ctx
        .accounts
        .vault_state
        .convert_to_shares(amount, context.total_assets()?)?;
    require!(shares_to_mint > 0, VaultError::ZeroAmount);
    require!(shares_to_mint >= min_shares, VaultError::SlippageExceeded);

    // EFFECTS: Update share ledger BEFORE external calls
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.record_deposit(amount, shares_to_mint)?;

    // INTERACTIONS: Pull assets, mint shares, then put the cash to work

    let transfer_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.user_asset_account.to_account_info(),
            to: ctx.accounts.vault_token_account.to_account_info(),
            authority: ctx.accounts.user.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;
    context.credit_buffer(amount)?;

    let asset_mint_key = vault_state.asset_mint;
    let authority_bump = vault_state.authority_bump;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    let mint_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        MintTo {
            mint: ctx.accounts.share_mint.to_account_info(),
            to: ctx.accounts.receiver_share_account.to_account_info(),
            authority: ctx.accounts.vault_authority.to_account_info(),
        },
        signer_seeds,
    );
    token::mint_to(mint_ctx, shares_to_mint)?;

    let plan = vault_state.rebalance(&mut context, &mut positions, 0, MAX_POSITIONS, false)?;
    emit_rebalance(vault_state.key(), &plan, &mut context)?;

    emit!(Deposited {
        vault: vault_state.key(),
        user: ctx.accounts.user.key(),
        asset_amount: amount,
        shares_minted: shares_to_mint,
        total_assets: context.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
