use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, Token, TokenAccount};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::rebalance::emit_rebalance,
    position::{load_positions, Custody},
    state::*,
};

/// Burn shares and pay out assets
///
/// Shared by `withdraw` (exact assets) and `redeem` (exact shares). Position
/// accounts of every occupied slot follow in `remaining_accounts`.
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Share owner
    /// Security: Must be signer, authorizes the burn
    pub user: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds
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

    /// User's share token account (burned from)
    /// Security: Must be owned by user and correct mint
    #[account(
        mut,
        constraint = user_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = user_share_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_share_account: Account<'info, TokenAccount>,

    /// Receiver's asset token account (paid to)
    /// Security: Must hold the vault's asset mint
    #[account(
        mut,
        constraint = receiver_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub receiver_asset_account: Account<'info, TokenAccount>,

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

/// What the caller fixed and the bound on what the vault computes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Exact assets out, at most `max_shares` burned
    Assets { assets: u64, max_shares: u64 },
    /// Exact shares burned, at least `min_assets` out
    Shares { shares: u64, min_assets: u64 },
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    assets: u64,
    max_shares: u64,
) -> Result<()> {
    process(ctx, Exit::Assets { assets, max_shares })
}

pub(crate) fn process<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    exit: Exit,
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
    let total_assets = context.total_assets()?;

    // CHECKS: Price the exit against the pool as it stands
    let (assets, shares) = match exit {
        Exit::Assets { assets, max_shares } => {
            let shares = vault_state.preview_withdraw(assets, total_assets)?;
            require!(shares <= max_shares, VaultError::SlippageExceeded);
            (assets, shares)
        }
        Exit::Shares { shares, min_assets } => {
            let assets = vault_state.convert_to_assets(shares, total_assets)?;
            require!(assets >= min_assets, VaultError::SlippageExceeded);
            (assets, shares)
        }
    };
    require!(assets > 0 && shares > 0, VaultError::ZeroAmount);
    require!(
        ctx.accounts.user_share_account.amount >= shares,
        VaultError::InsufficientShares
    );

    // Raise the payout in the buffer
    let plan = vault_state.rebalance(&mut context, &mut positions, assets, MAX_POSITIONS, false)?;
    emit_rebalance(vault_state.key(), &plan, &mut context)?;
    require!(context.pool_buffer >= assets, VaultError::InsufficientBalance);

    // EFFECTS: Update share ledger BEFORE paying out
    vault_state.record_withdraw(assets, shares)?;

    // INTERACTIONS: Burn shares, then pay the receiver
    let burn_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Burn {
            mint: ctx.accounts.share_mint.to_account_info(),
            from: ctx.accounts.user_share_account.to_account_info(),
            authority: ctx.accounts.user.to_account_info(),
        },
    );
    token::burn(burn_ctx, shares)?;

    custody.pay_out(&ctx.accounts.receiver_asset_account.to_account_info(), assets)?;
    context.debit_buffer(assets)?;

    emit!(Withdrawn {
        vault: vault_state.key(),
        user: ctx.accounts.user.key(),
        receiver: ctx.accounts.receiver_asset_account.key(),
        asset_amount: assets,
        shares_burned: shares,
        total_assets: context.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
