use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Initialize a new vault for a given asset token
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Vault owner - manages positions and claims yield fees
    /// Security: Must be signer, stored in state
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Vault state PDA
    /// Security: Initialized with proper space and padding for upgrades
    #[account(
        init,
        payer = authority,
        space = 8 + VaultState::INIT_SPACE,
        seeds = [VAULT_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Asset token mint (the underlying token users deposit)
    /// Security: No constraints needed - any valid mint can have a vault
    pub asset_mint: Account<'info, Mint>,

    /// Share token mint PDA (vault shares)
    /// Security: Mint authority is vault_authority PDA
    #[account(
        init,
        payer = authority,
        seeds = [SHARE_MINT_SEED, asset_mint.key().as_ref()],
        bump,
        mint::decimals = asset_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA - mint authority for shares and owner of every position account
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Pool buffer: the vault's token account for idle assets
    /// Security: Owned by vault_authority PDA, correct mint
    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(
    ctx: Context<Initialize>,
    governance: Pubkey,
    yield_fee_bps: u16,
    proposer_fee_bps: u16,
    min_move: u64,
) -> Result<()> {
    // CHECKS: Fees together may not exceed all returns
    require!(
        yield_fee_bps as u64 + proposer_fee_bps as u64 <= BPS_DENOMINATOR,
        VaultError::InvalidFeeRate
    );

    let vault_state = &mut ctx.accounts.vault_state;

    // EFFECTS: Initialize vault state
    vault_state.authority = ctx.accounts.authority.key();
    // Until a committee exists the owner governs the vault directly
    vault_state.governance = if governance == Pubkey::default() {
        vault_state.authority
    } else {
        governance
    };
    vault_state.asset_mint = ctx.accounts.asset_mint.key();
    vault_state.share_mint = ctx.accounts.share_mint.key();
    vault_state.total_shares = 0;
    vault_state.total_deposited = 0;
    vault_state.total_withdrawn = 0;
    vault_state.yield_fees_claimed = 0;
    vault_state.strategy_fees_claimed = 0;
    vault_state.current_proposer = Pubkey::default();
    vault_state.min_proposer_payout = 0;
    vault_state.yield_fee_bps = yield_fee_bps;
    vault_state.proposer_fee_bps = proposer_fee_bps;
    vault_state.min_move = min_move;
    vault_state.strategy = [StrategyWeight::default(); MAX_POSITIONS];
    vault_state.positions = [PositionSlot::default(); MAX_POSITIONS];
    vault_state.bump = ctx.bumps.vault_state;
    vault_state.share_bump = ctx.bumps.share_mint;
    vault_state.authority_bump = ctx.bumps.vault_authority;
    vault_state._reserved = [0; 64];

    // INTERACTIONS: Emit event
    emit!(VaultInitialized {
        vault: vault_state.key(),
        authority: vault_state.authority,
        governance: vault_state.governance,
        asset_mint: vault_state.asset_mint,
        share_mint: vault_state.share_mint,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
