use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Register a vault with a committee (add, or swap in place of another)
///
/// Opens the vault's strategy book on first registration.
#[derive(Accounts)]
pub struct RegisterPool<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Security: has_one constraint validates owner from state
    #[account(
        mut,
        has_one = owner @ VaultError::Unauthorized,
    )]
    pub governance: Account<'info, Governance>,

    /// Vault being registered
    #[account(
        seeds = [VAULT_SEED, pool.asset_mint.as_ref()],
        bump = pool.bump,
    )]
    pub pool: Account<'info, VaultState>,

    /// Strategy book of this vault under this committee
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + StrategyBook::INIT_SPACE,
        seeds = [STRATEGY_SEED, governance.key().as_ref(), pool.key().as_ref()],
        bump
    )]
    pub strategy_book: Account<'info, StrategyBook>,

    pub system_program: Program<'info, System>,
}

impl<'info> RegisterPool<'info> {
    fn open_book(&mut self, bump: u8) {
        let book = &mut self.strategy_book;
        if book.governance == Pubkey::default() {
            book.governance = self.governance.key();
            book.pool = self.pool.key();
            book.bump = bump;
        }
    }
}

/// Owner-only pool removal
#[derive(Accounts)]
pub struct ManagePools<'info> {
    pub owner: Signer<'info>,

    /// Security: has_one constraint validates owner from state
    #[account(
        mut,
        has_one = owner @ VaultError::Unauthorized,
    )]
    pub governance: Account<'info, Governance>,
}

pub fn add_handler(ctx: Context<RegisterPool>) -> Result<()> {
    let pool = ctx.accounts.pool.key();
    ctx.accounts.governance.add_pool(pool)?;
    ctx.accounts.open_book(ctx.bumps.strategy_book);
    emit_update(&ctx.accounts.governance, Pubkey::default(), pool)
}

pub fn swap_handler(ctx: Context<RegisterPool>, old_pool: Pubkey) -> Result<()> {
    let pool = ctx.accounts.pool.key();
    ctx.accounts.governance.swap_pool(&old_pool, pool)?;
    ctx.accounts.open_book(ctx.bumps.strategy_book);
    emit_update(&ctx.accounts.governance, old_pool, pool)
}

pub fn remove_handler(ctx: Context<ManagePools>, pool: Pubkey) -> Result<()> {
    ctx.accounts.governance.remove_pool(&pool)?;
    emit_update(&ctx.accounts.governance, pool, Pubkey::default())
}

fn emit_update(governance: &Account<Governance>, old_pool: Pubkey, new_pool: Pubkey) -> Result<()> {
    emit!(PoolsUpdated {
        governance: governance.key(),
        old_pool,
        new_pool,
        pool_count: governance.pools.len() as u8,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}
