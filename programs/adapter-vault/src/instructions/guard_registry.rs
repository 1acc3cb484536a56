use anchor_lang::prelude::*;

use crate::{errors::*, events::*, state::*};

/// Owner-only guard registry changes
#[derive(Accounts)]
pub struct ManageGuards<'info> {
    pub owner: Signer<'info>,

    /// Security: has_one constraint validates owner from state
    #[account(
        mut,
        has_one = owner @ VaultError::Unauthorized,
    )]
    pub governance: Account<'info, Governance>,
}

pub fn add_handler(ctx: Context<ManageGuards>, guard: Pubkey) -> Result<()> {
    ctx.accounts.governance.add_guard(guard)?;
    emit_update(&ctx.accounts.governance, Pubkey::default(), guard)
}

pub fn remove_handler(ctx: Context<ManageGuards>, guard: Pubkey) -> Result<()> {
    ctx.accounts.governance.remove_guard(&guard)?;
    emit_update(&ctx.accounts.governance, guard, Pubkey::default())
}

pub fn swap_handler(ctx: Context<ManageGuards>, old_guard: Pubkey, new_guard: Pubkey) -> Result<()> {
    ctx.accounts.governance.swap_guard(&old_guard, new_guard)?;
    emit_update(&ctx.accounts.governance, old_guard, new_guard)
}

fn emit_update(governance: &Account<Governance>, old_guard: Pubkey, new_guard: Pubkey) -> Result<()> {
    emit!(GuardsUpdated {
        governance: governance.key(),
        old_guard,
        new_guard,
        guard_count: governance.guards.len() as u8,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}
