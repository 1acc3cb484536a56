use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Hand the vault to a new governance key
#[derive(Accounts)]
pub struct SetGovernance<'info> {
    /// Key stored as the vault's governance pointer
    pub governance: Signer<'info>,

    /// Vault state PDA
    /// Security: has_one constraint validates governance from state
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = governance @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,
}

pub fn handler(ctx: Context<SetGovernance>, new_governance: Pubkey) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    replace_governance(vault_state, new_governance)
}

/// Point the vault at `new_governance`, which may be neither null nor the current key
pub(crate) fn replace_governance(
    vault_state: &mut Account<VaultState>,
    new_governance: Pubkey,
) -> Result<()> {
    let old_governance = vault_state.governance;
    require!(
        new_governance != Pubkey::default() && new_governance != old_governance,
        VaultError::InvalidIdentity
    );

    vault_state.governance = new_governance;

    emit!(GovernanceChanged {
        vault: vault_state.key(),
        old_governance,
        new_governance,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
