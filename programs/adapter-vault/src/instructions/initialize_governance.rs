use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Create a guard committee
#[derive(Accounts)]
pub struct InitializeGovernance<'info> {
    /// Committee owner - manages the guard and pool registries
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Governance account, a fresh keypair so one owner can run several committees
    #[account(
        init,
        payer = owner,
        space = 8 + Governance::INIT_SPACE,
    )]
    pub governance: Account<'info, Governance>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeGovernance>, time_delay: Option<i64>) -> Result<()> {
    let time_delay = time_delay.unwrap_or(DEFAULT_TIME_DELAY);
    require!(time_delay >= 0, VaultError::InvalidTimeDelay);

    let governance = &mut ctx.accounts.governance;
    governance.owner = ctx.accounts.owner.key();
    governance.guards = Vec::new();
    governance.pools = Vec::new();
    governance.time_delay = time_delay;

    emit!(GovernanceInitialized {
        governance: governance.key(),
        owner: governance.owner,
        time_delay,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
