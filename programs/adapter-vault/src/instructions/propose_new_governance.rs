use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::set_governance::replace_governance,
    state::*,
};

/// A guard's vote to move a pool to a new governance
///
/// The pool switches in the same call once a majority of current guards agree.
#[derive(Accounts)]
#[instruction(new_governance: Pubkey)]
pub struct ProposeNewGovernance<'info> {
    /// Security: Guard membership checked against the governance account
    #[account(mut)]
    pub guard: Signer<'info>,

    pub governance: Account<'info, Governance>,

    /// Pool to migrate
    /// Security: Must currently be governed by this governance account
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        constraint = vault_state.governance == governance.key() @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Ballot for this (governance, pool, new governance) triple
    #[account(
        init_if_needed,
        payer = guard,
        space = 8 + GovernanceBallot::INIT_SPACE,
        seeds = [
            BALLOT_SEED,
            governance.key().as_ref(),
            vault_state.key().as_ref(),
            new_governance.as_ref(),
        ],
        bump
    )]
    pub ballot: Account<'info, GovernanceBallot>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<ProposeNewGovernance>, new_governance: Pubkey) -> Result<()> {
    let governance_key = ctx.accounts.governance.key();
    require!(
        new_governance != Pubkey::default() && new_governance != governance_key,
        VaultError::InvalidIdentity
    );
    let pool = ctx.accounts.vault_state.key();
    require!(
        ctx.accounts.governance.is_pool(&pool),
        VaultError::PoolNotFound
    );

    let ballot = &mut ctx.accounts.ballot;
    if ballot.governance == Pubkey::default() {
        ballot.governance = governance_key;
        ballot.pool = pool;
        ballot.new_governance = new_governance;
        ballot.bump = ctx.bumps.ballot;
    }

    let guard = ctx.accounts.guard.key();
    let passed = ballot.cast(&ctx.accounts.governance, guard)?;

    emit!(GovernanceVoteCast {
        governance: governance_key,
        pool,
        new_governance,
        guard,
        votes: ballot.voters.len() as u8,
        timestamp: Clock::get()?.unix_timestamp,
    });

    if passed {
        ballot.reset();
        replace_governance(&mut ctx.accounts.vault_state, new_governance)?;
    }

    Ok(())
}
