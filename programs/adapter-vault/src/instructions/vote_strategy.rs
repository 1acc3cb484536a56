use anchor_lang::prelude::*;

use crate::{constants::*, events::*, governance::Vote, state::*};

/// A guard's endorsement or rejection of the pending proposal
#[derive(Accounts)]
pub struct VoteStrategy<'info> {
    /// Security: Guard membership checked against the governance account
    pub guard: Signer<'info>,

    pub governance: Account<'info, Governance>,

    /// Security: Validated by seeds under this governance
    #[account(
        mut,
        seeds = [STRATEGY_SEED, governance.key().as_ref(), strategy_book.pool.as_ref()],
        bump = strategy_book.bump,
    )]
    pub strategy_book: Account<'info, StrategyBook>,
}

pub fn handler(ctx: Context<VoteStrategy>, nonce: u64, vote: Vote) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let guard = ctx.accounts.guard.key();
    let book = &mut ctx.accounts.strategy_book;

    book.vote(&ctx.accounts.governance, guard, nonce, vote, now)?;

    emit!(StrategyVoted {
        governance: book.governance,
        pool: book.pool,
        nonce,
        guard,
        vote,
        timestamp: now,
    });

    Ok(())
}
