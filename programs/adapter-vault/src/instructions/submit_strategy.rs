use anchor_lang::prelude::*;

use crate::{constants::*, events::*, governance::StrategyProposal, state::*};

/// Propose a new weight table for a pool
#[derive(Accounts)]
pub struct SubmitStrategy<'info> {
    pub proposer: Signer<'info>,

    pub governance: Account<'info, Governance>,

    /// Strategy book of the target pool
    /// Security: Validated by seeds under this governance
    #[account(
        mut,
        seeds = [STRATEGY_SEED, governance.key().as_ref(), strategy_book.pool.as_ref()],
        bump = strategy_book.bump,
    )]
    pub strategy_book: Account<'info, StrategyBook>,
}

pub fn handler(ctx: Context<SubmitStrategy>, proposal: StrategyProposal) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let proposer = ctx.accounts.proposer.key();
    let book = &mut ctx.accounts.strategy_book;

    let nonce = book.submit(&ctx.accounts.governance, proposer, &proposal, now)?;

    emit!(StrategySubmitted {
        governance: book.governance,
        pool: book.pool,
        nonce,
        proposer,
        predicted_yield: proposal.predicted_yield,
        timestamp: now,
    });

    Ok(())
}
