use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Pull a pending proposal, proposer only
#[derive(Accounts)]
pub struct WithdrawStrategy<'info> {
    pub proposer: Signer<'info>,

    pub governance: Account<'info, Governance>,

    /// Security: Validated by seeds under this governance
    #[account(
        mut,
        seeds = [STRATEGY_SEED, governance.key().as_ref(), strategy_book.pool.as_ref()],
        bump = strategy_book.bump,
    )]
    pub strategy_book: Account<'info, StrategyBook>,
}

pub fn handler(ctx: Context<WithdrawStrategy>, nonce: u64) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let book = &mut ctx.accounts.strategy_book;

    book.withdraw(&ctx.accounts.governance, &ctx.accounts.proposer.key(), nonce, now)?;

    emit!(StrategyWithdrawn {
        governance: book.governance,
        pool: book.pool,
        nonce,
        timestamp: now,
    });

    Ok(())
}
