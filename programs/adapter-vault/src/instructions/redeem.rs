use anchor_lang::prelude::*;

use crate::instructions::withdraw::{process, Exit, Withdraw};

/// Burn an exact share count for its asset value, at least `min_assets`
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    shares: u64,
    min_assets: u64,
) -> Result<()> {
    process(ctx, Exit::Shares { shares, min_assets })
}
