use anchor_lang::prelude::*;

use crate::{
    constants::*,
    events::*,
    instructions::{add_position::ManagePositions, rebalance::emit_rebalance},
    position::load_positions,
};

/// Drain a position into the buffer and drop its slot
///
/// With `force` the slot is dropped even when the position keeps a balance,
/// which then leaves the vault's accounting.
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
    position: Pubkey,
    force: bool,
) -> Result<()> {
    let custody = ctx.accounts.custody();
    let (mut positions, _) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;

    let vault_state = &mut ctx.accounts.vault_state;
    let drained = vault_state.remove_position(&mut positions, &position, force)?;

    // Spread the drained cash over the remaining positions
    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;
    let plan = vault_state.rebalance(&mut context, &mut positions, 0, MAX_POSITIONS, false)?;

    emit!(PositionRemoved {
        vault: vault_state.key(),
        position,
        drained,
        forced: force,
        timestamp: Clock::get()?.unix_timestamp,
    });
    emit_rebalance(vault_state.key(), &plan, &mut context)
}
