use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::{add_position::ManagePositions, rebalance::emit_rebalance},
    position::{load_positions, Position, TokenPosition},
};

/// Replace a position in place, keeping its slot weight
pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ManagePositions<'info>>,
    old_position: Pubkey,
) -> Result<()> {
    let custody = ctx.accounts.custody();
    let (mut positions, extra) = load_positions(&ctx.accounts.vault_state, ctx.remaining_accounts, &custody)?;
    let account = extra.first().ok_or(VaultError::InvalidPositionAccounts)?;
    let replacement = TokenPosition::load(account, &custody)?;
    let new_position = replacement.id();
    let opening_value = replacement.value()?;

    let vault_state = &mut ctx.accounts.vault_state;
    let drained = vault_state.swap_position(&mut positions, &old_position, replacement)?;
    let idx = vault_state
        .slot_index(&new_position)
        .ok_or(VaultError::PositionNotFound)?;
    vault_state.positions[idx].last_value = opening_value;

    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;
    let plan = vault_state.rebalance(&mut context, &mut positions, 0, MAX_POSITIONS, false)?;

    emit!(PositionSwapped {
        vault: vault_state.key(),
        old_position,
        new_position,
        drained,
        timestamp: Clock::get()?.unix_timestamp,
    });
    emit_rebalance(vault_state.key(), &plan, &mut context)
}
