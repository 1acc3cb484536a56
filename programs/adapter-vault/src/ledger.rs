use anchor_lang::prelude::*;

use crate::{
    allocation::{self, AllocationPlan, PositionBalance},
    constants::*,
    errors::VaultError,
    position::Position,
    state::{FeeKind, PositionSlot, VaultState},
};

/// Live view of the pool for one instruction
///
/// The total is memoized and dropped whenever a value moves, so nothing reads a
/// total from before the last transfer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationContext {
    /// Asset tokens held in the vault's own token account
    pub pool_buffer: u64,

    pub balances: [PositionBalance; MAX_POSITIONS],

    /// Sum of weights over weighted, non-neutral slots
    pub total_weight: u64,

    total: Option<u64>,
}

impl AllocationContext {
    pub fn total_assets(&mut self) -> Result<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }
        let total = self
            .balances
            .iter()
            .filter(|balance| !balance.is_empty())
            .try_fold(self.pool_buffer, |acc, balance| {
                acc.checked_add(balance.current as u64)
            })
            .ok_or(VaultError::MathOverflow)?;
        self.total = Some(total);
        Ok(total)
    }

    /// Cash arriving in the buffer from outside the positions
    pub fn credit_buffer(&mut self, amount: u64) -> Result<()> {
        self.pool_buffer = self
            .pool_buffer
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.total = None;
        Ok(())
    }

    /// Cash leaving the pool
    pub fn debit_buffer(&mut self, amount: u64) -> Result<()> {
        self.pool_buffer = self
            .pool_buffer
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientBalance)?;
        self.total = None;
        Ok(())
    }

    /// Record a move of `executed` into slot `idx` (negative out of it) and its new observed value
    fn record_move(&mut self, idx: usize, executed: i64, value: u64) -> Result<()> {
        if executed >= 0 {
            self.debit_buffer(executed as u64)?;
        } else {
            self.credit_buffer(executed.unsigned_abs())?;
        }
        self.balances[idx].current = to_signed(value)?;
        self.total = None;
        Ok(())
    }

    /// Re-read slot weights after the vault's weight table changed
    pub fn reweight(&mut self, vault: &VaultState) {
        self.total_weight = 0;
        for (balance, slot) in self.balances.iter_mut().zip(vault.positions.iter()) {
            if slot.is_empty() {
                continue;
            }
            balance.weight = if slot.neutral { 0 } else { slot.weight };
            self.total_weight += balance.weight as u64;
        }
    }
}

fn to_signed(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| error!(VaultError::MathOverflow))
}

impl VaultState {
    /// Snapshot live position values into a fresh context
    ///
    /// `positions` holds one entry per occupied slot, in slot order.
    pub fn current_snapshot<P: Position>(
        &self,
        pool_buffer: u64,
        positions: &[P],
    ) -> Result<AllocationContext> {
        require!(
            positions.len() == self.position_count(),
            VaultError::InvalidPositionAccounts
        );

        let mut context = AllocationContext {
            pool_buffer,
            ..Default::default()
        };
        for (idx, (slot, position)) in self.positions.iter().zip(positions).enumerate() {
            require_keys_eq!(position.id(), slot.id, VaultError::InvalidPositionAccounts);

            let current = to_signed(position.value()?)?;
            context.balances[idx] = if slot.neutral {
                PositionBalance {
                    last_value: to_signed(slot.last_value)?,
                    max_withdraw: position.max_withdraw()?,
                    ..PositionBalance::neutral(slot.id, current)
                }
            } else {
                PositionBalance {
                    max_deposit: position.max_deposit()?,
                    max_withdraw: position.max_withdraw()?,
                    ..PositionBalance::new(slot.id, current, to_signed(slot.last_value)?, slot.weight)
                }
            };
        }
        context.reweight(self);

        Ok(context)
    }

    /// Plan against the context and execute up to `max_tx_count` transactions in order
    ///
    /// Quarantined slots keep their place with weight 0 and the `quarantined`
    /// flag. Every slot's `last_value` is refreshed afterwards.
    pub fn rebalance<P: Position>(
        &mut self,
        context: &mut AllocationContext,
        positions: &mut [P],
        target_buffer: u64,
        max_tx_count: usize,
        withdraw_only: bool,
    ) -> Result<AllocationPlan> {
        require!(
            positions.len() == self.position_count(),
            VaultError::InvalidPositionAccounts
        );

        let total_assets = to_signed(context.total_assets()?)?;
        let plan = allocation::plan(
            to_signed(context.pool_buffer)?,
            to_signed(target_buffer)?,
            to_signed(self.min_move)?,
            total_assets,
            context.total_weight,
            &context.balances,
            withdraw_only,
        )?;

        for id in plan.quarantined_ids() {
            let idx = self.slot_index(id).ok_or(VaultError::PositionNotFound)?;
            let slot = &mut self.positions[idx];
            msg!("Position {} quarantined after value fell below {}", id, slot.last_value);
            slot.weight = 0;
            slot.quarantined = true;
        }
        if plan.quarantined_ids().next().is_some() {
            context.reweight(self);
        }

        for tx in plan
            .transactions
            .iter()
            .filter(|tx| !tx.is_empty())
            .take(max_tx_count)
        {
            let idx = self
                .slot_index(&tx.position)
                .ok_or(VaultError::PositionNotFound)?;
            let position = &mut positions[idx];
            let executed = if tx.amount > 0 {
                to_signed(position.deposit(tx.amount as u64)?)?
            } else {
                -to_signed(position.withdraw(tx.amount.unsigned_abs())?)?
            };
            context.record_move(idx, executed, position.value()?)?;
        }

        for (slot, balance) in self.positions.iter_mut().zip(context.balances.iter()) {
            if !slot.is_empty() {
                slot.last_value = balance.current.max(0) as u64;
            }
        }

        Ok(plan)
    }

    /// Append a position slot, weighted from the active strategy
    pub fn add_position(&mut self, id: Pubkey, neutral: bool) -> Result<usize> {
        require!(id != Pubkey::default(), VaultError::EmptyPositionId);
        require!(self.slot_index(&id).is_none(), VaultError::DuplicatePosition);
        require!(
            !neutral || !self.positions.iter().any(|slot| !slot.is_empty() && slot.neutral),
            VaultError::DuplicatePosition
        );

        let idx = self.position_count();
        require!(idx < MAX_POSITIONS, VaultError::TooManyPositions);

        self.positions[idx] = PositionSlot {
            id,
            weight: if neutral { 0 } else { self.strategy_weight(&id) },
            last_value: 0,
            neutral,
            quarantined: false,
        };
        Ok(idx)
    }

    /// Drain a position into the buffer and drop its slot
    ///
    /// Returns the amount drained. A balance left behind blocks removal unless
    /// `force`, in which case it leaves the pool's accounting.
    pub fn remove_position<P: Position>(
        &mut self,
        positions: &mut Vec<P>,
        id: &Pubkey,
        force: bool,
    ) -> Result<u64> {
        require!(
            positions.len() == self.position_count(),
            VaultError::InvalidPositionAccounts
        );
        let idx = self.slot_index(id).ok_or(VaultError::PositionNotFound)?;

        let (drained, remaining) = drain(&mut positions[idx])?;
        if remaining > 0 {
            require!(force, VaultError::PositionNotEmpty);
            msg!("Position {} force-removed holding {}", id, remaining);
        }

        positions.remove(idx);
        self.positions.copy_within(idx + 1.., idx);
        self.positions[MAX_POSITIONS - 1] = PositionSlot::default();

        Ok(drained)
    }

    /// Drain `old` and put `new` in its slot, keeping the slot's weight
    pub fn swap_position<P: Position>(
        &mut self,
        positions: &mut [P],
        old: &Pubkey,
        new: P,
    ) -> Result<u64> {
        require!(
            positions.len() == self.position_count(),
            VaultError::InvalidPositionAccounts
        );
        let new_id = new.id();
        require!(new_id != Pubkey::default(), VaultError::EmptyPositionId);
        require!(self.slot_index(&new_id).is_none(), VaultError::DuplicatePosition);
        let idx = self.slot_index(old).ok_or(VaultError::PositionNotFound)?;

        let (drained, remaining) = drain(&mut positions[idx])?;
        require!(remaining == 0, VaultError::PositionNotEmpty);

        let slot = &mut self.positions[idx];
        slot.id = new_id;
        slot.last_value = 0;
        slot.quarantined = false;
        positions[idx] = new;

        Ok(drained)
    }
}

/// Outcome of settling the outgoing proposer's strategy fee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposerSettlement {
    /// Recorded proposer the payment is owed to
    pub proposer: Pubkey,

    /// Amount raised in the buffer and booked as claimed
    pub paid: u64,

    /// Rebalance that raised the payment, when one ran
    pub plan: Option<AllocationPlan>,
}

impl VaultState {
    /// Raise the outgoing proposer's fee in the buffer and book it as claimed
    ///
    /// Nothing moves when the fee is below the minimum payout. When positions
    /// release less than owed, only what reached the buffer is paid and the rest
    /// stays claimable. The caller transfers `paid` to `proposer`.
    pub fn settle_proposer<P: Position>(
        &mut self,
        context: &mut AllocationContext,
        positions: &mut [P],
    ) -> Result<ProposerSettlement> {
        let proposer = self.current_proposer;
        let owed = self.proposer_settlement(context.total_assets()?)?;
        if owed == 0 {
            return Ok(ProposerSettlement {
                proposer,
                paid: 0,
                plan: None,
            });
        }

        let plan = self.rebalance(context, positions, owed, MAX_POSITIONS, false)?;
        let paid = owed.min(context.pool_buffer);
        self.record_fee_claim(FeeKind::Strategy, paid)?;
        context.debit_buffer(paid)?;

        Ok(ProposerSettlement {
            proposer,
            paid,
            plan: Some(plan),
        })
    }
}

/// Withdraw everything a position will release, returning (drained, left behind)
fn drain<P: Position>(position: &mut P) -> Result<(u64, u64)> {
    let value = position.value()?;
    let drained = if value > 0 { position.withdraw(value)? } else { 0 };
    Ok((drained, position.value()?))
}
