use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// A position as seen by the allocation engine for one round
///
/// `target` and `delta` are derived by the engine and never persisted.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionBalance {
    /// Position identity, `Pubkey::default()` marks an unused slot
    pub id: Pubkey,

    /// Last observed value held in the position
    pub current: i64,

    /// Value observed at the previous rebalance (loss baseline)
    pub last_value: i64,

    /// Inbound cap this round, `UNBOUNDED_DEPOSIT` or `NEUTRAL_MAX_DEPOSIT`
    pub max_deposit: i64,

    /// Outbound cap this round (zero or negative)
    pub max_withdraw: i64,

    /// Target share of pool assets relative to the sum of weights
    pub weight: u32,

    /// Desired value for this round
    pub target: i64,

    /// Move amount for this round, positive deposits into the position
    pub delta: i64,
}

impl PositionBalance {
    /// A weighted position with unbounded deposit and withdraw capacity
    pub fn new(id: Pubkey, current: i64, last_value: i64, weight: u32) -> Self {
        Self {
            id,
            current,
            last_value,
            max_deposit: UNBOUNDED_DEPOSIT,
            max_withdraw: UNBOUNDED_WITHDRAW,
            weight,
            target: 0,
            delta: 0,
        }
    }

    /// A neutral absorber holding `current`
    pub fn neutral(id: Pubkey, current: i64) -> Self {
        Self {
            max_deposit: NEUTRAL_MAX_DEPOSIT,
            ..Self::new(id, current, current, 0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id == Pubkey::default()
    }

    pub fn is_neutral(&self) -> bool {
        self.max_deposit == NEUTRAL_MAX_DEPOSIT
    }

    /// Value fell since the previous rebalance while the position still carries weight
    pub fn has_loss(&self) -> bool {
        self.weight != 0 && self.current < self.last_value
    }

    fn deposit_cap(&self) -> i64 {
        if self.is_neutral() {
            UNBOUNDED_DEPOSIT
        } else {
            self.max_deposit.max(0)
        }
    }

    /// Most negative delta allowed: bounded by `max_withdraw` and by the balance itself
    fn withdraw_floor(&self) -> i64 {
        self.max_withdraw.min(0).max(-self.current.max(0))
    }

    fn project(&mut self) {
        self.current += self.delta;
        self.last_value = self.current;
    }
}

/// A signed transfer instruction, positive amounts deposit into the position
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceTx {
    pub amount: i64,
    pub position: Pubkey,
}

impl BalanceTx {
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }
}

/// Result of planning a single position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotPlan {
    /// Position projected as if its delta had executed
    pub position: PositionBalance,

    /// Part of the raw move the caps refused, to be carried to the next position
    pub leftover: i64,

    /// Loss detected, weight forced to zero
    pub quarantined: bool,

    /// Position is the neutral absorber
    pub neutral: bool,
}

/// Complete output of one planning round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Every slot, projected as if all transactions executed
    pub positions: [PositionBalance; MAX_POSITIONS],

    /// Ordered transactions, zero-amount entries are unused
    pub transactions: [BalanceTx; MAX_POSITIONS],

    /// Positions quarantined this round, default keys are unused
    pub quarantined: [Pubkey; MAX_POSITIONS],

    /// Net change of the pool buffer once every transaction executes
    pub pool_delta: i64,
}

impl AllocationPlan {
    pub fn tx_count(&self) -> usize {
        self.transactions.iter().filter(|tx| !tx.is_empty()).count()
    }

    pub fn quarantined_ids(&self) -> impl Iterator<Item = &Pubkey> {
        self.quarantined.iter().filter(|id| **id != Pubkey::default())
    }

    pub fn is_quarantined(&self, id: &Pubkey) -> bool {
        self.quarantined_ids().any(|q| q == id)
    }
}

/// Plan one position against `ratio_unit` assets per weight unit
///
/// A position whose value dropped since the previous round is quarantined:
/// weight forced to 0 and its whole balance withdrawn.
pub fn plan_one(ratio_unit: i64, position: &PositionBalance) -> Result<SlotPlan> {
    let mut slot = allocate(ratio_unit, position, 0)?;
    slot.position.project();
    Ok(slot)
}

fn allocate(ratio_unit: i64, position: &PositionBalance, carry: i64) -> Result<SlotPlan> {
    let mut p = *position;

    if p.has_loss() {
        p.weight = 0;
        p.target = 0;
        p.delta = p.withdraw_floor();
        return Ok(SlotPlan {
            position: p,
            leftover: 0,
            quarantined: true,
            neutral: false,
        });
    }

    let neutral = p.is_neutral();
    p.target = if neutral {
        p.current
    } else {
        proportional_target(ratio_unit, p.weight)?
    };

    let raw_delta = p
        .target
        .checked_sub(p.current)
        .and_then(|d| d.checked_add(carry))
        .ok_or(VaultError::MathOverflow)?;
    p.delta = raw_delta.clamp(p.withdraw_floor(), p.deposit_cap());

    Ok(SlotPlan {
        position: p,
        leftover: raw_delta - p.delta,
        quarantined: false,
        neutral,
    })
}

fn proportional_target(ratio_unit: i64, weight: u32) -> Result<i64> {
    let target = (ratio_unit as i128) * (weight as i128);
    i64::try_from(target).map_err(|_| error!(VaultError::MathOverflow))
}

/// Compute the ordered move transactions bringing the pool toward its weights
///
/// Cash excess over `target_buffer` is pushed into the most under-allocated
/// positions, a shortfall is raised from the neutral absorber and then the most
/// over-allocated positions, and a pool already at its buffer target gets a full
/// proportional rebalance. Quarantine withdrawals always run first.
pub fn plan(
    pool_buffer: i64,
    target_buffer: i64,
    min_move: i64,
    total_assets: i64,
    total_weight: u64,
    positions: &[PositionBalance; MAX_POSITIONS],
    withdraw_only: bool,
) -> Result<AllocationPlan> {
    let mut result = AllocationPlan {
        positions: *positions,
        ..AllocationPlan::default()
    };
    let mut quarantined = [false; MAX_POSITIONS];
    let mut total_weight = total_weight;
    let mut proceeds: i64 = 0;

    for (idx, position) in positions.iter().enumerate() {
        if position.is_empty() || !position.has_loss() {
            continue;
        }
        let slot = allocate(0, position, 0)?;
        total_weight = total_weight.saturating_sub(position.weight as u64);
        proceeds = proceeds
            .checked_sub(slot.position.delta)
            .ok_or(VaultError::MathOverflow)?;
        result.positions[idx] = slot.position;
        result.quarantined[idx] = position.id;
        quarantined[idx] = true;
    }

    let allocatable = total_assets.saturating_sub(target_buffer).max(0);
    let ratio_unit = if total_weight == 0 {
        0
    } else {
        allocatable / i64::try_from(total_weight).map_err(|_| error!(VaultError::MathOverflow))?
    };

    let absorber = result
        .positions
        .iter()
        .enumerate()
        .position(|(idx, p)| !p.is_empty() && !quarantined[idx] && p.is_neutral());

    for (idx, p) in result.positions.iter_mut().enumerate() {
        if p.is_empty() || quarantined[idx] {
            continue;
        }
        p.target = if p.is_neutral() {
            p.current
        } else {
            proportional_target(ratio_unit, p.weight)?
        };
        p.delta = 0;
    }

    let excess = pool_buffer
        .checked_add(proceeds)
        .and_then(|cash| cash.checked_sub(target_buffer))
        .ok_or(VaultError::MathOverflow)?;

    let moved = if excess > 0 {
        if total_weight > 0 {
            place_excess(&mut result, &quarantined, absorber, excess);
        }
        excess
    } else if excess < 0 {
        raise_shortfall(&mut result, &quarantined, absorber, -excess);
        -excess
    } else {
        full_rebalance(&mut result, &quarantined, absorber, ratio_unit)?
    };

    for (idx, p) in result.positions.iter_mut().enumerate() {
        if quarantined[idx] {
            continue;
        }
        // A shortfall is always raised, however small
        if (withdraw_only && p.delta > 0) || (excess >= 0 && moved < min_move) {
            p.delta = 0;
        }
    }

    order_plan(&mut result, &quarantined, pool_buffer);

    let mut pool_delta: i64 = 0;
    for p in result.positions.iter_mut().filter(|p| !p.is_empty()) {
        pool_delta = pool_delta
            .checked_sub(p.delta)
            .ok_or(VaultError::MathOverflow)?;
        p.project();
    }
    result.pool_delta = pool_delta;

    Ok(result)
}

fn is_weighted(p: &PositionBalance, quarantined: bool) -> bool {
    !p.is_empty() && !quarantined && !p.is_neutral() && p.weight > 0
}

/// Push `excess` into positions, most under-allocated first
fn place_excess(
    plan: &mut AllocationPlan,
    quarantined: &[bool; MAX_POSITIONS],
    absorber: Option<usize>,
    excess: i64,
) {
    let mut order: Vec<usize> = (0..MAX_POSITIONS)
        .filter(|&idx| is_weighted(&plan.positions[idx], quarantined[idx]))
        .collect();
    // current / weight ascending, compared by cross-multiplication; stable sort keeps slot order on ties
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&plan.positions[a], &plan.positions[b]);
        let lhs = pa.current as i128 * pb.weight as i128;
        let rhs = pb.current as i128 * pa.weight as i128;
        lhs.cmp(&rhs)
    });
    order.extend(absorber);

    let mut remaining = excess;
    for idx in order {
        if remaining == 0 {
            break;
        }
        let p = &mut plan.positions[idx];
        let amount = remaining.min(p.deposit_cap());
        p.delta = amount;
        remaining -= amount;
    }
}

/// Raise `shortfall` from the absorber, then the most over-allocated positions
fn raise_shortfall(
    plan: &mut AllocationPlan,
    quarantined: &[bool; MAX_POSITIONS],
    absorber: Option<usize>,
    shortfall: i64,
) {
    let mut ranked: Vec<usize> = (0..MAX_POSITIONS)
        .filter(|&idx| {
            let p = &plan.positions[idx];
            !p.is_empty() && !quarantined[idx] && !p.is_neutral() && p.current > 0
        })
        .collect();
    // Weight-0 positions hold nothing they should keep, so they rank above every weighted one
    ranked.sort_by(|&a, &b| {
        let (pa, pb) = (&plan.positions[a], &plan.positions[b]);
        match (pa.weight, pb.weight) {
            (0, 0) => std::cmp::Ordering::Equal,
            (0, _) => std::cmp::Ordering::Less,
            (_, 0) => std::cmp::Ordering::Greater,
            _ => {
                let lhs = pa.current as i128 * pb.weight as i128;
                let rhs = pb.current as i128 * pa.weight as i128;
                rhs.cmp(&lhs)
            }
        }
    });

    let mut remaining = shortfall;
    for idx in absorber.into_iter().chain(ranked) {
        if remaining == 0 {
            break;
        }
        let p = &mut plan.positions[idx];
        let amount = remaining.min(-p.withdraw_floor());
        p.delta = -amount;
        remaining -= amount;
    }
}

/// Target every position proportionally, cascading refused amounts in slot order
///
/// Returns the amount shifted into positions.
fn full_rebalance(
    plan: &mut AllocationPlan,
    quarantined: &[bool; MAX_POSITIONS],
    absorber: Option<usize>,
    ratio_unit: i64,
) -> Result<i64> {
    let mut carry: i64 = 0;
    let mut committed: i64 = 0;

    for idx in 0..MAX_POSITIONS {
        let p = plan.positions[idx];
        if p.is_empty() || quarantined[idx] || p.is_neutral() {
            continue;
        }
        let slot = allocate(ratio_unit, &p, carry)?;
        carry = slot.leftover;
        committed = committed
            .checked_add(slot.position.delta)
            .ok_or(VaultError::MathOverflow)?;
        plan.positions[idx] = slot.position;
    }

    // The absorber settles whatever the weighted positions could not, rounding included
    if let Some(idx) = absorber {
        let p = &mut plan.positions[idx];
        let raw = committed.checked_neg().ok_or(VaultError::MathOverflow)?;
        p.delta = raw.clamp(p.withdraw_floor(), p.deposit_cap());
    }

    Ok(plan
        .positions
        .iter()
        .enumerate()
        .filter(|(idx, p)| !quarantined[*idx] && p.delta > 0)
        .map(|(_, p)| p.delta)
        .sum())
}

/// Build the ordered transaction list and trim deposits the available cash cannot fund
fn order_plan(plan: &mut AllocationPlan, quarantined: &[bool; MAX_POSITIONS], pool_buffer: i64) {
    let mut forced = 0;
    for (idx, p) in plan.positions.iter().enumerate() {
        if quarantined[idx] && p.delta != 0 {
            plan.transactions[forced] = BalanceTx {
                amount: p.delta,
                position: p.id,
            };
            forced += 1;
        }
    }

    let rest: Vec<BalanceTx> = plan
        .positions
        .iter()
        .enumerate()
        .filter(|(idx, p)| !quarantined[*idx] && !p.is_empty())
        .map(|(_, p)| BalanceTx {
            amount: p.delta,
            position: p.id,
        })
        .collect();
    let sorted = order_transactions(&rest);
    plan.transactions[forced..].copy_from_slice(&sorted[..MAX_POSITIONS - forced]);

    let mut cash = pool_buffer.max(0);
    for tx in plan.transactions.iter_mut().filter(|tx| !tx.is_empty()) {
        if tx.amount < 0 {
            cash = cash.saturating_sub(tx.amount);
        } else {
            tx.amount = tx.amount.min(cash);
            cash -= tx.amount;
        }
    }

    for p in plan.positions.iter_mut().filter(|p| !p.is_empty()) {
        p.delta = plan
            .transactions
            .iter()
            .find(|tx| tx.position == p.id && !tx.is_empty())
            .map_or(0, |tx| tx.amount);
    }

    // Drop deposits trimmed to nothing and close the gaps
    let mut compacted = [BalanceTx::default(); MAX_POSITIONS];
    for (slot, tx) in compacted
        .iter_mut()
        .zip(plan.transactions.iter().filter(|tx| !tx.is_empty()))
    {
        *slot = *tx;
    }
    plan.transactions = compacted;
}

/// Order transactions ascending by amount with an insertion sort
///
/// Withdrawals come out first, largest first, so later deposits are funded.
/// Ties keep their input order and zero-amount entries are skipped.
pub fn order_transactions(txs: &[BalanceTx]) -> [BalanceTx; MAX_POSITIONS] {
    let mut ordered = [BalanceTx::default(); MAX_POSITIONS];
    let mut len = 0;

    for tx in txs.iter().filter(|tx| !tx.is_empty()) {
        if len == MAX_POSITIONS {
            break;
        }
        let pos = ordered[..len]
            .iter()
            .position(|existing| existing.amount > tx.amount)
            .unwrap_or(len);
        ordered.copy_within(pos..len, pos + 1);
        ordered[pos] = *tx;
        len += 1;
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(list: &[PositionBalance]) -> [PositionBalance; MAX_POSITIONS] {
        let mut out = [PositionBalance::default(); MAX_POSITIONS];
        out[..list.len()].copy_from_slice(list);
        out
    }

    fn amounts(plan: &AllocationPlan) -> Vec<i64> {
        plan.transactions
            .iter()
            .filter(|tx| !tx.is_empty())
            .map(|tx| tx.amount)
            .collect()
    }

    #[test]
    fn test_plan_one_single_position() {
        let a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        let slot = plan_one(1000, &a).unwrap();

        assert_eq!(slot.position.target, 1000);
        assert_eq!(slot.position.delta, 1000);
        assert_eq!(slot.position.current, 1000);
        assert_eq!(slot.position.last_value, 1000);
        assert_eq!(slot.leftover, 0);
        assert!(!slot.quarantined);
        assert!(!slot.neutral);
    }

    #[test]
    fn test_plan_one_capped_deposit_leaves_leftover() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 100, 100, 2);
        a.max_deposit = 300;
        let slot = plan_one(500, &a).unwrap();

        assert_eq!(slot.position.target, 1000);
        assert_eq!(slot.position.delta, 300);
        assert_eq!(slot.leftover, 600);
    }

    #[test]
    fn test_plan_one_capped_withdraw_leaves_negative_leftover() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        a.max_withdraw = -100;
        let slot = plan_one(400, &a).unwrap();

        assert_eq!(slot.position.delta, -100);
        assert_eq!(slot.leftover, -500);
    }

    #[test]
    fn test_plan_one_quarantines_on_loss() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1600, 2000, 1);
        let slot = plan_one(2000, &a).unwrap();

        assert!(slot.quarantined);
        assert_eq!(slot.position.weight, 0);
        assert_eq!(slot.position.target, 0);
        assert_eq!(slot.position.delta, -1600);
        assert_eq!(slot.position.current, 0);
    }

    #[test]
    fn test_plan_one_neutral_keeps_current() {
        let n = PositionBalance::neutral(Pubkey::new_unique(), 700);
        let slot = plan_one(1000, &n).unwrap();

        assert!(slot.neutral);
        assert_eq!(slot.position.target, 700);
        assert_eq!(slot.position.delta, 0);
    }

    #[test]
    fn test_plan_single_position_receives_everything() {
        let a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        let plan = plan(1000, 0, 0, 1000, 1, &slots(&[a]), false).unwrap();

        assert_eq!(plan.positions[0].target, 1000);
        assert_eq!(plan.positions[0].delta, 1000);
        assert_eq!(plan.transactions[0], BalanceTx { amount: 1000, position: a.id });
        assert_eq!(plan.tx_count(), 1);
        assert_eq!(plan.pool_delta, -1000);
    }

    #[test]
    fn test_plan_partial_withdraw_from_single_position() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        let plan = plan(0, 250, 0, 1000, 1, &slots(&[a]), false).unwrap();

        assert_eq!(plan.positions[0].target, 750);
        assert_eq!(plan.positions[0].delta, -250);
        assert_eq!(amounts(&plan), vec![-250]);
        assert_eq!(plan.pool_delta, 250);
    }

    #[test]
    fn test_plan_quarantine_withdraws_everything() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1600, 2000, 1);
        let plan = plan(400, 0, 0, 2000, 1, &slots(&[a]), false).unwrap();

        assert_eq!(plan.positions[0].weight, 0);
        assert_eq!(plan.positions[0].delta, -1600);
        assert!(plan.is_quarantined(&a.id));
        assert_eq!(plan.quarantined_ids().count(), 1);
        // Nothing left to target, the cash stays in the buffer
        assert_eq!(amounts(&plan), vec![-1600]);
    }

    #[test]
    fn test_plan_quarantined_funds_move_to_healthy_position() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1600, 2000, 1);
        let b = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        let plan = plan(0, 0, 0, 1600, 2, &slots(&[a, b]), false).unwrap();

        assert_eq!(plan.transactions[0], BalanceTx { amount: -1600, position: a.id });
        assert_eq!(plan.transactions[1], BalanceTx { amount: 1600, position: b.id });
        assert_eq!(plan.positions[1].target, 1600);
    }

    #[test]
    fn test_plan_deposit_cascades_past_capped_position() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        a.max_deposit = 300;
        let b = PositionBalance::new(Pubkey::new_unique(), 0, 0, 3);
        let plan = plan(2000, 0, 0, 2000, 4, &slots(&[a, b]), false).unwrap();

        assert_eq!(plan.positions[0].delta, 300);
        assert_eq!(plan.positions[1].delta, 1700);
        assert_eq!(plan.positions[0].target, 500);
        assert_eq!(plan.positions[1].target, 1500);
        assert_eq!(amounts(&plan), vec![300, 1700]);
    }

    #[test]
    fn test_plan_deposit_goes_to_most_under_allocated() {
        let a = PositionBalance::new(Pubkey::new_unique(), 900, 900, 1);
        let b = PositionBalance::new(Pubkey::new_unique(), 100, 100, 1);
        let plan = plan(500, 0, 0, 1500, 2, &slots(&[a, b]), false).unwrap();

        assert_eq!(plan.positions[0].delta, 0);
        assert_eq!(plan.positions[1].delta, 500);
    }

    #[test]
    fn test_plan_leftover_reaches_absorber() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        a.max_deposit = 100;
        let n = PositionBalance::neutral(Pubkey::new_unique(), 0);
        let plan = plan(1000, 0, 0, 1000, 1, &slots(&[n, a]), false).unwrap();

        assert_eq!(plan.positions[0].delta, 900);
        assert_eq!(plan.positions[1].delta, 100);
    }

    #[test]
    fn test_plan_shortfall_drains_absorber_first() {
        let n = PositionBalance::neutral(Pubkey::new_unique(), 200);
        let a = PositionBalance::new(Pubkey::new_unique(), 500, 500, 1);
        let b = PositionBalance::new(Pubkey::new_unique(), 800, 800, 1);
        let plan = plan(0, 500, 0, 1500, 2, &slots(&[a, n, b]), false).unwrap();

        assert_eq!(plan.positions[1].delta, -200);
        // b is the most over-allocated of the weighted positions
        assert_eq!(plan.positions[2].delta, -300);
        assert_eq!(plan.positions[0].delta, 0);
        assert_eq!(amounts(&plan), vec![-300, -200]);
    }

    #[test]
    fn test_plan_shortfall_cascades_past_withdraw_cap() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 800, 800, 1);
        a.max_withdraw = -100;
        let b = PositionBalance::new(Pubkey::new_unique(), 500, 500, 1);
        let plan = plan(0, 400, 0, 1300, 2, &slots(&[a, b]), false).unwrap();

        assert_eq!(plan.positions[0].delta, -100);
        assert_eq!(plan.positions[1].delta, -300);
    }

    #[test]
    fn test_plan_shortfall_takes_unweighted_positions_first() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        let retired = PositionBalance::new(Pubkey::new_unique(), 150, 150, 0);
        let plan = plan(0, 200, 0, 1150, 1, &slots(&[a, retired]), false).unwrap();

        assert_eq!(plan.positions[1].delta, -150);
        assert_eq!(plan.positions[0].delta, -50);
        assert!(plan.quarantined_ids().next().is_none());
    }

    #[test]
    fn test_plan_full_rebalance_follows_new_weights() {
        let a = PositionBalance::new(Pubkey::new_unique(), 500, 500, 1);
        let b = PositionBalance::new(Pubkey::new_unique(), 500, 500, 3);
        let plan = plan(0, 0, 0, 1000, 4, &slots(&[a, b]), false).unwrap();

        assert_eq!(plan.positions[0].target, 250);
        assert_eq!(plan.positions[1].target, 750);
        assert_eq!(plan.transactions[0], BalanceTx { amount: -250, position: a.id });
        assert_eq!(plan.transactions[1], BalanceTx { amount: 250, position: b.id });
        assert_eq!(plan.positions[0].current, 250);
        assert_eq!(plan.positions[1].current, 750);
    }

    #[test]
    fn test_plan_full_rebalance_carries_refused_deposit() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        a.max_deposit = 100;
        let b = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        let plan = plan(0, 0, 0, 1000, 2, &slots(&[a, b]), false).unwrap();

        assert_eq!(amounts(&plan), vec![-100, 100]);
        assert_eq!(plan.pool_delta, 0);
    }

    #[test]
    fn test_plan_absorber_funds_weighted_positions_and_keeps_rounding() {
        let n = PositionBalance::neutral(Pubkey::new_unique(), 1000);
        let a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        let b = PositionBalance::new(Pubkey::new_unique(), 0, 0, 2);
        let plan = plan(0, 0, 0, 1000, 3, &slots(&[a, b, n]), false).unwrap();

        assert_eq!(plan.positions[0].delta, 333);
        assert_eq!(plan.positions[1].delta, 666);
        assert_eq!(plan.positions[2].delta, -999);
        assert_eq!(plan.positions[2].current, 1);
        assert_eq!(amounts(&plan), vec![-999, 333, 666]);
    }

    #[test]
    fn test_plan_below_min_move_emits_nothing() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        let plan = plan(40, 0, 50, 1040, 1, &slots(&[a]), false).unwrap();

        assert_eq!(plan.tx_count(), 0);
        assert_eq!(plan.pool_delta, 0);
    }

    #[test]
    fn test_plan_min_move_never_blocks_shortfall() {
        let a = PositionBalance::new(Pubkey::new_unique(), 1000, 1000, 1);
        let plan = plan(0, 50, 100, 1000, 1, &slots(&[a]), false).unwrap();

        assert_eq!(amounts(&plan), vec![-50]);
        assert_eq!(plan.pool_delta, 50);
    }

    #[test]
    fn test_plan_min_move_never_blocks_quarantine() {
        let a = PositionBalance::new(Pubkey::new_unique(), 10, 20, 1);
        let plan = plan(0, 0, 1_000, 10, 1, &slots(&[a]), false).unwrap();

        assert_eq!(amounts(&plan), vec![-10]);
    }

    #[test]
    fn test_plan_withdraw_only_suppresses_deposits() {
        let a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 1);
        let plan = plan(1000, 0, 0, 1000, 1, &slots(&[a]), true).unwrap();

        assert_eq!(plan.tx_count(), 0);
    }

    #[test]
    fn test_plan_zero_weight_keeps_everything_in_buffer() {
        let a = PositionBalance::new(Pubkey::new_unique(), 0, 0, 0);
        let plan = plan(1000, 0, 0, 1000, 0, &slots(&[a]), false).unwrap();

        assert_eq!(plan.tx_count(), 0);
        assert_eq!(plan.positions[0].target, 0);
    }

    #[test]
    fn test_plan_never_withdraws_below_zero() {
        let mut a = PositionBalance::new(Pubkey::new_unique(), 100, 100, 1);
        a.max_withdraw = UNBOUNDED_WITHDRAW;
        let plan = plan(0, 5000, 0, 100, 1, &slots(&[a]), false).unwrap();

        assert_eq!(plan.positions[0].delta, -100);
        assert_eq!(plan.positions[0].current, 0);
    }

    #[test]
    fn test_order_transactions_insertion_sort() {
        let txs: Vec<BalanceTx> = [-5, 4, -25, 15]
            .iter()
            .map(|amount| BalanceTx {
                amount: *amount,
                position: Pubkey::new_unique(),
            })
            .collect();

        let ordered = order_transactions(&txs);
        let got: Vec<i64> = ordered.iter().map(|tx| tx.amount).collect();
        assert_eq!(got, vec![-25, -5, 4, 15, 0]);
        assert_eq!(ordered[0].position, txs[2].position);
    }

    #[test]
    fn test_order_transactions_ties_keep_slot_order() {
        let first = BalanceTx { amount: 10, position: Pubkey::new_unique() };
        let second = BalanceTx { amount: 10, position: Pubkey::new_unique() };
        let idle = BalanceTx { amount: 0, position: Pubkey::new_unique() };

        let ordered = order_transactions(&[first, idle, second]);
        assert_eq!(ordered[0], first);
        assert_eq!(ordered[1], second);
        assert!(ordered[2].is_empty());
    }
}
