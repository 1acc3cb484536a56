use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// Target weight of one position in a strategy table
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct StrategyWeight {
    pub position: Pubkey,
    pub weight: u32,
}

/// A persisted position slot
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct PositionSlot {
    /// Custody account of the position, `Pubkey::default()` when unused
    pub id: Pubkey,

    /// Proportional target weight
    pub weight: u32,

    /// Value observed at the end of the previous rebalance
    pub last_value: u64,

    /// Neutral absorber, never proportionally targeted
    pub neutral: bool,

    /// Weight forced to zero by loss detection
    pub quarantined: bool,
}

impl PositionSlot {
    pub fn is_empty(&self) -> bool {
        self.id == Pubkey::default()
    }
}

/// Which fee counter a claim draws from
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeKind {
    /// Share of returns owed to the vault owner
    Yield,
    /// Share of returns owed to the current strategy proposer
    Strategy,
}

/// Vault state: share ledger, fee counters and position slots
///
/// Security considerations:
/// - Authority and governance pointer stored in state (not instruction args)
/// - Total assets are never cached here, they are read live from the buffer and positions
/// - Bumps stored for efficient PDA signing
/// - Reserved padding for future upgrades
#[account]
#[derive(InitSpace)]
pub struct VaultState {
    /// Owner: manages positions, rebalances, claims yield fees
    pub authority: Pubkey,

    /// Key allowed to install strategies and replace itself
    pub governance: Pubkey,

    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,

    /// Mint of the vault share token
    pub share_mint: Pubkey,

    /// Total shares issued to depositors
    pub total_shares: u64,

    /// Cumulative assets deposited
    pub total_deposited: u64,

    /// Cumulative assets paid out to depositors
    pub total_withdrawn: u64,

    /// Cumulative yield fees paid to the owner
    pub yield_fees_claimed: u64,

    /// Cumulative strategy fees paid to proposers
    pub strategy_fees_claimed: u64,

    /// Proposer of the active strategy
    pub current_proposer: Pubkey,

    /// Smallest strategy fee paid out when the proposer is replaced
    pub min_proposer_payout: u64,

    pub yield_fee_bps: u16,

    pub proposer_fee_bps: u16,

    /// Smallest cash move a rebalance bothers with
    pub min_move: u64,

    /// Active weight table
    pub strategy: [StrategyWeight; MAX_POSITIONS],

    /// Occupied slots always form a prefix, in insertion order
    pub positions: [PositionSlot; MAX_POSITIONS],

    pub bump: u8,

    pub share_bump: u8,

    pub authority_bump: u8,

    pub _reserved: [u8; 64],
}

impl VaultState {
    pub fn position_count(&self) -> usize {
        self.positions.iter().take_while(|slot| !slot.is_empty()).count()
    }

    pub fn slot_index(&self, id: &Pubkey) -> Option<usize> {
        self.positions
            .iter()
            .position(|slot| !slot.is_empty() && slot.id == *id)
    }

    /// Weight assigned to `id` by the active strategy, 0 when absent
    pub fn strategy_weight(&self, id: &Pubkey) -> u32 {
        self.strategy
            .iter()
            .find(|entry| entry.position == *id && *id != Pubkey::default())
            .map_or(0, |entry| entry.weight)
    }

    // =========================================================================
    // Share ledger
    // =========================================================================

    /// Growth of pool value net of capital flows, fee payouts count as withdrawn value
    pub fn total_returns(&self, total_assets: u64) -> i128 {
        total_assets as i128 - self.total_deposited as i128
            + self.total_withdrawn as i128
            + self.yield_fees_claimed as i128
            + self.strategy_fees_claimed as i128
    }

    fn accrued_fee(&self, total_assets: u64, fee_bps: u16, claimed: u64) -> Result<u64> {
        let returns = self.total_returns(total_assets);
        if returns <= 0 {
            return Ok(0);
        }
        let earned = returns
            .checked_mul(fee_bps as i128)
            .ok_or(VaultError::MathOverflow)?
            / BPS_DENOMINATOR as i128;
        let owed = (earned - claimed as i128).max(0);
        u64::try_from(owed).map_err(|_| error!(VaultError::MathOverflow))
    }

    pub fn claimable_yield_fee(&self, total_assets: u64) -> Result<u64> {
        self.accrued_fee(total_assets, self.yield_fee_bps, self.yield_fees_claimed)
    }

    pub fn claimable_strategy_fee(&self, total_assets: u64) -> Result<u64> {
        self.accrued_fee(total_assets, self.proposer_fee_bps, self.strategy_fees_claimed)
    }

    pub fn claimable_fee(&self, kind: FeeKind, total_assets: u64) -> Result<u64> {
        match kind {
            FeeKind::Yield => self.claimable_yield_fee(total_assets),
            FeeKind::Strategy => self.claimable_strategy_fee(total_assets),
        }
    }

    /// Assets backing shares once unclaimed fees are set aside
    pub fn net_assets(&self, total_assets: u64) -> Result<u64> {
        let fees = self
            .claimable_yield_fee(total_assets)?
            .checked_add(self.claimable_strategy_fee(total_assets)?)
            .ok_or(VaultError::MathOverflow)?;
        Ok(total_assets.saturating_sub(fees))
    }

    /// Shares minted for `assets`, rounded down
    ///
    /// ERC-4626 formula:
    /// - If first deposit: shares = assets
    /// - Otherwise: shares = assets * totalShares / netAssets
    pub fn convert_to_shares(&self, assets: u64, total_assets: u64) -> Result<u64> {
        let net_assets = self.net_assets(total_assets)?;
        if self.total_shares == 0 || net_assets == 0 {
            return Ok(assets);
        }
        mul_div(assets, self.total_shares, net_assets, false)
    }

    /// Assets owed for `shares`, rounded down
    pub fn convert_to_assets(&self, shares: u64, total_assets: u64) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(shares);
        }
        mul_div(shares, self.net_assets(total_assets)?, self.total_shares, false)
    }

    /// Shares burned to withdraw exactly `assets`, rounded up
    pub fn preview_withdraw(&self, assets: u64, total_assets: u64) -> Result<u64> {
        let net_assets = self.net_assets(total_assets)?;
        if self.total_shares == 0 || net_assets == 0 {
            return Ok(assets);
        }
        mul_div(assets, self.total_shares, net_assets, true)
    }

    /// Most assets a holder of `holder_shares` can take out
    pub fn max_withdraw(&self, holder_shares: u64, total_assets: u64) -> Result<u64> {
        self.convert_to_assets(holder_shares.min(self.total_shares), total_assets)
    }

    /// Most shares a holder of `holder_shares` can redeem
    pub fn max_redeem(&self, holder_shares: u64) -> u64 {
        holder_shares.min(self.total_shares)
    }

    pub fn record_deposit(&mut self, assets: u64, shares: u64) -> Result<()> {
        self.total_deposited = self
            .total_deposited
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;
        self.total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn record_withdraw(&mut self, assets: u64, shares: u64) -> Result<()> {
        self.total_withdrawn = self
            .total_withdrawn
            .checked_add(assets)
            .ok_or(VaultError::MathOverflow)?;
        self.total_shares = self
            .total_shares
            .checked_sub(shares)
            .ok_or(VaultError::InsufficientShares)?;
        Ok(())
    }

    pub fn record_fee_claim(&mut self, kind: FeeKind, amount: u64) -> Result<()> {
        let counter = match kind {
            FeeKind::Yield => &mut self.yield_fees_claimed,
            FeeKind::Strategy => &mut self.strategy_fees_claimed,
        };
        *counter = counter.checked_add(amount).ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    // =========================================================================
    // Strategy installation
    // =========================================================================

    /// Strategy fee owed to the outgoing proposer, 0 when below the minimum payout
    pub fn proposer_settlement(&self, total_assets: u64) -> Result<u64> {
        if self.current_proposer == Pubkey::default() {
            return Ok(0);
        }
        let owed = self.claimable_strategy_fee(total_assets)?;
        if owed == 0 || owed < self.min_proposer_payout {
            return Ok(0);
        }
        Ok(owed)
    }

    /// Replace the weight table and re-weight every slot from it
    ///
    /// Quarantined slots get whatever weight the new table assigns them.
    pub fn apply_strategy(&mut self, weights: &[StrategyWeight; MAX_POSITIONS]) -> Result<()> {
        validate_weights(weights)?;
        self.strategy = *weights;
        let table = self.strategy;
        for slot in self.positions.iter_mut().filter(|slot| !slot.is_empty()) {
            slot.weight = if slot.neutral {
                0
            } else {
                table
                    .iter()
                    .find(|entry| entry.position == slot.id)
                    .map_or(0, |entry| entry.weight)
            };
            slot.quarantined = false;
        }
        Ok(())
    }

    pub fn install_proposer(&mut self, proposer: Pubkey, min_payout: u64) {
        self.current_proposer = proposer;
        self.min_proposer_payout = min_payout;
    }
}

/// A weight table may not name the same position twice
pub fn validate_weights(weights: &[StrategyWeight]) -> Result<()> {
    for (i, entry) in weights.iter().enumerate() {
        if entry.position == Pubkey::default() {
            continue;
        }
        require!(
            !weights[i + 1..].iter().any(|other| other.position == entry.position),
            VaultError::InvalidWeightTable
        );
    }
    Ok(())
}

/// `a * b / denominator` through u128, rounding up when `round_up`
fn mul_div(a: u64, b: u64, denominator: u64, round_up: bool) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);
    let product = (a as u128)
        .checked_mul(b as u128)
        .ok_or(VaultError::MathOverflow)?;
    let denominator = denominator as u128;
    let mut quotient = product / denominator;
    if round_up && product % denominator != 0 {
        quotient += 1;
    }
    u64::try_from(quotient).map_err(|_| error!(VaultError::MathOverflow))
}

// =============================================================================
// Governance accounts
// =============================================================================

/// Guard committee and the pools it governs
#[account]
#[derive(InitSpace)]
pub struct Governance {
    /// Manages the guard and pool registries
    pub owner: Pubkey,

    #[max_len(5)]
    pub guards: Vec<Pubkey>,

    #[max_len(3)]
    pub pools: Vec<Pubkey>,

    /// Seconds after submission when a proposal may activate without a quorum
    pub time_delay: i64,
}

/// A strategy proposal for one pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct Strategy {
    pub nonce: u64,
    pub proposer: Pubkey,
    pub weights: [StrategyWeight; MAX_POSITIONS],
    pub min_proposer_payout: u64,

    /// Yield the proposer claims the pool currently earns
    pub current_yield: u64,

    pub predicted_yield: u64,
    pub submitted_at: i64,
    pub activated_at: i64,

    #[max_len(5)]
    pub endorsements: Vec<Pubkey>,

    #[max_len(5)]
    pub rejections: Vec<Pubkey>,

    pub withdrawn: bool,
}

/// Pending and active strategy of one pool under one governance
#[account]
#[derive(InitSpace)]
pub struct StrategyBook {
    pub governance: Pubkey,
    pub pool: Pubkey,

    /// Nonce of the latest submitted proposal
    pub nonce: u64,

    pub pending: Option<Strategy>,
    pub active: Strategy,
    pub bump: u8,
}

/// Votes for moving one pool to a new governance
#[account]
#[derive(InitSpace)]
pub struct GovernanceBallot {
    pub governance: Pubkey,
    pub pool: Pubkey,
    pub new_governance: Pubkey,

    #[max_len(5)]
    pub voters: Vec<Pubkey>,

    pub bump: u8,
}
