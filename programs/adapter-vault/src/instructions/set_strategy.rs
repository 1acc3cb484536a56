use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    errors::*,
    events::*,
    instructions::rebalance::emit_rebalance,
    position::{load_positions, Custody},
    state::*,
};

/// Install a weight table straight from the vault's governance key
///
/// Lets a vault be governed by a wallet before a guard committee exists.
/// Position accounts of every occupied slot follow in `remaining_accounts`.
#[derive(Accounts)]
pub struct SetStrategy<'info> {
    /// Key stored as the vault's governance pointer
    pub governance: Signer<'info>,

    /// Vault state PDA
    /// Security: has_one constraint validates governance from state
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
        has_one = governance @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Pool buffer
    /// Security: Must be correct mint and owned by vault_authority
    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Outgoing proposer's asset account, required when a fee settlement is owed
    #[account(mut)]
    pub previous_proposer_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, SetStrategy<'info>>,
    weights: [StrategyWeight; MAX_POSITIONS],
    proposer: Pubkey,
    min_proposer_payout: u64,
) -> Result<()> {
    let custody = Custody::new(
        &ctx.accounts.vault_state,
        ctx.accounts.vault_token_account.to_account_info(),
        ctx.accounts.vault_authority.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
    );
    let strategy = Strategy {
        proposer,
        weights,
        min_proposer_payout,
        ..Strategy::default()
    };

    install_strategy(
        &mut ctx.accounts.vault_state,
        &custody,
        ctx.remaining_accounts,
        ctx.accounts.previous_proposer_account.as_ref(),
        &strategy,
    )
}

/// Settle the outgoing proposer, write the new weights and rebalance toward them
///
/// The previous proposer is paid whatever strategy fee accrued under them when
/// it reaches their minimum payout; smaller amounts roll over to the new proposer.
pub(crate) fn install_strategy<'info>(
    vault_state: &mut Account<'info, VaultState>,
    custody: &Custody<'info>,
    remaining_accounts: &'info [AccountInfo<'info>],
    previous_proposer_account: Option<&Account<'info, TokenAccount>>,
    strategy: &Strategy,
) -> Result<()> {
    let (mut positions, _) = load_positions(vault_state, remaining_accounts, custody)?;
    let mut context = vault_state.current_snapshot(custody.pool_buffer()?, &positions)?;

    let settlement = vault_state.settle_proposer(&mut context, &mut positions)?;
    if let Some(plan) = &settlement.plan {
        emit_rebalance(vault_state.key(), plan, &mut context)?;
    }

    if settlement.paid > 0 {
        let recipient = previous_proposer_account.ok_or(VaultError::MissingFeeRecipient)?;
        require_keys_eq!(recipient.owner, settlement.proposer, VaultError::InvalidOwner);
        require_keys_eq!(recipient.mint, vault_state.asset_mint, VaultError::InvalidMint);
        custody.pay_out(&recipient.to_account_info(), settlement.paid)?;
    } else if vault_state.claimable_strategy_fee(context.total_assets()?)? > 0 {
        msg!("Strategy fee below minimum payout, rolled over to the next proposer");
    }

    vault_state.apply_strategy(&strategy.weights)?;
    vault_state.install_proposer(strategy.proposer, strategy.min_proposer_payout);
    context.reweight(vault_state);

    let plan = vault_state.rebalance(&mut context, &mut positions, 0, MAX_POSITIONS, false)?;
    emit_rebalance(vault_state.key(), &plan, &mut context)?;

    emit!(StrategyInstalled {
        vault: vault_state.key(),
        proposer: strategy.proposer,
        previous_proposer: settlement.proposer,
        proposer_paid: settlement.paid,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
