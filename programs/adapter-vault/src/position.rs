use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::{constants::*, errors::VaultError, state::VaultState};

/// A yield-bearing slot the vault can move assets into and out of
///
/// Implementations report what they hold and how much they can take or give
/// this round. `deposit` and `withdraw` return the amount actually moved, a
/// shortfall against the request is a valuation update and not an error.
pub trait Position {
    fn id(&self) -> Pubkey;

    /// Assets currently held
    fn value(&self) -> Result<u64>;

    /// Most the position accepts this round
    fn max_deposit(&self) -> Result<i64>;

    /// Most the position releases this round, as a non-positive amount
    fn max_withdraw(&self) -> Result<i64>;

    fn deposit(&mut self, amount: u64) -> Result<u64>;

    fn withdraw(&mut self, amount: u64) -> Result<u64>;
}

/// Vault-side accounts every custody transfer needs
#[derive(Clone)]
pub struct Custody<'info> {
    pub vault_token_account: AccountInfo<'info>,
    pub vault_authority: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub asset_mint: Pubkey,
    pub authority_bump: u8,
}

impl<'info> Custody<'info> {
    pub fn new(
        vault: &VaultState,
        vault_token_account: AccountInfo<'info>,
        vault_authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
    ) -> Self {
        Self {
            vault_token_account,
            vault_authority,
            token_program,
            asset_mint: vault.asset_mint,
            authority_bump: vault.authority_bump,
        }
    }

    /// Live balance of the pool buffer, current after any transfer in this instruction
    pub fn pool_buffer(&self) -> Result<u64> {
        let data = self.vault_token_account.try_borrow_data()?;
        let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
        Ok(token_account.amount)
    }

    /// Move `amount` between two token accounts held by the vault authority PDA
    fn transfer(&self, from: &AccountInfo<'info>, to: &AccountInfo<'info>, amount: u64) -> Result<()> {
        let authority_seeds: &[&[u8]] = &[
            VAULT_AUTHORITY_SEED,
            self.asset_mint.as_ref(),
            &[self.authority_bump],
        ];
        let signer_seeds = &[authority_seeds];

        let transfer_ctx = CpiContext::new_with_signer(
            self.token_program.clone(),
            Transfer {
                from: from.clone(),
                to: to.clone(),
                authority: self.vault_authority.clone(),
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, amount)
    }

    /// Pay `amount` out of the pool buffer to an arbitrary token account
    pub fn pay_out(&self, to: &AccountInfo<'info>, amount: u64) -> Result<()> {
        self.transfer(&self.vault_token_account, to, amount)
    }
}

/// A custody token account of the asset mint owned by the vault authority
///
/// Deposits and withdrawals are PDA-signed transfers against the pool buffer.
/// Capacity is unbounded inbound and limited to the balance outbound.
pub struct TokenPosition<'info> {
    account: AccountInfo<'info>,
    custody: Custody<'info>,
}

impl<'info> TokenPosition<'info> {
    /// Validate `account` as a custody position of this vault
    pub fn load(account: &AccountInfo<'info>, custody: &Custody<'info>) -> Result<Self> {
        require_keys_eq!(*account.owner, token::ID, VaultError::InvalidOwner);
        let token_account = {
            let data = account.try_borrow_data()?;
            TokenAccount::try_deserialize(&mut &data[..])?
        };
        require_keys_eq!(
            token_account.mint,
            custody.asset_mint,
            VaultError::InvalidMint
        );
        require_keys_eq!(
            token_account.owner,
            custody.vault_authority.key(),
            VaultError::InvalidOwner
        );
        require_keys_neq!(
            account.key(),
            custody.vault_token_account.key(),
            VaultError::InvalidPositionAccounts
        );

        Ok(Self {
            account: account.clone(),
            custody: custody.clone(),
        })
    }
}

impl<'info> Position for TokenPosition<'info> {
    fn id(&self) -> Pubkey {
        self.account.key()
    }

    fn value(&self) -> Result<u64> {
        let data = self.account.try_borrow_data()?;
        let token_account = TokenAccount::try_deserialize(&mut &data[..])?;
        Ok(token_account.amount)
    }

    fn max_deposit(&self) -> Result<i64> {
        Ok(UNBOUNDED_DEPOSIT)
    }

    fn max_withdraw(&self) -> Result<i64> {
        let balance = i64::try_from(self.value()?).map_err(|_| error!(VaultError::MathOverflow))?;
        Ok(-balance)
    }

    fn deposit(&mut self, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Ok(0);
        }
        self.custody
            .transfer(&self.custody.vault_token_account, &self.account, amount)?;
        Ok(amount)
    }

    fn withdraw(&mut self, amount: u64) -> Result<u64> {
        let amount = amount.min(self.value()?);
        if amount == 0 {
            return Ok(0);
        }
        self.custody
            .transfer(&self.account, &self.custody.vault_token_account, amount)?;
        Ok(amount)
    }
}

/// Load the vault's positions from `remaining_accounts`, one per occupied slot in slot order
///
/// Accounts beyond the occupied slots are returned untouched for callers that
/// take an extra position (add, swap).
pub fn load_positions<'a, 'info>(
    vault: &VaultState,
    remaining_accounts: &'a [AccountInfo<'info>],
    custody: &Custody<'info>,
) -> Result<(Vec<TokenPosition<'info>>, &'a [AccountInfo<'info>])> {
    let occupied = vault.position_count();
    require!(
        remaining_accounts.len() >= occupied,
        VaultError::InvalidPositionAccounts
    );

    let (slots, extra) = remaining_accounts.split_at(occupied);
    let positions = vault
        .positions
        .iter()
        .zip(slots)
        .map(|(slot, account)| {
            require_keys_eq!(account.key(), slot.id, VaultError::InvalidPositionAccounts);
            TokenPosition::load(account, custody)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((positions, extra))
}
