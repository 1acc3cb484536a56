use anchor_lang::prelude::*;

/// Custom error codes for the Adapter Vault program
#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero")]
    DivisionByZero,

    #[msg("Invalid token mint - does not match vault asset")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Unauthorized - caller does not hold the required role")]
    Unauthorized,

    #[msg("Fee rate must be at most 10000 bps in total")]
    InvalidFeeRate,

    #[msg("Position list is full - maximum positions reached")]
    TooManyPositions,

    #[msg("Position already present in the vault")]
    DuplicatePosition,

    #[msg("Position not found in the vault")]
    PositionNotFound,

    #[msg("Position id must not be empty")]
    EmptyPositionId,

    #[msg("Position still holds a balance after draining")]
    PositionNotEmpty,

    #[msg("Position accounts do not match the vault's position slots")]
    InvalidPositionAccounts,

    #[msg("Share count moved beyond caller tolerance")]
    SlippageExceeded,

    #[msg("Owner holds fewer shares than required")]
    InsufficientShares,

    #[msg("Vault buffer cannot cover the requested amount")]
    InsufficientBalance,

    #[msg("Identity must not be empty or the current value")]
    InvalidIdentity,

    #[msg("Guard list is full - maximum guards reached")]
    GuardListFull,

    #[msg("Guard already registered")]
    DuplicateGuard,

    #[msg("Guard not found")]
    GuardNotFound,

    #[msg("Pool list is full - maximum pools reached")]
    PoolListFull,

    #[msg("Pool already registered")]
    DuplicatePool,

    #[msg("Pool not registered with this governance")]
    PoolNotFound,

    #[msg("Governance has no guards")]
    NoGuards,

    #[msg("A strategy proposal is already pending for this pool")]
    ProposalPending,

    #[msg("No strategy proposal is pending for this pool")]
    NoPendingProposal,

    #[msg("Nonce does not match the pending proposal")]
    NonceMismatch,

    #[msg("Guard has already voted on this proposal")]
    AlreadyVoted,

    #[msg("Activation preconditions not met")]
    ActivationNotReady,

    #[msg("Predicted yield does not improve on the active strategy")]
    NoImprovement,

    #[msg("Weight table must not list a position twice")]
    InvalidWeightTable,

    #[msg("Previous proposer's token account is required to settle fees")]
    MissingFeeRecipient,

    #[msg("Time delay must not be negative")]
    InvalidTimeDelay,
}
