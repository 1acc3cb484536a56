// Constants for the Adapter Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for the vault authority PDA (owns the buffer and every position account)
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Seed for the per-pool strategy book PDA
pub const STRATEGY_SEED: &[u8] = b"strategy";

/// Seed for governance migration ballots
pub const BALLOT_SEED: &[u8] = b"ballot";

/// Maximum number of positions a single vault can spread funds across.
/// Also bounds the number of move transactions per rebalance.
pub const MAX_POSITIONS: usize = 5;

/// Maximum number of guards on a governance committee
pub const MAX_GUARDS: usize = 5;

/// Maximum number of pools a governance account can manage
pub const MAX_POOLS: usize = 3;

/// Deposit cap meaning "no limit this round"
pub const UNBOUNDED_DEPOSIT: i64 = i64::MAX;

/// Withdraw cap meaning "no limit this round"
pub const UNBOUNDED_WITHDRAW: i64 = i64::MIN;

/// Reserved max_deposit value marking a neutral absorber position
pub const NEUTRAL_MAX_DEPOSIT: i64 = i64::MAX - 42;

/// Basis point denominator for fee rates
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default share of returns owed to the vault owner (10%)
pub const DEFAULT_YIELD_FEE_BPS: u16 = 1_000;

/// Default share of returns owed to the strategy proposer (1%)
pub const DEFAULT_PROPOSER_FEE_BPS: u16 = 100;

/// Default delay between strategy submission and unconditional activation (6 hours)
pub const DEFAULT_TIME_DELAY: i64 = 21_600;
