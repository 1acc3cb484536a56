pub mod activate_strategy;
pub mod add_position;
pub mod claim_fees;
pub mod deposit;
pub mod guard_registry;
pub mod initialize;
pub mod initialize_governance;
pub mod pool_registry;
pub mod propose_new_governance;
pub mod rebalance;
pub mod redeem;
pub mod remove_position;
pub mod set_governance;
pub mod set_strategy;
pub mod submit_strategy;
pub mod swap_position;
pub mod vote_strategy;
pub mod withdraw;
pub mod withdraw_strategy;

pub use activate_strategy::*;
pub use add_position::*;
pub use claim_fees::*;
pub use deposit::*;
pub use guard_registry::*;
pub use initialize::*;
pub use initialize_governance::*;
pub use pool_registry::*;
pub use propose_new_governance::*;
pub use rebalance::*;
pub use set_governance::*;
pub use set_strategy::*;
pub use submit_strategy::*;
pub use vote_strategy::*;
pub use withdraw::*;
pub use withdraw_strategy::*;
