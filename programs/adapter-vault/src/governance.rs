use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::VaultError,
    state::{validate_weights, Governance, GovernanceBallot, Strategy, StrategyBook, StrategyWeight},
};

/// Where a pool's strategy book stands
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyStatus {
    /// Nothing ever submitted
    Idle,
    /// Awaiting votes or the time delay
    Pending,
    /// Voted down, a new proposal may replace it
    Rejected,
    /// Pulled by its proposer
    Withdrawn,
    /// Latest proposal is the active strategy
    Activated,
}

/// Direction of a guard's vote
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
    Endorse,
    Reject,
}

/// Strategy content as submitted by a proposer
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyProposal {
    pub weights: [StrategyWeight; MAX_POSITIONS],
    pub min_proposer_payout: u64,
    pub current_yield: u64,
    pub predicted_yield: u64,
}

impl Governance {
    pub fn is_guard(&self, key: &Pubkey) -> bool {
        self.guards.contains(key)
    }

    pub fn is_pool(&self, key: &Pubkey) -> bool {
        self.pools.contains(key)
    }

    /// Endorsements activating a proposal without waiting for the delay
    pub fn quorum(&self) -> usize {
        self.guards.len().div_ceil(2).max(1)
    }

    pub fn add_guard(&mut self, guard: Pubkey) -> Result<()> {
        require!(guard != Pubkey::default(), VaultError::InvalidIdentity);
        require!(!self.is_guard(&guard), VaultError::DuplicateGuard);
        require!(self.guards.len() < MAX_GUARDS, VaultError::GuardListFull);
        self.guards.push(guard);
        Ok(())
    }

    pub fn remove_guard(&mut self, guard: &Pubkey) -> Result<()> {
        let idx = self
            .guards
            .iter()
            .position(|g| g == guard)
            .ok_or(VaultError::GuardNotFound)?;
        self.guards.remove(idx);
        Ok(())
    }

    pub fn swap_guard(&mut self, old: &Pubkey, new: Pubkey) -> Result<()> {
        require!(new != Pubkey::default(), VaultError::InvalidIdentity);
        require!(!self.is_guard(&new), VaultError::DuplicateGuard);
        let slot = self
            .guards
            .iter_mut()
            .find(|g| *g == old)
            .ok_or(VaultError::GuardNotFound)?;
        *slot = new;
        Ok(())
    }

    pub fn add_pool(&mut self, pool: Pubkey) -> Result<()> {
        require!(pool != Pubkey::default(), VaultError::InvalidIdentity);
        require!(!self.is_pool(&pool), VaultError::DuplicatePool);
        require!(self.pools.len() < MAX_POOLS, VaultError::PoolListFull);
        self.pools.push(pool);
        Ok(())
    }

    pub fn remove_pool(&mut self, pool: &Pubkey) -> Result<()> {
        let idx = self
            .pools
            .iter()
            .position(|p| p == pool)
            .ok_or(VaultError::PoolNotFound)?;
        self.pools.remove(idx);
        Ok(())
    }

    pub fn swap_pool(&mut self, old: &Pubkey, new: Pubkey) -> Result<()> {
        require!(new != Pubkey::default(), VaultError::InvalidIdentity);
        require!(!self.is_pool(&new), VaultError::DuplicatePool);
        let slot = self
            .pools
            .iter_mut()
            .find(|p| *p == old)
            .ok_or(VaultError::PoolNotFound)?;
        *slot = new;
        Ok(())
    }
}

impl Strategy {
    fn delay_elapsed(&self, now: i64, time_delay: i64) -> bool {
        now >= self.submitted_at.saturating_add(time_delay)
    }

    fn has_voted(&self, guard: &Pubkey) -> bool {
        self.endorsements.contains(guard) || self.rejections.contains(guard)
    }

    /// An endorsement quorum outranks any rejection count
    fn is_rejected(&self, now: i64, governance: &Governance) -> bool {
        if self.endorsements.len() >= governance.quorum() {
            return false;
        }
        self.rejections.len() >= governance.quorum()
            || (self.delay_elapsed(now, governance.time_delay)
                && self.rejections.len() > self.endorsements.len())
    }

    fn can_activate(&self, now: i64, governance: &Governance) -> bool {
        let endorsed = self.endorsements.len();
        (self.delay_elapsed(now, governance.time_delay) && endorsed >= self.rejections.len())
            || endorsed >= governance.quorum()
    }
}

impl StrategyBook {
    pub fn status(&self, now: i64, governance: &Governance) -> StrategyStatus {
        match &self.pending {
            None if self.nonce == 0 => StrategyStatus::Idle,
            None => StrategyStatus::Activated,
            Some(strategy) if strategy.withdrawn => StrategyStatus::Withdrawn,
            Some(strategy) if strategy.is_rejected(now, governance) => StrategyStatus::Rejected,
            Some(_) => StrategyStatus::Pending,
        }
    }

    /// The live pending proposal matching `nonce`
    fn pending_mut(&mut self, nonce: u64, now: i64, governance: &Governance) -> Result<&mut Strategy> {
        require!(
            self.status(now, governance) == StrategyStatus::Pending,
            VaultError::NoPendingProposal
        );
        let strategy = self.pending.as_mut().ok_or(VaultError::NoPendingProposal)?;
        require!(strategy.nonce == nonce, VaultError::NonceMismatch);
        Ok(strategy)
    }

    /// Record a new pending proposal and return its nonce
    pub fn submit(
        &mut self,
        governance: &Governance,
        proposer: Pubkey,
        proposal: &StrategyProposal,
        now: i64,
    ) -> Result<u64> {
        require!(governance.is_pool(&self.pool), VaultError::PoolNotFound);
        require!(!governance.guards.is_empty(), VaultError::NoGuards);
        require!(
            self.status(now, governance) != StrategyStatus::Pending,
            VaultError::ProposalPending
        );
        require!(
            proposal.predicted_yield > self.active.predicted_yield
                && proposal.predicted_yield > proposal.current_yield,
            VaultError::NoImprovement
        );
        validate_weights(&proposal.weights)?;

        self.nonce = self.nonce.checked_add(1).ok_or(VaultError::MathOverflow)?;
        self.pending = Some(Strategy {
            nonce: self.nonce,
            proposer,
            weights: proposal.weights,
            min_proposer_payout: proposal.min_proposer_payout,
            current_yield: proposal.current_yield,
            predicted_yield: proposal.predicted_yield,
            submitted_at: now,
            activated_at: 0,
            endorsements: Vec::new(),
            rejections: Vec::new(),
            withdrawn: false,
        });

        Ok(self.nonce)
    }

    pub fn vote(
        &mut self,
        governance: &Governance,
        guard: Pubkey,
        nonce: u64,
        vote: Vote,
        now: i64,
    ) -> Result<()> {
        require!(governance.is_guard(&guard), VaultError::Unauthorized);
        let strategy = self.pending_mut(nonce, now, governance)?;
        require!(!strategy.has_voted(&guard), VaultError::AlreadyVoted);

        match vote {
            Vote::Endorse => strategy.endorsements.push(guard),
            Vote::Reject => strategy.rejections.push(guard),
        }
        Ok(())
    }

    /// Move the pending proposal into the active slot and return it
    pub fn activate(&mut self, governance: &Governance, nonce: u64, now: i64) -> Result<Strategy> {
        let strategy = self.pending_mut(nonce, now, governance)?;
        require!(
            strategy.can_activate(now, governance),
            VaultError::ActivationNotReady
        );
        strategy.activated_at = now;

        let activated = strategy.clone();
        self.active = activated.clone();
        self.pending = None;
        Ok(activated)
    }

    pub fn withdraw(&mut self, governance: &Governance, caller: &Pubkey, nonce: u64, now: i64) -> Result<()> {
        let strategy = self.pending_mut(nonce, now, governance)?;
        require_keys_eq!(*caller, strategy.proposer, VaultError::Unauthorized);
        strategy.withdrawn = true;
        Ok(())
    }
}

impl GovernanceBallot {
    /// Count a guard's vote, returning true once a majority of current guards agree
    ///
    /// A guard voting again changes nothing.
    pub fn cast(&mut self, governance: &Governance, guard: Pubkey) -> Result<bool> {
        require!(governance.is_guard(&guard), VaultError::Unauthorized);
        // Votes from guards since removed are dropped to make room
        self.voters.retain(|voter| governance.is_guard(voter));
        if !self.voters.contains(&guard) {
            self.voters.push(guard);
        }

        Ok(self.voters.len() > governance.guards.len() / 2)
    }

    /// Forget every vote once the ballot has carried
    pub fn reset(&mut self) {
        self.voters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    fn governance(guard_count: usize) -> (Governance, Pubkey) {
        let pool = Pubkey::new_unique();
        let gov = Governance {
            owner: Pubkey::new_unique(),
            guards: (0..guard_count).map(|_| Pubkey::new_unique()).collect(),
            pools: vec![pool],
            time_delay: DEFAULT_TIME_DELAY,
        };
        (gov, pool)
    }

    fn book(pool: Pubkey) -> StrategyBook {
        StrategyBook {
            governance: Pubkey::new_unique(),
            pool,
            nonce: 0,
            pending: None,
            active: Strategy::default(),
            bump: 0,
        }
    }

    fn proposal(predicted_yield: u64) -> StrategyProposal {
        let mut weights = [StrategyWeight::default(); MAX_POSITIONS];
        weights[0] = StrategyWeight { position: Pubkey::new_unique(), weight: 1 };
        StrategyProposal {
            weights,
            min_proposer_payout: 0,
            current_yield: 100,
            predicted_yield,
        }
    }

    #[test]
    fn test_quorum() {
        assert_eq!(governance(0).0.quorum(), 1);
        assert_eq!(governance(1).0.quorum(), 1);
        assert_eq!(governance(3).0.quorum(), 2);
        assert_eq!(governance(4).0.quorum(), 2);
        assert_eq!(governance(5).0.quorum(), 3);
    }

    #[test]
    fn test_submit_requires_guards_and_pool() {
        let (mut gov, pool) = governance(0);
        let mut book = book(pool);
        assert_eq!(
            book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap_err(),
            VaultError::NoGuards.into()
        );

        gov.guards.push(Pubkey::new_unique());
        gov.pools.clear();
        assert_eq!(
            book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap_err(),
            VaultError::PoolNotFound.into()
        );
    }

    #[test]
    fn test_submit_requires_improvement() {
        let (gov, pool) = governance(1);
        let mut book = book(pool);

        assert_eq!(
            book.submit(&gov, Pubkey::new_unique(), &proposal(100), 0).unwrap_err(),
            VaultError::NoImprovement.into()
        );

        book.active.predicted_yield = 300;
        assert_eq!(
            book.submit(&gov, Pubkey::new_unique(), &proposal(250), 0).unwrap_err(),
            VaultError::NoImprovement.into()
        );
        assert_eq!(book.submit(&gov, Pubkey::new_unique(), &proposal(301), 0).unwrap(), 1);
    }

    #[test]
    fn test_single_pending_proposal() {
        let (gov, pool) = governance(1);
        let mut book = book(pool);
        book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        assert_eq!(book.status(0, &gov), StrategyStatus::Pending);
        assert_eq!(
            book.submit(&gov, Pubkey::new_unique(), &proposal(300), 10).unwrap_err(),
            VaultError::ProposalPending.into()
        );
    }

    #[test]
    fn test_single_guard_endorsement_activates_immediately() {
        let (gov, pool) = governance(1);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        assert_eq!(
            book.activate(&gov, nonce, 1).unwrap_err(),
            VaultError::ActivationNotReady.into()
        );
        book.vote(&gov, gov.guards[0], nonce, Vote::Endorse, 1).unwrap();
        let active = book.activate(&gov, nonce, 2).unwrap();

        assert_eq!(active.nonce, 1);
        assert_eq!(active.activated_at, 2);
        assert_eq!(book.active, active);
        assert!(book.pending.is_none());
        assert_eq!(book.status(2, &gov), StrategyStatus::Activated);
    }

    #[test]
    fn test_three_guards_need_two_endorsements() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        book.vote(&gov, gov.guards[0], nonce, Vote::Endorse, 1).unwrap();
        assert_eq!(
            book.activate(&gov, nonce, 1).unwrap_err(),
            VaultError::ActivationNotReady.into()
        );
        book.vote(&gov, gov.guards[1], nonce, Vote::Endorse, 2).unwrap();
        book.activate(&gov, nonce, 2).unwrap();
    }

    #[test]
    fn test_delay_without_votes_activates() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        assert_eq!(
            book.activate(&gov, nonce, DEFAULT_TIME_DELAY - 1).unwrap_err(),
            VaultError::ActivationNotReady.into()
        );
        book.activate(&gov, nonce, DEFAULT_TIME_DELAY).unwrap();
    }

    #[test]
    fn test_delay_with_majority_endorsing_activates() {
        let (gov, pool) = governance(5);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        book.vote(&gov, gov.guards[0], nonce, Vote::Endorse, 1).unwrap();
        book.vote(&gov, gov.guards[1], nonce, Vote::Endorse, 1).unwrap();
        book.vote(&gov, gov.guards[2], nonce, Vote::Reject, 1).unwrap();
        assert_eq!(
            book.activate(&gov, nonce, 1).unwrap_err(),
            VaultError::ActivationNotReady.into()
        );
        book.activate(&gov, nonce, DAY).unwrap();
    }

    #[test]
    fn test_rejected_after_delay_allows_resubmission() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();
        book.vote(&gov, gov.guards[0], nonce, Vote::Reject, 1).unwrap();

        assert_eq!(book.status(DAY, &gov), StrategyStatus::Rejected);
        assert_eq!(
            book.activate(&gov, nonce, DAY).unwrap_err(),
            VaultError::NoPendingProposal.into()
        );
        assert_eq!(book.submit(&gov, Pubkey::new_unique(), &proposal(200), DAY).unwrap(), 2);
        assert_eq!(book.status(DAY, &gov), StrategyStatus::Pending);
    }

    #[test]
    fn test_quorum_of_rejections_rejects_immediately() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();
        book.vote(&gov, gov.guards[0], nonce, Vote::Reject, 1).unwrap();
        assert_eq!(book.status(1, &gov), StrategyStatus::Pending);

        book.vote(&gov, gov.guards[1], nonce, Vote::Reject, 1).unwrap();
        assert_eq!(book.status(1, &gov), StrategyStatus::Rejected);
        assert_eq!(
            book.vote(&gov, gov.guards[2], nonce, Vote::Endorse, 1).unwrap_err(),
            VaultError::NoPendingProposal.into()
        );
    }

    #[test]
    fn test_one_vote_per_guard() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();
        let guard = gov.guards[0];

        book.vote(&gov, guard, nonce, Vote::Endorse, 1).unwrap();
        assert_eq!(
            book.vote(&gov, guard, nonce, Vote::Endorse, 1).unwrap_err(),
            VaultError::AlreadyVoted.into()
        );
        assert_eq!(
            book.vote(&gov, guard, nonce, Vote::Reject, 1).unwrap_err(),
            VaultError::AlreadyVoted.into()
        );
    }

    #[test]
    fn test_vote_checks_guard_and_nonce() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        assert_eq!(
            book.vote(&gov, Pubkey::new_unique(), nonce, Vote::Endorse, 1).unwrap_err(),
            VaultError::Unauthorized.into()
        );
        assert_eq!(
            book.vote(&gov, gov.guards[0], nonce + 1, Vote::Endorse, 1).unwrap_err(),
            VaultError::NonceMismatch.into()
        );
    }

    #[test]
    fn test_withdraw_only_by_proposer() {
        let (gov, pool) = governance(3);
        let mut book = book(pool);
        let proposer = Pubkey::new_unique();
        let nonce = book.submit(&gov, proposer, &proposal(200), 0).unwrap();

        assert_eq!(
            book.withdraw(&gov, &Pubkey::new_unique(), nonce, 1).unwrap_err(),
            VaultError::Unauthorized.into()
        );
        book.withdraw(&gov, &proposer, nonce, 1).unwrap();
        assert_eq!(book.status(1, &gov), StrategyStatus::Withdrawn);
        assert_eq!(
            book.withdraw(&gov, &proposer, nonce, 2).unwrap_err(),
            VaultError::NoPendingProposal.into()
        );
        assert_eq!(
            book.activate(&gov, nonce, DAY).unwrap_err(),
            VaultError::NoPendingProposal.into()
        );
    }

    #[test]
    fn test_guard_registry() {
        let (mut gov, _) = governance(0);
        let first = Pubkey::new_unique();

        gov.add_guard(first).unwrap();
        assert_eq!(gov.add_guard(first).unwrap_err(), VaultError::DuplicateGuard.into());
        assert_eq!(
            gov.add_guard(Pubkey::default()).unwrap_err(),
            VaultError::InvalidIdentity.into()
        );
        for _ in 1..MAX_GUARDS {
            gov.add_guard(Pubkey::new_unique()).unwrap();
        }
        assert_eq!(
            gov.add_guard(Pubkey::new_unique()).unwrap_err(),
            VaultError::GuardListFull.into()
        );

        let replacement = Pubkey::new_unique();
        gov.swap_guard(&first, replacement).unwrap();
        assert_eq!(gov.guards[0], replacement);
        assert_eq!(
            gov.swap_guard(&first, Pubkey::new_unique()).unwrap_err(),
            VaultError::GuardNotFound.into()
        );

        gov.remove_guard(&replacement).unwrap();
        assert_eq!(gov.guards.len(), MAX_GUARDS - 1);
        assert_eq!(
            gov.remove_guard(&replacement).unwrap_err(),
            VaultError::GuardNotFound.into()
        );
    }

    #[test]
    fn test_pool_registry_capacity() {
        let (mut gov, pool) = governance(1);
        assert_eq!(gov.add_pool(pool).unwrap_err(), VaultError::DuplicatePool.into());
        gov.add_pool(Pubkey::new_unique()).unwrap();
        gov.add_pool(Pubkey::new_unique()).unwrap();
        assert_eq!(
            gov.add_pool(Pubkey::new_unique()).unwrap_err(),
            VaultError::PoolListFull.into()
        );

        let moved = Pubkey::new_unique();
        gov.swap_pool(&pool, moved).unwrap();
        assert!(gov.is_pool(&moved));
        gov.remove_pool(&moved).unwrap();
        assert_eq!(gov.remove_pool(&moved).unwrap_err(), VaultError::PoolNotFound.into());
    }

    #[test]
    fn test_migration_needs_majority() {
        let (gov, pool) = governance(3);
        let mut ballot = GovernanceBallot {
            governance: Pubkey::new_unique(),
            pool,
            new_governance: Pubkey::new_unique(),
            voters: Vec::new(),
            bump: 0,
        };

        assert!(!ballot.cast(&gov, gov.guards[0]).unwrap());
        // A repeat vote is counted once
        assert!(!ballot.cast(&gov, gov.guards[0]).unwrap());
        assert_eq!(ballot.voters.len(), 1);
        assert!(ballot.cast(&gov, gov.guards[1]).unwrap());
        assert!(ballot.cast(&gov, gov.guards[1]).unwrap());
        assert_eq!(ballot.voters.len(), 2);
    }

    #[test]
    fn test_migration_ballot_starts_over_after_passing() {
        let (gov, pool) = governance(3);
        let mut ballot = GovernanceBallot {
            governance: Pubkey::new_unique(),
            pool,
            new_governance: Pubkey::new_unique(),
            voters: Vec::new(),
            bump: 0,
        };
        ballot.cast(&gov, gov.guards[0]).unwrap();
        assert!(ballot.cast(&gov, gov.guards[1]).unwrap());

        ballot.reset();
        assert!(ballot.voters.is_empty());
        assert!(!ballot.cast(&gov, gov.guards[2]).unwrap());
    }

    #[test]
    fn test_endorsement_quorum_beats_rejection_quorum() {
        let (gov, pool) = governance(4);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        book.vote(&gov, gov.guards[0], nonce, Vote::Endorse, 1).unwrap();
        book.vote(&gov, gov.guards[1], nonce, Vote::Endorse, 1).unwrap();
        book.vote(&gov, gov.guards[2], nonce, Vote::Reject, 1).unwrap();
        book.vote(&gov, gov.guards[3], nonce, Vote::Reject, 1).unwrap();

        assert_eq!(book.status(1, &gov), StrategyStatus::Pending);
        book.activate(&gov, nonce, 1).unwrap();
        assert_eq!(book.status(1, &gov), StrategyStatus::Activated);
    }

    #[test]
    fn test_two_guards_split_vote_activates() {
        let (gov, pool) = governance(2);
        let mut book = book(pool);
        let nonce = book.submit(&gov, Pubkey::new_unique(), &proposal(200), 0).unwrap();

        book.vote(&gov, gov.guards[0], nonce, Vote::Endorse, 1).unwrap();
        book.vote(&gov, gov.guards[1], nonce, Vote::Reject, 1).unwrap();

        book.activate(&gov, nonce, 1).unwrap();
    }

    #[test]
    fn test_migration_single_guard_switches_at_once() {
        let (gov, pool) = governance(1);
        let mut ballot = GovernanceBallot {
            governance: Pubkey::new_unique(),
            pool,
            new_governance: Pubkey::new_unique(),
            voters: Vec::new(),
            bump: 0,
        };
        assert!(ballot.cast(&gov, gov.guards[0]).unwrap());
    }
}
