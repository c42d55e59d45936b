//! Historical voting power.
//!
//! Each account's voting weight is recorded as an append-only sequence of
//! checkpoints ordered by block number, so that the weight at any past block
//! can be looked up by binary search. Tokens only count once their holder
//! has delegated them; an undelegated balance carries no weight.

use std::collections::HashMap;

use augur_types::Address;

use crate::error::GovernanceError;

/// Voting weight of an account from `from_block` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub from_block: u64,
    pub votes: u128,
}

/// A delegate's weight moved from `previous` to `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotesChange {
    pub delegate: Address,
    pub previous: u128,
    pub current: u128,
}

/// Delegation table and per-delegate checkpoint history.
#[derive(Debug, Clone, Default)]
pub struct VotingPowerLedger {
    /// delegator -> delegatee
    delegates: HashMap<Address, Address>,
    /// delegatee -> checkpoints, strictly increasing `from_block`
    checkpoints: HashMap<Address, Vec<Checkpoint>>,
}

impl VotingPowerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delegatee of `delegator`, if any.
    pub fn delegate_of(&self, delegator: &Address) -> Option<Address> {
        self.delegates.get(delegator).copied()
    }

    /// Point `delegator`'s weight (`balance`) at `delegatee`.
    ///
    /// Delegating to [`Address::ZERO`] withdraws the weight. Re-delegating to
    /// the current delegatee writes nothing. Returns the previous delegatee
    /// and the weight changes applied.
    pub fn delegate(
        &mut self,
        delegator: Address,
        delegatee: Address,
        balance: u128,
        block: u64,
    ) -> Result<(Option<Address>, Vec<VotesChange>), GovernanceError> {
        let previous = self.delegate_of(&delegator);
        let next = delegatee.non_zero();
        if previous == next {
            return Ok((previous, Vec::new()));
        }

        let changes = self.move_voting_power(previous, next, balance, block)?;
        match next {
            Some(to) => self.delegates.insert(delegator, to),
            None => self.delegates.remove(&delegator),
        };
        Ok((previous, changes))
    }

    /// Run the balance-change hook for a transfer, mint (`from` is `None`)
    /// or burn (`to` is `None`) of `amount`.
    pub fn on_balance_change(
        &mut self,
        from: Option<Address>,
        to: Option<Address>,
        amount: u128,
        block: u64,
    ) -> Result<Vec<VotesChange>, GovernanceError> {
        let src = from.and_then(|a| self.delegate_of(&a));
        let dst = to.and_then(|a| self.delegate_of(&a));
        self.move_voting_power(src, dst, amount, block)
    }

    fn move_voting_power(
        &mut self,
        src: Option<Address>,
        dst: Option<Address>,
        amount: u128,
        block: u64,
    ) -> Result<Vec<VotesChange>, GovernanceError> {
        if src == dst || amount == 0 {
            return Ok(Vec::new());
        }

        // Compute both sides before writing so a failure leaves no trace.
        let debit = match src {
            Some(delegate) => {
                let previous = self.current_votes(&delegate);
                let current = previous
                    .checked_sub(amount)
                    .ok_or_else(|| GovernanceError::overflow("vote amount underflows"))?;
                Some(VotesChange {
                    delegate,
                    previous,
                    current,
                })
            }
            None => None,
        };
        let credit = match dst {
            Some(delegate) => {
                let previous = self.current_votes(&delegate);
                let current = previous
                    .checked_add(amount)
                    .ok_or_else(|| GovernanceError::overflow("vote amount overflows"))?;
                Some(VotesChange {
                    delegate,
                    previous,
                    current,
                })
            }
            None => None,
        };

        let changes: Vec<VotesChange> = debit.into_iter().chain(credit).collect();
        for change in &changes {
            self.write_checkpoint(change.delegate, change.current, block);
        }
        Ok(changes)
    }

    fn write_checkpoint(&mut self, delegate: Address, votes: u128, block: u64) {
        let history = self.checkpoints.entry(delegate).or_default();
        match history.last_mut() {
            Some(last) if last.from_block == block => last.votes = votes,
            _ => history.push(Checkpoint {
                from_block: block,
                votes,
            }),
        }
        tracing::debug!("Checkpoint for {} at block {}: {} votes", delegate, block, votes);
    }

    /// Latest recorded weight of `account`.
    pub fn current_votes(&self, account: &Address) -> u128 {
        self.checkpoints
            .get(account)
            .and_then(|history| history.last())
            .map_or(0, |cp| cp.votes)
    }

    /// Weight of `account` as of the end of `block`.
    ///
    /// `block` must be strictly before `current_block`; the weight of the
    /// block in progress is not yet final.
    pub fn prior_votes(
        &self,
        account: &Address,
        block: u64,
        current_block: u64,
    ) -> Result<u128, GovernanceError> {
        if block >= current_block {
            return Err(GovernanceError::InvalidBlock {
                requested: block,
                current: current_block,
            });
        }

        let Some(history) = self.checkpoints.get(account) else {
            return Ok(0);
        };
        let upper = history.partition_point(|cp| cp.from_block <= block);
        Ok(upper.checked_sub(1).map_or(0, |i| history[i].votes))
    }

    /// Full checkpoint history of `account`.
    pub fn checkpoints(&self, account: &Address) -> &[Checkpoint] {
        self.checkpoints
            .get(account)
            .map_or(&[][..], |history| history.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_undelegated_balance_has_no_weight() {
        let mut ledger = VotingPowerLedger::new();
        let changes = ledger.on_balance_change(None, Some(addr(1)), 500, 10).unwrap();
        assert!(changes.is_empty());
        assert_eq!(ledger.current_votes(&addr(1)), 0);
    }

    #[test]
    fn test_self_delegation_and_prior_votes() {
        let mut ledger = VotingPowerLedger::new();
        let (previous, changes) = ledger.delegate(addr(1), addr(1), 100, 10).unwrap();
        assert_eq!(previous, None);
        assert_eq!(changes.len(), 1);

        ledger.on_balance_change(None, Some(addr(1)), 50, 20).unwrap();

        assert_eq!(ledger.prior_votes(&addr(1), 9, 30).unwrap(), 0);
        assert_eq!(ledger.prior_votes(&addr(1), 10, 30).unwrap(), 100);
        assert_eq!(ledger.prior_votes(&addr(1), 19, 30).unwrap(), 100);
        assert_eq!(ledger.prior_votes(&addr(1), 20, 30).unwrap(), 150);
        assert_eq!(ledger.prior_votes(&addr(1), 29, 30).unwrap(), 150);
    }

    #[test]
    fn test_prior_votes_requires_past_block() {
        let ledger = VotingPowerLedger::new();
        assert!(matches!(
            ledger.prior_votes(&addr(1), 30, 30),
            Err(GovernanceError::InvalidBlock { requested: 30, current: 30 })
        ));
        assert_eq!(ledger.prior_votes(&addr(1), 0, 30).unwrap(), 0);
    }

    #[test]
    fn test_same_block_writes_coalesce() {
        let mut ledger = VotingPowerLedger::new();
        ledger.delegate(addr(1), addr(1), 100, 10).unwrap();
        ledger.on_balance_change(None, Some(addr(1)), 5, 10).unwrap();
        ledger.on_balance_change(Some(addr(1)), None, 20, 10).unwrap();

        assert_eq!(
            ledger.checkpoints(&addr(1)),
            &[Checkpoint { from_block: 10, votes: 85 }]
        );
    }

    #[test]
    fn test_redelegate_to_current_is_noop() {
        let mut ledger = VotingPowerLedger::new();
        ledger.delegate(addr(1), addr(2), 100, 10).unwrap();
        let (previous, changes) = ledger.delegate(addr(1), addr(2), 100, 11).unwrap();

        assert_eq!(previous, Some(addr(2)));
        assert!(changes.is_empty());
        assert_eq!(ledger.checkpoints(&addr(2)).len(), 1);
    }

    #[test]
    fn test_redelegate_moves_weight() {
        let mut ledger = VotingPowerLedger::new();
        ledger.delegate(addr(1), addr(2), 100, 10).unwrap();
        ledger.delegate(addr(1), addr(3), 100, 12).unwrap();

        assert_eq!(ledger.current_votes(&addr(2)), 0);
        assert_eq!(ledger.current_votes(&addr(3)), 100);
        assert_eq!(ledger.prior_votes(&addr(2), 11, 13).unwrap(), 100);

        // Undelegate
        ledger.delegate(addr(1), Address::ZERO, 100, 14).unwrap();
        assert_eq!(ledger.current_votes(&addr(3)), 0);
        assert_eq!(ledger.delegate_of(&addr(1)), None);
    }

    #[test]
    fn test_transfer_between_delegated_holders() {
        let mut ledger = VotingPowerLedger::new();
        ledger.delegate(addr(1), addr(1), 100, 1).unwrap();
        ledger.delegate(addr(2), addr(9), 0, 1).unwrap();

        let changes = ledger
            .on_balance_change(Some(addr(1)), Some(addr(2)), 40, 2)
            .unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(ledger.current_votes(&addr(1)), 60);
        assert_eq!(ledger.current_votes(&addr(9)), 40);
    }

    #[test]
    fn test_overflow_leaves_ledger_untouched() {
        let mut ledger = VotingPowerLedger::new();
        ledger.delegate(addr(1), addr(3), u128::MAX, 1).unwrap();
        ledger.delegate(addr(2), addr(2), 10, 1).unwrap();

        let err = ledger.delegate(addr(2), addr(3), 10, 2).unwrap_err();
        assert!(matches!(err, GovernanceError::Overflow(_)));
        assert_eq!(ledger.current_votes(&addr(2)), 10);
        assert_eq!(ledger.delegate_of(&addr(2)), Some(addr(2)));
    }

    proptest! {
        #[test]
        fn prop_binary_search_matches_linear_scan(
            steps in proptest::collection::vec((0u64..4, 0u128..1_000), 1..40),
            query in 0u64..200,
        ) {
            let mut ledger = VotingPowerLedger::new();
            let holder = addr(1);
            ledger.delegate(holder, holder, 0, 0).unwrap();

            let mut block = 0u64;
            for (gap, amount) in &steps {
                block += gap;
                ledger.on_balance_change(None, Some(holder), *amount, block).unwrap();
            }

            let history = ledger.checkpoints(&holder);
            prop_assert!(history.windows(2).all(|w| w[0].from_block < w[1].from_block));

            let expected = history
                .iter()
                .rev()
                .find(|cp| cp.from_block <= query)
                .map_or(0, |cp| cp.votes);
            let current = block.max(query) + 1;
            prop_assert_eq!(ledger.prior_votes(&holder, query, current).unwrap(), expected);
        }
    }
}
