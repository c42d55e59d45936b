//! Proposal lifecycle management.
//!
//! Only the `canceled` and `executed` flags and the eta are stored; every
//! other state is derived from the clock and the tallies:
//! Pending -> Active -> Succeeded/Defeated, Succeeded -> Queued ->
//! Executed/Expired, and anything before execution -> Canceled.

use std::collections::HashMap;
use std::fmt;

use augur_types::Address;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::GovernanceError;
use crate::timelock::TimelockTransaction;

/// Proposal state in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Created, voting has not started
    Pending,
    /// Voting is open
    Active,
    Canceled,
    /// Voting ended without a quorum or a majority
    Defeated,
    /// Voting ended in favour, not yet queued
    Succeeded,
    /// Waiting in the timelock
    Queued,
    /// Grace period passed without execution
    Expired,
    Executed,
}

impl ProposalState {
    /// Whether the proposal can still be canceled.
    pub fn is_cancelable(&self) -> bool {
        !matches!(self, ProposalState::Canceled | ProposalState::Executed)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalState::Pending => "Pending",
            ProposalState::Active => "Active",
            ProposalState::Canceled => "Canceled",
            ProposalState::Defeated => "Defeated",
            ProposalState::Succeeded => "Succeeded",
            ProposalState::Queued => "Queued",
            ProposalState::Expired => "Expired",
            ProposalState::Executed => "Executed",
        };
        f.write_str(name)
    }
}

/// Vote support options.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VoteSupport {
    #[default]
    Against,
    For,
}

impl From<bool> for VoteSupport {
    fn from(support: bool) -> Self {
        if support {
            VoteSupport::For
        } else {
            VoteSupport::Against
        }
    }
}

/// One call a proposal asks the timelock to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAction {
    pub target: Address,
    /// Native value sent with the call
    #[serde(with = "crate::config::amount")]
    pub value: u128,
    pub signature: String,
    pub calldata: Vec<u8>,
}

impl ProposalAction {
    pub fn new(target: Address, value: u128, signature: impl Into<String>, calldata: Vec<u8>) -> Self {
        Self {
            target,
            value,
            signature: signature.into(),
            calldata,
        }
    }

    pub fn to_transaction(&self, eta: u64) -> TimelockTransaction {
        TimelockTransaction {
            target: self.target,
            value: self.value,
            signature: self.signature.clone(),
            data: self.calldata.clone(),
            eta,
        }
    }
}

/// A proposal as submitted: parallel action arrays and a description.
///
/// Entry `i` of each array describes action `i`; the arrays must have
/// equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalRequest {
    pub targets: Vec<Address>,
    pub values: Vec<u128>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Vec<u8>>,
    pub description: String,
}

impl ProposalRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn from_actions(actions: Vec<ProposalAction>, description: impl Into<String>) -> Self {
        actions
            .into_iter()
            .fold(Self::new(description), |request, a| {
                request.with_action(a.target, a.value, a.signature, a.calldata)
            })
    }

    /// Append one action to every array.
    pub fn with_action(
        mut self,
        target: Address,
        value: u128,
        signature: impl Into<String>,
        calldata: Vec<u8>,
    ) -> Self {
        self.targets.push(target);
        self.values.push(value);
        self.signatures.push(signature.into());
        self.calldatas.push(calldata);
        self
    }

    /// Zip the arrays into actions.
    pub fn into_actions(self) -> Result<(Vec<ProposalAction>, String), GovernanceError> {
        let len = self.targets.len();
        if self.values.len() != len || self.signatures.len() != len || self.calldatas.len() != len {
            return Err(GovernanceError::InvalidProposal(
                "proposal function information arity mismatch".to_string(),
            ));
        }

        let actions = self
            .targets
            .into_iter()
            .zip(self.values)
            .zip(self.signatures)
            .zip(self.calldatas)
            .map(|(((target, value), signature), calldata)| ProposalAction {
                target,
                value,
                signature,
                calldata,
            })
            .collect();
        Ok((actions, self.description))
    }
}

/// A voter's ballot on one proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub has_voted: bool,
    pub support: VoteSupport,
    #[serde(with = "crate::config::amount")]
    pub votes: u128,
}

#[derive(Debug, Clone)]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub actions: Vec<ProposalAction>,
    pub description: String,
    /// Voting opens after this block
    pub start_block: u64,
    /// Voting closes at the end of this block
    pub end_block: u64,
    pub for_votes: u128,
    pub against_votes: u128,
    pub canceled: bool,
    pub executed: bool,
    /// Timestamp from which the queued actions may run; zero until queued
    pub eta: u64,
    receipts: HashMap<Address, Receipt>,
}

impl Proposal {
    pub fn new(
        id: u64,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: String,
        start_block: u64,
        end_block: u64,
    ) -> Self {
        Self {
            id,
            proposer,
            actions,
            description,
            start_block,
            end_block,
            for_votes: 0,
            against_votes: 0,
            canceled: false,
            executed: false,
            eta: 0,
            receipts: HashMap::new(),
        }
    }

    /// Derive the current state.
    pub fn state(&self, clock: &Clock, quorum_votes: u128, grace_period: u64) -> ProposalState {
        if self.canceled {
            ProposalState::Canceled
        } else if clock.block_number <= self.start_block {
            ProposalState::Pending
        } else if clock.block_number <= self.end_block {
            ProposalState::Active
        } else if self.for_votes <= self.against_votes || self.for_votes < quorum_votes {
            ProposalState::Defeated
        } else if self.eta == 0 {
            ProposalState::Succeeded
        } else if self.executed {
            ProposalState::Executed
        } else if clock.timestamp >= self.eta.saturating_add(grace_period) {
            ProposalState::Expired
        } else {
            ProposalState::Queued
        }
    }

    /// Record a ballot of `votes` weight. Tallies are untouched on failure.
    pub fn record_vote(
        &mut self,
        voter: Address,
        support: VoteSupport,
        votes: u128,
    ) -> Result<Receipt, GovernanceError> {
        if self.has_voted(&voter) {
            return Err(GovernanceError::DuplicateVote { id: self.id, voter });
        }

        match support {
            VoteSupport::For => {
                self.for_votes = self
                    .for_votes
                    .checked_add(votes)
                    .ok_or_else(|| GovernanceError::overflow("for votes"))?;
            }
            VoteSupport::Against => {
                self.against_votes = self
                    .against_votes
                    .checked_add(votes)
                    .ok_or_else(|| GovernanceError::overflow("against votes"))?;
            }
        }

        let receipt = Receipt {
            has_voted: true,
            support,
            votes,
        };
        self.receipts.insert(voter, receipt);
        Ok(receipt)
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.receipts.contains_key(voter)
    }

    /// Ballot of `voter`; the default receipt if they have not voted.
    pub fn receipt(&self, voter: &Address) -> Receipt {
        self.receipts.get(voter).copied().unwrap_or_default()
    }

    /// Timelock transactions for the current eta.
    pub fn transactions(&self) -> Vec<TimelockTransaction> {
        self.actions
            .iter()
            .map(|action| action.to_transaction(self.eta))
            .collect()
    }
}

/// Proposal registry of one governor.
#[derive(Debug, Clone, Default)]
pub struct ProposalRegistry {
    proposals: HashMap<u64, Proposal>,
    latest_by_proposer: HashMap<Address, u64>,
    count: u64,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new proposal under the next id. Ids start at 1 and are never reused.
    pub fn create(
        &mut self,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: String,
        start_block: u64,
        end_block: u64,
    ) -> Result<u64, GovernanceError> {
        let id = self
            .count
            .checked_add(1)
            .ok_or_else(|| GovernanceError::overflow("proposal count"))?;

        self.proposals
            .insert(id, Proposal::new(id, proposer, actions, description, start_block, end_block));
        self.latest_by_proposer.insert(proposer, id);
        self.count = id;
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    pub fn get_mut(&mut self, id: u64) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// Most recent proposal of `proposer`.
    pub fn latest_for(&self, proposer: &Address) -> Option<u64> {
        self.latest_by_proposer.get(proposer).copied()
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const QUORUM: u128 = 400;
    const GRACE: u64 = 1_000;

    fn proposal() -> Proposal {
        let action = ProposalAction::new(Address::from_bytes([9u8; 20]), 0, "abdicate()", Vec::new());
        Proposal::new(1, Address::ZERO, vec![action], String::new(), 100, 200)
    }

    fn at(block: u64, timestamp: u64) -> Clock {
        Clock::new(block, timestamp)
    }

    #[test]
    fn test_voting_window() {
        let proposal = proposal();
        assert_eq!(proposal.state(&at(50, 0), QUORUM, GRACE), ProposalState::Pending);
        assert_eq!(proposal.state(&at(100, 0), QUORUM, GRACE), ProposalState::Pending);
        assert_eq!(proposal.state(&at(101, 0), QUORUM, GRACE), ProposalState::Active);
        assert_eq!(proposal.state(&at(200, 0), QUORUM, GRACE), ProposalState::Active);
        assert_eq!(proposal.state(&at(201, 0), QUORUM, GRACE), ProposalState::Defeated);
    }

    #[test]
    fn test_outcome() {
        let mut proposal = proposal();
        proposal.record_vote(Address::from_bytes([1u8; 20]), VoteSupport::For, 500).unwrap();
        proposal.record_vote(Address::from_bytes([2u8; 20]), VoteSupport::Against, 100).unwrap();
        assert_eq!(proposal.state(&at(201, 0), QUORUM, GRACE), ProposalState::Succeeded);

        // Below quorum
        assert_eq!(proposal.state(&at(201, 0), 501, GRACE), ProposalState::Defeated);
    }

    #[test]
    fn test_tie_is_defeated() {
        let mut proposal = proposal();
        proposal.record_vote(Address::from_bytes([1u8; 20]), VoteSupport::For, 500).unwrap();
        proposal.record_vote(Address::from_bytes([2u8; 20]), VoteSupport::Against, 500).unwrap();
        assert_eq!(proposal.state(&at(201, 0), QUORUM, GRACE), ProposalState::Defeated);
    }

    #[test]
    fn test_queued_expired_executed() {
        let mut proposal = proposal();
        proposal.record_vote(Address::from_bytes([1u8; 20]), VoteSupport::For, 500).unwrap();
        proposal.eta = 5_000;

        assert_eq!(proposal.state(&at(300, 4_000), QUORUM, GRACE), ProposalState::Queued);
        assert_eq!(proposal.state(&at(300, 5_999), QUORUM, GRACE), ProposalState::Queued);
        assert_eq!(proposal.state(&at(300, 6_000), QUORUM, GRACE), ProposalState::Expired);

        proposal.executed = true;
        assert_eq!(proposal.state(&at(300, 9_000), QUORUM, GRACE), ProposalState::Executed);
    }

    #[test]
    fn test_canceled_overrides_everything() {
        let mut proposal = proposal();
        proposal.canceled = true;
        assert_eq!(proposal.state(&at(50, 0), QUORUM, GRACE), ProposalState::Canceled);
        assert!(!ProposalState::Canceled.is_cancelable());
        assert!(ProposalState::Queued.is_cancelable());
    }

    #[test]
    fn test_duplicate_vote_leaves_tally() {
        let voter = Address::from_bytes([1u8; 20]);
        let mut proposal = proposal();
        proposal.record_vote(voter, VoteSupport::For, 500).unwrap();

        assert_eq!(
            proposal.record_vote(voter, VoteSupport::Against, 700),
            Err(GovernanceError::DuplicateVote { id: 1, voter })
        );
        assert_eq!(proposal.for_votes, 500);
        assert_eq!(proposal.against_votes, 0);
        assert_eq!(
            proposal.receipt(&voter),
            Receipt {
                has_voted: true,
                support: VoteSupport::For,
                votes: 500
            }
        );
        assert!(!proposal.receipt(&Address::ZERO).has_voted);
    }

    #[test]
    fn test_vote_overflow_rejected() {
        let mut proposal = proposal();
        proposal.record_vote(Address::from_bytes([1u8; 20]), VoteSupport::For, u128::MAX).unwrap();
        let second = Address::from_bytes([2u8; 20]);
        assert!(proposal.record_vote(second, VoteSupport::For, 1).is_err());
        assert!(!proposal.has_voted(&second));
    }

    #[test]
    fn test_registry_ids() {
        let proposer = Address::from_bytes([1u8; 20]);
        let mut registry = ProposalRegistry::new();
        assert!(registry.get(1).is_err());

        let first = registry.create(proposer, Vec::new(), "first".to_string(), 1, 2).unwrap();
        let second = registry.create(proposer, Vec::new(), "second".to_string(), 3, 4).unwrap();
        assert_eq!((first, second), (1, 2));
        assert_eq!(registry.latest_for(&proposer), Some(2));
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.get(2).unwrap().start_block, 3);
        assert_eq!(registry.get(1).unwrap().description, "first");
    }

    #[test]
    fn test_request_zips_parallel_arrays() {
        let target = Address::from_bytes([4u8; 20]);
        let request = ProposalRequest::new("pay out")
            .with_action(target, 0, "abdicate()", Vec::new())
            .with_action(target, 5, "", Vec::new());
        let (actions, description) = request.into_actions().unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].value, 5);
        assert_eq!(actions[0].signature, "abdicate()");
        assert_eq!(description, "pay out");

        let mut mismatch = ProposalRequest::new("short").with_action(target, 0, "", Vec::new());
        mismatch.values.push(1);
        assert!(matches!(mismatch.into_actions(), Err(GovernanceError::InvalidProposal(_))));
    }

    fn rank(state: ProposalState) -> u8 {
        match state {
            ProposalState::Pending => 0,
            ProposalState::Active => 1,
            ProposalState::Defeated | ProposalState::Succeeded => 2,
            ProposalState::Queued => 3,
            ProposalState::Expired | ProposalState::Executed => 4,
            ProposalState::Canceled => 5,
        }
    }

    proptest! {
        #[test]
        fn prop_state_never_moves_backwards(
            for_votes in 0u128..1_000,
            against_votes in 0u128..1_000,
            eta in prop_oneof![Just(0u64), 1u64..10_000],
        ) {
            let mut proposal = proposal();
            proposal.for_votes = for_votes;
            proposal.against_votes = against_votes;
            proposal.eta = eta;

            let mut previous = None;
            for step in 0..400u64 {
                let state = proposal.state(&at(step, step * 30), QUORUM, GRACE);
                if let Some(prev) = previous {
                    prop_assert!(rank(state) >= rank(prev));
                    if state != prev {
                        prop_assert!(!(prev == ProposalState::Defeated && state != ProposalState::Defeated));
                    }
                }
                previous = Some(state);
            }
        }
    }
}
