//! Token-weighted governor.
//!
//! A governor owns its proposals and drives them through the lifecycle.
//! It holds no reference to its voting token or timelock; both are passed
//! in by the host for each operation and checked against the addresses the
//! governor was deployed with.

use std::collections::HashSet;

use augur_types::{Address, Hash};

use crate::calldata;
use crate::clock::Clock;
use crate::config::GovernorConfig;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};
use crate::guardian::GuardianLink;
use crate::proposal::{
    Proposal, ProposalAction, ProposalRegistry, ProposalRequest, ProposalState, Receipt, VoteSupport,
};
use crate::timelock::{Timelock, TimelockTransaction};
use crate::token::VotesSource;

#[derive(Debug, Clone)]
pub struct Governor {
    address: Address,
    name: String,
    config: GovernorConfig,
    timelock: Address,
    /// Copied from the timelock, which cannot change it
    grace_period: u64,
    token: Address,
    guardian: GuardianLink,
    guardian_governance_token: Option<Address>,
    registry: ProposalRegistry,
}

impl Governor {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        config: GovernorConfig,
        timelock: &Timelock,
        token: Address,
        guardian: Address,
        guardian_governance_token: Option<Address>,
    ) -> Result<Self, GovernanceError> {
        config.validate()?;
        Ok(Self {
            address,
            name: name.into(),
            config,
            timelock: timelock.address(),
            grace_period: timelock.grace_period(),
            token,
            guardian: GuardianLink::new(guardian),
            guardian_governance_token,
            registry: ProposalRegistry::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn timelock(&self) -> Address {
        self.timelock
    }

    /// Token whose checkpoints weigh votes.
    pub fn token(&self) -> Address {
        self.token
    }

    pub fn guardian(&self) -> Option<Address> {
        self.guardian.guardian()
    }

    pub fn guardian_governance_token(&self) -> Option<Address> {
        self.guardian_governance_token
    }

    pub fn proposal_count(&self) -> u64 {
        self.registry.count()
    }

    pub fn latest_proposal_id(&self, proposer: &Address) -> Option<u64> {
        self.registry.latest_for(proposer)
    }

    pub fn proposal(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.registry.get(id)
    }

    pub fn get_actions(&self, id: u64) -> Result<&[ProposalAction], GovernanceError> {
        Ok(&self.registry.get(id)?.actions)
    }

    pub fn get_receipt(&self, id: u64, voter: &Address) -> Result<Receipt, GovernanceError> {
        Ok(self.registry.get(id)?.receipt(voter))
    }

    pub fn state(&self, id: u64, clock: &Clock) -> Result<ProposalState, GovernanceError> {
        Ok(self
            .registry
            .get(id)?
            .state(clock, self.config.quorum_votes, self.grace_period))
    }

    fn require_state(
        &self,
        id: u64,
        clock: &Clock,
        expected: ProposalState,
        label: &'static str,
    ) -> Result<(), GovernanceError> {
        let state = self.state(id, clock)?;
        if state != expected {
            return Err(GovernanceError::InvalidState {
                id,
                state,
                expected: label,
            });
        }
        Ok(())
    }

    fn check_timelock(&self, timelock: &Timelock) -> Result<(), GovernanceError> {
        if timelock.address() != self.timelock {
            return Err(GovernanceError::InvalidParameter(format!(
                "{} is not the timelock of {}",
                timelock.address(),
                self.name
            )));
        }
        Ok(())
    }

    pub fn propose(
        &mut self,
        proposer: Address,
        request: ProposalRequest,
        votes: &dyn VotesSource,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<u64, GovernanceError> {
        let proposer_votes = votes.prior_votes(&proposer, clock.previous_block()?, clock.block_number)?;
        if proposer_votes <= self.config.proposal_threshold {
            return Err(GovernanceError::InsufficientVotingPower {
                votes: proposer_votes,
                threshold: self.config.proposal_threshold,
            });
        }
        let (actions, description) = request.into_actions()?;
        if actions.is_empty() {
            return Err(GovernanceError::InvalidProposal("must provide actions".to_string()));
        }
        if actions.len() > self.config.proposal_max_operations {
            return Err(GovernanceError::InvalidProposal(format!(
                "too many actions: {} > {}",
                actions.len(),
                self.config.proposal_max_operations
            )));
        }

        if let Some(latest) = self.registry.latest_for(&proposer) {
            let state = self.state(latest, &clock)?;
            if matches!(state, ProposalState::Pending | ProposalState::Active) {
                return Err(GovernanceError::DuplicateProposal {
                    proposer,
                    existing: latest,
                });
            }
        }

        let start_block = clock
            .block_number
            .checked_add(self.config.voting_delay)
            .ok_or_else(|| GovernanceError::overflow("start block"))?;
        let end_block = start_block
            .checked_add(self.config.voting_period)
            .ok_or_else(|| GovernanceError::overflow("end block"))?;

        let targets = actions.iter().map(|a| a.target).collect();
        let values = actions.iter().map(|a| a.value).collect();
        let signatures = actions.iter().map(|a| a.signature.clone()).collect();
        let calldatas = actions.iter().map(|a| a.calldata.clone()).collect();
        let id = self
            .registry
            .create(proposer, actions, description.clone(), start_block, end_block)?;

        events.emit(
            self.address,
            clock,
            GovernanceEvent::ProposalCreated {
                id,
                proposer,
                targets,
                values,
                signatures,
                calldatas,
                start_block,
                end_block,
                description,
            },
        );
        tracing::info!(
            "{}: proposal {} created by {} (voting after block {} until {})",
            self.name,
            id,
            proposer,
            start_block,
            end_block
        );
        Ok(id)
    }

    /// Vote with the weight the voter held at the proposal's start block.
    pub fn cast_vote(
        &mut self,
        voter: Address,
        id: u64,
        support: VoteSupport,
        votes: &dyn VotesSource,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<Receipt, GovernanceError> {
        self.require_state(id, &clock, ProposalState::Active, "Active")?;

        let proposal = self.registry.get_mut(id)?;
        let weight = votes.prior_votes(&voter, proposal.start_block, clock.block_number)?;
        let receipt = proposal.record_vote(voter, support, weight)?;

        events.emit(
            self.address,
            clock,
            GovernanceEvent::VoteCast {
                voter,
                proposal_id: id,
                support,
                votes: weight,
            },
        );
        tracing::debug!("{}: {} voted {:?} on {} with {}", self.name, voter, support, id, weight);
        Ok(receipt)
    }

    /// Queue every action of a succeeded proposal; returns the eta.
    pub fn queue(
        &mut self,
        id: u64,
        timelock: &mut Timelock,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<u64, GovernanceError> {
        self.check_timelock(timelock)?;
        self.require_state(id, &clock, ProposalState::Succeeded, "Succeeded")?;

        let eta = timelock.earliest_eta(clock)?;
        let transactions: Vec<TimelockTransaction> = self
            .registry
            .get(id)?
            .actions
            .iter()
            .map(|action| action.to_transaction(eta))
            .collect();

        // Identical actions would collide in the timelock
        let mut seen: HashSet<Hash> = HashSet::new();
        for tx in &transactions {
            let tx_hash = tx.hash();
            if timelock.is_queued(&tx_hash) || !seen.insert(tx_hash) {
                return Err(GovernanceError::DuplicateAction(tx_hash));
            }
        }
        for tx in &transactions {
            timelock.queue_transaction(self.address, tx, clock, events)?;
        }

        self.registry.get_mut(id)?.eta = eta;
        events.emit(self.address, clock, GovernanceEvent::ProposalQueued { id, eta });
        tracing::info!("{}: proposal {} queued, eta {}", self.name, id, eta);
        Ok(eta)
    }

    /// Mark a queued proposal executed and hand back its transactions.
    ///
    /// The host runs them through the timelock in order; the whole operation
    /// is rolled back if any of them fails.
    pub fn begin_execute(&mut self, id: u64, clock: Clock) -> Result<Vec<TimelockTransaction>, GovernanceError> {
        self.require_state(id, &clock, ProposalState::Queued, "Queued")?;

        let proposal = self.registry.get_mut(id)?;
        proposal.executed = true;
        Ok(proposal.transactions())
    }

    pub fn record_execution(&self, id: u64, clock: Clock, events: &mut EventLog) {
        events.emit(self.address, clock, GovernanceEvent::ProposalExecuted { id });
        tracing::info!("{}: proposal {} executed", self.name, id);
    }

    /// Cancel a proposal that has not been executed.
    ///
    /// The guardian may always cancel. Anyone else may only once the
    /// proposer's voting power has dropped below the proposal threshold.
    pub fn cancel(
        &mut self,
        caller: Address,
        id: u64,
        votes: &dyn VotesSource,
        timelock: &mut Timelock,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.check_timelock(timelock)?;
        let state = self.state(id, &clock)?;
        if !state.is_cancelable() {
            return Err(GovernanceError::InvalidState {
                id,
                state,
                expected: "not Canceled or Executed",
            });
        }

        let proposal = self.registry.get(id)?;
        if !self.guardian.is_guardian(&caller) {
            let proposer_votes =
                votes.prior_votes(&proposal.proposer, clock.previous_block()?, clock.block_number)?;
            if proposer_votes >= self.config.proposal_threshold {
                return Err(GovernanceError::Unauthorized(
                    "cancel: proposer above threshold".to_string(),
                ));
            }
        }

        if proposal.eta != 0 {
            for tx in proposal.transactions() {
                timelock.cancel_transaction(self.address, &tx, clock, events)?;
            }
        }

        self.registry.get_mut(id)?.canceled = true;
        events.emit(self.address, clock, GovernanceEvent::ProposalCanceled { id });
        tracing::info!("{}: proposal {} canceled by {}", self.name, id, caller);
        Ok(())
    }

    pub fn require_guardian(&self, caller: Address, action: &str) -> Result<(), GovernanceError> {
        self.guardian.require_guardian(caller, action)
    }

    /// Calls that only the governor's own timelock may make.
    pub fn require_timelock(&self, caller: Address, action: &str) -> Result<(), GovernanceError> {
        if caller != self.timelock {
            return Err(GovernanceError::Unauthorized(format!("{}: only timelock", action)));
        }
        Ok(())
    }

    pub fn change_guardian(
        &mut self,
        caller: Address,
        new_guardian: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.guardian.change(caller, new_guardian)?;
        events.emit(self.address, clock, GovernanceEvent::GuardianChanged { guardian: new_guardian });
        tracing::info!("{}: guardian changed to {}", self.name, new_guardian);
        Ok(())
    }

    pub fn abdicate(&mut self, caller: Address, clock: Clock, events: &mut EventLog) -> Result<(), GovernanceError> {
        self.guardian.abdicate(caller)?;
        events.emit(self.address, clock, GovernanceEvent::GuardianAbdicated);
        tracing::info!("{}: guardian abdicated", self.name);
        Ok(())
    }

    /// Re-point voting at another token. Guardian only.
    pub fn change_governance_token(
        &mut self,
        caller: Address,
        token: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.guardian.require_guardian(caller, "change_governance_token")?;
        if token.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "governance token cannot be the zero address".to_string(),
            ));
        }

        self.token = token;
        events.emit(self.address, clock, GovernanceEvent::GovernanceTokenChanged { token });
        tracing::info!("{}: governance token changed to {}", self.name, token);
        Ok(())
    }

    /// Timelock transaction nominating `pending_admin` as admin of this
    /// governor's timelock.
    pub fn set_timelock_pending_admin_transaction(
        &self,
        pending_admin: Address,
        eta: u64,
    ) -> Result<TimelockTransaction, GovernanceError> {
        Ok(TimelockTransaction {
            target: self.timelock,
            value: 0,
            signature: calldata::timelock::SET_PENDING_ADMIN.to_string(),
            data: calldata::encode(calldata::timelock::SET_PENDING_ADMIN, &pending_admin)?,
            eta,
        })
    }
}
