//! Voting token with checkpointed delegation.
//!
//! Both the wrapped voting token of the main DAO and the membership token of
//! the guardian DAO are instances of [`GovernanceToken`]; the latter simply
//! forbids transfers.

use std::collections::HashMap;

use augur_types::Address;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{VotesChange, VotingPowerLedger};
use crate::clock::Clock;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};

/// What a governor needs from a voting token.
pub trait VotesSource {
    fn balance_of(&self, account: &Address) -> u128;

    fn current_votes(&self, account: &Address) -> u128;

    /// Weight of `account` at the end of `block`; `block` must precede
    /// `current_block`.
    fn prior_votes(
        &self,
        account: &Address,
        block: u64,
        current_block: u64,
    ) -> Result<u128, GovernanceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPolicy {
    Transferable,
    /// Balances only change through mint and burn
    NonTransferable,
}

#[derive(Debug, Clone)]
pub struct GovernanceToken {
    address: Address,
    name: String,
    symbol: String,
    policy: TransferPolicy,
    deployer: Address,
    minter: Option<Address>,
    total_supply: u128,
    balances: HashMap<Address, u128>,
    votes: VotingPowerLedger,
}

impl GovernanceToken {
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        policy: TransferPolicy,
        deployer: Address,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            policy,
            deployer,
            minter: None,
            total_supply: 0,
            balances: HashMap::new(),
            votes: VotingPowerLedger::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    pub fn minter(&self) -> Option<Address> {
        self.minter
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn delegates(&self, account: &Address) -> Option<Address> {
        self.votes.delegate_of(account)
    }

    pub fn ledger(&self) -> &VotingPowerLedger {
        &self.votes
    }

    /// Set the single address allowed to mint and burn. Once only, deployer only.
    pub fn initialize(
        &mut self,
        caller: Address,
        minter: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        if self.minter.is_some() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        if caller != self.deployer {
            return Err(GovernanceError::Unauthorized(
                "only the deployer can initialize the token".to_string(),
            ));
        }
        if minter.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "minter cannot be the zero address".to_string(),
            ));
        }

        self.minter = Some(minter);
        events.emit(self.address, clock, GovernanceEvent::MinterInitialized { minter });
        tracing::info!("Token {} minter set to {}", self.symbol, minter);
        Ok(())
    }

    pub fn mint(
        &mut self,
        caller: Address,
        to: Address,
        amount: u128,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.require_minter(caller)?;
        if to.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "cannot mint to the zero address".to_string(),
            ));
        }

        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| GovernanceError::overflow("total supply"))?;
        let balance = self
            .balance_of(&to)
            .checked_add(amount)
            .ok_or_else(|| GovernanceError::overflow("balance"))?;
        let changes = self
            .votes
            .on_balance_change(None, Some(to), amount, clock.block_number)?;

        self.total_supply = total_supply;
        self.balances.insert(to, balance);
        events.emit(
            self.address,
            clock,
            GovernanceEvent::Transfer {
                from: Address::ZERO,
                to,
                amount,
            },
        );
        self.emit_vote_changes(&changes, clock, events);
        Ok(())
    }

    pub fn burn(
        &mut self,
        caller: Address,
        from: Address,
        amount: u128,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.require_minter(caller)?;

        let balance = self.balance_of(&from).checked_sub(amount).ok_or_else(|| {
            GovernanceError::InsufficientBalance(format!("{} cannot burn {}", from, amount))
        })?;
        let total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(|| GovernanceError::overflow("total supply"))?;
        let changes = self
            .votes
            .on_balance_change(Some(from), None, amount, clock.block_number)?;

        self.total_supply = total_supply;
        self.balances.insert(from, balance);
        events.emit(
            self.address,
            clock,
            GovernanceEvent::Transfer {
                from,
                to: Address::ZERO,
                amount,
            },
        );
        self.emit_vote_changes(&changes, clock, events);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        if self.policy == TransferPolicy::NonTransferable {
            return Err(GovernanceError::NonTransferable);
        }
        if to.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "cannot transfer to the zero address".to_string(),
            ));
        }

        let from_balance = self.balance_of(&from).checked_sub(amount).ok_or_else(|| {
            GovernanceError::InsufficientBalance(format!("{} cannot send {}", from, amount))
        })?;
        // Self-transfers leave the balance unchanged
        let to_balance = if from == to {
            from_balance
                .checked_add(amount)
                .ok_or_else(|| GovernanceError::overflow("balance"))?
        } else {
            self.balance_of(&to)
                .checked_add(amount)
                .ok_or_else(|| GovernanceError::overflow("balance"))?
        };
        let changes = self
            .votes
            .on_balance_change(Some(from), Some(to), amount, clock.block_number)?;

        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);
        events.emit(self.address, clock, GovernanceEvent::Transfer { from, to, amount });
        self.emit_vote_changes(&changes, clock, events);
        Ok(())
    }

    /// Point the caller's whole balance at `delegatee` (zero to withdraw).
    pub fn delegate(
        &mut self,
        delegator: Address,
        delegatee: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        let balance = self.balance_of(&delegator);
        let (previous, changes) =
            self.votes
                .delegate(delegator, delegatee, balance, clock.block_number)?;

        if previous != delegatee.non_zero() {
            events.emit(
                self.address,
                clock,
                GovernanceEvent::DelegateChanged {
                    delegator,
                    from_delegate: previous.unwrap_or(Address::ZERO),
                    to_delegate: delegatee,
                },
            );
            tracing::debug!("{} delegated {} votes to {}", delegator, balance, delegatee);
        }
        self.emit_vote_changes(&changes, clock, events);
        Ok(())
    }

    fn require_minter(&self, caller: Address) -> Result<(), GovernanceError> {
        if self.minter != Some(caller) {
            return Err(GovernanceError::Unauthorized(format!(
                "only the minter can mint or burn {}",
                self.symbol
            )));
        }
        Ok(())
    }

    fn emit_vote_changes(&self, changes: &[VotesChange], clock: Clock, events: &mut EventLog) {
        for change in changes {
            events.emit(
                self.address,
                clock,
                GovernanceEvent::DelegateVotesChanged {
                    delegate: change.delegate,
                    previous_votes: change.previous,
                    new_votes: change.current,
                },
            );
        }
    }
}

impl VotesSource for GovernanceToken {
    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn current_votes(&self, account: &Address) -> u128 {
        self.votes.current_votes(account)
    }

    fn prior_votes(
        &self,
        account: &Address,
        block: u64,
        current_block: u64,
    ) -> Result<u128, GovernanceError> {
        self.votes.prior_votes(account, block, current_block)
    }
}
