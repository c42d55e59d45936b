//! Host state machine.
//!
//! The [`Chain`] owns the clock, every deployed component (tokens, timelocks,
//! governors) keyed by address, native balances and the event log.
//! Components only know each other by address; the chain looks them up for
//! every call.
//!
//! Each public operation is atomic: component state is snapshotted before
//! it runs and restored, together with the event log, if it fails. This also
//! makes a governor's multi-action execution all-or-nothing.

use std::collections::HashMap;
use std::sync::Arc;

use augur_types::{Address, Hash};

use crate::calldata;
use crate::clock::Clock;
use crate::config::{ChainConfig, GovernorConfig, TimelockConfig};
use crate::error::{ErrorKind, GovernanceError};
use crate::events::EventLog;
use crate::governor::Governor;
use crate::proposal::{ProposalRequest, ProposalState, Receipt, VoteSupport};
use crate::timelock::{Timelock, TimelockTransaction};
use crate::token::{GovernanceToken, TransferPolicy};

/// Components are shared between snapshots and copied on first write.
#[derive(Debug, Clone, Default)]
struct State {
    tokens: HashMap<Address, Arc<GovernanceToken>>,
    timelocks: HashMap<Address, Arc<Timelock>>,
    governors: HashMap<Address, Arc<Governor>>,
    /// Native funds (the treasury a timelock controls)
    native: HashMap<Address, u128>,
    /// Deployments per deployer, for address derivation
    nonces: HashMap<Address, u64>,
}

impl State {
    fn token(&self, address: Address) -> Result<&GovernanceToken, GovernanceError> {
        self.tokens
            .get(&address)
            .map(Arc::as_ref)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn token_mut(&mut self, address: Address) -> Result<&mut GovernanceToken, GovernanceError> {
        self.tokens
            .get_mut(&address)
            .map(Arc::make_mut)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn timelock(&self, address: Address) -> Result<&Timelock, GovernanceError> {
        self.timelocks
            .get(&address)
            .map(Arc::as_ref)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn timelock_mut(&mut self, address: Address) -> Result<&mut Timelock, GovernanceError> {
        self.timelocks
            .get_mut(&address)
            .map(Arc::make_mut)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn governor(&self, address: Address) -> Result<&Governor, GovernanceError> {
        self.governors
            .get(&address)
            .map(Arc::as_ref)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn governor_mut(&mut self, address: Address) -> Result<&mut Governor, GovernanceError> {
        self.governors
            .get_mut(&address)
            .map(Arc::make_mut)
            .ok_or(GovernanceError::UnknownContract(address))
    }

    fn is_deployed(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
            || self.timelocks.contains_key(address)
            || self.governors.contains_key(address)
    }

    fn next_address(&mut self, deployer: Address) -> Result<Address, GovernanceError> {
        let nonce = self.nonces.entry(deployer).or_insert(0);
        let address = Address::derive_contract(&deployer, *nonce);
        *nonce = nonce
            .checked_add(1)
            .ok_or_else(|| GovernanceError::overflow("deployer nonce"))?;
        if self.is_deployed(&address) {
            return Err(GovernanceError::InvalidParameter(format!(
                "address {} is already in use",
                address
            )));
        }
        Ok(address)
    }

    fn native_balance(&self, account: &Address) -> u128 {
        self.native.get(account).copied().unwrap_or(0)
    }

    fn transfer_native(&mut self, from: Address, to: Address, value: u128) -> Result<(), GovernanceError> {
        if value == 0 || from == to {
            return Ok(());
        }
        let from_balance = self.native_balance(&from).checked_sub(value).ok_or_else(|| {
            GovernanceError::InsufficientBalance(format!("{} cannot send {} native", from, value))
        })?;
        let to_balance = self
            .native_balance(&to)
            .checked_add(value)
            .ok_or_else(|| GovernanceError::overflow("native balance"))?;
        self.native.insert(from, from_balance);
        self.native.insert(to, to_balance);
        Ok(())
    }

    /// Generic call primitive: move `value` to `target`, then run
    /// `signature` on the component deployed there.
    fn call(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        target: Address,
        value: u128,
        signature: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, GovernanceError> {
        if signature.is_empty() && !data.is_empty() {
            return Err(GovernanceError::InvalidCalldata {
                signature: String::new(),
                reason: format!("{} bytes of calldata without a function signature", data.len()),
            });
        }
        self.transfer_native(caller, target, value)?;
        if signature.is_empty() {
            // Plain value transfer
            return Ok(Vec::new());
        }

        tracing::debug!("Call {} -> {}: {}", caller, target, signature);
        if self.tokens.contains_key(&target) {
            self.call_token(events, clock, caller, target, signature, data)
        } else if self.timelocks.contains_key(&target) {
            self.call_timelock(events, clock, caller, target, signature, data)
        } else if self.governors.contains_key(&target) {
            self.call_governor(events, clock, caller, target, signature, data)
        } else {
            Err(GovernanceError::UnknownContract(target))
        }
    }

    fn call_token(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        target: Address,
        signature: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, GovernanceError> {
        let token = self.token_mut(target)?;
        match signature {
            calldata::token::TRANSFER => {
                let (to, amount): (Address, u128) = calldata::decode(signature, data)?;
                token.transfer(caller, to, amount, clock, events)?;
            }
            calldata::token::MINT => {
                let (to, amount): (Address, u128) = calldata::decode(signature, data)?;
                token.mint(caller, to, amount, clock, events)?;
            }
            calldata::token::BURN => {
                let (from, amount): (Address, u128) = calldata::decode(signature, data)?;
                token.burn(caller, from, amount, clock, events)?;
            }
            calldata::token::DELEGATE => {
                let delegatee: Address = calldata::decode(signature, data)?;
                token.delegate(caller, delegatee, clock, events)?;
            }
            calldata::token::INITIALIZE => {
                let minter: Address = calldata::decode(signature, data)?;
                token.initialize(caller, minter, clock, events)?;
            }
            _ => return Err(unknown_function(target, signature)),
        }
        Ok(Vec::new())
    }

    fn call_timelock(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        target: Address,
        signature: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, GovernanceError> {
        match signature {
            calldata::timelock::SET_DELAY => {
                let delay: u64 = calldata::decode(signature, data)?;
                self.timelock_mut(target)?.set_delay(caller, delay, clock, events)?;
            }
            calldata::timelock::SET_PENDING_ADMIN => {
                let pending: Address = calldata::decode(signature, data)?;
                self.timelock_mut(target)?
                    .set_pending_admin(caller, pending, clock, events)?;
            }
            calldata::timelock::ACCEPT_ADMIN => {
                calldata::decode::<()>(signature, data)?;
                self.timelock_mut(target)?.accept_admin(caller, clock, events)?;
            }
            calldata::timelock::QUEUE_TRANSACTION => {
                let tx: TimelockTransaction = calldata::decode(signature, data)?;
                let tx_hash = self
                    .timelock_mut(target)?
                    .queue_transaction(caller, &tx, clock, events)?;
                return Ok(tx_hash.as_bytes().to_vec());
            }
            calldata::timelock::CANCEL_TRANSACTION => {
                let tx: TimelockTransaction = calldata::decode(signature, data)?;
                self.timelock_mut(target)?
                    .cancel_transaction(caller, &tx, clock, events)?;
            }
            calldata::timelock::EXECUTE_TRANSACTION => {
                let tx: TimelockTransaction = calldata::decode(signature, data)?;
                return self.execute_timelock_transaction(events, clock, caller, target, &tx);
            }
            _ => return Err(unknown_function(target, signature)),
        }
        Ok(Vec::new())
    }

    fn call_governor(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        target: Address,
        signature: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, GovernanceError> {
        match signature {
            calldata::governor::CANCEL => {
                let id: u64 = calldata::decode(signature, data)?;
                self.cancel_proposal(events, clock, caller, target, id)?;
            }
            calldata::governor::CHANGE_GUARDIAN => {
                let guardian: Address = calldata::decode(signature, data)?;
                self.governor_mut(target)?
                    .change_guardian(caller, guardian, clock, events)?;
            }
            calldata::governor::ABDICATE => {
                calldata::decode::<()>(signature, data)?;
                self.governor_mut(target)?.abdicate(caller, clock, events)?;
            }
            calldata::governor::ACCEPT_ADMIN => {
                calldata::decode::<()>(signature, data)?;
                self.accept_timelock_admin(events, clock, caller, target)?;
            }
            calldata::governor::CHANGE_GOVERNANCE_TOKEN => {
                let token: Address = calldata::decode(signature, data)?;
                self.token(token)?;
                self.governor_mut(target)?
                    .change_governance_token(caller, token, clock, events)?;
            }
            calldata::governor::MINT_GUARDIAN_GOVERNANCE_TOKEN => {
                let (to, amount): (Address, u128) = calldata::decode(signature, data)?;
                let token = self.guardian_governance_token(caller, target, signature)?;
                self.token_mut(token)?.mint(target, to, amount, clock, events)?;
            }
            calldata::governor::BURN_GUARDIAN_GOVERNANCE_TOKEN => {
                let (from, amount): (Address, u128) = calldata::decode(signature, data)?;
                let token = self.guardian_governance_token(caller, target, signature)?;
                self.token_mut(token)?.burn(target, from, amount, clock, events)?;
            }
            _ => return Err(unknown_function(target, signature)),
        }
        Ok(Vec::new())
    }

    /// Run a queued transaction of `timelock` on behalf of `caller`, which
    /// must be its admin. Failures of the call itself become `CallReverted`.
    fn execute_timelock_transaction(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        timelock: Address,
        tx: &TimelockTransaction,
    ) -> Result<Vec<u8>, GovernanceError> {
        let tx_hash = self.timelock_mut(timelock)?.begin_execute(caller, tx, clock)?;
        let output = self
            .call(events, clock, timelock, tx.target, tx.value, &tx.signature, &tx.data)
            .map_err(|e| GovernanceError::CallReverted {
                target: tx.target,
                signature: tx.signature.clone(),
                reason: e.to_string(),
            })?;
        self.timelock(timelock)?
            .record_execution(tx_hash, tx, clock, events);
        Ok(output)
    }

    fn cancel_proposal(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        governor: Address,
        id: u64,
    ) -> Result<(), GovernanceError> {
        let State {
            tokens,
            timelocks,
            governors,
            ..
        } = self;
        let governor = governors
            .get_mut(&governor)
            .map(Arc::make_mut)
            .ok_or(GovernanceError::UnknownContract(governor))?;
        let token = tokens
            .get(&governor.token())
            .map(Arc::as_ref)
            .ok_or(GovernanceError::UnknownContract(governor.token()))?;
        let timelock = timelocks
            .get_mut(&governor.timelock())
            .map(Arc::make_mut)
            .ok_or(GovernanceError::UnknownContract(governor.timelock()))?;
        governor.cancel(caller, id, token, timelock, clock, events)
    }

    fn accept_timelock_admin(
        &mut self,
        events: &mut EventLog,
        clock: Clock,
        caller: Address,
        governor: Address,
    ) -> Result<(), GovernanceError> {
        let gov = self.governor(governor)?;
        gov.require_guardian(caller, "accept_admin")?;
        let timelock = gov.timelock();
        self.timelock_mut(timelock)?.accept_admin(governor, clock, events)
    }

    fn guardian_governance_token(
        &self,
        caller: Address,
        governor: Address,
        action: &str,
    ) -> Result<Address, GovernanceError> {
        let gov = self.governor(governor)?;
        gov.require_timelock(caller, action)?;
        gov.guardian_governance_token().ok_or_else(|| {
            GovernanceError::InvalidParameter(format!("{} has no guardian governance token", gov.name()))
        })
    }
}

fn unknown_function(target: Address, signature: &str) -> GovernanceError {
    GovernanceError::UnknownFunction {
        target,
        signature: signature.to_string(),
    }
}

/// The single authoritative state machine hosting every component.
#[derive(Debug)]
pub struct Chain {
    config: ChainConfig,
    clock: Clock,
    state: State,
    events: EventLog,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            clock: Clock::new(config.genesis_block, config.genesis_timestamp),
            config,
            state: State::default(),
            events: EventLog::new(),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn block_number(&self) -> u64 {
        self.clock.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.clock.timestamp
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Mine `blocks` blocks.
    pub fn advance_blocks(&mut self, blocks: u64) -> Result<(), GovernanceError> {
        self.clock.advance_blocks(blocks, self.config.seconds_per_block)
    }

    /// Move wall-clock time forward without mining.
    pub fn advance_time(&mut self, seconds: u64) -> Result<(), GovernanceError> {
        self.clock.advance_time(seconds)
    }

    /// Run `op` against the component state, all-or-nothing.
    ///
    /// The snapshot shares every component with the live state; only the
    /// components `op` writes to are copied.
    fn transact<T>(
        &mut self,
        operation: &str,
        op: impl FnOnce(&mut State, &mut EventLog, Clock) -> Result<T, GovernanceError>,
    ) -> Result<T, GovernanceError> {
        let snapshot = self.state.clone();
        let mark = self.events.len();
        match op(&mut self.state, &mut self.events, self.clock) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.state = snapshot;
                self.events.truncate(mark);
                tracing::warn!("{} reverted at block {}: {}", operation, self.clock.block_number, e);
                Err(e)
            }
        }
    }

    // -- native funds --

    /// Credit `amount` of native funds out of thin air (genesis allocation).
    pub fn fund(&mut self, account: Address, amount: u128) -> Result<(), GovernanceError> {
        self.transact("fund", |state, _, _| {
            let balance = state
                .native_balance(&account)
                .checked_add(amount)
                .ok_or_else(|| GovernanceError::overflow("native balance"))?;
            state.native.insert(account, balance);
            Ok(())
        })
    }

    pub fn native_balance(&self, account: &Address) -> u128 {
        self.state.native_balance(account)
    }

    // -- deployment --

    pub fn deploy_token(
        &mut self,
        deployer: Address,
        name: &str,
        symbol: &str,
        policy: TransferPolicy,
    ) -> Result<Address, GovernanceError> {
        self.transact("deploy_token", |state, _, _| {
            let address = state.next_address(deployer)?;
            state
                .tokens
                .insert(address, Arc::new(GovernanceToken::new(address, name, symbol, policy, deployer)));
            tracing::info!("Token {} deployed at {}", symbol, address);
            Ok(address)
        })
    }

    pub fn deploy_timelock(
        &mut self,
        deployer: Address,
        admin: Address,
        config: TimelockConfig,
    ) -> Result<Address, GovernanceError> {
        self.transact("deploy_timelock", |state, _, _| {
            let address = state.next_address(deployer)?;
            state
                .timelocks
                .insert(address, Arc::new(Timelock::new(address, admin, config)?));
            tracing::info!("Timelock deployed at {} with admin {}", address, admin);
            Ok(address)
        })
    }

    /// Deploy a governor whose guardian is the deployer.
    pub fn deploy_governor(
        &mut self,
        deployer: Address,
        name: &str,
        config: GovernorConfig,
        timelock: Address,
        token: Address,
        guardian_governance_token: Option<Address>,
    ) -> Result<Address, GovernanceError> {
        self.transact("deploy_governor", |state, _, _| {
            state.token(token)?;
            if let Some(guardian_token) = guardian_governance_token {
                state.token(guardian_token)?;
            }
            let address = state.next_address(deployer)?;
            let governor = Governor::new(
                address,
                name,
                config,
                state.timelock(timelock)?,
                token,
                deployer,
                guardian_governance_token,
            )?;
            state.governors.insert(address, Arc::new(governor));
            tracing::info!("Governor {} deployed at {}", name, address);
            Ok(address)
        })
    }

    pub fn token(&self, address: Address) -> Result<&GovernanceToken, GovernanceError> {
        self.state.token(address)
    }

    pub fn timelock(&self, address: Address) -> Result<&Timelock, GovernanceError> {
        self.state.timelock(address)
    }

    pub fn governor(&self, address: Address) -> Result<&Governor, GovernanceError> {
        self.state.governor(address)
    }

    // -- governor --

    /// Submit a proposal. The action arrays must have equal length.
    pub fn propose(
        &mut self,
        proposer: Address,
        governor: Address,
        request: ProposalRequest,
    ) -> Result<u64, GovernanceError> {
        self.transact("propose", |state, events, clock| {
            let State {
                tokens, governors, ..
            } = state;
            let gov = governors
                .get_mut(&governor)
                .map(Arc::make_mut)
                .ok_or(GovernanceError::UnknownContract(governor))?;
            let token = tokens
                .get(&gov.token())
                .map(Arc::as_ref)
                .ok_or(GovernanceError::UnknownContract(gov.token()))?;
            gov.propose(proposer, request, token, clock, events)
        })
    }

    pub fn cast_vote(
        &mut self,
        voter: Address,
        governor: Address,
        id: u64,
        support: VoteSupport,
    ) -> Result<Receipt, GovernanceError> {
        self.transact("cast_vote", |state, events, clock| {
            let State {
                tokens, governors, ..
            } = state;
            let gov = governors
                .get_mut(&governor)
                .map(Arc::make_mut)
                .ok_or(GovernanceError::UnknownContract(governor))?;
            let token = tokens
                .get(&gov.token())
                .map(Arc::as_ref)
                .ok_or(GovernanceError::UnknownContract(gov.token()))?;
            gov.cast_vote(voter, id, support, token, clock, events)
        })
    }

    /// Queue a succeeded proposal in its timelock. Anyone may call this.
    pub fn queue(&mut self, governor: Address, id: u64) -> Result<u64, GovernanceError> {
        self.transact("queue", |state, events, clock| {
            let State {
                timelocks,
                governors,
                ..
            } = state;
            let gov = governors
                .get_mut(&governor)
                .map(Arc::make_mut)
                .ok_or(GovernanceError::UnknownContract(governor))?;
            let timelock = timelocks
                .get_mut(&gov.timelock())
                .map(Arc::make_mut)
                .ok_or(GovernanceError::UnknownContract(gov.timelock()))?;
            gov.queue(id, timelock, clock, events)
        })
    }

    /// Execute every action of a queued proposal through its timelock.
    ///
    /// If any action fails the whole batch is undone and the error names the
    /// failing action. Timing and authorization failures of the timelock
    /// itself are passed through unchanged.
    pub fn execute(&mut self, governor: Address, id: u64) -> Result<(), GovernanceError> {
        self.transact("execute", |state, events, clock| {
            let gov = state.governor_mut(governor)?;
            let timelock = gov.timelock();
            let transactions = gov.begin_execute(id, clock)?;

            for (index, tx) in transactions.iter().enumerate() {
                state
                    .execute_timelock_transaction(events, clock, governor, timelock, tx)
                    .map_err(|e| match e.kind() {
                        ErrorKind::Execution => GovernanceError::ExecutionFailed {
                            index,
                            reason: e.to_string(),
                        },
                        _ => e,
                    })?;
            }

            state.governor(governor)?.record_execution(id, clock, events);
            Ok(())
        })
    }

    pub fn cancel(&mut self, caller: Address, governor: Address, id: u64) -> Result<(), GovernanceError> {
        self.transact("cancel", |state, events, clock| {
            state.cancel_proposal(events, clock, caller, governor, id)
        })
    }

    pub fn state(&self, governor: Address, id: u64) -> Result<ProposalState, GovernanceError> {
        self.state.governor(governor)?.state(id, &self.clock)
    }

    pub fn get_receipt(&self, governor: Address, id: u64, voter: &Address) -> Result<Receipt, GovernanceError> {
        self.state.governor(governor)?.get_receipt(id, voter)
    }

    /// Guardian completes the handoff of the governor's timelock to the governor.
    pub fn accept_admin(&mut self, caller: Address, governor: Address) -> Result<(), GovernanceError> {
        self.transact("accept_admin", |state, events, clock| {
            state.accept_timelock_admin(events, clock, caller, governor)
        })
    }

    pub fn abdicate(&mut self, caller: Address, governor: Address) -> Result<(), GovernanceError> {
        self.transact("abdicate", |state, events, clock| {
            state.governor_mut(governor)?.abdicate(caller, clock, events)
        })
    }

    pub fn change_guardian(
        &mut self,
        caller: Address,
        governor: Address,
        new_guardian: Address,
    ) -> Result<(), GovernanceError> {
        self.transact("change_guardian", |state, events, clock| {
            state
                .governor_mut(governor)?
                .change_guardian(caller, new_guardian, clock, events)
        })
    }

    pub fn change_governance_token(
        &mut self,
        caller: Address,
        governor: Address,
        token: Address,
    ) -> Result<(), GovernanceError> {
        self.transact("change_governance_token", |state, events, clock| {
            state.token(token)?;
            state
                .governor_mut(governor)?
                .change_governance_token(caller, token, clock, events)
        })
    }

    /// Guardian queues, through the governor, a transaction nominating
    /// `new_admin` as the timelock's next admin.
    pub fn queue_set_timelock_pending_admin(
        &mut self,
        caller: Address,
        governor: Address,
        new_admin: Address,
        eta: u64,
    ) -> Result<Hash, GovernanceError> {
        self.transact("queue_set_timelock_pending_admin", |state, events, clock| {
            let gov = state.governor(governor)?;
            gov.require_guardian(caller, "queue_set_timelock_pending_admin")?;
            let tx = gov.set_timelock_pending_admin_transaction(new_admin, eta)?;
            let timelock = gov.timelock();
            state
                .timelock_mut(timelock)?
                .queue_transaction(governor, &tx, clock, events)
        })
    }

    pub fn execute_set_timelock_pending_admin(
        &mut self,
        caller: Address,
        governor: Address,
        new_admin: Address,
        eta: u64,
    ) -> Result<(), GovernanceError> {
        self.transact("execute_set_timelock_pending_admin", |state, events, clock| {
            let gov = state.governor(governor)?;
            gov.require_guardian(caller, "execute_set_timelock_pending_admin")?;
            let tx = gov.set_timelock_pending_admin_transaction(new_admin, eta)?;
            let timelock = gov.timelock();
            state.execute_timelock_transaction(events, clock, governor, timelock, &tx)?;
            Ok(())
        })
    }

    // -- timelock --

    pub fn queue_transaction(
        &mut self,
        caller: Address,
        timelock: Address,
        tx: &TimelockTransaction,
    ) -> Result<Hash, GovernanceError> {
        self.transact("queue_transaction", |state, events, clock| {
            state
                .timelock_mut(timelock)?
                .queue_transaction(caller, tx, clock, events)
        })
    }

    pub fn cancel_transaction(
        &mut self,
        caller: Address,
        timelock: Address,
        tx: &TimelockTransaction,
    ) -> Result<Hash, GovernanceError> {
        self.transact("cancel_transaction", |state, events, clock| {
            state
                .timelock_mut(timelock)?
                .cancel_transaction(caller, tx, clock, events)
        })
    }

    pub fn execute_transaction(
        &mut self,
        caller: Address,
        timelock: Address,
        tx: &TimelockTransaction,
    ) -> Result<Vec<u8>, GovernanceError> {
        self.transact("execute_transaction", |state, events, clock| {
            state.execute_timelock_transaction(events, clock, caller, timelock, tx)
        })
    }

    // -- tokens --

    pub fn initialize_token(&mut self, caller: Address, token: Address, minter: Address) -> Result<(), GovernanceError> {
        self.transact("initialize", |state, events, clock| {
            state.token_mut(token)?.initialize(caller, minter, clock, events)
        })
    }

    pub fn mint(&mut self, caller: Address, token: Address, to: Address, amount: u128) -> Result<(), GovernanceError> {
        self.transact("mint", |state, events, clock| {
            state.token_mut(token)?.mint(caller, to, amount, clock, events)
        })
    }

    pub fn burn(&mut self, caller: Address, token: Address, from: Address, amount: u128) -> Result<(), GovernanceError> {
        self.transact("burn", |state, events, clock| {
            state.token_mut(token)?.burn(caller, from, amount, clock, events)
        })
    }

    pub fn transfer(&mut self, from: Address, token: Address, to: Address, amount: u128) -> Result<(), GovernanceError> {
        self.transact("transfer", |state, events, clock| {
            state.token_mut(token)?.transfer(from, to, amount, clock, events)
        })
    }

    pub fn delegate(&mut self, delegator: Address, token: Address, delegatee: Address) -> Result<(), GovernanceError> {
        self.transact("delegate", |state, events, clock| {
            state.token_mut(token)?.delegate(delegator, delegatee, clock, events)
        })
    }

    // -- generic --

    /// Call any deployed component directly, as `caller`.
    pub fn call(
        &mut self,
        caller: Address,
        target: Address,
        value: u128,
        signature: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, GovernanceError> {
        self.transact("call", |state, events, clock| {
            state.call(events, clock, caller, target, value, signature, data)
        })
    }
}
