//! Delayed-call executor.
//!
//! The admin queues a transaction with an eta at least `delay` seconds out.
//! It may then be executed once the eta has passed and before the grace
//! period runs out. The timelock reconfigures itself (delay, pending admin)
//! only through transactions it executes against its own address.

use std::collections::HashSet;

use augur_types::{Address, Hash};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::admin::AdminHandoff;
use crate::clock::Clock;
use crate::config::TimelockConfig;
use crate::error::GovernanceError;
use crate::events::{EventLog, GovernanceEvent};

/// A call waiting in the timelock. Identified by the hash of all its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TimelockTransaction {
    pub target: Address,
    #[serde(with = "crate::config::amount")]
    pub value: u128,
    pub signature: String,
    pub data: Vec<u8>,
    pub eta: u64,
}

impl TimelockTransaction {
    pub fn hash(&self) -> Hash {
        Hash::compute_fields(&[
            self.target.as_bytes(),
            &self.value.to_le_bytes(),
            self.signature.as_bytes(),
            &self.data,
            &self.eta.to_le_bytes(),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct Timelock {
    address: Address,
    admin: AdminHandoff,
    config: TimelockConfig,
    queued: HashSet<Hash>,
}

impl Timelock {
    pub fn new(address: Address, admin: Address, config: TimelockConfig) -> Result<Self, GovernanceError> {
        config.validate()?;
        Ok(Self {
            address,
            admin: AdminHandoff::new(admin),
            config,
            queued: HashSet::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.admin.admin()
    }

    pub fn pending_admin(&self) -> Option<Address> {
        self.admin.pending_admin()
    }

    pub fn delay(&self) -> u64 {
        self.config.delay
    }

    pub fn grace_period(&self) -> u64 {
        self.config.grace_period
    }

    pub fn config(&self) -> &TimelockConfig {
        &self.config
    }

    pub fn is_queued(&self, tx_hash: &Hash) -> bool {
        self.queued.contains(tx_hash)
    }

    fn require_self(&self, caller: Address, action: &str) -> Result<(), GovernanceError> {
        if caller != self.address {
            return Err(GovernanceError::Unauthorized(format!(
                "{}: call must come from the timelock",
                action
            )));
        }
        Ok(())
    }

    pub fn set_delay(
        &mut self,
        caller: Address,
        delay: u64,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.require_self(caller, "set_delay")?;
        self.config.check_delay(delay)?;

        self.config.delay = delay;
        events.emit(self.address, clock, GovernanceEvent::NewDelay { delay });
        tracing::info!("Timelock {} delay set to {}s", self.address, delay);
        Ok(())
    }

    pub fn set_pending_admin(
        &mut self,
        caller: Address,
        pending_admin: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        self.require_self(caller, "set_pending_admin")?;

        self.admin.set_pending(pending_admin);
        events.emit(self.address, clock, GovernanceEvent::NewPendingAdmin { pending_admin });
        Ok(())
    }

    pub fn accept_admin(
        &mut self,
        caller: Address,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<(), GovernanceError> {
        let admin = self.admin.accept(caller)?;
        events.emit(self.address, clock, GovernanceEvent::NewAdmin { admin });
        tracing::info!("Timelock {} admin is now {}", self.address, admin);
        Ok(())
    }

    pub fn queue_transaction(
        &mut self,
        caller: Address,
        tx: &TimelockTransaction,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<Hash, GovernanceError> {
        self.admin.require_admin(caller, "queue_transaction")?;
        let earliest = self.earliest_eta(clock)?;
        if tx.eta < earliest {
            return Err(GovernanceError::DelayNotMet {
                eta: tx.eta,
                earliest,
            });
        }

        let tx_hash = tx.hash();
        if !self.queued.insert(tx_hash) {
            return Err(GovernanceError::DuplicateQueue(tx_hash));
        }

        events.emit(
            self.address,
            clock,
            GovernanceEvent::QueueTransaction {
                tx_hash,
                target: tx.target,
                signature: tx.signature.clone(),
                eta: tx.eta,
            },
        );
        tracing::debug!("Queued {} ({}) for {}", tx_hash, tx.signature, tx.eta);
        Ok(tx_hash)
    }

    /// Drop a queued transaction. Cancelling one that is not queued is a no-op.
    pub fn cancel_transaction(
        &mut self,
        caller: Address,
        tx: &TimelockTransaction,
        clock: Clock,
        events: &mut EventLog,
    ) -> Result<Hash, GovernanceError> {
        self.admin.require_admin(caller, "cancel_transaction")?;

        let tx_hash = tx.hash();
        self.queued.remove(&tx_hash);
        events.emit(self.address, clock, GovernanceEvent::CancelTransaction { tx_hash });
        Ok(tx_hash)
    }

    /// Check that `tx` may run now and take it off the queue.
    ///
    /// The caller performs the call itself and then reports it through
    /// [`Timelock::record_execution`].
    pub fn begin_execute(
        &mut self,
        caller: Address,
        tx: &TimelockTransaction,
        clock: Clock,
    ) -> Result<Hash, GovernanceError> {
        self.admin.require_admin(caller, "execute_transaction")?;

        let tx_hash = tx.hash();
        if !self.queued.contains(&tx_hash) {
            return Err(GovernanceError::NotQueued(tx_hash));
        }
        if clock.timestamp < tx.eta {
            return Err(GovernanceError::TooEarly {
                eta: tx.eta,
                now: clock.timestamp,
            });
        }
        let expired_at = tx
            .eta
            .checked_add(self.config.grace_period)
            .ok_or_else(|| GovernanceError::overflow("eta plus grace period"))?;
        if clock.timestamp > expired_at {
            return Err(GovernanceError::StaleTransaction {
                expired_at,
                now: clock.timestamp,
            });
        }

        self.queued.remove(&tx_hash);
        Ok(tx_hash)
    }

    pub fn record_execution(
        &self,
        tx_hash: Hash,
        tx: &TimelockTransaction,
        clock: Clock,
        events: &mut EventLog,
    ) {
        events.emit(
            self.address,
            clock,
            GovernanceEvent::ExecuteTransaction {
                tx_hash,
                target: tx.target,
                signature: tx.signature.clone(),
            },
        );
    }

    /// Earliest eta a transaction queued now may carry.
    pub fn earliest_eta(&self, clock: Clock) -> Result<u64, GovernanceError> {
        clock
            .timestamp
            .checked_add(self.config.delay)
            .ok_or_else(|| GovernanceError::overflow("eta"))
    }
}
