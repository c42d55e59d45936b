//! Auditable record of governance transitions.
//!
//! Every committed operation appends one or more [`GovernanceEvent`]s for
//! off-chain indexers. Events of a failed operation are dropped together
//! with the rest of its effects.

use augur_types::{Address, Hash};
use serde::{Serialize, Serializer};

use crate::clock::Clock;
use crate::proposal::VoteSupport;

/// A single state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ProposalCreated {
        id: u64,
        proposer: Address,
        targets: Vec<Address>,
        #[serde(serialize_with = "amounts")]
        values: Vec<u128>,
        signatures: Vec<String>,
        #[serde(serialize_with = "hex_bytes")]
        calldatas: Vec<Vec<u8>>,
        start_block: u64,
        end_block: u64,
        description: String,
    },
    VoteCast {
        voter: Address,
        proposal_id: u64,
        support: VoteSupport,
        #[serde(with = "crate::config::amount")]
        votes: u128,
    },
    ProposalQueued {
        id: u64,
        eta: u64,
    },
    ProposalExecuted {
        id: u64,
    },
    ProposalCanceled {
        id: u64,
    },

    QueueTransaction {
        tx_hash: Hash,
        target: Address,
        signature: String,
        eta: u64,
    },
    CancelTransaction {
        tx_hash: Hash,
    },
    ExecuteTransaction {
        tx_hash: Hash,
        target: Address,
        signature: String,
    },
    NewDelay {
        delay: u64,
    },
    NewPendingAdmin {
        pending_admin: Address,
    },
    NewAdmin {
        admin: Address,
    },

    GuardianChanged {
        guardian: Address,
    },
    GuardianAbdicated,
    GovernanceTokenChanged {
        token: Address,
    },

    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "crate::config::amount")]
        amount: u128,
    },
    DelegateChanged {
        delegator: Address,
        from_delegate: Address,
        to_delegate: Address,
    },
    DelegateVotesChanged {
        delegate: Address,
        #[serde(with = "crate::config::amount")]
        previous_votes: u128,
        #[serde(with = "crate::config::amount")]
        new_votes: u128,
    },
    MinterInitialized {
        minter: Address,
    },
}

fn amounts<S: Serializer>(values: &[u128], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|v| v.to_string()))
}

fn hex_bytes<S: Serializer>(calldatas: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(calldatas.iter().map(|data| format!("0x{}", hex::encode(data))))
}

/// An event together with where and when it was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub emitter: Address,
    pub block_number: u64,
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: GovernanceEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, emitter: Address, clock: Clock, event: GovernanceEvent) {
        self.records.push(EventRecord {
            emitter,
            block_number: clock.block_number,
            timestamp: clock.timestamp,
            event,
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Events emitted by one component, oldest first.
    pub fn by_emitter(&self, emitter: Address) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().filter(move |r| r.emitter == emitter)
    }

    /// Drop everything emitted after the log had `len` records.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_filter() {
        let a = Address::from_bytes([1u8; 20]);
        let b = Address::from_bytes([2u8; 20]);
        let mut log = EventLog::new();
        log.emit(a, Clock::new(5, 100), GovernanceEvent::ProposalQueued { id: 1, eta: 200 });
        log.emit(b, Clock::new(5, 100), GovernanceEvent::GuardianAbdicated);
        log.emit(a, Clock::new(6, 115), GovernanceEvent::ProposalExecuted { id: 1 });

        assert_eq!(log.len(), 3);
        assert_eq!(log.by_emitter(a).count(), 2);
        assert_eq!(log.records()[2].block_number, 6);

        log.truncate(1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.by_emitter(b).count(), 0);
    }

    #[test]
    fn test_record_serializes_flat() {
        let mut log = EventLog::new();
        log.emit(
            Address::from_bytes([7u8; 20]),
            Clock::new(1, 2),
            GovernanceEvent::VoteCast {
                voter: Address::from_bytes([8u8; 20]),
                proposal_id: 3,
                support: VoteSupport::For,
                votes: u128::MAX,
            },
        );

        let json = serde_json::to_value(&log.records()[0]).unwrap();
        assert_eq!(json["event"], "vote_cast");
        assert_eq!(json["proposal_id"], 3);
        assert_eq!(json["votes"], u128::MAX.to_string());
        assert_eq!(json["block_number"], 1);
    }

    #[test]
    fn test_proposal_created_carries_full_actions() {
        let target = Address::from_bytes([9u8; 20]);
        let event = GovernanceEvent::ProposalCreated {
            id: 1,
            proposer: Address::from_bytes([8u8; 20]),
            targets: vec![target],
            values: vec![5],
            signatures: vec!["mint(address,u128)".to_string()],
            calldatas: vec![vec![0xde, 0xad]],
            start_block: 11,
            end_block: 111,
            description: "seat guardians".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "proposal_created");
        assert_eq!(json["values"][0], "5");
        assert_eq!(json["calldatas"][0], "0xdead");
        assert_eq!(json["description"], "seat guardians");
    }
}
