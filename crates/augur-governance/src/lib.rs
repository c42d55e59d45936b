//! Augur Governance - two-tier on-chain governance state machine.
//!
//! This crate provides:
//! - Checkpointed voting power with explicit delegation
//! - Governor proposal lifecycle (propose, vote, queue, execute, cancel)
//! - Timelock with delay and grace window
//! - Two-phase admin handoff and a once-changeable guardian
//! - A host [`Chain`] that runs every operation atomically

pub mod admin;
pub mod bootstrap;
pub mod calldata;
pub mod chain;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod governor;
pub mod guardian;
pub mod proposal;
pub mod timelock;
pub mod token;

pub use bootstrap::Deployment;
pub use chain::Chain;
pub use checkpoint::{Checkpoint, VotingPowerLedger};
pub use clock::Clock;
pub use config::{ChainConfig, DeploymentConfig, GovernorConfig, TimelockConfig};
pub use error::{ConfigError, ErrorKind, GovernanceError};
pub use events::{EventLog, EventRecord, GovernanceEvent};
pub use governor::Governor;
pub use proposal::{ProposalAction, ProposalRequest, ProposalState, Receipt, VoteSupport};
pub use timelock::{Timelock, TimelockTransaction};
pub use token::{GovernanceToken, TransferPolicy, VotesSource};
