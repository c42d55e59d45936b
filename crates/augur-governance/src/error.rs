use augur_types::{Address, Hash};
use thiserror::Error;

use crate::proposal::ProposalState;

/// Coarse failure category, so callers can tell "retry later" from
/// "never valid" from "needs more authority".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input: mismatched arrays, bad calldata, out-of-range values.
    Validation,
    /// Caller lacks the role or the voting weight for the operation.
    Authorization,
    /// Operation attempted in the wrong lifecycle state.
    State,
    /// Too early or too late relative to a delay, eta or grace window.
    Timing,
    /// Repeat of something that may only happen once.
    Duplicate,
    /// A downstream call failed while executing queued actions.
    Execution,
}

impl ErrorKind {
    /// Only timing failures can succeed later without any other change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Timing)
    }
}

/// Errors that can occur in governance operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    // -- validation --
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Invalid block: {requested} is not yet determined (current block {current})")]
    InvalidBlock { requested: u64, current: u64 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid calldata for {signature}: {reason}")]
    InvalidCalldata { signature: String, reason: String },

    #[error("Unknown function {signature} on {target}")]
    UnknownFunction { target: Address, signature: String },

    #[error("No component deployed at {0}")]
    UnknownContract(Address),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    // -- authorization --
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient voting power: {votes} does not exceed threshold {threshold}")]
    InsufficientVotingPower { votes: u128, threshold: u128 },

    #[error("Token is non-transferable")]
    NonTransferable,

    // -- state --
    #[error("Proposal {id} is {state}, expected {expected}")]
    InvalidState {
        id: u64,
        state: ProposalState,
        expected: &'static str,
    },

    #[error("Transaction {0} has not been queued")]
    NotQueued(Hash),

    // -- timing --
    #[error("Estimated execution time {eta} must be at least {earliest}")]
    DelayNotMet { eta: u64, earliest: u64 },

    #[error("Transaction has not surpassed its time lock: eta {eta}, now {now}")]
    TooEarly { eta: u64, now: u64 },

    #[error("Transaction is stale: grace period ended at {expired_at}, now {now}")]
    StaleTransaction { expired_at: u64, now: u64 },

    // -- duplicate --
    #[error("Proposer {proposer} already has live proposal {existing}")]
    DuplicateProposal { proposer: Address, existing: u64 },

    #[error("Voter {voter} already voted on proposal {id}")]
    DuplicateVote { id: u64, voter: Address },

    #[error("Proposal action already queued at eta: {0}")]
    DuplicateAction(Hash),

    #[error("Transaction already queued: {0}")]
    DuplicateQueue(Hash),

    #[error("Guardian can only be changed once")]
    GuardianAlreadyChanged,

    #[error("Already initialized")]
    AlreadyInitialized,

    // -- execution --
    #[error("Call to {target} ({signature}) reverted: {reason}")]
    CallReverted {
        target: Address,
        signature: String,
        reason: String,
    },

    #[error("Execution of action {index} failed: {reason}")]
    ExecutionFailed { index: usize, reason: String },
}

impl GovernanceError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            InvalidProposal(_)
            | ProposalNotFound(_)
            | InvalidBlock { .. }
            | InvalidParameter(_)
            | InvalidCalldata { .. }
            | UnknownFunction { .. }
            | UnknownContract(_)
            | InsufficientBalance(_)
            | Overflow(_) => ErrorKind::Validation,
            Unauthorized(_) | InsufficientVotingPower { .. } | NonTransferable => {
                ErrorKind::Authorization
            }
            InvalidState { .. } | NotQueued(_) => ErrorKind::State,
            DelayNotMet { .. } | TooEarly { .. } | StaleTransaction { .. } => ErrorKind::Timing,
            DuplicateProposal { .. }
            | DuplicateVote { .. }
            | DuplicateAction(_)
            | DuplicateQueue(_)
            | GuardianAlreadyChanged
            | AlreadyInitialized => ErrorKind::Duplicate,
            CallReverted { .. } | ExecutionFailed { .. } => ErrorKind::Execution,
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        GovernanceError::Overflow(what.to_string())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
