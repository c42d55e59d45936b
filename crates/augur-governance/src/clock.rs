//! Block height and wall-clock time as seen by governance operations.

use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Current block number and timestamp (seconds).
///
/// Voting windows are measured in blocks, timelock windows in seconds.
/// Both only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub block_number: u64,
    pub timestamp: u64,
}

impl Clock {
    pub fn new(block_number: u64, timestamp: u64) -> Self {
        Self {
            block_number,
            timestamp,
        }
    }

    /// The most recent block whose state is final.
    pub fn previous_block(&self) -> Result<u64, GovernanceError> {
        self.block_number
            .checked_sub(1)
            .ok_or(GovernanceError::InvalidBlock {
                requested: 0,
                current: self.block_number,
            })
    }

    /// Move forward by `blocks` blocks of `seconds_per_block` each.
    pub fn advance_blocks(&mut self, blocks: u64, seconds_per_block: u64) -> Result<(), GovernanceError> {
        let elapsed = blocks
            .checked_mul(seconds_per_block)
            .ok_or_else(|| GovernanceError::overflow("block time"))?;
        let block_number = self
            .block_number
            .checked_add(blocks)
            .ok_or_else(|| GovernanceError::overflow("block number"))?;
        let timestamp = self
            .timestamp
            .checked_add(elapsed)
            .ok_or_else(|| GovernanceError::overflow("timestamp"))?;
        self.block_number = block_number;
        self.timestamp = timestamp;
        Ok(())
    }

    /// Move wall-clock time forward without producing blocks.
    pub fn advance_time(&mut self, seconds: u64) -> Result<(), GovernanceError> {
        self.timestamp = self
            .timestamp
            .checked_add(seconds)
            .ok_or_else(|| GovernanceError::overflow("timestamp"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_blocks_moves_time() {
        let mut clock = Clock::new(10, 1_000);
        clock.advance_blocks(3, 15).unwrap();
        assert_eq!(clock, Clock::new(13, 1_045));

        clock.advance_time(60).unwrap();
        assert_eq!(clock.block_number, 13);
        assert_eq!(clock.timestamp, 1_105);
    }

    #[test]
    fn test_previous_block_at_genesis() {
        assert!(Clock::new(0, 0).previous_block().is_err());
        assert_eq!(Clock::new(5, 0).previous_block().unwrap(), 4);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut clock = Clock::new(u64::MAX, 0);
        assert!(clock.advance_blocks(1, 1).is_err());
        // Failed advance leaves the clock untouched
        assert_eq!(clock.block_number, u64::MAX);
    }
}
