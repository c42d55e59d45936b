//! Call encoding for timelock actions.
//!
//! A call is a function signature plus the borsh encoding of its argument
//! tuple. The signatures below are everything the host can dispatch.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::GovernanceError;

/// Functions of a [`GovernanceToken`](crate::token::GovernanceToken).
pub mod token {
    pub const TRANSFER: &str = "transfer(address,u128)";
    pub const MINT: &str = "mint(address,u128)";
    pub const BURN: &str = "burn(address,u128)";
    pub const DELEGATE: &str = "delegate(address)";
    pub const INITIALIZE: &str = "initialize(address)";
}

/// Functions of a [`Timelock`](crate::timelock::Timelock).
pub mod timelock {
    pub const SET_DELAY: &str = "set_delay(u64)";
    pub const SET_PENDING_ADMIN: &str = "set_pending_admin(address)";
    pub const ACCEPT_ADMIN: &str = "accept_admin()";
    pub const QUEUE_TRANSACTION: &str = "queue_transaction(tx)";
    pub const CANCEL_TRANSACTION: &str = "cancel_transaction(tx)";
    pub const EXECUTE_TRANSACTION: &str = "execute_transaction(tx)";
}

/// Functions of a [`Governor`](crate::governor::Governor).
pub mod governor {
    pub const CANCEL: &str = "cancel(u64)";
    pub const CHANGE_GUARDIAN: &str = "change_guardian(address)";
    pub const ABDICATE: &str = "abdicate()";
    pub const ACCEPT_ADMIN: &str = "accept_admin()";
    pub const CHANGE_GOVERNANCE_TOKEN: &str = "change_governance_token(address)";
    pub const MINT_GUARDIAN_GOVERNANCE_TOKEN: &str = "mint_guardian_governance_token(address,u128)";
    pub const BURN_GUARDIAN_GOVERNANCE_TOKEN: &str = "burn_guardian_governance_token(address,u128)";
}

/// Encode the arguments of a call to `signature`.
pub fn encode<T: BorshSerialize>(signature: &str, args: &T) -> Result<Vec<u8>, GovernanceError> {
    borsh::to_vec(args).map_err(|e| GovernanceError::InvalidCalldata {
        signature: signature.to_string(),
        reason: e.to_string(),
    })
}

/// Decode the arguments of a call to `signature`. Trailing bytes are rejected.
pub fn decode<T: BorshDeserialize>(signature: &str, data: &[u8]) -> Result<T, GovernanceError> {
    borsh::from_slice(data).map_err(|e| GovernanceError::InvalidCalldata {
        signature: signature.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_types::Address;

    #[test]
    fn test_argument_tuple() {
        let to = Address::from_bytes([3u8; 20]);
        let data = encode(token::MINT, &(to, 300u128)).unwrap();
        assert_eq!(data.len(), 20 + 16);

        let (decoded_to, amount): (Address, u128) = decode(token::MINT, &data).unwrap();
        assert_eq!(decoded_to, to);
        assert_eq!(amount, 300);
    }

    #[test]
    fn test_no_arguments() {
        let data = encode(governor::ABDICATE, &()).unwrap();
        assert!(data.is_empty());
        decode::<()>(governor::ABDICATE, &data).unwrap();
        assert!(decode::<()>(governor::ABDICATE, &[0]).is_err());
    }

    #[test]
    fn test_malformed_calldata() {
        let err = decode::<u64>(governor::CANCEL, &[1, 2]).unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidCalldata { ref signature, .. } if signature == governor::CANCEL));
    }
}
