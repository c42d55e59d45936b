//! Two-phase admin handoff.
//!
//! The current admin nominates a pending admin; authority only moves once
//! the nominee calls [`AdminHandoff::accept`] itself, so an address that
//! cannot act never ends up holding the role.

use augur_types::Address;

use crate::error::GovernanceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminHandoff {
    admin: Address,
    pending_admin: Option<Address>,
}

impl AdminHandoff {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            pending_admin: None,
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn pending_admin(&self) -> Option<Address> {
        self.pending_admin
    }

    pub fn require_admin(&self, caller: Address, action: &str) -> Result<(), GovernanceError> {
        if caller != self.admin {
            return Err(GovernanceError::Unauthorized(format!(
                "{}: call must come from admin",
                action
            )));
        }
        Ok(())
    }

    /// Nominate `pending`; replaces any earlier nomination.
    pub fn set_pending(&mut self, pending: Address) {
        self.pending_admin = pending.non_zero();
    }

    /// Complete the handoff. Only the pending admin may call this.
    pub fn accept(&mut self, caller: Address) -> Result<Address, GovernanceError> {
        match self.pending_admin {
            Some(pending) if pending == caller => {
                self.admin = pending;
                self.pending_admin = None;
                Ok(pending)
            }
            _ => Err(GovernanceError::Unauthorized(
                "accept_admin: call must come from pending admin".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_phase_handoff() {
        let deployer = Address::from_bytes([1u8; 20]);
        let governor = Address::from_bytes([2u8; 20]);
        let mut handoff = AdminHandoff::new(deployer);

        assert!(handoff.accept(governor).is_err());

        handoff.set_pending(governor);
        assert_eq!(handoff.admin(), deployer);
        assert!(handoff.accept(deployer).is_err());

        assert_eq!(handoff.accept(governor).unwrap(), governor);
        assert_eq!(handoff.admin(), governor);
        assert_eq!(handoff.pending_admin(), None);
        assert!(handoff.require_admin(deployer, "queue_transaction").is_err());
        assert!(handoff.require_admin(governor, "queue_transaction").is_ok());
    }

    #[test]
    fn test_zero_pending_clears_nomination() {
        let mut handoff = AdminHandoff::new(Address::from_bytes([1u8; 20]));
        handoff.set_pending(Address::from_bytes([2u8; 20]));
        handoff.set_pending(Address::ZERO);
        assert_eq!(handoff.pending_admin(), None);
    }
}
