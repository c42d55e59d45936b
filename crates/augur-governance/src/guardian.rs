use augur_types::Address;

use crate::error::GovernanceError;

/// Address holding unconditional cancel rights over a governor's proposals.
///
/// Starts as the deployer. It may be handed over exactly once, and can be
/// given up for good through [`GuardianLink::abdicate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianLink {
    guardian: Option<Address>,
    changed: bool,
}

impl GuardianLink {
    pub fn new(guardian: Address) -> Self {
        Self {
            guardian: guardian.non_zero(),
            changed: false,
        }
    }

    pub fn guardian(&self) -> Option<Address> {
        self.guardian
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn is_guardian(&self, caller: &Address) -> bool {
        self.guardian.as_ref() == Some(caller)
    }

    pub fn require_guardian(&self, caller: Address, action: &str) -> Result<(), GovernanceError> {
        if !self.is_guardian(&caller) {
            return Err(GovernanceError::Unauthorized(format!(
                "{}: only guardian",
                action
            )));
        }
        Ok(())
    }

    pub fn change(&mut self, caller: Address, new_guardian: Address) -> Result<(), GovernanceError> {
        // Once-only check comes first, ahead of authorization
        if self.has_changed() {
            return Err(GovernanceError::GuardianAlreadyChanged);
        }
        self.require_guardian(caller, "change_guardian")?;
        if new_guardian.is_zero() {
            return Err(GovernanceError::InvalidParameter(
                "change_guardian: use abdicate to remove the guardian".to_string(),
            ));
        }

        self.guardian = Some(new_guardian);
        self.changed = true;
        Ok(())
    }

    pub fn abdicate(&mut self, caller: Address) -> Result<(), GovernanceError> {
        self.require_guardian(caller, "abdicate")?;
        self.guardian = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_change_once() {
        let mut link = GuardianLink::new(addr(1));
        assert!(link.change(addr(2), addr(3)).is_err());

        link.change(addr(1), addr(3)).unwrap();
        assert!(link.is_guardian(&addr(3)));

        assert_eq!(
            link.change(addr(3), addr(4)),
            Err(GovernanceError::GuardianAlreadyChanged)
        );
        // Reported even for a caller that is not the guardian
        assert_eq!(
            link.change(addr(9), addr(4)),
            Err(GovernanceError::GuardianAlreadyChanged)
        );
    }

    #[test]
    fn test_abdicate_is_permanent() {
        let mut link = GuardianLink::new(addr(1));
        link.abdicate(addr(1)).unwrap();
        assert_eq!(link.guardian(), None);
        assert!(!link.is_guardian(&addr(1)));
        assert!(link.abdicate(addr(1)).is_err());
        assert!(link.change(addr(1), addr(2)).is_err());
    }
}
